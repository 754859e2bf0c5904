//! Interactive read-eval-print loop

use std::io::Write;
use std::sync::mpsc;

use console::style;
use futures::StreamExt;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use keystone_core::{ContentBlock, KeystoneAgent, Message};

const BANNER: &str = "\nThe Delegation Layer — type your request (quit to exit)\n";
const PROMPT: &str = "you> ";

/// Result of reading one line from the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    Eof,
    Interrupted,
}

/// Blocking source of user input
pub trait LineReader: Send {
    fn read_line(&mut self, prompt: &str) -> ReadOutcome;
}

/// Line editor running on its own thread
///
/// The editor never leaves the thread that created it; prompts and
/// replies cross over channels.
pub struct Terminal {
    prompts: mpsc::Sender<String>,
    replies: mpsc::Receiver<ReadOutcome>,
}

impl Terminal {
    pub fn spawn() -> anyhow::Result<Self> {
        let (prompt_tx, prompt_rx) = mpsc::channel::<String>();
        let (reply_tx, reply_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        std::thread::Builder::new()
            .name("keystone-readline".into())
            .spawn(move || {
                let mut editor = match DefaultEditor::new() {
                    Ok(editor) => {
                        let _ = ready_tx.send(Ok(()));
                        editor
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                for prompt in prompt_rx {
                    let outcome = read_with(&mut editor, &prompt);
                    if reply_tx.send(outcome).is_err() {
                        break;
                    }
                }
            })?;

        ready_rx
            .recv()?
            .map_err(|e| anyhow::anyhow!("failed to open terminal: {}", e))?;
        Ok(Self {
            prompts: prompt_tx,
            replies: reply_rx,
        })
    }
}

fn read_with(editor: &mut DefaultEditor, prompt: &str) -> ReadOutcome {
    match editor.readline(prompt) {
        Ok(line) => {
            if !line.trim().is_empty() {
                let _ = editor.add_history_entry(line.as_str());
            }
            ReadOutcome::Line(line)
        }
        Err(ReadlineError::Interrupted) => ReadOutcome::Interrupted,
        Err(ReadlineError::Eof) => ReadOutcome::Eof,
        Err(e) => {
            tracing::warn!(error = %e, "terminal read failed");
            ReadOutcome::Eof
        }
    }
}

impl LineReader for Terminal {
    fn read_line(&mut self, prompt: &str) -> ReadOutcome {
        if self.prompts.send(prompt.to_string()).is_err() {
            return ReadOutcome::Eof;
        }
        self.replies.recv().unwrap_or(ReadOutcome::Eof)
    }
}

/// Connect the agent, run the REPL, then disconnect
///
/// Once connected the session is released on every exit path, including a
/// failed REPL.
pub async fn run_session<W: Write>(
    agent: &mut KeystoneAgent,
    reader: Box<dyn LineReader>,
    out: &mut W,
) -> anyhow::Result<()> {
    agent.connect()?;
    let outcome = run(agent, reader, out).await;
    let disconnected = agent.disconnect();

    outcome?;
    disconnected?;
    Ok(())
}

/// Run the REPL until the user quits or input ends
///
/// Errors during a turn are printed and the loop continues.
pub async fn run<W: Write>(
    agent: &mut KeystoneAgent,
    mut reader: Box<dyn LineReader>,
    out: &mut W,
) -> anyhow::Result<()> {
    writeln!(out, "{}", BANNER)?;

    loop {
        out.flush()?;
        // Reads block, so they run off the async workers
        let (returned, outcome) = tokio::task::spawn_blocking(move || {
            let outcome = reader.read_line(PROMPT);
            (reader, outcome)
        })
        .await?;
        reader = returned;

        let line = match outcome {
            ReadOutcome::Line(line) => line,
            ReadOutcome::Eof | ReadOutcome::Interrupted => {
                writeln!(out, "\nGoodbye!")?;
                break;
            }
        };

        let command = line.trim();
        if command.eq_ignore_ascii_case("quit") || command.eq_ignore_ascii_case("exit") {
            writeln!(out, "Goodbye!")?;
            break;
        }
        if command.is_empty() {
            continue;
        }

        agent.query(&line)?;
        let stream = agent.receive_response();
        futures::pin_mut!(stream);

        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Assistant(assistant)) => {
                    for block in assistant.content {
                        match block {
                            ContentBlock::Text { text } => writeln!(out, "\nagent> {}", text)?,
                            ContentBlock::ToolUse { name, .. } => {
                                writeln!(out, "\n[{}]", name)?
                            }
                        }
                    }
                }
                Ok(Message::Result(result)) => {
                    tracing::debug!(
                        subtype = %result.subtype,
                        turns = result.num_turns,
                        duration_ms = result.duration_ms,
                        "turn finished"
                    );
                }
                Err(e) => writeln!(out, "\n{}", style(format!("error: {}", e)).red())?,
            }
        }
    }

    out.flush()?;
    Ok(())
}
