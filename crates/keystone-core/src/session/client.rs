//! In-process agent runtime client
//!
//! Holds one conversation at a time. A query appends a user turn; the
//! response stream then alternates model requests and tool dispatch until
//! the model answers without tool calls, `max_turns` is reached, or the
//! provider fails.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, Stream};
use tracing::{debug, info, warn};

use super::types::{AssistantMessage, ContentBlock, Message, ResultMessage, ResultSubtype};
use crate::config::defaults;
use crate::error::{Error, Result};
use crate::provider::{CompletionRequest, LlmMessage, LlmProvider, PendingToolCall};
use crate::tools::{ToolDefinition, ToolResult, ToolServer};

/// How allow-listed tools are approved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionMode {
    /// Every tool call needs interactive approval; none is available, so
    /// calls are refused
    #[default]
    Default,
    /// Allow-listed tools run without prompting
    BypassPermissions,
}

/// Options for an [`AgentClient`]
#[derive(Debug, Clone)]
pub struct AgentOptions {
    pub system_prompt: String,
    pub tool_servers: Vec<ToolServer>,
    /// Qualified names of tools the model may call
    pub allowed_tools: Vec<String>,
    pub permission_mode: PermissionMode,
    pub max_turns: usize,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            system_prompt: String::new(),
            tool_servers: Vec::new(),
            allowed_tools: Vec::new(),
            permission_mode: PermissionMode::Default,
            max_turns: defaults::MAX_TURNS,
        }
    }
}

impl AgentOptions {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_tool_server(mut self, server: ToolServer) -> Self {
        self.tool_servers.push(server);
        self
    }

    pub fn with_allowed_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_permission_mode(mut self, mode: PermissionMode) -> Self {
        self.permission_mode = mode;
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    fn is_allowed(&self, qualified: &str) -> bool {
        self.allowed_tools.iter().any(|t| t == qualified)
    }

    /// Definitions of tools both registered and allow-listed
    pub fn offered_tools(&self) -> Vec<ToolDefinition> {
        self.tool_servers
            .iter()
            .flat_map(ToolServer::definitions)
            .filter(|def| self.is_allowed(&def.name))
            .collect()
    }
}

/// State of an open conversation
#[derive(Debug)]
struct Conversation {
    session_id: String,
    history: Vec<LlmMessage>,
    /// A query is waiting for its response to be streamed
    pending: bool,
}

/// Client driving the model and dispatching its tool calls
pub struct AgentClient {
    options: AgentOptions,
    provider: Arc<dyn LlmProvider>,
    conversation: Option<Conversation>,
}

impl AgentClient {
    pub fn new(options: AgentOptions, provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            options,
            provider,
            conversation: None,
        }
    }

    pub fn options(&self) -> &AgentOptions {
        &self.options
    }

    pub fn is_connected(&self) -> bool {
        self.conversation.is_some()
    }

    /// Id of the open conversation
    pub fn session_id(&self) -> Option<&str> {
        self.conversation.as_ref().map(|c| c.session_id.as_str())
    }

    /// Conversation history so far
    pub fn history(&self) -> &[LlmMessage] {
        self.conversation.as_ref().map(|c| c.history.as_slice()).unwrap_or(&[])
    }

    /// Open a fresh conversation
    pub fn connect(&mut self) -> Result<()> {
        if self.conversation.is_some() {
            return Err(Error::AlreadyConnected);
        }
        let session_id = uuid::Uuid::new_v4().to_string();
        info!(
            session_id = %session_id,
            provider = self.provider.name(),
            tools = self.options.allowed_tools.len(),
            "agent connected"
        );
        self.conversation = Some(Conversation {
            session_id,
            history: Vec::new(),
            pending: false,
        });
        Ok(())
    }

    /// Drop the open conversation
    pub fn disconnect(&mut self) -> Result<()> {
        let conversation = self.conversation.take().ok_or(Error::NotConnected)?;
        info!(session_id = %conversation.session_id, "agent disconnected");
        Ok(())
    }

    /// Send a user prompt; its answer is read with [`Self::receive_response`]
    pub fn query(&mut self, prompt: impl Into<String>) -> Result<()> {
        let conversation = self.conversation.as_mut().ok_or(Error::NotConnected)?;
        conversation.history.push(LlmMessage::user(prompt));
        conversation.pending = true;
        Ok(())
    }

    /// Stream the messages answering the last query
    ///
    /// The stream is finite. When a query is pending it ends with exactly
    /// one [`Message::Result`]; a provider failure is yielded as an `Err`
    /// just before that result.
    pub fn receive_response(&mut self) -> impl Stream<Item = Result<Message>> + '_ {
        let state = TurnState {
            client: self,
            phase: Phase::Request,
            queue: VecDeque::new(),
            turns: 0,
            started: Instant::now(),
        };

        stream::unfold(state, |mut state| async move {
            loop {
                if let Some(item) = state.queue.pop_front() {
                    return Some((item, state));
                }
                match std::mem::replace(&mut state.phase, Phase::Done) {
                    Phase::Request => state.request().await,
                    Phase::Dispatch(calls) => state.dispatch(calls).await,
                    Phase::Done => return None,
                }
            }
        })
    }

    /// Run one tool call against the registered servers
    async fn run_tool(&self, call: &PendingToolCall) -> ToolResult {
        let tool = self
            .options
            .tool_servers
            .iter()
            .find_map(|server| server.get(&call.name))
            .filter(|_| self.options.is_allowed(&call.name));

        let Some(tool) = tool else {
            warn!(tool = %call.name, "tool call refused: not available");
            return ToolResult::err(format!("Tool {} is not available", call.name));
        };

        match self.options.permission_mode {
            PermissionMode::BypassPermissions => {
                debug!(tool = %call.name, call_id = %call.call_id, "dispatching tool call");
                tool.execute(call.arguments.clone()).await
            }
            PermissionMode::Default => {
                warn!(tool = %call.name, "tool call refused: no approval");
                ToolResult::err(format!("Permission to use {} was not granted", call.name))
            }
        }
    }
}

enum Phase {
    Request,
    Dispatch(Vec<PendingToolCall>),
    Done,
}

/// Progress of one response stream
struct TurnState<'a> {
    client: &'a mut AgentClient,
    phase: Phase,
    queue: VecDeque<Result<Message>>,
    turns: usize,
    started: Instant,
}

impl TurnState<'_> {
    async fn request(&mut self) {
        let Some(conversation) = self.client.conversation.as_ref() else {
            self.queue.push_back(Err(Error::NotConnected));
            return;
        };
        if !conversation.pending {
            return;
        }
        if self.turns >= self.client.options.max_turns {
            warn!(max_turns = self.client.options.max_turns, "turn limit reached");
            self.finish(ResultSubtype::ErrorMaxTurns, None);
            return;
        }
        self.turns += 1;

        let tools = self.client.options.offered_tools();
        let request = CompletionRequest {
            system: &self.client.options.system_prompt,
            messages: &conversation.history,
            tools: &tools,
        };

        let completion = match self.client.provider.complete(request).await {
            Ok(completion) => completion,
            Err(e) => {
                self.queue.push_back(Err(e));
                self.finish(ResultSubtype::ErrorDuringExecution, None);
                return;
            }
        };

        let text = completion.content.filter(|c| !c.is_empty());
        let mut blocks: Vec<ContentBlock> = text.iter().map(ContentBlock::text).collect();
        blocks.extend(
            completion
                .tool_calls
                .iter()
                .map(|call| ContentBlock::tool_use(&call.call_id, &call.name, call.arguments.clone())),
        );
        if !blocks.is_empty() {
            self.queue
                .push_back(Ok(Message::Assistant(AssistantMessage { content: blocks })));
        }

        if completion.tool_calls.is_empty() {
            self.push_history(LlmMessage::assistant(text.clone().unwrap_or_default()));
            self.finish(ResultSubtype::Success, text);
        } else {
            self.push_history(LlmMessage::assistant_with_tool_calls(
                text,
                completion.tool_calls.clone(),
            ));
            self.phase = Phase::Dispatch(completion.tool_calls);
        }
    }

    async fn dispatch(&mut self, calls: Vec<PendingToolCall>) {
        for call in calls {
            let result = self.client.run_tool(&call).await;
            self.push_history(LlmMessage::tool_result(
                call.call_id,
                result.text(),
                result.is_error,
            ));
        }
        self.phase = Phase::Request;
    }

    fn push_history(&mut self, message: LlmMessage) {
        if let Some(conversation) = self.client.conversation.as_mut() {
            conversation.history.push(message);
        }
    }

    fn finish(&mut self, subtype: ResultSubtype, result: Option<String>) {
        let session_id = match self.client.conversation.as_mut() {
            Some(conversation) => {
                conversation.pending = false;
                conversation.session_id.clone()
            }
            None => String::new(),
        };
        let duration_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(%subtype, turns = self.turns, duration_ms, "response finished");

        self.queue.push_back(Ok(Message::Result(ResultMessage {
            subtype,
            is_error: subtype != ResultSubtype::Success,
            num_turns: self.turns,
            duration_ms,
            session_id,
            result,
        })));
        self.phase = Phase::Done;
    }
}
