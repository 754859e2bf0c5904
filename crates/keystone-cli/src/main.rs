//! Keystone CLI - delegation agent REPL
//!
//! Verifies the sandbox, opens an agent session and hands the terminal to
//! the REPL. The session is always disconnected on the way out.

mod repl;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

use keystone_core::{Config, GenAIProvider, KeystoneAgent};
use keystone_sandbox::HttpSandbox;

#[derive(Parser)]
#[command(name = "keystone")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Delegation agent that runs its work in a remote sandbox", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Model to use (overrides config and KEYSTONE_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Sandbox base URL (overrides config and SANDBOX_URL)
    #[arg(long)]
    sandbox_url: Option<String>,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(url) = &self.sandbox_url {
            config.sandbox_url = url.clone();
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr at warn by default so they stay out of the REPL
    let default_filter = if cli.verbose {
        "info,keystone_core=debug,keystone_sandbox=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", style(format!("{:#}", e)).red());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    cli.apply(&mut config);
    tracing::debug!(?config, "configuration loaded");

    let sandbox = Arc::new(HttpSandbox::new(&config.sandbox_url)?);
    let provider = Arc::new(GenAIProvider::new(config.model.clone()));
    let mut agent = KeystoneAgent::new(&config, provider, sandbox);

    println!("Connecting to sandbox...");
    let context = agent.check_sandbox().await?;
    println!(
        "Sandbox ready (version {}, home: {})",
        context.version, context.home_dir
    );

    let reader = repl::Terminal::spawn()?;
    repl::run_session(&mut agent, Box::new(reader), &mut std::io::stdout()).await
}
