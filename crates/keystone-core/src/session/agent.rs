//! The Keystone agent session
//!
//! Owns the sandbox handle and the runtime client, and enforces the
//! lifecycle `Constructed -> SandboxVerified -> Connected -> Disconnected`.

use std::sync::Arc;

use futures::Stream;
use keystone_sandbox::{SandboxApi, SandboxContext};
use tracing::{info, warn};

use super::client::{AgentClient, AgentOptions, PermissionMode};
use super::types::Message;
use crate::config::{Config, MCP_SERVER_NAME, MCP_SERVER_VERSION, SYSTEM_PROMPT};
use crate::error::{Error, Result};
use crate::provider::LlmProvider;
use crate::tools::{all_tools, ToolServer};

/// Lifecycle state of a [`KeystoneAgent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Constructed,
    SandboxVerified,
    Connected,
    Disconnected,
}

/// Agent session bound to one sandbox
pub struct KeystoneAgent {
    client: AgentClient,
    sandbox: Arc<dyn SandboxApi>,
    sandbox_url: String,
    state: SessionState,
    context: Option<SandboxContext>,
}

impl KeystoneAgent {
    /// Register the sandbox tools and configure the runtime client
    pub fn new(config: &Config, provider: Arc<dyn LlmProvider>, sandbox: Arc<dyn SandboxApi>) -> Self {
        let server = ToolServer::new(MCP_SERVER_NAME, MCP_SERVER_VERSION, all_tools(sandbox.clone()));
        let options = AgentOptions::new(SYSTEM_PROMPT)
            .with_allowed_tools(server.qualified_names())
            .with_tool_server(server)
            .with_permission_mode(PermissionMode::BypassPermissions)
            .with_max_turns(config.max_turns);

        Self {
            client: AgentClient::new(options, provider),
            sandbox,
            sandbox_url: config.sandbox_url.clone(),
            state: SessionState::Constructed,
            context: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn sandbox_url(&self) -> &str {
        &self.sandbox_url
    }

    /// Context recorded by the last successful [`Self::check_sandbox`]
    pub fn sandbox_context(&self) -> Option<&SandboxContext> {
        self.context.as_ref()
    }

    pub fn options(&self) -> &AgentOptions {
        self.client.options()
    }

    /// Check the sandbox is reachable and record its context
    ///
    /// On failure the state is left unchanged.
    pub async fn check_sandbox(&mut self) -> Result<&SandboxContext> {
        let context = self.sandbox.get_context().await.map_err(|e| {
            warn!(url = %self.sandbox_url, error = %e, "sandbox check failed");
            Error::SandboxUnreachable {
                url: self.sandbox_url.clone(),
                reason: e.to_string(),
            }
        })?;

        info!(version = %context.version, home_dir = %context.home_dir, "sandbox verified");
        if self.state == SessionState::Constructed {
            self.state = SessionState::SandboxVerified;
        }
        Ok(&*self.context.insert(context))
    }

    pub fn connect(&mut self) -> Result<()> {
        match self.state {
            SessionState::SandboxVerified => {
                self.client.connect()?;
                self.state = SessionState::Connected;
                Ok(())
            }
            SessionState::Connected => Err(Error::AlreadyConnected),
            SessionState::Constructed => Err(Error::InvalidState(
                "sandbox must be verified before connecting".to_string(),
            )),
            SessionState::Disconnected => {
                Err(Error::InvalidState("session has been disconnected".to_string()))
            }
        }
    }

    pub fn disconnect(&mut self) -> Result<()> {
        if self.state != SessionState::Connected {
            return Err(Error::NotConnected);
        }
        self.client.disconnect()?;
        self.state = SessionState::Disconnected;
        Ok(())
    }

    pub fn query(&mut self, prompt: &str) -> Result<()> {
        if self.state != SessionState::Connected {
            return Err(Error::NotConnected);
        }
        self.client.query(prompt)
    }

    /// Stream the answer to the last query
    pub fn receive_response(&mut self) -> impl Stream<Item = Result<Message>> + '_ {
        self.client.receive_response()
    }
}
