//! Error types for Keystone Core

use keystone_sandbox::SandboxError;
use thiserror::Error;

use crate::config::SANDBOX_LAUNCH_COMMAND;

/// Result type alias using Keystone Error
pub type Result<T> = std::result::Result<T, Error>;

/// Keystone error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not reach sandbox at {url}: {reason}\nStart it with: {}", SANDBOX_LAUNCH_COMMAND)]
    SandboxUnreachable { url: String, reason: String },

    #[error("Invalid session state: {0}")]
    InvalidState(String),

    #[error("Agent session is already connected")]
    AlreadyConnected,

    #[error("Agent session is not connected")]
    NotConnected,

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Sandbox error: {0}")]
    Sandbox(#[from] SandboxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures inside a tool adapter
///
/// These never leave the adapter: they are rendered into an error
/// [`ToolResult`](crate::tools::ToolResult) for the agent runtime.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("missing required argument `{0}`")]
    MissingArgument(&'static str),

    #[error(transparent)]
    Sandbox(#[from] SandboxError),
}
