//! Keystone Sandbox - client for the remote execution sandbox
//!
//! The sandbox is an HTTP service that runs code, shell commands and
//! filesystem operations inside an isolated container. This crate exposes
//! its capabilities through the [`SandboxApi`] trait, with [`HttpSandbox`]
//! as the network-backed implementation.

mod http;
pub mod types;

use async_trait::async_trait;

pub use http::HttpSandbox;
pub use types::{
    ApiResponse, CodeExecution, FileRead, FileWrite, JupyterOutput, SandboxContext, ShellExecution,
};

/// Default base URL of a locally running sandbox container
pub const DEFAULT_SANDBOX_URL: &str = "http://localhost:8081";

/// Errors raised while talking to the sandbox
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("Invalid sandbox URL: {0}")]
    InvalidUrl(String),
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("Sandbox returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Sandbox API error: {0}")]
    Api(String),
    #[error("Failed to decode sandbox response: {0}")]
    Decode(String),
}

/// Capabilities exposed by the sandbox service
///
/// Every call is a single request with no retry; a failure is returned to
/// the caller as-is.
#[async_trait]
pub trait SandboxApi: Send + Sync {
    /// Reachability check returning basic environment info
    async fn get_context(&self) -> Result<SandboxContext, SandboxError>;

    /// Run code in the sandbox's Jupyter kernel
    async fn execute_code(&self, code: &str) -> Result<CodeExecution, SandboxError>;

    /// Run a shell command
    async fn exec_command(&self, command: &str) -> Result<ShellExecution, SandboxError>;

    /// Write `content` to `file`
    async fn write_file(&self, file: &str, content: &str) -> Result<FileWrite, SandboxError>;

    /// Read the text content of `file`
    async fn read_file(&self, file: &str) -> Result<FileRead, SandboxError>;
}
