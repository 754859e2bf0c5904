//! Keystone Core - delegation agent backed by a remote sandbox
//!
//! This crate provides the core functionality for Keystone:
//! - Tool adapters that run code, shell commands and file operations in the sandbox
//! - The tool server and allow-list exposed to the agent runtime
//! - An in-process agent runtime driving an LLM through genai
//! - The agent session lifecycle used by the CLI

pub mod config;
pub mod error;
pub mod formatting;
pub mod provider;
pub mod session;
pub mod tools;

pub use config::{defaults, Config, MAX_OUTPUT, MCP_SERVER_NAME, MCP_SERVER_VERSION, SYSTEM_PROMPT};
pub use error::{Error, Result, ToolError};
pub use formatting::{log_invocation, render_invocation, truncate};
pub use provider::{CompletionRequest, CompletionResult, GenAIProvider, LlmMessage, LlmProvider, PendingToolCall};
pub use session::{
    AgentClient, AgentOptions, AssistantMessage, ContentBlock, KeystoneAgent, Message,
    PermissionMode, ResultMessage, ResultSubtype, SessionState,
};
pub use tools::{
    all_tools, qualified_tool_name, tool_names, Tool, ToolContent, ToolDefinition, ToolResult,
    ToolServer,
};
