//! Agent session
//!
//! - `AgentClient`: the in-process agent runtime (model loop and tool dispatch)
//! - `KeystoneAgent`: the session lifecycle around one sandbox
//! - `Message`: what a response stream yields

mod agent;
mod client;
mod types;

pub use agent::{KeystoneAgent, SessionState};
pub use client::{AgentClient, AgentOptions, PermissionMode};
pub use types::{AssistantMessage, ContentBlock, Message, ResultMessage, ResultSubtype};
