//! LLM provider abstraction
//!
//! The agent runtime talks to the model through [`LlmProvider`]. The
//! production implementation is [`GenAIProvider`], which reaches Anthropic
//! (and any other backend genai resolves from the model name).

mod genai_provider;

pub use genai_provider::GenAIProvider;

use async_trait::async_trait;
use genai::chat::ToolCall;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::tools::ToolDefinition;

/// One entry in the conversation history sent to the model
#[derive(Debug, Clone, PartialEq)]
pub enum LlmMessage {
    /// A user turn
    User(String),
    /// A plain assistant reply
    Assistant(String),
    /// An assistant turn that requested tool calls
    AssistantToolCalls {
        content: Option<String>,
        tool_calls: Vec<PendingToolCall>,
    },
    /// The result of one tool call
    ToolResult {
        call_id: String,
        content: String,
        is_error: bool,
    },
}

impl LlmMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::User(content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant(content.into())
    }

    pub fn assistant_with_tool_calls(content: Option<String>, tool_calls: Vec<PendingToolCall>) -> Self {
        Self::AssistantToolCalls { content, tool_calls }
    }

    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>, is_error: bool) -> Self {
        Self::ToolResult {
            call_id: call_id.into(),
            content: content.into(),
            is_error,
        }
    }
}

/// Tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingToolCall {
    pub call_id: String,
    pub name: String,
    pub arguments: Value,
}

impl PendingToolCall {
    pub fn new(call_id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            call_id: call_id.into(),
            name: name.into(),
            arguments,
        }
    }
}

impl From<ToolCall> for PendingToolCall {
    fn from(tc: ToolCall) -> Self {
        Self {
            call_id: tc.call_id,
            name: tc.fn_name,
            arguments: tc.fn_arguments,
        }
    }
}

impl From<PendingToolCall> for ToolCall {
    fn from(tc: PendingToolCall) -> Self {
        ToolCall {
            call_id: tc.call_id,
            fn_name: tc.name,
            fn_arguments: tc.arguments,
            thought_signatures: None,
        }
    }
}

/// Response from completion that may contain both content and tool calls
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionResult {
    /// Text content from the assistant (may be present even with tool calls)
    pub content: Option<String>,
    pub tool_calls: Vec<PendingToolCall>,
}

impl CompletionResult {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    pub fn has_content(&self) -> bool {
        self.content.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// One completion request
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub messages: &'a [LlmMessage],
    pub tools: &'a [ToolDefinition],
}

/// A model backend able to complete a conversation
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    /// Produce the next assistant turn for the conversation
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<CompletionResult>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_call_conversion_keeps_fields() {
        let pending = PendingToolCall::new("call_1", "mcp__sandbox__run_shell", json!({"command": "ls"}));
        let genai_call: ToolCall = pending.clone().into();
        assert_eq!(genai_call.call_id, "call_1");
        assert_eq!(genai_call.fn_name, "mcp__sandbox__run_shell");
        assert_eq!(PendingToolCall::from(genai_call), pending);
    }

    #[test]
    fn test_completion_result_flags() {
        let result = CompletionResult::text("hi");
        assert!(result.has_content());
        assert!(!result.has_tool_calls());
        assert!(!CompletionResult::default().has_content());
    }
}
