//! GenAI-based LLM provider implementation
//!
//! Credentials come from the environment (`ANTHROPIC_API_KEY` for Claude
//! models), resolved by genai from the model name.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use genai::chat::{ChatMessage, ChatRequest, ChatStreamEvent, Tool, ToolCall, ToolResponse};
use genai::{Client, WebConfig};
use tracing::debug;

use super::{CompletionRequest, CompletionResult, LlmMessage, LlmProvider, PendingToolCall};
use crate::error::{Error, Result};

/// A provider implementation using genai
pub struct GenAIProvider {
    client: Client,
    model: String,
}

impl GenAIProvider {
    /// Default timeout for LLM API requests (5 minutes)
    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    fn default_web_config() -> WebConfig {
        WebConfig::default()
            .with_timeout(Self::DEFAULT_TIMEOUT)
            .with_connect_timeout(Duration::from_secs(30))
    }

    pub fn new(model: impl Into<String>) -> Self {
        let client = Client::builder()
            .with_web_config(Self::default_web_config())
            .build();
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(request: &CompletionRequest<'_>) -> ChatRequest {
        let mut chat_req = ChatRequest::default().with_system(request.system);

        for msg in request.messages {
            chat_req = match msg {
                LlmMessage::User(text) => chat_req.append_message(ChatMessage::user(text.as_str())),
                LlmMessage::Assistant(text) => {
                    chat_req.append_message(ChatMessage::assistant(text.as_str()))
                }
                // Text said alongside tool calls goes first, as its own
                // assistant message, so the calls stay adjacent to their results
                LlmMessage::AssistantToolCalls { content, tool_calls } => {
                    let chat_req = match content.as_deref() {
                        Some(text) if !text.is_empty() => {
                            chat_req.append_message(ChatMessage::assistant(text))
                        }
                        _ => chat_req,
                    };
                    let calls: Vec<ToolCall> = tool_calls.iter().cloned().map(ToolCall::from).collect();
                    chat_req.append_message(calls)
                }
                // genai has no error flag on tool responses; failed results
                // already read "<tool> failed: ..."
                LlmMessage::ToolResult { call_id, content, .. } => {
                    chat_req.append_message(ToolResponse::new(call_id.clone(), content.clone()))
                }
            };
        }

        if !request.tools.is_empty() {
            let tools: Vec<Tool> = request
                .tools
                .iter()
                .map(|t| {
                    Tool::new(&t.name)
                        .with_description(&t.description)
                        .with_schema(t.parameters.clone())
                })
                .collect();
            chat_req = chat_req.with_tools(tools);
        }

        chat_req
    }
}

#[async_trait]
impl LlmProvider for GenAIProvider {
    fn name(&self) -> &str {
        "genai"
    }

    async fn complete(&self, request: CompletionRequest<'_>) -> Result<CompletionResult> {
        let chat_req = Self::build_request(&request);
        debug!(
            model = %self.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "sending completion request"
        );

        // Streaming keeps long generations clear of the request timeout
        let stream_response = self
            .client
            .exec_chat_stream(&self.model, chat_req, None)
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, model = %self.model, "LLM request failed");
                Error::Provider(format!("GenAI error: {}", e))
            })?;

        let mut content = String::new();
        let mut tool_calls: Vec<PendingToolCall> = Vec::new();
        let mut stream = stream_response.stream;

        while let Some(event) = stream.next().await {
            match event {
                Ok(ChatStreamEvent::Chunk(chunk)) => content.push_str(&chunk.content),
                Ok(ChatStreamEvent::ToolCallChunk(tc)) => tool_calls.push(tc.tool_call.into()),
                Ok(ChatStreamEvent::End(_)) => break,
                // Reasoning is not surfaced as assistant text
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = ?e, model = %self.model, "LLM stream error");
                    return Err(Error::Provider(format!("GenAI stream error: {}", e)));
                }
            }
        }

        debug!(
            chars = content.len(),
            tool_calls = tool_calls.len(),
            "completion finished"
        );

        Ok(CompletionResult {
            content: if content.is_empty() { None } else { Some(content) },
            tool_calls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolDefinition;
    use serde_json::json;

    #[test]
    fn test_build_request_maps_history() {
        let messages = vec![
            LlmMessage::user("list files"),
            LlmMessage::assistant_with_tool_calls(
                None,
                vec![PendingToolCall::new("c1", "mcp__sandbox__run_shell", json!({"command": "ls"}))],
            ),
            LlmMessage::tool_result("c1", "a.txt\n[exit code: 0]", false),
            LlmMessage::assistant("There is one file."),
        ];
        let tools = vec![ToolDefinition {
            name: "mcp__sandbox__run_shell".into(),
            description: "Run a shell command".into(),
            parameters: json!({"type": "object"}),
        }];
        let request = CompletionRequest {
            system: "be helpful",
            messages: &messages,
            tools: &tools,
        };

        let chat_req = GenAIProvider::build_request(&request);
        assert_eq!(chat_req.system.as_deref(), Some("be helpful"));
        assert_eq!(chat_req.messages.len(), 4);
        assert_eq!(chat_req.tools.map(|t| t.len()), Some(1));
    }

    #[test]
    fn test_build_request_keeps_text_before_tool_calls() {
        let messages = vec![
            LlmMessage::user("check the disk"),
            LlmMessage::assistant_with_tool_calls(
                Some("Let me look.".into()),
                vec![PendingToolCall::new("c1", "mcp__sandbox__run_shell", json!({"command": "df"}))],
            ),
            LlmMessage::tool_result("c1", "run_shell failed: timeout", true),
        ];
        let request = CompletionRequest {
            system: "s",
            messages: &messages,
            tools: &[],
        };

        let chat_req = GenAIProvider::build_request(&request);
        assert_eq!(chat_req.messages.len(), 4);
        assert_eq!(chat_req.messages[1].content.joined_texts().as_deref(), Some("Let me look."));
    }

    #[test]
    fn test_build_request_without_tools() {
        let messages = vec![LlmMessage::user("hi")];
        let request = CompletionRequest {
            system: "s",
            messages: &messages,
            tools: &[],
        };
        assert!(GenAIProvider::build_request(&request).tools.is_none());
    }
}
