//! Tool system for the Keystone agent
//!
//! Tools are the actions the agent can take in the sandbox. Each tool has:
//! - A name and description for the LLM
//! - A JSON schema for parameters
//! - An execute method that always produces a [`ToolResult`]

pub mod files;
pub mod python;
mod registry;
pub mod shell;

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::MAX_OUTPUT;
use crate::error::ToolError;
use crate::formatting::truncate;

pub use files::{ReadFile, WriteFile};
pub use python::ExecutePython;
pub use registry::{all_tools, qualified_tool_name, tool_names, ToolServer, TOOL_NAMES};
pub use shell::RunShell;

/// Boxed future type for object-safe async trait methods
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A content block inside a tool result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolContent {
    Text { text: String },
}

/// Result handed back to the agent runtime for one tool invocation
///
/// Text is capped at [`MAX_OUTPUT`] characters (plus the truncation marker).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_error: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ToolResult {
    /// Successful result
    pub fn ok(text: impl AsRef<str>) -> Self {
        Self::new(text.as_ref(), false)
    }

    /// Error result
    pub fn err(text: impl AsRef<str>) -> Self {
        Self::new(text.as_ref(), true)
    }

    fn new(text: &str, is_error: bool) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: truncate(text, MAX_OUTPUT),
            }],
            is_error,
        }
    }

    /// All text content joined with newlines
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|block| match block {
                ToolContent::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Tool definition for LLM consumption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Core trait for all tools
///
/// `execute` is infallible: every failure is reported as an error
/// [`ToolResult`], never as a panic or an `Err`.
pub trait Tool: Send + Sync {
    /// Tool name (bare, without the server prefix)
    fn name(&self) -> &str;

    /// Description of what the tool does
    fn description(&self) -> &str;

    /// JSON schema for parameters
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with given parameters
    fn execute(&self, params: Value) -> BoxFuture<'_, ToolResult>;

    /// Convert to tool definition for LLM
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Fetch a required string argument
pub(crate) fn required_str<'a>(params: &'a Value, field: &'static str) -> Result<&'a str, ToolError> {
    params
        .get(field)
        .and_then(Value::as_str)
        .ok_or(ToolError::MissingArgument(field))
}

/// Render an adapter outcome into the result shape the runtime expects
pub(crate) fn into_result(tool: &str, outcome: Result<String, ToolError>) -> ToolResult {
    match outcome {
        Ok(text) => {
            tracing::debug!(tool, chars = text.chars().count(), "tool succeeded");
            ToolResult::ok(text)
        }
        Err(e) => {
            tracing::warn!(tool, error = %e, "tool failed");
            ToolResult::err(format!("{} failed: {}", tool, e))
        }
    }
}

/// Helper macro for creating tool parameter schemas
#[macro_export]
macro_rules! tool_params {
    ($($field:ident : $type:expr => $desc:expr),* $(,)?) => {
        serde_json::json!({
            "type": "object",
            "properties": {
                $( stringify!($field): { "type": $type, "description": $desc } ),*
            },
            "required": [ $( stringify!($field) ),* ]
        })
    };
}
