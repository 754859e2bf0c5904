//! Sandbox file tools

use std::sync::Arc;

use keystone_sandbox::SandboxApi;
use serde_json::Value;

use crate::error::ToolError;
use crate::formatting::{log_invocation, preview};
use crate::tool_params;
use crate::tools::{into_result, required_str, BoxFuture, Tool, ToolResult};

/// Characters of file content shown in the console trace
const PREVIEW_CHARS: usize = 200;

/// Tool for writing a file in the sandbox
pub struct WriteFile {
    sandbox: Arc<dyn SandboxApi>,
}

impl WriteFile {
    pub const NAME: &'static str = "write_file";

    pub fn new(sandbox: Arc<dyn SandboxApi>) -> Self {
        Self { sandbox }
    }

    async fn run(&self, params: &Value) -> Result<String, ToolError> {
        let path = required_str(params, "path")?;
        let content = required_str(params, "content")?;

        let mut lines = vec![format!("path: {}", path)];
        lines.extend(preview(content, PREVIEW_CHARS).lines().map(str::to_string));
        log_invocation(Self::NAME, &lines);

        // Report what the sandbox wrote, which may be a normalized path
        let written = self.sandbox.write_file(path, content).await?;
        Ok(format!("Wrote {} bytes to {}", written.bytes_written, written.file))
    }
}

impl Tool for WriteFile {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Write content to a file in the sandbox."
    }

    fn parameters_schema(&self) -> Value {
        tool_params!(
            path: "string" => "Path of the file to write",
            content: "string" => "The content to write to the file",
        )
    }

    fn execute(&self, params: Value) -> BoxFuture<'_, ToolResult> {
        Box::pin(async move { into_result(Self::NAME, self.run(&params).await) })
    }
}

/// Tool for reading a file from the sandbox
pub struct ReadFile {
    sandbox: Arc<dyn SandboxApi>,
}

impl ReadFile {
    pub const NAME: &'static str = "read_file";

    pub fn new(sandbox: Arc<dyn SandboxApi>) -> Self {
        Self { sandbox }
    }

    async fn run(&self, params: &Value) -> Result<String, ToolError> {
        let path = required_str(params, "path")?;
        log_invocation(Self::NAME, &[format!("path: {}", path)]);

        let read = self.sandbox.read_file(path).await?;
        Ok(read.content)
    }
}

impl Tool for ReadFile {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Read the contents of a file in the sandbox."
    }

    fn parameters_schema(&self) -> Value {
        tool_params!(path: "string" => "Path of the file to read")
    }

    fn execute(&self, params: Value) -> BoxFuture<'_, ToolResult> {
        Box::pin(async move { into_result(Self::NAME, self.run(&params).await) })
    }
}
