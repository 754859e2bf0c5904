//! Run shell command tool

use std::sync::Arc;

use keystone_sandbox::SandboxApi;
use serde_json::Value;

use crate::error::ToolError;
use crate::formatting::log_invocation;
use crate::tool_params;
use crate::tools::{into_result, required_str, BoxFuture, Tool, ToolResult};

/// Tool running a shell command inside the sandbox
///
/// A nonzero exit code is still a successful tool call; the code is
/// reported in the result text for the agent to interpret.
pub struct RunShell {
    sandbox: Arc<dyn SandboxApi>,
}

impl RunShell {
    pub const NAME: &'static str = "run_shell";

    pub fn new(sandbox: Arc<dyn SandboxApi>) -> Self {
        Self { sandbox }
    }

    async fn run(&self, params: &Value) -> Result<String, ToolError> {
        let command = required_str(params, "command")?;
        log_invocation(Self::NAME, &[format!("$ {}", command)]);

        let result = self.sandbox.exec_command(command).await?;
        Ok(format!(
            "{}\n[exit code: {}]",
            result.output.unwrap_or_default(),
            result.exit_code.unwrap_or(-1)
        ))
    }
}

impl Tool for RunShell {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Run a shell command inside the sandbox and return its output."
    }

    fn parameters_schema(&self) -> Value {
        tool_params!(command: "string" => "The shell command to execute")
    }

    fn execute(&self, params: Value) -> BoxFuture<'_, ToolResult> {
        Box::pin(async move { into_result(Self::NAME, self.run(&params).await) })
    }
}
