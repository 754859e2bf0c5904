//! Execute Python tool

use std::sync::Arc;

use keystone_sandbox::{JupyterOutput, SandboxApi};
use serde_json::{Map, Value};

use crate::error::ToolError;
use crate::formatting::log_invocation;
use crate::tool_params;
use crate::tools::{into_result, required_str, BoxFuture, Tool, ToolResult};

/// Result text when the kernel produced nothing printable
pub const NO_OUTPUT: &str = "(no output)";

/// Tool running Python in the sandbox's Jupyter kernel
pub struct ExecutePython {
    sandbox: Arc<dyn SandboxApi>,
}

impl ExecutePython {
    pub const NAME: &'static str = "execute_python";

    pub fn new(sandbox: Arc<dyn SandboxApi>) -> Self {
        Self { sandbox }
    }

    async fn run(&self, params: &Value) -> Result<String, ToolError> {
        let code = required_str(params, "code")?;
        log_invocation(Self::NAME, &code.lines().collect::<Vec<_>>());

        let execution = self.sandbox.execute_code(code).await?;
        Ok(render_outputs(&execution.outputs))
    }
}

impl Tool for ExecutePython {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Execute Python code in a Jupyter kernel inside the sandbox."
    }

    fn parameters_schema(&self) -> Value {
        tool_params!(code: "string" => "Python source to execute")
    }

    fn execute(&self, params: Value) -> BoxFuture<'_, ToolResult> {
        Box::pin(async move { into_result(Self::NAME, self.run(&params).await) })
    }
}

/// Join the text contributed by each kernel output record, in order
///
/// Streams contribute their text, rich results their `text/plain`
/// representation, and errors `"<ename>: <evalue>"` followed by the
/// traceback. Returns [`NO_OUTPUT`] if nothing contributed.
pub fn render_outputs(outputs: &[JupyterOutput]) -> String {
    let mut parts: Vec<String> = Vec::new();

    for output in outputs {
        match output {
            JupyterOutput::Stream { text: Some(text), .. } if !text.is_empty() => {
                parts.push(text.clone());
            }
            JupyterOutput::ExecuteResult { data } | JupyterOutput::DisplayData { data }
                if !data.is_empty() =>
            {
                parts.push(plain_text(data));
            }
            JupyterOutput::Error {
                ename,
                evalue,
                traceback,
            } => {
                parts.push(format!("{}: {}", ename, evalue));
                if !traceback.is_empty() {
                    parts.push(traceback.join("\n"));
                }
            }
            _ => {}
        }
    }

    if parts.is_empty() {
        NO_OUTPUT.to_string()
    } else {
        parts.join("\n")
    }
}

/// `text/plain` from a MIME bundle, or the whole bundle as JSON
fn plain_text(data: &Map<String, Value>) -> String {
    match data.get("text/plain") {
        Some(Value::String(text)) => text.clone(),
        // Jupyter may split multi-line text into a list of strings
        Some(Value::Array(chunks)) => chunks.iter().filter_map(Value::as_str).collect(),
        Some(other) => other.to_string(),
        None => Value::Object(data.clone()).to_string(),
    }
}
