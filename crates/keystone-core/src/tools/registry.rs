//! Tool server registration
//!
//! The four sandbox tools are grouped under a named server. The agent
//! runtime addresses them as `mcp__<server>__<tool>`.

use std::fmt;
use std::sync::Arc;

use keystone_sandbox::SandboxApi;

use super::{ExecutePython, ReadFile, RunShell, Tool, ToolDefinition, WriteFile};

/// Bare tool names, in registration order
pub const TOOL_NAMES: [&str; 4] = [
    ExecutePython::NAME,
    RunShell::NAME,
    WriteFile::NAME,
    ReadFile::NAME,
];

/// Create every sandbox tool, in registration order
pub fn all_tools(sandbox: Arc<dyn SandboxApi>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ExecutePython::new(sandbox.clone())),
        Arc::new(RunShell::new(sandbox.clone())),
        Arc::new(WriteFile::new(sandbox.clone())),
        Arc::new(ReadFile::new(sandbox)),
    ]
}

/// Name under which the runtime addresses `tool` on `server`
pub fn qualified_tool_name(server: &str, tool: &str) -> String {
    format!("mcp__{}__{}", server, tool)
}

/// Qualified names of every sandbox tool on `server`
pub fn tool_names(server: &str) -> Vec<String> {
    TOOL_NAMES
        .iter()
        .map(|tool| qualified_tool_name(server, tool))
        .collect()
}

/// A named, versioned group of tools
#[derive(Clone)]
pub struct ToolServer {
    name: String,
    version: String,
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolServer {
    pub fn new(name: impl Into<String>, version: impl Into<String>, tools: Vec<Arc<dyn Tool>>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            tools,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    /// Qualified names of the registered tools, in order
    pub fn qualified_names(&self) -> Vec<String> {
        self.tools
            .iter()
            .map(|tool| qualified_tool_name(&self.name, tool.name()))
            .collect()
    }

    /// Look up a tool by its qualified name
    pub fn get(&self, qualified: &str) -> Option<Arc<dyn Tool>> {
        let bare = qualified
            .strip_prefix("mcp__")?
            .strip_prefix(self.name.as_str())?
            .strip_prefix("__")?;
        self.tools.iter().find(|tool| tool.name() == bare).cloned()
    }

    /// Tool definitions carrying qualified names
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|tool| {
                let mut definition = tool.to_definition();
                definition.name = qualified_tool_name(&self.name, tool.name());
                definition
            })
            .collect()
    }
}

impl fmt::Debug for ToolServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolServer")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("tools", &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>())
            .finish()
    }
}
