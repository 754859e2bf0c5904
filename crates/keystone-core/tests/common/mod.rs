//! Test doubles shared by the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use keystone_core::provider::{CompletionRequest, CompletionResult, LlmMessage, LlmProvider, PendingToolCall};
use keystone_core::tools::ToolDefinition;
use keystone_core::{Error, Result};
use keystone_sandbox::{
    CodeExecution, FileRead, FileWrite, JupyterOutput, SandboxApi, SandboxContext, SandboxError,
    ShellExecution,
};
use serde_json::Value;

/// In-memory sandbox recording every call
#[derive(Default)]
pub struct MockSandbox {
    pub outputs: Vec<JupyterOutput>,
    pub shell_output: Option<String>,
    pub exit_code: Option<i64>,
    /// When set, every call fails with this API message
    pub failure: Option<String>,
    pub files: Mutex<HashMap<String, String>>,
    pub calls: Mutex<Vec<String>>,
}

impl MockSandbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outputs(outputs: Vec<JupyterOutput>) -> Self {
        Self {
            outputs,
            ..Default::default()
        }
    }

    pub fn with_shell(output: &str, exit_code: Option<i64>) -> Self {
        Self {
            shell_output: Some(output.to_string()),
            exit_code,
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> std::result::Result<(), SandboxError> {
        self.calls.lock().unwrap().push(call);
        match &self.failure {
            Some(message) => Err(SandboxError::Api(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SandboxApi for MockSandbox {
    async fn get_context(&self) -> std::result::Result<SandboxContext, SandboxError> {
        self.record("get_context".into())?;
        Ok(SandboxContext {
            version: "1.2.3".into(),
            home_dir: "/home/gem".into(),
        })
    }

    async fn execute_code(&self, code: &str) -> std::result::Result<CodeExecution, SandboxError> {
        self.record(format!("execute_code:{}", code))?;
        Ok(CodeExecution {
            outputs: self.outputs.clone(),
            ..Default::default()
        })
    }

    async fn exec_command(&self, command: &str) -> std::result::Result<ShellExecution, SandboxError> {
        self.record(format!("exec_command:{}", command))?;
        Ok(ShellExecution {
            output: self.shell_output.clone(),
            exit_code: self.exit_code,
            session_id: None,
        })
    }

    async fn write_file(&self, file: &str, content: &str) -> std::result::Result<FileWrite, SandboxError> {
        self.record(format!("write_file:{}", file))?;
        self.files
            .lock()
            .unwrap()
            .insert(file.to_string(), content.to_string());
        Ok(FileWrite {
            file: file.to_string(),
            bytes_written: content.len() as u64,
        })
    }

    async fn read_file(&self, file: &str) -> std::result::Result<FileRead, SandboxError> {
        self.record(format!("read_file:{}", file))?;
        let content = self
            .files
            .lock()
            .unwrap()
            .get(file)
            .cloned()
            .ok_or_else(|| SandboxError::Api(format!("file not found: {}", file)))?;
        Ok(FileRead {
            content,
            file: Some(file.to_string()),
        })
    }
}

/// A request as seen by [`ScriptedProvider`]
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub system: String,
    pub messages: Vec<LlmMessage>,
    pub tools: Vec<ToolDefinition>,
}

/// Provider replaying a fixed list of replies
///
/// Once the script is exhausted every request fails.
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<CompletionResult>>>,
    pub requests: Mutex<Vec<SeenRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<CompletionResult>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest<'_>) -> Result<CompletionResult> {
        self.requests.lock().unwrap().push(SeenRequest {
            system: request.system.to_string(),
            messages: request.messages.to_vec(),
            tools: request.tools.to_vec(),
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Provider("script exhausted".into())))
    }
}

/// A reply requesting one tool call
pub fn tool_call(call_id: &str, name: &str, arguments: Value) -> Result<CompletionResult> {
    Ok(CompletionResult {
        content: None,
        tool_calls: vec![PendingToolCall::new(call_id, name, arguments)],
    })
}

/// A plain text reply
pub fn text(content: &str) -> Result<CompletionResult> {
    Ok(CompletionResult::text(content))
}
