//! Wire types for the sandbox HTTP API

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Envelope wrapping most sandbox responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

fn default_success() -> bool {
    true
}

/// Environment info returned by the reachability check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxContext {
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub home_dir: String,
}

/// Result of running code in the Jupyter kernel
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeExecution {
    #[serde(default, deserialize_with = "null_as_default")]
    pub outputs: Vec<JupyterOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// One output record produced by a Jupyter execution, in kernel order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum JupyterOutput {
    Stream {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    ExecuteResult {
        #[serde(default, deserialize_with = "null_as_default")]
        data: Map<String, Value>,
    },
    DisplayData {
        #[serde(default, deserialize_with = "null_as_default")]
        data: Map<String, Value>,
    },
    Error {
        #[serde(default, deserialize_with = "null_as_default")]
        ename: String,
        #[serde(default, deserialize_with = "null_as_default")]
        evalue: String,
        #[serde(default, deserialize_with = "null_as_default")]
        traceback: Vec<String>,
    },
    #[serde(other)]
    Unknown,
}

impl JupyterOutput {
    pub fn stream(text: impl Into<String>) -> Self {
        Self::Stream {
            name: Some("stdout".to_string()),
            text: Some(text.into()),
        }
    }

    pub fn execute_result(text_plain: impl Into<String>) -> Self {
        Self::ExecuteResult {
            data: plain_text_bundle(text_plain.into()),
        }
    }

    pub fn display_data(text_plain: impl Into<String>) -> Self {
        Self::DisplayData {
            data: plain_text_bundle(text_plain.into()),
        }
    }

    pub fn error(
        ename: impl Into<String>,
        evalue: impl Into<String>,
        traceback: Vec<String>,
    ) -> Self {
        Self::Error {
            ename: ename.into(),
            evalue: evalue.into(),
            traceback,
        }
    }
}

/// Treat an explicit `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn plain_text_bundle(text: String) -> Map<String, Value> {
    let mut data = Map::new();
    data.insert("text/plain".to_string(), Value::String(text));
    data
}

/// Result of a shell command
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShellExecution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Result of a file write; `file` is the path as resolved by the sandbox
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileWrite {
    pub file: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bytes_written: u64,
}

/// Result of a file read
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileRead {
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_jupyter_outputs() {
        let raw = json!({
            "outputs": [
                {"output_type": "stream", "name": "stdout", "text": "hi\n"},
                {"output_type": "execute_result", "data": {"text/plain": "42"}, "execution_count": 1},
                {"output_type": "error", "ename": "NameError", "evalue": "x", "traceback": ["t1"]},
                {"output_type": "clear_output", "wait": false}
            ],
            "status": "ok"
        });

        let exec: CodeExecution = serde_json::from_value(raw).unwrap();
        assert_eq!(exec.outputs.len(), 4);
        assert_eq!(exec.outputs[0], JupyterOutput::Stream {
            name: Some("stdout".into()),
            text: Some("hi\n".into()),
        });
        assert!(matches!(exec.outputs[1], JupyterOutput::ExecuteResult { .. }));
        assert_eq!(exec.outputs[2], JupyterOutput::error("NameError", "x", vec!["t1".into()]));
        assert_eq!(exec.outputs[3], JupyterOutput::Unknown);
    }

    #[test]
    fn test_null_fields_decode_as_empty() {
        let raw = json!({
            "outputs": [
                {"output_type": "stream", "name": "stdout", "text": "partial\n"},
                {"output_type": "display_data", "data": null},
                {"output_type": "execute_result", "data": null, "execution_count": null},
                {"output_type": "error", "ename": "ValueError", "evalue": "bad", "traceback": null},
                {"output_type": "error", "ename": null, "evalue": null}
            ]
        });

        let exec: CodeExecution = serde_json::from_value(raw).unwrap();
        assert_eq!(exec.outputs.len(), 5);
        assert_eq!(exec.outputs[1], JupyterOutput::DisplayData { data: Map::new() });
        assert_eq!(exec.outputs[2], JupyterOutput::ExecuteResult { data: Map::new() });
        assert_eq!(exec.outputs[3], JupyterOutput::error("ValueError", "bad", vec![]));
        assert_eq!(exec.outputs[4], JupyterOutput::error("", "", vec![]));
    }

    #[test]
    fn test_null_top_level_fields() {
        let exec: CodeExecution =
            serde_json::from_value(json!({"outputs": null, "status": null})).unwrap();
        assert!(exec.outputs.is_empty());

        let read: FileRead = serde_json::from_value(json!({"content": null, "file": null})).unwrap();
        assert_eq!(read.content, "");
    }

    #[test]
    fn test_envelope_defaults() {
        let resp: ApiResponse<FileRead> =
            serde_json::from_value(json!({"data": {"content": "abc"}})).unwrap();
        assert!(resp.success);
        assert_eq!(resp.data.unwrap().content, "abc");

        let resp: ApiResponse<FileRead> =
            serde_json::from_value(json!({"success": false, "message": "no such file"})).unwrap();
        assert!(!resp.success);
        assert!(resp.data.is_none());
    }
}
