//! reqwest-backed implementation of [`SandboxApi`]

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::types::{ApiResponse, CodeExecution, FileRead, FileWrite, SandboxContext, ShellExecution};
use crate::{SandboxApi, SandboxError};

/// Sandbox client talking to the service's HTTP API
#[derive(Debug, Clone)]
pub struct HttpSandbox {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSandbox {
    /// Create a client for the sandbox at `base_url`, e.g. `http://localhost:8081`
    pub fn new(base_url: &str) -> Result<Self, SandboxError> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing reqwest client
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, SandboxError> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| SandboxError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SandboxError::InvalidUrl(format!(
                "{}: unsupported scheme '{}'",
                base_url,
                parsed.scheme()
            )));
        }

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, SandboxError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        debug!(%url, "sandbox request");

        let response = self.client.post(&url).json(body).send().await?;
        let envelope: ApiResponse<T> = decode(response).await?;
        unwrap_envelope(envelope)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, SandboxError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(SandboxError::Status {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|e| SandboxError::Decode(e.to_string()))
}

fn unwrap_envelope<T>(envelope: ApiResponse<T>) -> Result<T, SandboxError> {
    if !envelope.success {
        return Err(SandboxError::Api(
            envelope.message.unwrap_or_else(|| "request failed".to_string()),
        ));
    }

    envelope.data.ok_or_else(|| {
        SandboxError::Api(
            envelope
                .message
                .unwrap_or_else(|| "response contained no data".to_string()),
        )
    })
}

#[async_trait]
impl SandboxApi for HttpSandbox {
    async fn get_context(&self) -> Result<SandboxContext, SandboxError> {
        let url = self.endpoint("/v1/sandbox");
        debug!(%url, "sandbox context request");

        let response = self.client.get(&url).send().await?;
        decode(response).await
    }

    async fn execute_code(&self, code: &str) -> Result<CodeExecution, SandboxError> {
        self.post("/v1/jupyter/execute", &json!({ "code": code })).await
    }

    async fn exec_command(&self, command: &str) -> Result<ShellExecution, SandboxError> {
        self.post("/v1/shell/exec", &json!({ "command": command })).await
    }

    async fn write_file(&self, file: &str, content: &str) -> Result<FileWrite, SandboxError> {
        self.post("/v1/file/write", &json!({ "file": file, "content": content }))
            .await
    }

    async fn read_file(&self, file: &str) -> Result<FileRead, SandboxError> {
        self.post("/v1/file/read", &json!({ "file": file })).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_urls() {
        assert!(matches!(
            HttpSandbox::new("not a url"),
            Err(SandboxError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpSandbox::new("ftp://localhost:8081"),
            Err(SandboxError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let sandbox = HttpSandbox::new("http://localhost:8081/").unwrap();
        assert_eq!(sandbox.base_url(), "http://localhost:8081");
        assert_eq!(sandbox.endpoint("/v1/sandbox"), "http://localhost:8081/v1/sandbox");
    }

    #[test]
    fn test_unwrap_envelope() {
        let ok = ApiResponse {
            success: true,
            message: None,
            data: Some(5),
        };
        assert_eq!(unwrap_envelope(ok).unwrap(), 5);

        let failed: ApiResponse<i32> = ApiResponse {
            success: false,
            message: Some("file not found".into()),
            data: None,
        };
        let err = unwrap_envelope(failed).unwrap_err();
        assert_eq!(err.to_string(), "Sandbox API error: file not found");

        let empty: ApiResponse<i32> = ApiResponse {
            success: true,
            message: None,
            data: None,
        };
        assert!(matches!(unwrap_envelope(empty), Err(SandboxError::Api(_))));
    }
}
