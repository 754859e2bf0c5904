//! Configuration management for Keystone
//!
//! Settings are layered: built-in defaults, then the optional
//! `<config_dir>/keystone/config.toml`, then environment variables. The CLI
//! applies its own flags on top.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum number of characters of tool output handed back to the agent
pub const MAX_OUTPUT: usize = 10_000;

/// Server identifier the sandbox tools are registered under
pub const MCP_SERVER_NAME: &str = "sandbox";

/// Version advertised by the sandbox tool server
pub const MCP_SERVER_VERSION: &str = "1.0.0";

/// Environment variable holding the sandbox base URL
pub const SANDBOX_URL_ENV: &str = "SANDBOX_URL";

/// Environment variable overriding the model
pub const MODEL_ENV: &str = "KEYSTONE_MODEL";

/// Command that starts a local sandbox container
pub const SANDBOX_LAUNCH_COMMAND: &str =
    "docker run --security-opt seccomp=unconfined --rm -it -p 8081:8080 ghcr.io/agent-infra/sandbox:latest";

pub const SYSTEM_PROMPT: &str = "\
You are a delegation agent with access to a sandboxed execution environment.
When the user asks you to do something, ALWAYS write and execute code to accomplish it
rather than just explaining how. You have four tools:

- execute_python: Run Python code in a Jupyter kernel inside the sandbox.
- run_shell: Run a shell command inside the sandbox.
- write_file: Write a file to the sandbox filesystem.
- read_file: Read a file from the sandbox filesystem.

Bias heavily toward action. If the user asks a question that can be answered by
running code, run the code. If they ask you to create something, create it.
Show the results, not just the plan.
";

/// Default values
pub mod defaults {
    pub const SANDBOX_URL: &str = keystone_sandbox::DEFAULT_SANDBOX_URL;
    pub const MODEL: &str = "claude-sonnet-4-5-20250929";
    /// Maximum LLM round trips per user message
    pub const MAX_TURNS: usize = 100;
}

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the sandbox HTTP service
    pub sandbox_url: String,
    /// Model identifier passed to genai (the provider is inferred from it)
    pub model: String,
    /// Maximum LLM round trips per user message
    pub max_turns: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sandbox_url: defaults::SANDBOX_URL.to_string(),
            model: defaults::MODEL.to_string(),
            max_turns: defaults::MAX_TURNS,
        }
    }
}

impl Config {
    /// Load the config file (if present) and apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Location of the user config file
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("keystone").join("config.toml"))
    }

    /// Load configuration from a TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SANDBOX_URL` / `KEYSTONE_MODEL` overrides from `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(SANDBOX_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.sandbox_url = url;
        }
        if let Some(model) = lookup(MODEL_ENV).filter(|v| !v.trim().is_empty()) {
            self.model = model;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.max_turns == 0 {
            return Err(Error::Config("max_turns must be at least 1".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(Error::Config("model must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.sandbox_url, "http://localhost:8081");
        assert_eq!(config.max_turns, 100);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(r#"model = "gpt-4o""#).unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.sandbox_url, defaults::SANDBOX_URL);
        assert_eq!(config.max_turns, defaults::MAX_TURNS);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(Config::from_toml_str("max_turns = \"many\""), Err(Error::Config(_))));
        assert!(matches!(Config::from_toml_str("max_turns = 0"), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "sandbox_url = \"http://sandbox.internal:8080\"\nmax_turns = 12\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.sandbox_url, "http://sandbox.internal:8080");
        assert_eq!(config.max_turns, 12);
        assert_eq!(config.model, defaults::MODEL);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (SANDBOX_URL_ENV, "http://10.0.0.5:8081"),
            (MODEL_ENV, "claude-opus-4-1"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.sandbox_url, "http://10.0.0.5:8081");
        assert_eq!(config.model, "claude-opus-4-1");
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let mut config = Config::default();
        config.apply_env(|_| Some("  ".to_string()));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_system_prompt_lists_tools() {
        for tool in ["execute_python", "run_shell", "write_file", "read_file"] {
            assert!(SYSTEM_PROMPT.contains(tool));
        }
    }
}
