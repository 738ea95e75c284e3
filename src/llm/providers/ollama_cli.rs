//! Local model runner invoked as a subprocess: `<binary> run <model> <prompt>`.
//!
//! The child is killed if the call times out or the future is dropped.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::llm::ProviderError;

#[derive(Debug, Clone)]
pub struct OllamaCliProvider {
    binary: String,
    model: String,
    timeout_seconds: u64,
}

impl OllamaCliProvider {
    pub fn new(binary: String, model: String, timeout_seconds: u64) -> Self {
        Self { binary, model, timeout_seconds }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run the model on `prompt` and return its trimmed stdout.
    pub async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        debug!(binary = %self.binary, model = %self.model, prompt_len = prompt.len(), "running model");

        let child = Command::new(&self.binary)
            .arg("run")
            .arg(&self.model)
            .arg(prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                warn!(binary = %self.binary, "cannot start model runner: {e}");
                ProviderError::Spawn(e.to_string())
            })?;

        let output = tokio::time::timeout(
            Duration::from_secs(self.timeout_seconds),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| {
            warn!(model = %self.model, timeout = self.timeout_seconds, "model runner timed out");
            ProviderError::Timeout(self.timeout_seconds)
        })?
        .map_err(|e| ProviderError::Spawn(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(status = %output.status, "model runner failed");
            return Err(ProviderError::Exit { status: output.status.to_string(), stderr });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
