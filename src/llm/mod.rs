//! LLM provider abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Provider instances are shared immutable capabilities; clone them freely.
//! The `complete` method is `async fn` on the enum so callers need no
//! trait-object machinery.

pub mod providers;

use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("provider request failed: {0}")]
    Request(String),
    #[error("model runner timed out after {0}s")]
    Timeout(u64),
    #[error("model runner could not be started: {0}")]
    Spawn(String),
    #[error("model runner exited with {status}")]
    Exit { status: String, stderr: String },
}

impl ProviderError {
    /// Reply shown to the end user in place of a generated answer.
    pub fn user_message(&self) -> String {
        match self {
            ProviderError::Timeout(_) => "抱歉，调用 Ollama 超时。".to_string(),
            ProviderError::Spawn(e) => format!("抱歉，调用 Ollama 出错：{e}"),
            ProviderError::Exit { stderr, .. } => {
                format!("抱歉，生成失败。\nOllama stderr:\n{stderr}")
            }
            ProviderError::UnknownProvider(_) | ProviderError::Request(_) => {
                format!("抱歉，生成失败：{self}")
            }
        }
    }
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    OllamaCli(providers::ollama_cli::OllamaCliProvider),
    OpenAiCompatible(providers::openai_compatible::OpenAiCompatibleProvider),
}

impl LlmProvider {
    /// Send `prompt` to the provider and return its text reply.
    pub async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.complete(prompt).await,
            LlmProvider::OllamaCli(p) => p.complete(prompt).await,
            LlmProvider::OpenAiCompatible(p) => p.complete(prompt).await,
        }
    }

    /// Model name reported by the status endpoint.
    pub fn model(&self) -> &str {
        match self {
            LlmProvider::Dummy(_) => "dummy",
            LlmProvider::OllamaCli(p) => p.model(),
            LlmProvider::OpenAiCompatible(p) => p.model(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runner_failures_map_to_canned_replies() {
        assert_eq!(ProviderError::Timeout(60).user_message(), "抱歉，调用 Ollama 超时。");
        assert_eq!(
            ProviderError::Spawn("not found".into()).user_message(),
            "抱歉，调用 Ollama 出错：not found"
        );
        let exit = ProviderError::Exit { status: "exit status: 1".into(), stderr: "boom".into() };
        assert_eq!(exit.user_message(), "抱歉，生成失败。\nOllama stderr:\nboom");
    }

    #[tokio::test]
    async fn dummy_dispatch() {
        let p = LlmProvider::Dummy(providers::dummy::DummyProvider);
        assert_eq!(p.complete("hi").await.unwrap(), "[echo] hi");
        assert_eq!(p.model(), "dummy");
    }
}
