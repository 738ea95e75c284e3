//! Dummy LLM provider: echoes the prompt back prefixed with `[echo]`.
//! Used by tests and offline runs without a model runner.

use crate::llm::ProviderError;

#[derive(Debug, Clone)]
pub struct DummyProvider;

impl DummyProvider {
    pub async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        Ok(format!("[echo] {prompt}"))
    }
}
