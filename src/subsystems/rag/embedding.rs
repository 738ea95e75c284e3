//! Text embedders for the document index.
//!
//! `Hashing` is deterministic and offline: each token is hashed into one of
//! `dims` signed buckets and the bag is L2-normalised. `Ollama` asks a local
//! Ollama server for a model embedding over HTTP.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, error};

use crate::config::EmbeddingConfig;
use crate::error::AppError;
use crate::subsystems::qa::tokenizer;

#[derive(Debug, Clone)]
pub enum Embedder {
    Hashing(HashingEmbedder),
    Ollama(OllamaEmbedder),
}

impl Embedder {
    /// Build the embedder named by `config.provider`.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, AppError> {
        match config.provider.as_str() {
            "hashing" => Ok(Embedder::Hashing(HashingEmbedder::new(config.dims)?)),
            "ollama" => {
                let o = &config.ollama;
                Ok(Embedder::Ollama(OllamaEmbedder::new(
                    o.api_base_url.clone(),
                    o.model.clone(),
                    o.timeout_seconds,
                )?))
            }
            other => Err(AppError::Config(format!("unknown embedding provider: {other}"))),
        }
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        match self {
            Embedder::Hashing(e) => Ok(e.embed(text)),
            Embedder::Ollama(e) => e.embed(text).await,
        }
    }

    /// Short description for logs and status output.
    pub fn describe(&self) -> String {
        match self {
            Embedder::Hashing(e) => format!("hashing/{}", e.dims),
            Embedder::Ollama(e) => format!("ollama/{}", e.model),
        }
    }
}

// ── Hashing ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dims: usize,
}

impl HashingEmbedder {
    pub fn new(dims: usize) -> Result<Self, AppError> {
        if dims == 0 {
            return Err(AppError::Config("embedding dims must be positive".into()));
        }
        Ok(Self { dims })
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dims];
        for token in tokenizer::index_tokens(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket = [0u8; 8];
            bucket.copy_from_slice(&digest[..8]);
            let slot = (u64::from_le_bytes(bucket) % self.dims as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            v[slot] += sign;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

// ── Ollama ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: Client,
    url: String,
    model: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedder {
    pub fn new(api_base_url: String, model: String, timeout_seconds: u64) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| AppError::Rag(format!("failed to build HTTP client: {e}")))?;
        let url = format!("{}/api/embeddings", api_base_url.trim_end_matches('/'));
        Ok(Self { client, url, model })
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        debug!(url = %self.url, model = %self.model, len = text.len(), "requesting embedding");
        let response = self
            .client
            .post(&self.url)
            .json(&EmbeddingRequest { model: &self.model, prompt: text })
            .send()
            .await
            .map_err(|e| {
                error!(url = %self.url, error = %e, "embedding request failed");
                AppError::Rag(format!("embedding request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Rag(format!("embedding HTTP {status}: {body}")));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Rag(format!("malformed embedding response: {e}")))?;
        if parsed.embedding.is_empty() {
            return Err(AppError::Rag("empty embedding in response".into()));
        }
        Ok(parsed.embedding)
    }
}
