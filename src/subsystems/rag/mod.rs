//! Retrieval-augmented answering over a folder of plain-text documents.
//!
//! Flow per question: embed → nearest paragraphs from the vector index →
//! prompt with the paragraphs as context → LLM. Model-runner failures are
//! turned into a short apology instead of an error so the caller always has
//! something to show.

pub mod embedding;
pub mod indexer;
pub mod prompt;
pub mod vector_index;

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::llm::LlmProvider;

use embedding::Embedder;
pub use indexer::IndexReport;
use prompt::PromptTemplate;
use vector_index::{ChunkMetadata, VectorIndex};

/// A retrieved paragraph.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedDoc {
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RagAnswer {
    pub answer: String,
    pub docs: Vec<String>,
    /// Wall-clock seconds spent on retrieval and generation.
    pub elapsed: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RagStats {
    pub count: usize,
    pub sources: Vec<String>,
}

pub struct RagService {
    embedder: Embedder,
    index: RwLock<VectorIndex>,
    index_path: PathBuf,
    llm: LlmProvider,
    prompt: PromptTemplate,
    top_k: usize,
    min_paragraph_chars: usize,
}

impl RagService {
    /// Build the service from config, loading the persisted index if any.
    pub fn open(config: &Config, llm: LlmProvider) -> Result<Self, AppError> {
        let embedder = Embedder::from_config(&config.embedding)?;
        let index = VectorIndex::load(&config.rag.index_path, config.embedding.dims)?;
        info!(
            embedder = %embedder.describe(),
            model = llm.model(),
            chunks = index.len(),
            "rag service ready"
        );
        Ok(Self {
            embedder,
            index: RwLock::new(index),
            index_path: config.rag.index_path.clone(),
            llm,
            prompt: PromptTemplate::load(config.rag.prompt_file.as_deref()),
            top_k: config.rag.top_k,
            min_paragraph_chars: config.rag.min_paragraph_chars,
        })
    }

    pub fn model(&self) -> &str {
        self.llm.model()
    }

    /// The `limit` paragraphs closest to `query`.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<RetrievedDoc>, AppError> {
        let vector = self.embedder.embed(query).await?;
        let index = self.index.read().await;
        let hits = index.search(&vector, limit)?;
        Ok(hits
            .into_iter()
            .map(|h| RetrievedDoc {
                id: h.chunk.id.clone(),
                content: h.chunk.content.clone(),
                metadata: h.chunk.metadata.clone(),
                score: h.score,
            })
            .collect())
    }

    /// Answer `query` from the indexed documents. `top_k` defaults to the
    /// configured neighbour count.
    pub async fn ask(&self, query: &str, top_k: Option<usize>) -> Result<RagAnswer, AppError> {
        let started = Instant::now();
        let docs: Vec<String> = self
            .search(query, top_k.unwrap_or(self.top_k))
            .await?
            .into_iter()
            .map(|d| d.content)
            .collect();
        debug!(query, docs = docs.len(), "context retrieved");

        let refs: Vec<&str> = docs.iter().map(String::as_str).collect();
        let prompt = self.prompt.render(&refs, query);
        let answer = match self.llm.complete(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "generation failed");
                e.user_message()
            }
        };

        let elapsed = started.elapsed().as_secs_f64();
        info!(docs = docs.len(), elapsed, "rag answer ready");
        Ok(RagAnswer { answer, docs, elapsed })
    }

    /// Index `dir` into the vector index and persist it.
    pub async fn index_dir(&self, dir: &Path) -> Result<IndexReport, AppError> {
        let mut index = self.index.write().await;
        let report =
            indexer::index_dir(dir, &self.embedder, &mut index, self.min_paragraph_chars).await?;
        index.save(&self.index_path)?;
        Ok(report)
    }

    pub async fn stats(&self) -> RagStats {
        let index = self.index.read().await;
        RagStats {
            count: index.len(),
            sources: index.sources().into_iter().map(str::to_string).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::providers::dummy::DummyProvider;
    use tempfile::TempDir;

    fn service(dir: &TempDir) -> RagService {
        let config = Config::test_default(dir.path());
        RagService::open(&config, LlmProvider::Dummy(DummyProvider)).unwrap()
    }

    #[tokio::test]
    async fn ask_without_documents_uses_placeholder_context() {
        let dir = TempDir::new().unwrap();
        let rag = service(&dir);
        let out = rag.ask("信用卡年费", None).await.unwrap();
        assert!(out.docs.is_empty());
        assert!(out.answer.starts_with("[echo] "));
        assert!(out.answer.contains(prompt::NO_CONTEXT));
        assert!(out.answer.contains("信用卡年费"));
    }

    #[tokio::test]
    async fn indexed_paragraphs_reach_the_prompt() {
        let dir = TempDir::new().unwrap();
        let docs = dir.path().join("docs");
        std::fs::create_dir_all(&docs).unwrap();
        std::fs::write(
            docs.join("cards.txt"),
            "信用卡年费首年免收，刷卡满六次免次年年费。\n\n房贷利率以贷款市场报价利率为基准浮动。",
        )
        .unwrap();

        let rag = service(&dir);
        let report = rag.index_dir(&docs).await.unwrap();
        assert_eq!(report.inserted, 2);
        assert!(dir.path().join("vector_index.json").exists());

        let out = rag.ask("信用卡年费怎么免", Some(1)).await.unwrap();
        assert_eq!(out.docs, vec!["信用卡年费首年免收，刷卡满六次免次年年费。"]);
        assert!(out.answer.contains("刷卡满六次"));

        let stats = rag.stats().await;
        assert_eq!(stats.count, 2);
        assert_eq!(stats.sources, vec!["cards.txt"]);

        // A fresh service sees the persisted index.
        assert_eq!(service(&dir).stats().await.count, 2);
    }

    #[tokio::test]
    async fn generation_failure_becomes_apology() {
        let dir = TempDir::new().unwrap();
        let config = Config::test_default(dir.path());
        let llm = LlmProvider::OllamaCli(crate::llm::providers::ollama_cli::OllamaCliProvider::new(
            "/nonexistent/ollama".into(),
            "m".into(),
            1,
        ));
        let rag = RagService::open(&config, llm).unwrap();
        let out = rag.ask("问题", None).await.unwrap();
        assert!(out.answer.starts_with("抱歉，调用 Ollama 出错："), "got {}", out.answer);
    }
}
