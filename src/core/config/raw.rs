//! Raw TOML deserialization types.
//!
//! These structs mirror the TOML file shape and use `serde` defaults.
//! The `load` module converts them into the public `types` structs.

use serde::Deserialize;

// ── Top-level ────────────────────────────────────────────────────────────────

/// Raw TOML shape — serde target before resolution.
#[derive(Deserialize)]
pub(super) struct RawConfig {
    pub app: RawApp,
    #[serde(default)]
    pub knowledge: RawKnowledge,
    #[serde(default)]
    pub matcher: RawMatcher,
    #[serde(default)]
    pub composer: RawComposer,
    #[serde(default)]
    pub server: RawServer,
    #[serde(default)]
    pub rag: RawRag,
    #[serde(default)]
    pub embedding: RawEmbedding,
    #[serde(default)]
    pub llm: RawLlm,
    #[serde(default)]
    pub history: RawHistory,
    #[serde(default)]
    pub settings: RawSettings,
}

#[derive(Deserialize)]
pub(super) struct RawApp {
    #[serde(default = "default_app_name")]
    pub name: String,
    pub work_dir: String,
    pub log_level: String,
    #[serde(default)]
    pub log_file: Option<String>,
}

// ── Knowledge ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawKnowledge {
    #[serde(default = "default_knowledge_path")]
    pub path: String,
    #[serde(default = "default_true")]
    pub save_on_add: bool,
}

impl Default for RawKnowledge {
    fn default() -> Self {
        Self {
            path: default_knowledge_path(),
            save_on_add: true,
        }
    }
}

// ── Matcher / composer ───────────────────────────────────────────────────────

/// Every field is optional; unset fields keep the `MatcherConfig` default.
#[derive(Deserialize, Default)]
pub(super) struct RawMatcher {
    pub cosine_weight: Option<f64>,
    pub combined_weight: Option<f64>,
    pub category_binary_weight: Option<f64>,
    pub question_weight: Option<f64>,
    pub keyword_weight: Option<f64>,
    pub category_weight: Option<f64>,
    pub category_bonus: Option<f64>,
    pub token_set_weight: Option<f64>,
    pub token_sort_weight: Option<f64>,
    pub partial_weight: Option<f64>,
    pub keyword_exact_score: Option<f64>,
    pub keyword_high_score: Option<f64>,
    pub keyword_medium_score: Option<f64>,
    pub keyword_high_ratio: Option<f64>,
    pub keyword_medium_ratio: Option<f64>,
    pub keyword_raw_share: Option<f64>,
    pub threshold: Option<f64>,
    pub category_threshold: Option<f64>,
}

#[derive(Deserialize, Default)]
pub(super) struct RawComposer {
    pub verbatim_above: Option<f64>,
    pub prefix_from: Option<f64>,
    pub similar_limit: Option<usize>,
    pub similar_min_cosine: Option<f64>,
}

// ── Server ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawServer {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_http_bind")]
    pub bind: String,
}

impl Default for RawServer {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: default_http_bind(),
        }
    }
}

// ── RAG ──────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawRag {
    #[serde(default = "default_rag_index_path")]
    pub index_path: String,
    #[serde(default = "default_rag_docs_dir")]
    pub docs_dir: String,
    #[serde(default = "default_rag_top_k")]
    pub top_k: usize,
    #[serde(default = "default_min_paragraph_chars")]
    pub min_paragraph_chars: usize,
    #[serde(default)]
    pub prompt_file: Option<String>,
}

impl Default for RawRag {
    fn default() -> Self {
        Self {
            index_path: default_rag_index_path(),
            docs_dir: default_rag_docs_dir(),
            top_k: default_rag_top_k(),
            min_paragraph_chars: default_min_paragraph_chars(),
            prompt_file: None,
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawEmbedding {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_dims")]
    pub dims: usize,
    #[serde(default)]
    pub ollama: RawOllamaEmbedding,
}

impl Default for RawEmbedding {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            dims: default_embedding_dims(),
            ollama: RawOllamaEmbedding::default(),
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawOllamaEmbedding {
    #[serde(default = "default_ollama_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_ollama_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RawOllamaEmbedding {
    fn default() -> Self {
        Self {
            api_base_url: default_ollama_api_base_url(),
            model: default_ollama_embedding_model(),
            timeout_seconds: default_embedding_timeout_seconds(),
        }
    }
}

// ── LLM ─────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawLlm {
    #[serde(rename = "default", default = "default_llm_provider")]
    pub provider: String,
    #[serde(default)]
    pub ollama: RawOllamaCli,
    #[serde(default)]
    pub openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            ollama: RawOllamaCli::default(),
            openai: RawOpenAiConfig::default(),
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawOllamaCli {
    #[serde(default = "default_ollama_binary")]
    pub binary: String,
    #[serde(default = "default_ollama_model")]
    pub model: String,
    #[serde(default = "default_llm_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RawOllamaCli {
    fn default() -> Self {
        Self {
            binary: default_ollama_binary(),
            model: default_ollama_model(),
            timeout_seconds: default_llm_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_openai_temperature")]
    pub temperature: f32,
    #[serde(default = "default_llm_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            temperature: default_openai_temperature(),
            timeout_seconds: default_llm_timeout_seconds(),
        }
    }
}

// ── Local state ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawHistory {
    #[serde(default = "default_history_path")]
    pub path: String,
    #[serde(default = "default_history_cap")]
    pub cap: usize,
}

impl Default for RawHistory {
    fn default() -> Self {
        Self {
            path: default_history_path(),
            cap: default_history_cap(),
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawSettings {
    #[serde(default = "default_settings_path")]
    pub path: String,
}

impl Default for RawSettings {
    fn default() -> Self {
        Self {
            path: default_settings_path(),
        }
    }
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}

pub(super) fn default_app_name() -> String {
    "smartqa".to_string()
}

pub(super) fn default_knowledge_path() -> String {
    "data/knowledge_base.json".to_string()
}

pub(super) fn default_http_bind() -> String {
    "127.0.0.1:8000".to_string()
}

pub(super) fn default_rag_index_path() -> String {
    "vector_index.json".to_string()
}

pub(super) fn default_rag_docs_dir() -> String {
    "docs".to_string()
}

pub(super) fn default_rag_top_k() -> usize {
    3
}

pub(super) fn default_min_paragraph_chars() -> usize {
    10
}

pub(super) fn default_embedding_provider() -> String {
    "hashing".to_string()
}

pub(super) fn default_embedding_dims() -> usize {
    384
}

pub(super) fn default_ollama_api_base_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

pub(super) fn default_ollama_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

pub(super) fn default_embedding_timeout_seconds() -> u64 {
    30
}

pub(super) fn default_llm_provider() -> String {
    "ollama".to_string()
}

pub(super) fn default_ollama_binary() -> String {
    "ollama".to_string()
}

pub(super) fn default_ollama_model() -> String {
    "deepseek-r1:7b".to_string()
}

pub(super) fn default_llm_timeout_seconds() -> u64 {
    60
}

pub(super) fn default_openai_api_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

pub(super) fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

pub(super) fn default_openai_temperature() -> f32 {
    0.2
}

pub(super) fn default_history_path() -> String {
    "chat_history.json".to_string()
}

pub(super) fn default_history_cap() -> usize {
    500
}

pub(super) fn default_settings_path() -> String {
    "settings.json".to_string()
}
