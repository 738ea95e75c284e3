//! Public configuration types.
//!
//! These are the resolved, ready-to-use structs that subsystems consume.
//! Raw TOML deserialization types live in `raw.rs`.

use std::path::PathBuf;

// ── Knowledge ────────────────────────────────────────────────────────────────

/// FAQ knowledge-base location.
#[derive(Debug, Clone)]
pub struct KnowledgeConfig {
    /// JSON file holding the FAQ records. Read at startup, rewritten on save.
    pub path: PathBuf,
    /// Persist the store after every runtime `add_entry`.
    pub save_on_add: bool,
}

// ── Matcher ──────────────────────────────────────────────────────────────────

/// Scoring weights and acceptance thresholds for the FAQ matcher.
///
/// Every field can be overridden from the `[matcher]` table.
#[derive(Debug, Clone, PartialEq)]
pub struct MatcherConfig {
    /// Weight of the TF-IDF cosine in the final blend.
    pub cosine_weight: f64,
    /// Weight of the per-record combined score in the final blend.
    pub combined_weight: f64,
    /// Extra weight added when the record's category matches the query.
    pub category_binary_weight: f64,

    /// Weight of the fuzzy question score inside the combined score.
    pub question_weight: f64,
    /// Weight of the keyword overlap score inside the combined score.
    pub keyword_weight: f64,
    /// Weight of the category bonus inside the combined score.
    pub category_weight: f64,
    /// Category bonus awarded before weighting.
    pub category_bonus: f64,

    /// Fuzzy question blend: token-set, token-sort, partial.
    pub token_set_weight: f64,
    pub token_sort_weight: f64,
    pub partial_weight: f64,

    /// Raw score per exact keyword hit.
    pub keyword_exact_score: f64,
    /// Raw score per fuzzy keyword hit above `keyword_high_ratio`.
    pub keyword_high_score: f64,
    /// Raw score per fuzzy keyword hit above `keyword_medium_ratio`.
    pub keyword_medium_score: f64,
    /// Fuzzy ratio thresholds on the 0–100 scale.
    pub keyword_high_ratio: f64,
    pub keyword_medium_ratio: f64,
    /// Share of the raw keyword score in the keyword blend; the rest is coverage.
    pub keyword_raw_share: f64,

    /// Global acceptance threshold for the arg-max.
    pub threshold: f64,
    /// Acceptance threshold for the best record inside the query's categories.
    pub category_threshold: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            cosine_weight: 0.6,
            combined_weight: 0.4,
            category_binary_weight: 0.1,
            question_weight: 0.4,
            keyword_weight: 0.4,
            category_weight: 0.2,
            category_bonus: 0.2,
            token_set_weight: 0.5,
            token_sort_weight: 0.3,
            partial_weight: 0.2,
            keyword_exact_score: 0.25,
            keyword_high_score: 0.2,
            keyword_medium_score: 0.1,
            keyword_high_ratio: 85.0,
            keyword_medium_ratio: 70.0,
            keyword_raw_share: 0.7,
            threshold: 0.35,
            category_threshold: 0.30,
        }
    }
}

/// Confidence bands and suggestion limits for the answer composer.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposerConfig {
    /// Above this the stored answer is returned verbatim.
    pub verbatim_above: f64,
    /// At or above this (and up to `verbatim_above`) a hedging prefix is added.
    pub prefix_from: f64,
    /// Maximum number of similar questions listed in a fallback answer.
    pub similar_limit: usize,
    /// Minimum cosine for a record to be suggested as a similar question.
    pub similar_min_cosine: f64,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            verbatim_above: 0.7,
            prefix_from: 0.5,
            similar_limit: 3,
            similar_min_cosine: 0.2,
        }
    }
}

// ── Server ───────────────────────────────────────────────────────────────────

/// Axum HTTP channel configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Whether the HTTP channel is started by `serve`.
    pub enabled: bool,
    /// Socket address to bind the axum listener to.
    pub bind: String,
}

// ── RAG ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RagConfig {
    /// Vector index JSON file (under `work_dir` unless absolute).
    pub index_path: PathBuf,
    /// Directory of plain-text documents indexed by the `index` command.
    pub docs_dir: PathBuf,
    /// Number of neighbours retrieved per question.
    pub top_k: usize,
    /// Paragraphs shorter than this (in characters) are not indexed.
    pub min_paragraph_chars: usize,
    /// Optional prompt template with `{{context}}` and `{{question}}`.
    pub prompt_file: Option<PathBuf>,
}

/// Embedding backend selection.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// `"hashing"` (offline, default) or `"ollama"`.
    pub provider: String,
    /// Vector dimension for the hashing embedder.
    pub dims: usize,
    pub ollama: OllamaEmbeddingConfig,
}

#[derive(Debug, Clone)]
pub struct OllamaEmbeddingConfig {
    pub api_base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
}

// ── LLM ──────────────────────────────────────────────────────────────────────

/// Local model runner invoked as a subprocess (`<binary> run <model> <prompt>`).
#[derive(Debug, Clone)]
pub struct OllamaCliConfig {
    pub binary: String,
    pub model: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

/// LLM subsystem configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Active provider name (`"ollama"`, `"openai"`, `"dummy"`).
    pub provider: String,
    pub ollama: OllamaCliConfig,
    pub openai: OpenAiConfig,
}

// ── Local state ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HistoryConfig {
    pub path: PathBuf,
    /// Maximum entries kept before FIFO eviction.
    pub cap: usize,
}

#[derive(Debug, Clone)]
pub struct SettingsConfig {
    pub path: PathBuf,
}

// ── Top-level ────────────────────────────────────────────────────────────────

/// Fully resolved application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: String,
    /// Directory for generated state (vector index, settings, history).
    pub work_dir: PathBuf,
    pub log_level: String,
    /// Append logs to this file instead of stderr.
    pub log_file: Option<PathBuf>,
    pub knowledge: KnowledgeConfig,
    pub matcher: MatcherConfig,
    pub composer: ComposerConfig,
    pub server: ServerConfig,
    pub rag: RagConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    /// Sourced from `LLM_API_KEY` env only, never from TOML.
    pub llm_api_key: Option<String>,
    pub history: HistoryConfig,
    pub settings: SettingsConfig,
}

impl Config {
    /// Returns whether the axum channel should be started by `serve`.
    pub fn server_should_load(&self) -> bool {
        self.server.enabled
    }
}
