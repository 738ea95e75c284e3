//! Configuration loading with env-var overrides.
//!
//! Reads TOML files, supports `[meta] base = "..."` inheritance chains,
//! and applies `SMARTQA_WORK_DIR` and `SMARTQA_LOG_LEVEL` env overrides.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::AppError;

use super::raw::{self, RawApp, RawConfig, RawComposer, RawMatcher};
use super::types::*;

/// Deep-merge two TOML values.
/// Tables are merged recursively — the overlay only needs to specify keys that
/// differ from the base. For every other type (string, integer, array, …)
/// the overlay value replaces the base value wholesale.
fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_tbl), toml::Value::Table(overlay_tbl)) => {
            for (key, ov_val) in overlay_tbl {
                let merged = match base_tbl.remove(&key) {
                    Some(base_val) => merge_toml(base_val, ov_val),
                    None => ov_val,
                };
                base_tbl.insert(key, merged);
            }
            toml::Value::Table(base_tbl)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file, follow any `[meta] base = "..."` chain, and return the
/// fully merged `toml::Value`. `visited` carries canonicalized paths already
/// seen in this chain so circular references are caught early.
fn load_raw_merged(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<toml::Value, AppError> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical) {
        return Err(AppError::Config(format!(
            "circular base reference detected at: {}",
            path.display()
        )));
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let overlay_val: toml::Value = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    if let Some(base_str) = overlay_val
        .get("meta")
        .and_then(|m| m.get("base"))
        .and_then(|b| b.as_str())
    {
        let base_path = if Path::new(base_str).is_absolute() {
            PathBuf::from(base_str)
        } else {
            path.parent().unwrap_or(Path::new(".")).join(base_str)
        };
        let base_val = load_raw_merged(&base_path, visited)?;
        Ok(merge_toml(base_val, overlay_val))
    } else {
        Ok(overlay_val)
    }
}

/// Load config from the given path, or `config/default.toml`, then apply env-var overrides.
/// If no path is given and `config/default.toml` does not exist, returns the built-in defaults.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let work_dir_override = env::var("SMARTQA_WORK_DIR").ok();
    let log_level_override = env::var("SMARTQA_LOG_LEVEL").ok();

    if let Some(path) = config_path {
        return load_from(
            Path::new(path),
            work_dir_override.as_deref(),
            log_level_override.as_deref(),
        );
    }

    let default_path = Path::new("config/default.toml");
    if default_path.exists() {
        load_from(
            default_path,
            work_dir_override.as_deref(),
            log_level_override.as_deref(),
        )
    } else {
        let parsed = RawConfig {
            app: RawApp {
                name: raw::default_app_name(),
                work_dir: "~/.smartqa".to_string(),
                log_level: "info".to_string(),
                log_file: None,
            },
            knowledge: Default::default(),
            matcher: Default::default(),
            composer: Default::default(),
            server: Default::default(),
            rag: Default::default(),
            embedding: Default::default(),
            llm: Default::default(),
            history: Default::default(),
            settings: Default::default(),
        };
        Ok(resolve(
            parsed,
            work_dir_override.as_deref(),
            log_level_override.as_deref(),
        ))
    }
}

/// Internal loader — accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
/// Follows `[meta] base = "..."` inheritance chains before resolving.
pub fn load_from(
    path: &Path,
    work_dir_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Config, AppError> {
    let merged_val = load_raw_merged(path, &mut HashSet::new())?;

    let parsed: RawConfig = Deserialize::deserialize(merged_val).map_err(|e: toml::de::Error| {
        AppError::Config(format!("config error in {}: {e}", path.display()))
    })?;

    Ok(resolve(parsed, work_dir_override, log_level_override))
}

fn resolve(
    parsed: RawConfig,
    work_dir_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Config {
    let a = parsed.app;

    let work_dir = expand_home(work_dir_override.unwrap_or(&a.work_dir));
    let log_level = log_level_override.unwrap_or(&a.log_level).to_string();

    // Generated state lives under work_dir; shipped inputs are used as given.
    let under_work_dir = |p: &str| {
        let p = expand_home(p);
        if p.is_absolute() { p } else { work_dir.join(p) }
    };
    let index_path = under_work_dir(&parsed.rag.index_path);
    let history_path = under_work_dir(&parsed.history.path);
    let settings_path = under_work_dir(&parsed.settings.path);

    Config {
        app_name: a.name,
        log_file: a.log_file.as_deref().map(expand_home),
        knowledge: KnowledgeConfig {
            path: expand_home(&parsed.knowledge.path),
            save_on_add: parsed.knowledge.save_on_add,
        },
        matcher: resolve_matcher(parsed.matcher),
        composer: resolve_composer(parsed.composer),
        server: ServerConfig {
            enabled: parsed.server.enabled,
            bind: parsed.server.bind,
        },
        rag: RagConfig {
            index_path,
            docs_dir: expand_home(&parsed.rag.docs_dir),
            top_k: parsed.rag.top_k.max(1),
            min_paragraph_chars: parsed.rag.min_paragraph_chars,
            prompt_file: parsed.rag.prompt_file.as_deref().map(expand_home),
        },
        embedding: EmbeddingConfig {
            provider: parsed.embedding.provider,
            dims: parsed.embedding.dims.max(1),
            ollama: OllamaEmbeddingConfig {
                api_base_url: parsed.embedding.ollama.api_base_url,
                model: parsed.embedding.ollama.model,
                timeout_seconds: parsed.embedding.ollama.timeout_seconds,
            },
        },
        llm: LlmConfig {
            provider: parsed.llm.provider,
            ollama: OllamaCliConfig {
                binary: parsed.llm.ollama.binary,
                model: parsed.llm.ollama.model,
                timeout_seconds: parsed.llm.ollama.timeout_seconds,
            },
            openai: OpenAiConfig {
                api_base_url: parsed.llm.openai.api_base_url,
                model: parsed.llm.openai.model,
                temperature: parsed.llm.openai.temperature,
                timeout_seconds: parsed.llm.openai.timeout_seconds,
            },
        },
        llm_api_key: env::var("LLM_API_KEY").ok(),
        history: HistoryConfig {
            path: history_path,
            cap: parsed.history.cap.max(1),
        },
        settings: SettingsConfig {
            path: settings_path,
        },
        work_dir,
        log_level,
    }
}

fn resolve_matcher(m: RawMatcher) -> MatcherConfig {
    let d = MatcherConfig::default();
    MatcherConfig {
        cosine_weight: m.cosine_weight.unwrap_or(d.cosine_weight),
        combined_weight: m.combined_weight.unwrap_or(d.combined_weight),
        category_binary_weight: m.category_binary_weight.unwrap_or(d.category_binary_weight),
        question_weight: m.question_weight.unwrap_or(d.question_weight),
        keyword_weight: m.keyword_weight.unwrap_or(d.keyword_weight),
        category_weight: m.category_weight.unwrap_or(d.category_weight),
        category_bonus: m.category_bonus.unwrap_or(d.category_bonus),
        token_set_weight: m.token_set_weight.unwrap_or(d.token_set_weight),
        token_sort_weight: m.token_sort_weight.unwrap_or(d.token_sort_weight),
        partial_weight: m.partial_weight.unwrap_or(d.partial_weight),
        keyword_exact_score: m.keyword_exact_score.unwrap_or(d.keyword_exact_score),
        keyword_high_score: m.keyword_high_score.unwrap_or(d.keyword_high_score),
        keyword_medium_score: m.keyword_medium_score.unwrap_or(d.keyword_medium_score),
        keyword_high_ratio: m.keyword_high_ratio.unwrap_or(d.keyword_high_ratio),
        keyword_medium_ratio: m.keyword_medium_ratio.unwrap_or(d.keyword_medium_ratio),
        keyword_raw_share: m.keyword_raw_share.unwrap_or(d.keyword_raw_share).clamp(0.0, 1.0),
        threshold: m.threshold.unwrap_or(d.threshold),
        category_threshold: m.category_threshold.unwrap_or(d.category_threshold),
    }
}

fn resolve_composer(c: RawComposer) -> ComposerConfig {
    let d = ComposerConfig::default();
    ComposerConfig {
        verbatim_above: c.verbatim_above.unwrap_or(d.verbatim_above),
        prefix_from: c.prefix_from.unwrap_or(d.prefix_from),
        similar_limit: c.similar_limit.unwrap_or(d.similar_limit),
        similar_min_cosine: c.similar_min_cosine.unwrap_or(d.similar_min_cosine),
    }
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
