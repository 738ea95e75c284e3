//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `SMARTQA_WORK_DIR` and `SMARTQA_LOG_LEVEL` env overrides.
//!
//! # Module layout
//!
//! - **types** — Public configuration structs consumed by subsystems
//!   (`Config`, `MatcherConfig`, `RagConfig`, `LlmConfig`, etc.).
//! - **raw** — Raw TOML deserialization types (`RawConfig`, `RawLlm`, …).
//!   These mirror the file shape and use serde defaults; kept private.
//! - **load** — Loading logic: `merge_toml`, `load_raw_merged`, `load`,
//!   `load_from`, `expand_home`.
//!
//! # Path resolution
//!
//! `knowledge.path`, `rag.docs_dir` and `rag.prompt_file` are shipped inputs
//! and are used as given (after `~` expansion). Generated state
//! (`rag.index_path`, `history.path`, `settings.path`) is placed under
//! `work_dir` unless absolute.

mod load;
mod raw;
mod types;

pub use load::{expand_home, load, load_from};
pub use types::*;

impl Config {
    /// Self-contained `Config` rooted at `work_dir` — dummy LLM, hashing
    /// embedder, no network, every file inside `work_dir`.
    ///
    /// Used by unit and integration tests.
    pub fn test_default(work_dir: &std::path::Path) -> Self {
        Self {
            app_name: "test".into(),
            work_dir: work_dir.to_path_buf(),
            log_level: "info".into(),
            log_file: None,
            knowledge: KnowledgeConfig {
                path: work_dir.join("knowledge_base.json"),
                save_on_add: true,
            },
            matcher: MatcherConfig::default(),
            composer: ComposerConfig::default(),
            server: ServerConfig {
                enabled: false,
                bind: raw::default_http_bind(),
            },
            rag: RagConfig {
                index_path: work_dir.join("vector_index.json"),
                docs_dir: work_dir.join("docs"),
                top_k: 3,
                min_paragraph_chars: 10,
                prompt_file: None,
            },
            embedding: EmbeddingConfig {
                provider: "hashing".into(),
                dims: 384,
                ollama: OllamaEmbeddingConfig {
                    api_base_url: "http://localhost:0".into(),
                    model: "test-embed".into(),
                    timeout_seconds: 1,
                },
            },
            llm: LlmConfig {
                provider: "dummy".into(),
                ollama: OllamaCliConfig {
                    binary: "ollama".into(),
                    model: "test-model".into(),
                    timeout_seconds: 1,
                },
                openai: OpenAiConfig {
                    api_base_url: "http://localhost:0/v1/chat/completions".into(),
                    model: "test-model".into(),
                    temperature: 0.0,
                    timeout_seconds: 1,
                },
            },
            llm_api_key: None,
            history: HistoryConfig {
                path: work_dir.join("chat_history.json"),
                cap: 500,
            },
            settings: SettingsConfig {
                path: work_dir.join("settings.json"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    const MINIMAL_TOML: &str = r#"
[app]
name = "test-qa"
work_dir = "~/.smartqa"
log_level = "info"
"#;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn parse_basic_config() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(cfg.app_name, "test-qa");
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(cfg.matcher, MatcherConfig::default());
        assert_eq!(cfg.composer, ComposerConfig::default());
        assert_eq!(cfg.llm.provider, "ollama");
        assert_eq!(cfg.llm.ollama.model, "deepseek-r1:7b");
        assert_eq!(cfg.llm.ollama.timeout_seconds, 60);
        assert_eq!(cfg.rag.top_k, 3);
        assert_eq!(cfg.rag.min_paragraph_chars, 10);
        assert_eq!(cfg.embedding.provider, "hashing");
        assert_eq!(cfg.embedding.dims, 384);
        assert_eq!(cfg.server.bind, "127.0.0.1:8000");
    }

    #[test]
    fn state_files_resolve_under_work_dir() {
        let toml = r#"
[app]
work_dir = "/tmp/qa-state"
log_level = "info"

[knowledge]
path = "data/kb.json"
"#;
        let f = write_toml(toml);
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(cfg.rag.index_path, std::path::PathBuf::from("/tmp/qa-state/vector_index.json"));
        assert_eq!(cfg.history.path, std::path::PathBuf::from("/tmp/qa-state/chat_history.json"));
        assert_eq!(cfg.settings.path, std::path::PathBuf::from("/tmp/qa-state/settings.json"));
        assert_eq!(cfg.knowledge.path, std::path::PathBuf::from("data/kb.json"));
    }

    #[test]
    fn matcher_overrides_are_partial() {
        let toml = r#"
[app]
work_dir = "/tmp"
log_level = "info"

[matcher]
threshold = 0.4
cosine_weight = 0.5
"#;
        let f = write_toml(toml);
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(cfg.matcher.threshold, 0.4);
        assert_eq!(cfg.matcher.cosine_weight, 0.5);
        assert_eq!(cfg.matcher.category_threshold, 0.30);
        assert_eq!(cfg.matcher.keyword_high_ratio, 85.0);
    }

    #[test]
    fn parse_llm_sections() {
        let toml = r#"
[app]
work_dir = "/tmp"
log_level = "debug"

[llm]
default = "openai"

[llm.ollama]
model = "qwen2.5:7b"
timeout_seconds = 30

[llm.openai]
model = "gpt-test"
"#;
        let f = write_toml(toml);
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(cfg.llm.provider, "openai");
        assert_eq!(cfg.llm.ollama.model, "qwen2.5:7b");
        assert_eq!(cfg.llm.ollama.binary, "ollama");
        assert_eq!(cfg.llm.ollama.timeout_seconds, 30);
        assert_eq!(cfg.llm.openai.model, "gpt-test");
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().expect("home dir must exist in test env");
        let expanded = expand_home("~/.smartqa");
        assert!(expanded.starts_with(&home));
        assert!(expanded.ends_with(".smartqa"));
    }

    #[test]
    fn absolute_path_unchanged() {
        let p = expand_home("/absolute/path");
        assert_eq!(p, std::path::PathBuf::from("/absolute/path"));
    }

    #[test]
    fn relative_path_unchanged() {
        let p = expand_home("relative/path");
        assert_eq!(p, std::path::PathBuf::from("relative/path"));
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(std::path::Path::new("/nonexistent/config.toml"), None, None);
        assert!(result.is_err());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("config error"));
    }

    #[test]
    fn missing_app_section_errors() {
        let f = write_toml("[server]\nenabled = false\n");
        let result = load_from(f.path(), None, None);
        assert!(result.is_err());
    }

    #[test]
    fn env_work_dir_override() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), Some("/tmp/test-override"), None).unwrap();
        assert_eq!(cfg.work_dir, std::path::PathBuf::from("/tmp/test-override"));
    }

    #[test]
    fn env_log_level_override() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), None, Some("debug")).unwrap();
        assert_eq!(cfg.log_level, "debug");
    }

    const BASE_TOML: &str = r#"
[app]
name = "base-qa"
work_dir = "~/.smartqa"
log_level = "info"

[llm]
default = "dummy"

[llm.openai]
model = "gpt-base"
temperature = 0.1
timeout_seconds = 30
"#;

    fn write_named(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let p = dir.path().join(name);
        std::fs::write(&p, content).unwrap();
        p
    }

    #[test]
    fn overlay_keeps_base_fields() {
        let dir = TempDir::new().unwrap();
        write_named(&dir, "base.toml", BASE_TOML);
        let overlay = r#"
[meta]
base = "base.toml"

[app]
log_level = "debug"
"#;
        let overlay_path = write_named(&dir, "overlay.toml", overlay);
        let cfg = load_from(&overlay_path, None, None).unwrap();
        assert_eq!(cfg.app_name, "base-qa");
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn overlay_wins_scalar() {
        let dir = TempDir::new().unwrap();
        write_named(&dir, "base.toml", BASE_TOML);
        let overlay = r#"
[meta]
base = "base.toml"

[llm.openai]
model = "gpt-overlay"
"#;
        let overlay_path = write_named(&dir, "overlay.toml", overlay);
        let cfg = load_from(&overlay_path, None, None).unwrap();
        assert_eq!(cfg.llm.openai.model, "gpt-overlay");
        assert_eq!(cfg.llm.openai.temperature, 0.1);
    }

    #[test]
    fn chained_bases() {
        let dir = TempDir::new().unwrap();
        write_named(&dir, "grandbase.toml", BASE_TOML);
        let middle = r#"
[meta]
base = "grandbase.toml"

[app]
name = "middle-qa"
"#;
        write_named(&dir, "middle.toml", middle);
        let top = r#"
[meta]
base = "middle.toml"

[app]
log_level = "warn"
"#;
        let top_path = write_named(&dir, "top.toml", top);
        let cfg = load_from(&top_path, None, None).unwrap();
        assert_eq!(cfg.app_name, "middle-qa");
        assert_eq!(cfg.log_level, "warn");
    }

    #[test]
    fn missing_base_errors() {
        let dir = TempDir::new().unwrap();
        let overlay = r#"
[meta]
base = "nonexistent.toml"

[app]
work_dir = "~/.smartqa"
log_level = "info"
"#;
        let overlay_path = write_named(&dir, "overlay.toml", overlay);
        let result = load_from(&overlay_path, None, None);
        assert!(result.is_err());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("cannot read") || msg.contains("config error"));
    }

    #[test]
    fn cycle_detection() {
        let dir = TempDir::new().unwrap();
        let self_path = dir.path().join("self.toml");
        let content = format!("[meta]\nbase = \"{}\"\n\n{BASE_TOML}", self_path.display());
        std::fs::write(&self_path, content).unwrap();
        let result = load_from(&self_path, None, None);
        assert!(result.is_err());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("circular"));
    }

    #[test]
    fn test_default_is_self_contained() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::test_default(dir.path());
        assert_eq!(cfg.llm.provider, "dummy");
        assert!(cfg.knowledge.path.starts_with(dir.path()));
        assert!(cfg.rag.index_path.starts_with(dir.path()));
    }
}
