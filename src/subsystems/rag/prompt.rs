//! Prompt template for retrieval-augmented answers.
//!
//! Templates use `{{context}}` and `{{question}}` placeholders, substituted
//! once at render time. A template file is optional; without one the
//! built-in wording is used.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::{debug, warn};

/// Context line used when retrieval found nothing.
pub const NO_CONTEXT: &str = "无相关背景知识";

const BUILTIN: &str = "\n以下是背景知识：\n{{context}}\n\n请根据背景知识回答：\n{{question}}\n";

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{(context|question)\}\}").expect("placeholder pattern is valid")
    })
}

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self { text: BUILTIN.to_string() }
    }
}

impl PromptTemplate {
    /// Load the template at `path`; a missing or unreadable file falls back
    /// to the built-in template.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match fs::read_to_string(path) {
            Ok(text) => {
                if !text.contains("{{question}}") {
                    warn!(path = %path.display(), "prompt template has no question placeholder");
                }
                debug!(path = %path.display(), "prompt template loaded");
                Self { text }
            }
            Err(e) => {
                warn!(path = %path.display(), "cannot read prompt template ({e}); using built-in");
                Self::default()
            }
        }
    }

    /// Fill the template. `docs` are joined with newlines; an empty slice
    /// becomes [`NO_CONTEXT`]. Placeholders are only recognised in the
    /// template itself, never inside substituted text.
    pub fn render(&self, docs: &[&str], question: &str) -> String {
        let context = if docs.is_empty() { NO_CONTEXT.to_string() } else { docs.join("\n") };
        placeholder()
            .replace_all(&self.text, |caps: &Captures<'_>| match &caps[1] {
                "context" => context.clone(),
                _ => question.to_string(),
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn builtin_wording() {
        let p = PromptTemplate::default().render(&["甲", "乙"], "问题？");
        assert_eq!(p, "\n以下是背景知识：\n甲\n乙\n\n请根据背景知识回答：\n问题？\n");
    }

    #[test]
    fn placeholders_inside_documents_are_left_alone() {
        let p = PromptTemplate::default().render(&["见 {{question}} 与 {{context}}"], "房贷利率");
        assert!(p.contains("见 {{question}} 与 {{context}}"), "{p}");
        assert_eq!(p.matches("房贷利率").count(), 1, "{p}");
    }

    #[test]
    fn empty_context_uses_placeholder() {
        let p = PromptTemplate::default().render(&[], "问");
        assert!(p.contains("以下是背景知识：\n无相关背景知识\n"));
    }

    #[test]
    fn file_template_overrides_builtin() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.txt");
        fs::write(&path, "C={{context}} Q={{question}}").unwrap();
        let p = PromptTemplate::load(Some(&path)).render(&["x"], "y");
        assert_eq!(p, "C=x Q=y");
    }

    #[test]
    fn missing_file_falls_back() {
        let p = PromptTemplate::load(Some(Path::new("/nonexistent/prompt.txt")));
        assert_eq!(p.render(&[], "q"), PromptTemplate::default().render(&[], "q"));
    }
}
