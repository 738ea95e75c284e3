//! Knowledge subsystem — FAQ records, their file store, and the banking
//! taxonomy used to categorise them.

pub mod repair;
pub mod store;
pub mod taxonomy;

use serde::{Deserialize, Serialize};

pub use store::{KnowledgeStore, LoadOutcome};

/// One FAQ entry. `id` is unique within a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqRecord {
    pub id: u64,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub category: String,
}

impl FaqRecord {
    /// Text indexed by the lexical index: the question followed by keywords.
    pub fn index_text(&self) -> String {
        if self.keywords.is_empty() {
            self.question.clone()
        } else {
            format!("{} {}", self.question, self.keywords.join(" "))
        }
    }
}
