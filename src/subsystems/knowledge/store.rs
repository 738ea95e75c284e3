//! FAQ knowledge store — in-memory record list backed by a JSON file.
//!
//! The file is read and written wholesale: a JSON array of
//! `{id, question, answer, keywords, category}` objects, pretty-printed with
//! four-space indentation and unescaped UTF-8.
//!
//! Loading never fails. A missing or unreadable file yields the built-in
//! default records; a malformed file is repaired record-by-record, and when
//! nothing survives the minimal single-record set is used.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::AppError;

use super::{FaqRecord, repair};

/// How [`KnowledgeStore::load`] obtained its records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The file parsed cleanly.
    Loaded,
    /// The file was malformed; `recovered` records were extracted.
    Repaired { recovered: usize },
    /// The file was malformed and nothing could be extracted.
    Minimal,
    /// The file could not be read.
    Defaulted,
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeStore {
    records: Vec<FaqRecord>,
}

impl KnowledgeStore {
    /// Build a store from `records`, dropping any whose id is already taken.
    pub fn from_records(records: Vec<FaqRecord>) -> Self {
        let mut seen = HashSet::new();
        let records = records
            .into_iter()
            .filter(|r| {
                let fresh = seen.insert(r.id);
                if !fresh {
                    warn!(id = r.id, question = %r.question, "duplicate record id dropped");
                }
                fresh
            })
            .collect();
        Self { records }
    }

    /// Load the store from `path`, degrading as described in the module docs.
    pub fn load(path: &Path) -> (Self, LoadOutcome) {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), "cannot read knowledge base ({e}); using defaults");
                return (Self::from_records(repair::default_records()), LoadOutcome::Defaulted);
            }
        };

        match serde_json::from_str::<Vec<FaqRecord>>(&text) {
            Ok(records) => {
                let store = Self::from_records(records);
                info!(
                    path = %path.display(),
                    records = store.len(),
                    categories = store.categories().len(),
                    "knowledge base loaded"
                );
                (store, LoadOutcome::Loaded)
            }
            Err(e) => {
                warn!(path = %path.display(), "malformed knowledge base ({e}); attempting repair");
                Self::from_damaged(&text)
            }
        }
    }

    /// Recover what can be recovered from damaged file contents.
    pub fn from_damaged(text: &str) -> (Self, LoadOutcome) {
        let recovered = repair::extract_records(text);
        if recovered.is_empty() {
            warn!("no records recovered; using minimal knowledge base");
            (Self::from_records(repair::minimal_records()), LoadOutcome::Minimal)
        } else {
            let n = recovered.len();
            info!(recovered = n, "knowledge base repaired");
            (Self::from_records(recovered), LoadOutcome::Repaired { recovered: n })
        }
    }

    /// Write every record to `path` as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Knowledge(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let data = to_pretty_json(&self.records)?;
        fs::write(path, data)
            .map_err(|e| AppError::Knowledge(format!("cannot write {}: {e}", path.display())))?;
        debug!(path = %path.display(), records = self.len(), "knowledge base saved");
        Ok(())
    }

    pub fn records(&self) -> &[FaqRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&FaqRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Next free id: one past the current maximum, or 1 for an empty store.
    pub fn next_id(&self) -> u64 {
        self.records.iter().map(|r| r.id).max().map_or(1, |m| m + 1)
    }

    /// Distinct category labels, in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| r.category.as_str())
            .filter(|c| seen.insert(*c))
            .collect()
    }

    /// Append `record`. Rejects an id that is already taken.
    pub fn push(&mut self, record: FaqRecord) -> Result<(), AppError> {
        if self.get(record.id).is_some() {
            return Err(AppError::Knowledge(format!("duplicate record id {}", record.id)));
        }
        self.records.push(record);
        Ok(())
    }
}

/// Serialize with four-space indentation; non-ASCII text is written as-is.
fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>, AppError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut ser)
        .map_err(|e| AppError::Knowledge(format!("serialise knowledge base: {e}")))?;
    Ok(buf)
}
