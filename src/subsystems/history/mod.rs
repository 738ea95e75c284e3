//! Chat history: a capped JSON transcript of user and assistant turns.
//!
//! File shape: `{ "cap": N, "entries": [{text, is_user, timestamp}] }`.
//! Entries beyond the cap are dropped oldest-first.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub text: String,
    pub is_user: bool,
    /// RFC 3339, UTC.
    pub timestamp: String,
}

impl HistoryEntry {
    pub fn now(text: impl Into<String>, is_user: bool) -> Self {
        Self {
            text: text.into(),
            is_user,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// On-disk shape of the history file.
#[derive(Serialize, Deserialize)]
struct HistoryFile {
    cap: usize,
    entries: Vec<HistoryEntry>,
}

pub struct ChatHistory {
    path: PathBuf,
    cap: usize,
    entries: Mutex<Vec<HistoryEntry>>,
}

impl ChatHistory {
    /// Open the history at `path`. A missing or malformed file starts empty.
    pub fn open(path: &Path, cap: usize) -> Self {
        let mut entries = match fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<HistoryFile>(&text) {
                Ok(file) => file.entries,
                Err(e) => {
                    warn!(path = %path.display(), "ignoring malformed history: {e}");
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        trim_to_cap(&mut entries, cap);
        Self { path: path.to_path_buf(), cap, entries: Mutex::new(entries) }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<HistoryEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one exchange and persist.
    pub fn record_exchange(&self, question: &str, answer: &str) -> Result<(), AppError> {
        self.append(vec![HistoryEntry::now(question, true), HistoryEntry::now(answer, false)])
    }

    /// Append `new` entries, evict beyond the cap and persist.
    pub fn append(&self, new: Vec<HistoryEntry>) -> Result<(), AppError> {
        let mut entries = self.lock();
        entries.extend(new);
        trim_to_cap(&mut entries, self.cap);
        self.write(&entries)
    }

    pub fn list(&self) -> Vec<HistoryEntry> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) -> Result<(), AppError> {
        let mut entries = self.lock();
        entries.clear();
        self.write(&entries)
    }

    fn write(&self, entries: &[HistoryEntry]) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = HistoryFile { cap: self.cap, entries: entries.to_vec() };
        let data = serde_json::to_string_pretty(&file)
            .map_err(|e| AppError::Comms(format!("serialise history: {e}")))?;
        fs::write(&self.path, data)
            .map_err(|e| AppError::Comms(format!("cannot write {}: {e}", self.path.display())))?;
        debug!(entries = entries.len(), "history saved");
        Ok(())
    }
}

fn trim_to_cap(entries: &mut Vec<HistoryEntry>, cap: usize) {
    if entries.len() > cap {
        let excess = entries.len() - cap;
        entries.drain(..excess);
    }
}
