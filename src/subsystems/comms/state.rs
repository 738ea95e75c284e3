//! Shared state for the Comms subsystem — capability boundary for channels.
//!
//! Channels receive an `Arc<CommsState>` and are restricted to the typed
//! methods below. The engines themselves are private; a channel cannot
//! reach into the knowledge store or the vector index directly.
//!
//! # Intra-subsystem events
//!
//! [`CommsState::report_event`] lets a running channel signal the comms
//! subsystem manager (e.g. "I shut down", "new session started"). The
//! manager owns the receiver end.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::subsystems::history::{ChatHistory, HistoryEntry};
use crate::subsystems::knowledge::FaqRecord;
use crate::subsystems::qa::{Answer, KnowledgeStats, NewEntry, QaEngine};
use crate::subsystems::rag::{RagAnswer, RagService, RagStats, RetrievedDoc};
use crate::subsystems::settings::{Settings, SettingsStore};

/// Settings toggle that controls whether exchanges are written to history.
const AUTO_SAVE_HISTORY: &str = "auto_save_history";

// ── Events ────────────────────────────────────────────────────────────────────

/// Events a channel sends back to the comms subsystem manager.
#[derive(Debug)]
pub enum CommsEvent {
    /// Channel has stopped (clean exit or EOF).
    ChannelShutdown { channel_id: String },
    /// A new session/connection was established on the channel.
    SessionStarted { channel_id: String },
}

// ── State ─────────────────────────────────────────────────────────────────────

/// Shared state passed as `Arc<CommsState>` to every channel task.
pub struct CommsState {
    qa: Arc<QaEngine>,
    rag: Arc<RagService>,
    settings: Arc<SettingsStore>,
    history: Arc<ChatHistory>,
    /// Back-channel to the comms subsystem manager.
    event_tx: mpsc::Sender<CommsEvent>,
}

impl CommsState {
    pub fn new(
        qa: Arc<QaEngine>,
        rag: Arc<RagService>,
        settings: Arc<SettingsStore>,
        history: Arc<ChatHistory>,
        event_tx: mpsc::Sender<CommsEvent>,
    ) -> Self {
        Self { qa, rag, settings, history, event_tx }
    }

    /// Name of the model behind the RAG service.
    pub fn model(&self) -> &str {
        self.rag.model()
    }

    // ── FAQ ───────────────────────────────────────────────────────────────

    /// Answer `query` from the FAQ knowledge base.
    ///
    /// Matching is CPU-bound and runs on the blocking pool.
    pub async fn ask_faq(&self, channel_id: &str, query: String) -> Result<Answer, AppError> {
        let qa = self.qa.clone();
        let q = query.clone();
        let answer = tokio::task::spawn_blocking(move || qa.answer(&q))
            .await
            .map_err(|e| AppError::Comms(format!("faq task failed: {e}")))?;
        debug!(channel_id, record_id = ?answer.record_id, confidence = answer.confidence, "faq answered");
        self.remember(query, answer.text.clone()).await;
        Ok(answer)
    }

    pub async fn add_faq_entry(&self, entry: NewEntry) -> Result<FaqRecord, AppError> {
        let qa = self.qa.clone();
        tokio::task::spawn_blocking(move || qa.add_entry(entry))
            .await
            .map_err(|e| AppError::Comms(format!("faq task failed: {e}")))?
    }

    pub fn faq_stats(&self) -> KnowledgeStats {
        self.qa.stats()
    }

    // ── RAG ───────────────────────────────────────────────────────────────

    /// Answer `query` from the indexed documents through the LLM.
    pub async fn ask_rag(
        &self,
        channel_id: &str,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<RagAnswer, AppError> {
        let answer = self.rag.ask(query, top_k).await?;
        debug!(channel_id, docs = answer.docs.len(), "rag answered");
        self.remember(query.to_string(), answer.answer.clone()).await;
        Ok(answer)
    }

    pub async fn search_knowledge(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RetrievedDoc>, AppError> {
        self.rag.search(query, limit).await
    }

    pub async fn knowledge_stats(&self) -> RagStats {
        self.rag.stats().await
    }

    // ── Settings & history ────────────────────────────────────────────────

    pub fn settings(&self) -> Settings {
        self.settings.get()
    }

    pub fn update_settings(&self, patch: Settings) -> Result<Settings, AppError> {
        self.settings.update(patch)
    }

    pub fn reset_settings(&self) -> Result<Settings, AppError> {
        self.settings.reset()
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.list()
    }

    pub async fn clear_history(&self) -> Result<(), AppError> {
        let history = self.history.clone();
        tokio::task::spawn_blocking(move || history.clear())
            .await
            .map_err(|e| AppError::Comms(format!("history task failed: {e}")))?
    }

    /// Record an exchange when history saving is switched on. The file is
    /// rewritten on the blocking pool. Failures are logged; a reply is never
    /// lost because the transcript could not be written.
    async fn remember(&self, question: String, answer: String) {
        if !self.settings.flag(AUTO_SAVE_HISTORY) {
            return;
        }
        let history = self.history.clone();
        let saved = tokio::task::spawn_blocking(move || history.record_exchange(&question, &answer))
            .await
            .map_err(|e| AppError::Comms(format!("history task failed: {e}")))
            .and_then(|r| r);
        if let Err(e) = saved {
            warn!("history not saved: {e}");
        }
    }

    /// Report an event to the comms subsystem manager.
    ///
    /// Non-blocking: drops the event and logs a warning if the manager is not
    /// keeping up (channel full) or has already exited (closed).
    pub fn report_event(&self, event: CommsEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            warn!("comms event dropped: {e}");
        }
    }
}
