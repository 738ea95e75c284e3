//! FAQ question answering.
//!
//! [`QaEngine`] owns the knowledge store and the lexical index derived from
//! it as one immutable [`Snapshot`]. Queries read the current snapshot;
//! adding a record builds a fresh snapshot and swaps it in, so readers never
//! see a store and an index that disagree.
//!
//! Pipeline per query: normalise → extract keywords and intent → score every
//! record → compose the reply (hedged answer or templated fallback).
//!
//! All methods are synchronous and CPU-bound. Async callers should run them
//! on `tokio::task::spawn_blocking`.

pub mod composer;
pub mod extract;
pub mod fuzzy;
pub mod lexical;
pub mod matcher;
pub mod normalize;
pub mod tokenizer;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{ComposerConfig, Config, MatcherConfig};
use crate::error::AppError;
use crate::subsystems::knowledge::{FaqRecord, KnowledgeStore, LoadOutcome, taxonomy};

pub use extract::{Intent, QueryAnalysis};
use lexical::LexicalIndex;

/// Keywords extracted from a question added without explicit keywords.
const AUTO_KEYWORDS: usize = 5;

// ── Types ─────────────────────────────────────────────────────────────────────

/// What the engine returns for one query.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    /// Id of the matched record; `None` for a fallback reply.
    pub record_id: Option<u64>,
    pub confidence: f64,
    pub intent: Intent,
    pub keywords: Vec<String>,
    pub matched: bool,
}

/// A record and its match score, as returned by [`QaEngine::rank`].
#[derive(Debug, Clone, Serialize)]
pub struct RankedRecord {
    pub id: u64,
    pub question: String,
    pub score: f64,
}

/// Input to [`QaEngine::add_entry`]. Missing keywords and category are
/// inferred from the question.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewEntry {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeStats {
    pub records: usize,
    /// `(category, record count)` in first-seen order.
    pub categories: Vec<(String, usize)>,
}

/// Knowledge store plus its derived index. Never mutated after construction.
#[derive(Debug)]
pub struct Snapshot {
    store: KnowledgeStore,
    index: LexicalIndex,
}

impl Snapshot {
    pub fn new(store: KnowledgeStore) -> Self {
        let index = LexicalIndex::build(store.records());
        Self { store, index }
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    pub fn index(&self) -> &LexicalIndex {
        &self.index
    }
}

// ── QaEngine ──────────────────────────────────────────────────────────────────

pub struct QaEngine {
    snapshot: RwLock<Arc<Snapshot>>,
    /// Serialises writers so concurrent adds cannot drop each other's record.
    writer: Mutex<()>,
    matcher: MatcherConfig,
    composer: ComposerConfig,
    path: PathBuf,
    save_on_add: bool,
}

impl QaEngine {
    /// Load the knowledge base named in `config` and build the index.
    pub fn open(config: &Config) -> Self {
        let (store, outcome) = KnowledgeStore::load(&config.knowledge.path);
        if outcome != LoadOutcome::Loaded {
            info!(?outcome, path = %config.knowledge.path.display(), "knowledge base not loaded cleanly");
        }
        Self::from_store(
            store,
            config.matcher.clone(),
            config.composer.clone(),
            config.knowledge.path.clone(),
            config.knowledge.save_on_add,
        )
    }

    pub fn from_store(
        store: KnowledgeStore,
        matcher: MatcherConfig,
        composer: ComposerConfig,
        path: PathBuf,
        save_on_add: bool,
    ) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(Snapshot::new(store))),
            writer: Mutex::new(()),
            matcher,
            composer,
            path,
            save_on_add,
        }
    }

    /// The current snapshot. Cheap; later adds do not affect it.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace(&self, snapshot: Snapshot) {
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(snapshot);
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Answer `query` using the thread-local random source for phrasing.
    pub fn answer(&self, query: &str) -> Answer {
        self.answer_with(query, &mut rand::thread_rng())
    }

    /// Answer `query` with an explicit random source.
    pub fn answer_with<R: Rng + ?Sized>(&self, query: &str, rng: &mut R) -> Answer {
        let snap = self.snapshot();
        let analysis = QueryAnalysis::new(query);
        let records = snap.store.records();
        let result = matcher::best_match(&self.matcher, records, &snap.index, &analysis);
        debug!(
            query = %analysis.normalized,
            keywords = ?analysis.keywords,
            intent = %analysis.intent,
            intent_confidence = analysis.intent_confidence,
            score = result.score,
            by_category = result.by_category,
            "query scored"
        );

        match result.index.map(|i| &records[i]) {
            Some(record) => {
                info!(id = record.id, score = result.score, "faq match");
                Answer {
                    text: composer::compose_match(&self.composer, &record.answer, result.score, rng),
                    record_id: Some(record.id),
                    confidence: result.score,
                    intent: analysis.intent,
                    keywords: analysis.keywords,
                    matched: true,
                }
            }
            None => {
                info!(score = result.score, intent = %analysis.intent, "no faq match; using fallback");
                let similar: Vec<&str> = matcher::similar(
                    &snap.index,
                    &analysis.normalized,
                    self.composer.similar_limit,
                    self.composer.similar_min_cosine,
                )
                .into_iter()
                .map(|(i, _)| records[i].question.as_str())
                .collect();
                Answer {
                    text: composer::compose_fallback(&analysis, &similar, rng),
                    record_id: None,
                    confidence: result.score,
                    intent: analysis.intent,
                    keywords: analysis.keywords,
                    matched: false,
                }
            }
        }
    }

    /// Every record ordered by descending match score; equal scores keep
    /// store order.
    pub fn rank(&self, query: &str) -> Vec<RankedRecord> {
        let snap = self.snapshot();
        let analysis = QueryAnalysis::new(query);
        let records = snap.store.records();
        let scores = matcher::score_all(&self.matcher, records, &snap.index, &analysis);
        let mut ranked: Vec<RankedRecord> = records
            .iter()
            .zip(scores)
            .map(|(r, score)| RankedRecord { id: r.id, question: r.question.clone(), score })
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }

    /// Append a record, rebuild the index and, if configured, persist.
    pub fn add_entry(&self, entry: NewEntry) -> Result<FaqRecord, AppError> {
        let question = entry.question.trim();
        let answer = entry.answer.trim();
        if question.is_empty() || answer.is_empty() {
            return Err(AppError::Knowledge("question and answer must not be empty".into()));
        }

        let keywords = entry
            .keywords
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| tokenizer::salient_terms(question, AUTO_KEYWORDS));
        let category = entry
            .category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| {
                taxonomy::best_category(&keywords, true)
                    .map_or(taxonomy::UNCATEGORIZED, |(name, _)| name)
                    .to_string()
            });

        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut store = self.snapshot().store.clone();
        let record = FaqRecord {
            id: store.next_id(),
            question: question.to_string(),
            answer: answer.to_string(),
            keywords,
            category,
        };
        store.push(record.clone())?;
        if self.save_on_add {
            store.save(&self.path)?;
        }
        self.replace(Snapshot::new(store));
        info!(id = record.id, category = %record.category, "faq entry added");
        Ok(record)
    }

    /// Persist the current records to the knowledge-base file.
    pub fn save(&self) -> Result<(), AppError> {
        self.snapshot().store.save(&self.path)
    }

    /// Re-read the knowledge-base file and swap in the result.
    pub fn reload(&self) -> LoadOutcome {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let (store, outcome) = KnowledgeStore::load(&self.path);
        self.replace(Snapshot::new(store));
        outcome
    }

    pub fn stats(&self) -> KnowledgeStats {
        let snap = self.snapshot();
        let records = snap.store.records();
        let categories = snap
            .store
            .categories()
            .into_iter()
            .map(|c| {
                let n = records.iter().filter(|r| r.category == c).count();
                (c.to_string(), n)
            })
            .collect();
        KnowledgeStats { records: records.len(), categories }
    }
}
