//! Flat in-memory vector index with JSON persistence.
//!
//! File shape: `{dims, entries: [{id, content, metadata, hash, vector}]}`.
//! Search is exhaustive cosine similarity; fine for the few hundred
//! paragraphs a document folder yields.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    pub para_id: usize,
}

/// One indexed paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocChunk {
    /// `"{file_name}_{paragraph_index}"`.
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
    /// SHA-256 of `content`, hex.
    pub hash: String,
    pub vector: Vec<f32>,
}

/// Result of [`VectorIndex::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    pub chunk: &'a DocChunk,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    dims: usize,
    entries: Vec<DocChunk>,
}

pub fn sha256_hex(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

impl VectorIndex {
    pub fn new(dims: usize) -> Self {
        Self { dims, entries: Vec::new() }
    }

    /// Load the index at `path`, or an empty one if the file does not exist.
    ///
    /// A file built with a different dimension is an error: its vectors
    /// cannot be compared with the current embedder's.
    pub fn load(path: &Path, dims: usize) -> Result<Self, AppError> {
        if !path.exists() {
            debug!(path = %path.display(), "no vector index yet");
            return Ok(Self::new(dims));
        }
        let data = fs::read_to_string(path)
            .map_err(|e| AppError::Rag(format!("cannot read {}: {e}", path.display())))?;
        let index: Self = serde_json::from_str(&data)
            .map_err(|e| AppError::Rag(format!("malformed {}: {e}", path.display())))?;
        if index.dims != dims {
            return Err(AppError::Rag(format!(
                "{} has dimension {}, embedder produces {dims}; re-run `index`",
                path.display(),
                index.dims
            )));
        }
        info!(path = %path.display(), entries = index.len(), "vector index loaded");
        Ok(index)
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string(self)
            .map_err(|e| AppError::Rag(format!("serialise vector index: {e}")))?;
        fs::write(path, data)
            .map_err(|e| AppError::Rag(format!("cannot write {}: {e}", path.display())))?;
        debug!(path = %path.display(), entries = self.len(), "vector index saved");
        Ok(())
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&DocChunk> {
        self.entries.iter().find(|c| c.id == id)
    }

    /// Distinct chunk sources, in first-seen order.
    pub fn sources(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for c in &self.entries {
            if !out.contains(&c.metadata.source.as_str()) {
                out.push(&c.metadata.source);
            }
        }
        out
    }

    /// Insert `chunk`, or replace the chunk with the same id.
    pub fn upsert(&mut self, chunk: DocChunk) -> Result<Upsert, AppError> {
        if chunk.vector.len() != self.dims {
            return Err(AppError::Rag(format!(
                "vector for {} has dimension {}, index expects {}",
                chunk.id,
                chunk.vector.len(),
                self.dims
            )));
        }
        match self.entries.iter_mut().find(|c| c.id == chunk.id) {
            Some(existing) if existing.hash == chunk.hash && existing.vector == chunk.vector => {
                Ok(Upsert::Unchanged)
            }
            Some(existing) => {
                *existing = chunk;
                Ok(Upsert::Updated)
            }
            None => {
                self.entries.push(chunk);
                Ok(Upsert::Inserted)
            }
        }
    }

    /// Drop every chunk of `source` whose id is not in `keep`. Returns the
    /// number removed.
    pub fn prune_source(&mut self, source: &str, keep: &[String]) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|c| c.metadata.source != source || keep.contains(&c.id));
        before - self.entries.len()
    }

    /// The `k` chunks most similar to `query`, best first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit<'_>>, AppError> {
        if query.len() != self.dims {
            return Err(AppError::Rag(format!(
                "query has dimension {}, index expects {}",
                query.len(),
                self.dims
            )));
        }
        let mut hits: Vec<SearchHit<'_>> = self
            .entries
            .iter()
            .map(|chunk| SearchHit { chunk, score: cosine(query, &chunk.vector) })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        Ok(hits)
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na * nb) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn chunk(id: &str, content: &str, vector: Vec<f32>) -> DocChunk {
        DocChunk {
            id: id.into(),
            content: content.into(),
            metadata: ChunkMetadata { source: "a.txt".into(), para_id: 0 },
            hash: sha256_hex(content),
            vector,
        }
    }

    #[test]
    fn search_ranks_by_cosine() {
        let mut index = VectorIndex::new(2);
        index.upsert(chunk("x", "x", vec![1.0, 0.0])).unwrap();
        index.upsert(chunk("y", "y", vec![0.0, 1.0])).unwrap();
        index.upsert(chunk("xy", "xy", vec![1.0, 1.0])).unwrap();
        let hits = index.search(&[1.0, 0.1], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.id, "x");
        assert_eq!(hits[1].chunk.id, "xy");
    }

    #[test]
    fn upsert_replaces_by_id() {
        let mut index = VectorIndex::new(2);
        assert_eq!(index.upsert(chunk("a", "old", vec![1.0, 0.0])).unwrap(), Upsert::Inserted);
        assert_eq!(index.upsert(chunk("a", "old", vec![1.0, 0.0])).unwrap(), Upsert::Unchanged);
        assert_eq!(index.upsert(chunk("a", "new", vec![0.0, 1.0])).unwrap(), Upsert::Updated);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("a").unwrap().content, "new");
    }

    #[test]
    fn dimension_mismatch_is_an_error() {
        let mut index = VectorIndex::new(3);
        assert!(index.upsert(chunk("a", "a", vec![1.0])).is_err());
        assert!(index.search(&[1.0], 1).is_err());
    }

    #[test]
    fn empty_index_returns_no_hits() {
        let index = VectorIndex::new(2);
        assert!(index.search(&[1.0, 0.0], 3).unwrap().is_empty());
    }

    #[test]
    fn persists_and_checks_dims_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("idx.json");
        assert!(VectorIndex::load(&path, 2).unwrap().is_empty());

        let mut index = VectorIndex::new(2);
        index.upsert(chunk("a", "内容", vec![0.6, 0.8])).unwrap();
        index.save(&path).unwrap();

        let loaded = VectorIndex::load(&path, 2).unwrap();
        assert_eq!(loaded.get("a"), index.get("a"));
        assert!(VectorIndex::load(&path, 4).is_err());
    }

    #[test]
    fn hash_is_hex_sha256() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
