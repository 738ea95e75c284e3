//! Document folder indexer: paragraphs of every file become index chunks.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::AppError;

use super::embedding::Embedder;
use super::vector_index::{ChunkMetadata, DocChunk, Upsert, VectorIndex, sha256_hex};

/// Counters returned by [`index_dir`].
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct IndexReport {
    pub files: usize,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Chunks of re-read files whose paragraph is gone or now too short.
    pub removed: usize,
    /// Paragraphs shorter than the minimum length.
    pub skipped: usize,
}

/// Split `text` on blank lines. Yields `(paragraph_index, trimmed_text)` for
/// every paragraph of at least `min_chars` characters; indices count all
/// paragraphs, kept or not.
pub fn split_paragraphs(text: &str, min_chars: usize) -> impl Iterator<Item = (usize, &str)> {
    text.split("\n\n")
        .map(str::trim)
        .enumerate()
        .filter(move |(_, p)| p.chars().count() >= min_chars)
}

/// Index every regular file in `dir` (non-recursive, name order) into
/// `index`. Paragraphs whose id and content hash are already present are not
/// re-embedded; chunks of a re-read file that this pass did not produce are
/// dropped.
pub async fn index_dir(
    dir: &Path,
    embedder: &Embedder,
    index: &mut VectorIndex,
    min_chars: usize,
) -> Result<IndexReport, AppError> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| AppError::Rag(format!("cannot read {}: {e}", dir.display())))?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();

    let mut report = IndexReport::default();
    for name in names {
        let text = match tokio::fs::read_to_string(dir.join(&name)).await {
            Ok(text) => text,
            Err(e) => {
                warn!(file = %name, "skipping unreadable document: {e}");
                continue;
            }
        };
        report.files += 1;

        let total = text.split("\n\n").count();
        let mut produced: Vec<String> = Vec::new();
        for (i, paragraph) in split_paragraphs(&text, min_chars) {
            let id = format!("{name}_{i}");
            produced.push(id.clone());
            let hash = sha256_hex(paragraph);
            if index.get(&id).is_some_and(|c| c.hash == hash) {
                report.unchanged += 1;
                continue;
            }
            let vector = embedder.embed(paragraph).await?;
            let chunk = DocChunk {
                id,
                content: paragraph.to_string(),
                metadata: ChunkMetadata { source: name.clone(), para_id: i },
                hash,
                vector,
            };
            match index.upsert(chunk)? {
                Upsert::Inserted => report.inserted += 1,
                Upsert::Updated => report.updated += 1,
                Upsert::Unchanged => report.unchanged += 1,
            }
        }
        report.skipped += total - produced.len();
        let removed = index.prune_source(&name, &produced);
        report.removed += removed;
        debug!(file = %name, paragraphs = produced.len(), removed, "document indexed");
    }

    info!(
        dir = %dir.display(),
        files = report.files,
        inserted = report.inserted,
        updated = report.updated,
        unchanged = report.unchanged,
        removed = report.removed,
        "document folder indexed"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subsystems::rag::embedding::HashingEmbedder;
    use tempfile::TempDir;

    #[test]
    fn paragraphs_keep_original_indices() {
        let text = "第一段内容足够长足够长足够长\n\n短\n\n  第三段内容同样足够长足够长  ";
        let paras: Vec<_> = split_paragraphs(text, 10).collect();
        assert_eq!(
            paras,
            vec![(0, "第一段内容足够长足够长足够长"), (2, "第三段内容同样足够长足够长")]
        );
    }

    #[test]
    fn length_is_counted_in_characters() {
        // Ten CJK characters are 30 bytes but only 10 characters.
        assert_eq!(split_paragraphs("一二三四五六七八九十", 10).count(), 1);
        assert_eq!(split_paragraphs("一二三四五六七八九", 10).count(), 0);
    }

    #[tokio::test]
    async fn indexes_folder_and_skips_unchanged() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("cards.txt"),
            "信用卡年费首年免收，刷卡满六次免次年年费。\n\n短段\n\n信用卡额度可在手机银行申请临时提升。",
        )
        .unwrap();
        std::fs::write(dir.path().join("loans.txt"), "房贷利率以最新贷款市场报价利率为基准。").unwrap();

        let embedder = Embedder::Hashing(HashingEmbedder::new(64).unwrap());
        let mut index = VectorIndex::new(64);

        let report = index_dir(dir.path(), &embedder, &mut index, 10).await.unwrap();
        assert_eq!(report.files, 2);
        assert_eq!(report.inserted, 3);
        assert_eq!(report.skipped, 1);
        let chunk = index.get("cards.txt_2").unwrap();
        assert_eq!(chunk.metadata, ChunkMetadata { source: "cards.txt".into(), para_id: 2 });

        let again = index_dir(dir.path(), &embedder, &mut index, 10).await.unwrap();
        assert_eq!(again.inserted, 0);
        assert_eq!(again.unchanged, 3);
        assert_eq!(index.len(), 3);
    }

    #[tokio::test]
    async fn shrunk_document_loses_stale_chunks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cards.txt");
        std::fs::write(
            &path,
            "信用卡年费首年免收，刷卡满六次免次年年费。\n\n信用卡额度可在手机银行申请临时提升。\n\n信用卡账单日后二十天内还款免息。",
        )
        .unwrap();
        std::fs::write(dir.path().join("loans.txt"), "房贷利率以最新贷款市场报价利率为基准。").unwrap();

        let embedder = Embedder::Hashing(HashingEmbedder::new(64).unwrap());
        let mut index = VectorIndex::new(64);
        index_dir(dir.path(), &embedder, &mut index, 10).await.unwrap();
        assert_eq!(index.len(), 4);

        std::fs::write(&path, "信用卡年费首年免收，刷卡满六次免次年年费。").unwrap();
        let report = index_dir(dir.path(), &embedder, &mut index, 10).await.unwrap();
        assert_eq!(report.removed, 2);
        assert_eq!(report.unchanged, 2);
        assert_eq!(index.len(), 2);
        assert!(index.get("cards.txt_1").is_none());
        assert!(index.get("cards.txt_2").is_none());
        assert!(index.get("loans.txt_0").is_some());

        let hits = index.search(&embedder.embed("账单免息").await.unwrap(), 5).unwrap();
        assert!(hits.iter().all(|h| h.chunk.id != "cards.txt_2"));
    }

    #[tokio::test]
    async fn missing_folder_is_an_error() {
        let embedder = Embedder::Hashing(HashingEmbedder::new(8).unwrap());
        let mut index = VectorIndex::new(8);
        let err = index_dir(Path::new("/nonexistent/docs"), &embedder, &mut index, 10).await;
        assert!(matches!(err, Err(AppError::Rag(_))));
    }
}
