//! Lexical TF-IDF index over FAQ records.
//!
//! Each record's [`FaqRecord::index_text`] is tokenized, weighted by raw
//! term frequency times smoothed idf `ln((1+n)/(1+df)) + 1`, and
//! L2-normalised. Vectors are sparse `(term, weight)` lists sorted by term
//! index. The index is immutable: the engine rebuilds it whenever the store
//! changes.

use std::collections::HashMap;

use crate::subsystems::knowledge::FaqRecord;

use super::tokenizer;

type SparseVec = Vec<(usize, f64)>;

#[derive(Debug, Clone, Default)]
pub struct LexicalIndex {
    vocab: HashMap<String, usize>,
    idf: Vec<f64>,
    rows: Vec<SparseVec>,
}

impl LexicalIndex {
    pub fn build(records: &[FaqRecord]) -> Self {
        let docs: Vec<Vec<String>> = records
            .iter()
            .map(|r| tokenizer::index_tokens(&r.index_text()))
            .collect();

        let mut vocab: HashMap<String, usize> = HashMap::new();
        let mut df: Vec<usize> = Vec::new();
        for doc in &docs {
            let mut seen_here = Vec::new();
            for token in doc {
                let next = vocab.len();
                let idx = *vocab.entry(token.clone()).or_insert(next);
                if idx == df.len() {
                    df.push(0);
                }
                if !seen_here.contains(&idx) {
                    seen_here.push(idx);
                    df[idx] += 1;
                }
            }
        }

        let n = docs.len() as f64;
        let idf: Vec<f64> = df
            .iter()
            .map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
            .collect();

        let mut index = Self { vocab, idf, rows: Vec::with_capacity(docs.len()) };
        index.rows = docs.iter().map(|doc| index.weigh(doc)).collect();
        index
    }

    /// Number of indexed records.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cosine similarity of `query` against every record, in record order.
    /// Empty for an empty index.
    pub fn similarities(&self, query: &str) -> Vec<f64> {
        if self.rows.is_empty() {
            return Vec::new();
        }
        let q = self.weigh(&tokenizer::index_tokens(query));
        self.rows.iter().map(|row| dot(&q, row)).collect()
    }

    /// TF-IDF vector for `tokens`; out-of-vocabulary tokens are ignored.
    fn weigh(&self, tokens: &[String]) -> SparseVec {
        let mut tf: HashMap<usize, f64> = HashMap::new();
        for token in tokens {
            if let Some(&idx) = self.vocab.get(token) {
                *tf.entry(idx).or_default() += 1.0;
            }
        }
        let mut v: SparseVec = tf.into_iter().map(|(i, f)| (i, f * self.idf[i])).collect();
        v.sort_unstable_by_key(|(i, _)| *i);
        let norm = v.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut v {
                *w /= norm;
            }
        }
        v
    }
}

/// Dot product of two sorted sparse vectors; both are unit length, so this
/// is their cosine.
fn dot(a: &SparseVec, b: &SparseVec) -> f64 {
    let (mut i, mut j, mut sum) = (0, 0, 0.0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, question: &str, keywords: &[&str]) -> FaqRecord {
        FaqRecord {
            id,
            question: question.into(),
            answer: String::new(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            category: String::new(),
        }
    }

    fn corpus() -> Vec<FaqRecord> {
        vec![
            record(1, "信用卡年费怎么收", &["信用卡", "年费"]),
            record(2, "贷款利率是多少", &["贷款", "利率"]),
            record(3, "手机银行如何转账", &["手机银行", "转账"]),
        ]
    }

    #[test]
    fn empty_index_yields_no_scores() {
        let index = LexicalIndex::build(&[]);
        assert!(index.is_empty());
        assert!(index.similarities("信用卡").is_empty());
    }

    #[test]
    fn one_score_per_record() {
        let index = LexicalIndex::build(&corpus());
        assert_eq!(index.len(), 3);
        assert_eq!(index.similarities("随便问问").len(), 3);
    }

    #[test]
    fn own_text_is_most_similar() {
        let records = corpus();
        let index = LexicalIndex::build(&records);
        for (i, r) in records.iter().enumerate() {
            let sims = index.similarities(&r.index_text());
            let best = sims
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(k, _)| k);
            assert_eq!(best, Some(i));
            assert!((sims[i] - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn unknown_terms_score_zero() {
        let index = LexicalIndex::build(&corpus());
        assert!(index.similarities("天气").iter().all(|s| *s == 0.0));
    }

    #[test]
    fn scores_are_bounded() {
        let index = LexicalIndex::build(&corpus());
        for s in index.similarities("信用卡 贷款 转账 利率") {
            assert!((0.0..=1.0 + 1e-9).contains(&s));
        }
    }
}
