//! Hybrid FAQ matcher.
//!
//! Every record gets one score blending four signals: TF-IDF cosine of the
//! query against the record's indexed text, fuzzy similarity of the query
//! to the record question, keyword overlap, and a category bonus when the
//! record's category is among the query's categories. The arg-max wins if it
//! clears the global threshold; otherwise the best record inside the query's
//! categories gets a second chance against a lower threshold.
//!
//! Scoring is pure: same records, index and query, same result.

use crate::config::MatcherConfig;
use crate::subsystems::knowledge::FaqRecord;

use super::extract::QueryAnalysis;
use super::fuzzy;
use super::lexical::LexicalIndex;

/// Outcome of [`best_match`]. `index` points into the record slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    pub index: Option<usize>,
    pub score: f64,
    /// The record was accepted by the category fallback, not the arg-max.
    pub by_category: bool,
}

impl MatchResult {
    fn none(score: f64) -> Self {
        Self { index: None, score, by_category: false }
    }
}

/// Final score of every record, in record order.
pub fn score_all(
    config: &MatcherConfig,
    records: &[FaqRecord],
    index: &LexicalIndex,
    analysis: &QueryAnalysis,
) -> Vec<f64> {
    let cosines = index.similarities(&analysis.normalized);
    records
        .iter()
        .zip(cosines)
        .map(|(record, cosine)| {
            let in_category = analysis.categories.contains(&record.category.as_str());
            let question = question_score(config, &analysis.normalized, &record.question);
            let keywords = keyword_score(config, &analysis.keywords, &record.keywords);
            let bonus = if in_category { config.category_bonus } else { 0.0 };
            let combined = config.question_weight * question
                + config.keyword_weight * keywords
                + config.category_weight * bonus;
            let binary = if in_category { 1.0 } else { 0.0 };
            config.cosine_weight * cosine
                + config.combined_weight * combined
                + config.category_binary_weight * binary
        })
        .collect()
}

/// Best record for `analysis`, or `None` with the best score seen.
pub fn best_match(
    config: &MatcherConfig,
    records: &[FaqRecord],
    index: &LexicalIndex,
    analysis: &QueryAnalysis,
) -> MatchResult {
    let scores = score_all(config, records, index, analysis);
    let Some((best, best_score)) = arg_max(scores.iter().copied().enumerate()) else {
        return MatchResult::none(0.0);
    };

    if best_score >= config.threshold {
        return MatchResult { index: Some(best), score: best_score, by_category: false };
    }
    if analysis.categories.is_empty() {
        return MatchResult::none(best_score);
    }

    let in_categories = scores.iter().copied().enumerate().filter(|(i, _)| {
        analysis.categories.contains(&records[*i].category.as_str())
    });
    match arg_max(in_categories) {
        Some((i, score)) if score >= config.category_threshold => {
            MatchResult { index: Some(i), score, by_category: true }
        }
        _ => MatchResult::none(best_score),
    }
}

/// Up to `k` record indices ordered by descending cosine, each above
/// `min_cosine`. Equal cosines keep record order.
pub fn similar(index: &LexicalIndex, query: &str, k: usize, min_cosine: f64) -> Vec<(usize, f64)> {
    let mut ranked: Vec<(usize, f64)> = index
        .similarities(query)
        .into_iter()
        .enumerate()
        .filter(|(_, c)| *c > min_cosine)
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(k);
    ranked
}

/// First maximum of `(index, score)` pairs.
fn arg_max(scores: impl Iterator<Item = (usize, f64)>) -> Option<(usize, f64)> {
    scores.fold(None, |best, (i, s)| match best {
        Some((_, b)) if b >= s => best,
        _ => Some((i, s)),
    })
}

/// Fuzzy similarity of the query to a record question, 0–1.
fn question_score(config: &MatcherConfig, query: &str, question: &str) -> f64 {
    let set = f64::from(fuzzy::token_set_ratio(query, question)) / 100.0;
    let sort = f64::from(fuzzy::token_sort_ratio(query, question)) / 100.0;
    let partial = f64::from(fuzzy::partial_ratio(query, question)) / 100.0;
    config.token_set_weight * set + config.token_sort_weight * sort + config.partial_weight * partial
}

/// Keyword overlap between query keywords and record keywords, 0–1.
fn keyword_score(config: &MatcherConfig, query_keywords: &[String], record_keywords: &[String]) -> f64 {
    if query_keywords.is_empty() {
        return 0.0;
    }
    let mut raw = 0.0;
    let mut matched = 0.0;
    for keyword in query_keywords {
        let exact = record_keywords
            .iter()
            .any(|k| k == keyword || k.contains(keyword.as_str()));
        if exact {
            raw += config.keyword_exact_score;
            matched += 1.0;
            continue;
        }
        let best = record_keywords
            .iter()
            .map(|k| f64::from(fuzzy::token_set_ratio(keyword, k)))
            .fold(0.0, f64::max);
        if best > config.keyword_high_ratio {
            raw += config.keyword_high_score;
            matched += 0.8;
        } else if best > config.keyword_medium_ratio {
            raw += config.keyword_medium_score;
            matched += 0.5;
        }
    }
    let coverage = matched / query_keywords.len() as f64;
    let blended = config.keyword_raw_share * raw + (1.0 - config.keyword_raw_share) * coverage;
    blended.min(1.0)
}
