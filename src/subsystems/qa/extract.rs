//! Keyword and intent extraction for a normalised query.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::subsystems::knowledge::taxonomy;

use super::{normalize, tokenizer};

/// Salient terms taken from the TF-IDF extractor.
const SALIENT_TOP_K: usize = 8;

/// Multi-word bank phrases picked up by plain containment.
const BANK_PHRASES: &[&str] = &[
    "信用卡", "储蓄卡", "借记卡", "贷记卡", "银行卡",
    "定期存款", "活期存款", "大额存单", "智能存款",
    "房贷", "车贷", "消费贷", "信用贷", "经营贷",
    "手机银行", "网上银行", "电话银行", "自助银行",
    "理财产品", "结构性存款", "风险等级", "收益率",
];

/// Base word appended whenever one of its synonyms is a keyword.
const SYNONYMS: &[(&str, &[&str])] = &[
    ("查询", &["查看", "了解", "知道", "询问"]),
    ("办理", &["申请", "开通", "开户", "开卡"]),
    ("额度", &["限额", "上限", "额度"]),
    ("利率", &["利息", "利息率", "年化", "收益率"]),
    ("转账", &["汇款", "付款", "支付", "打钱"]),
];

const INTENT_PATTERN_CONFIDENCE: f64 = 0.8;
const INTENT_CATEGORY_CONFIDENCE: f64 = 0.9;
const INTENT_DEFAULT_CONFIDENCE: f64 = 0.6;

// ── Intent ────────────────────────────────────────────────────────────────────

/// What the user is trying to do. Serialises as its Chinese label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Query,
    Apply,
    Problem,
    Compare,
    Consult,
    /// The query is mostly about one taxonomy category.
    Category(&'static str),
}

impl Intent {
    pub fn label(&self) -> &'static str {
        match self {
            Intent::Query => "查询",
            Intent::Apply => "办理",
            Intent::Problem => "问题",
            Intent::Compare => "比较",
            Intent::Consult => "咨询",
            Intent::Category(name) => name,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Intent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

struct IntentPatterns {
    number: Regex,
    intents: Vec<(Intent, Regex)>,
}

fn patterns() -> &'static IntentPatterns {
    static PATTERNS: OnceLock<IntentPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let table: [(Intent, &str); 5] = [
            (Intent::Query, "如何|怎么|怎样|哪里|什么|多少|几点|查询|查看|了解|知道|告诉|说明"),
            (Intent::Apply, "如何|怎么|怎样|去哪|在哪|办理|开通|申请|开户|开卡"),
            (Intent::Problem, "出现|遇到|碰到|发生|问题|错误|失败|无法|不能"),
            (Intent::Compare, "对比|比较|区别|差异|不同|优势|好处|哪个好"),
            (Intent::Consult, "请问|想问|咨询|了解|想知道"),
        ];
        IntentPatterns {
            number: Regex::new(r"\d+\.?\d*%?").expect("number pattern is valid"),
            intents: table
                .into_iter()
                .map(|(intent, pat)| (intent, Regex::new(pat).expect("intent pattern is valid")))
                .collect(),
        }
    })
}

// ── QueryAnalysis ─────────────────────────────────────────────────────────────

/// Everything derived from one query, computed once and shared by the
/// matcher and the composer.
#[derive(Debug, Clone, Serialize)]
pub struct QueryAnalysis {
    pub raw: String,
    pub normalized: String,
    pub keywords: Vec<String>,
    pub intent: Intent,
    pub intent_confidence: f64,
    /// Taxonomy categories with at least one term inside the normalised query.
    pub categories: Vec<&'static str>,
}

impl QueryAnalysis {
    pub fn new(raw: &str) -> Self {
        let normalized = normalize::normalize(raw);
        let keywords = extract_keywords(&normalized);
        let (intent, intent_confidence) = detect_intent(&normalized, &keywords);
        let categories = taxonomy::categories_in(&normalized);
        Self {
            raw: raw.to_string(),
            normalized,
            keywords,
            intent,
            intent_confidence,
            categories,
        }
    }
}

/// Deduplicated keywords of `query`, in discovery order.
pub fn extract_keywords(query: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();

    for term in tokenizer::salient_terms(query, SALIENT_TOP_K) {
        push_unique(&mut keywords, &term);
    }
    for m in patterns().number.find_iter(query) {
        push_unique(&mut keywords, m.as_str());
    }
    for word in tokenizer::cut(query) {
        if taxonomy::contains_term(word) {
            push_unique(&mut keywords, word);
        }
    }
    for phrase in BANK_PHRASES {
        if query.contains(phrase) {
            push_unique(&mut keywords, phrase);
        }
    }

    let found = keywords.len();
    for i in 0..found {
        for (base, synonyms) in SYNONYMS {
            if synonyms.contains(&keywords[i].as_str()) {
                push_unique(&mut keywords, base);
            }
        }
    }
    keywords
}

fn push_unique(keywords: &mut Vec<String>, word: &str) {
    if !word.is_empty() && !keywords.iter().any(|k| k == word) {
        keywords.push(word.to_string());
    }
}

/// Rule-based intent with its confidence.
///
/// Every matching phrasing pattern scores 0.8, the dominant taxonomy
/// category among `keywords` scores 0.9, and 查询 at 0.6 is the default.
/// The highest score wins; earlier candidates win ties.
pub fn detect_intent(query: &str, keywords: &[String]) -> (Intent, f64) {
    let mut candidates: Vec<(Intent, f64)> = patterns()
        .intents
        .iter()
        .filter(|(_, re)| re.is_match(query))
        .map(|(intent, _)| (*intent, INTENT_PATTERN_CONFIDENCE))
        .collect();

    if let Some((category, _)) = taxonomy::best_category(keywords, false) {
        candidates.push((Intent::Category(category), INTENT_CATEGORY_CONFIDENCE));
    }

    candidates
        .into_iter()
        .fold(None, |best: Option<(Intent, f64)>, cand| match best {
            Some(b) if b.1 >= cand.1 => Some(b),
            _ => Some(cand),
        })
        .unwrap_or((Intent::Query, INTENT_DEFAULT_CONFIDENCE))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kws(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn keywords_are_unique() {
        let keywords = extract_keywords("信用卡 信用卡 额度");
        let mut sorted = keywords.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), keywords.len());
    }

    #[test]
    fn numbers_and_phrases_are_kept() {
        let keywords = extract_keywords("大额存单利率3.5%");
        assert!(keywords.contains(&"3.5%".to_string()), "got {keywords:?}");
        assert!(keywords.contains(&"大额存单".to_string()), "got {keywords:?}");
    }

    #[test]
    fn synonyms_add_base_word() {
        let keywords = extract_keywords("汇款手续费");
        assert!(keywords.contains(&"汇款".to_string()), "got {keywords:?}");
        assert!(keywords.contains(&"转账".to_string()), "got {keywords:?}");
    }

    #[test]
    fn phrase_patterns_score_point_eight() {
        assert_eq!(detect_intent("遇到错误", &[]), (Intent::Problem, 0.8));
        assert_eq!(detect_intent("两者有何区别", &[]), (Intent::Compare, 0.8));
        // 如何 matches both 查询 and 办理; the first declared wins.
        assert_eq!(detect_intent("如何开户", &[]), (Intent::Query, 0.8));
    }

    #[test]
    fn dominant_category_beats_patterns() {
        let (intent, conf) = detect_intent("如何提额", &kws(&["额度", "信用卡"]));
        assert_eq!(intent, Intent::Category("信用卡"));
        assert_eq!(conf, 0.9);
        assert_eq!(intent.label(), "信用卡");
    }

    #[test]
    fn default_intent_is_query() {
        assert_eq!(detect_intent("你好", &kws(&["你好"])), (Intent::Query, 0.6));
    }

    #[test]
    fn analysis_normalises_before_extracting() {
        let a = QueryAnalysis::new("  转账手续费是多少？ ");
        assert_eq!(a.normalized, "转账手续费是多少");
        assert_eq!(a.categories, vec!["支付结算"]);
        assert!(a.keywords.contains(&"转账".to_string()));
        assert_eq!(a.intent, Intent::Category("支付结算"));
    }

    #[test]
    fn intent_serialises_as_label() {
        let json = serde_json::to_string(&Intent::Apply).unwrap();
        assert_eq!(json, "\"办理\"");
    }
}
