//! Chinese word segmentation shared by the lexical index and the extractor.
//!
//! One process-wide [`Jieba`] instance, built lazily and seeded with every
//! taxonomy term and specialised banking word so domain phrases such as
//! 大额存单 or 手机银行 survive segmentation as single tokens.

use std::sync::OnceLock;

use jieba_rs::{Jieba, KeywordExtract, TfIdf};

use crate::subsystems::knowledge::taxonomy;

static JIEBA: OnceLock<Jieba> = OnceLock::new();
static TFIDF: OnceLock<TfIdf> = OnceLock::new();

fn jieba() -> &'static Jieba {
    JIEBA.get_or_init(|| {
        let mut jieba = Jieba::new();
        for word in taxonomy::vocabulary() {
            jieba.add_word(word, None, None);
        }
        jieba
    })
}

fn tfidf() -> &'static TfIdf {
    TFIDF.get_or_init(TfIdf::default)
}

/// Precise-mode segmentation with HMM for unknown words.
pub fn cut(text: &str) -> Vec<&str> {
    jieba().cut(text, true)
}

/// Tokens used for lexical weighting: lowercased, with whitespace and
/// punctuation-only tokens removed.
pub fn index_tokens(text: &str) -> Vec<String> {
    cut(text)
        .into_iter()
        .filter(|t| t.chars().any(char::is_alphanumeric))
        .map(str::to_lowercase)
        .collect()
}

/// Up to `top_k` salient words of `text`, most salient first.
///
/// Single-character words and stop words are never returned.
pub fn salient_terms(text: &str, top_k: usize) -> Vec<String> {
    tfidf()
        .extract_keywords(jieba(), text, top_k, Vec::new())
        .into_iter()
        .map(|k| k.keyword)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_terms_stay_whole() {
        let words = cut("我想买大额存单");
        assert!(words.contains(&"大额存单"), "got {words:?}");
    }

    #[test]
    fn index_tokens_drop_punctuation_and_lowercase() {
        let tokens = index_tokens("LPR 是什么？");
        assert!(tokens.contains(&"lpr".to_string()), "got {tokens:?}");
        assert!(tokens.iter().all(|t| t != "？" && !t.trim().is_empty()));
    }

    #[test]
    fn salient_terms_skip_single_chars() {
        let terms = salient_terms("信用卡的年费是多少", 8);
        assert!(terms.contains(&"信用卡".to_string()), "got {terms:?}");
        assert!(terms.iter().all(|t| t.chars().count() > 1));
    }

    #[test]
    fn salient_terms_respect_top_k() {
        assert!(salient_terms("贷款利率 房贷 车贷 征信 逾期 还款 额度", 3).len() <= 3);
        assert!(salient_terms("", 5).is_empty());
    }
}
