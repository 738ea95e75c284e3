//! Query normalisation: whitespace and punctuation stripping followed by
//! canonicalisation of common synonymous phrasings.

use std::sync::OnceLock;

use regex::Regex;

/// Phrasing rewrites, applied in order.
const REWRITES: &[(&str, &str)] = &[
    ("怎么样|怎样|如何", "如何"),
    ("能不能|可不可以|是否可以", "可以"),
    ("什么是|是什么", "什么是"),
    ("哪些|有哪些|有什么", "哪些"),
    ("多少钱|什么价格|价格是|费用是", "多少钱"),
    ("(想|要)?(开|办)一?(个|张)", "开立"),
];

struct Patterns {
    whitespace: Regex,
    punctuation: Regex,
    rewrites: Vec<(Regex, &'static str)>,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        whitespace: Regex::new(r"\s+").expect("whitespace pattern is valid"),
        punctuation: Regex::new(r"[?？!！.。,，:：;；]").expect("punctuation pattern is valid"),
        rewrites: REWRITES
            .iter()
            .map(|(pat, to)| (Regex::new(pat).expect("rewrite pattern is valid"), *to))
            .collect(),
    })
}

/// Normalise a raw user query. Idempotent.
pub fn normalize(query: &str) -> String {
    let p = patterns();
    let collapsed = p.whitespace.replace_all(query, " ");
    let mut text = p.punctuation.replace_all(collapsed.trim(), " ").trim().to_string();
    for (re, to) in &p.rewrites {
        text = re.replace_all(&text, *to).into_owned();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation_and_whitespace() {
        assert_eq!(normalize("  银行卡丢失了怎么办?  "), "银行卡丢失了怎么办");
        assert_eq!(normalize("转账，  手续费！"), "转账  手续费");
    }

    #[test]
    fn canonicalises_phrasings() {
        assert_eq!(normalize("今天天气怎么样"), "今天天气如何");
        assert_eq!(normalize("能不能提前还款"), "可以提前还款");
        assert_eq!(normalize("LPR是什么"), "LPR什么是");
        assert_eq!(normalize("有哪些理财产品"), "哪些理财产品");
        assert_eq!(normalize("年费是多少钱"), "年费是多少钱");
        assert_eq!(normalize("我想开个银行卡"), "我开立银行卡");
        assert_eq!(normalize("要办一张信用卡"), "开立信用卡");
    }

    #[test]
    fn is_idempotent() {
        for q in ["如何开立银行账户?", "信用卡 额度 怎样 提高？", "什么是大额存单", "想办张卡"] {
            let once = normalize(q);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn empty_stays_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" ？ "), "");
    }
}
