//! Best-effort recovery of FAQ records from a damaged knowledge-base file.
//!
//! Well-formed record objects are pulled out of the text with a regex, so a
//! truncated file or a stray comma only loses the records it touches. When
//! nothing can be recovered the caller falls back to [`minimal_records`].

use std::sync::OnceLock;

use regex::Regex;

use super::FaqRecord;

fn record_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?s)\s*\{\s*"id"\s*:\s*(\d+)\s*,\s*"question"\s*:\s*"([^"]+)"\s*,\s*"answer"\s*:\s*"([^"]+)"\s*,\s*"keywords"\s*:\s*\[(.*?)\]\s*,\s*"category"\s*:\s*"([^"]+)"\s*\}"#,
        )
        .expect("record pattern is valid")
    })
}

fn quoted_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""([^"]+)""#).expect("quoted pattern is valid"))
}

/// Extract every well-formed record from `text`, in file order.
///
/// Records whose id does not fit in a `u64` are skipped. Duplicate ids are
/// kept; the store decides what to do with them.
pub fn extract_records(text: &str) -> Vec<FaqRecord> {
    record_re()
        .captures_iter(text)
        .filter_map(|caps| {
            let id = caps[1].parse::<u64>().ok()?;
            let keywords = quoted_re()
                .captures_iter(&caps[4])
                .map(|k| k[1].to_string())
                .collect();
            Some(FaqRecord {
                id,
                question: caps[2].to_string(),
                answer: caps[3].to_string(),
                keywords,
                category: caps[5].to_string(),
            })
        })
        .collect()
}

/// Knowledge base used when the file cannot be read at all.
pub fn default_records() -> Vec<FaqRecord> {
    vec![
        FaqRecord {
            id: 1,
            question: "如何开立银行账户?".into(),
            answer: "开立银行账户需要您携带有效身份证件(身份证/护照)、手机号码等到银行网点办理。"
                .into(),
            keywords: vec!["开户".into(), "开立账户".into(), "银行账户".into()],
            category: "账户服务".into(),
        },
        FaqRecord {
            id: 2,
            question: "银行卡丢失了怎么办?".into(),
            answer: "银行卡丢失后，请立即拨打银行客服热线挂失卡片，并前往银行网点补办新卡。"
                .into(),
            keywords: vec!["银行卡丢失".into(), "丢卡".into(), "挂失".into()],
            category: "账户安全".into(),
        },
    ]
}

/// Single-record knowledge base used when repair recovers nothing.
pub fn minimal_records() -> Vec<FaqRecord> {
    default_records().into_iter().take(1).collect()
}
