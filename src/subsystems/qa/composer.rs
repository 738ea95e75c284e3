//! Answer composition: confidence-dependent hedging for matched records and
//! intent-specific templates when nothing matched.
//!
//! Phrase choice is random; callers inject the generator so tests can seed it.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::config::ComposerConfig;

use super::extract::{Intent, QueryAnalysis};

/// Hedges put in front of a moderately confident answer.
pub const PREFIXES: &[&str] = &["根据您的问题，", "您可能想了解的是，", "对于这个问题，", "针对您的咨询，"];

const SUFFIXES: &[&str] = &[
    "如果这不是您想了解的内容，请尝试更详细地描述您的问题。",
    "希望这个回答对您有所帮助，如需更多信息，请告诉我。",
    "如果您有更具体的问题，请随时咨询。",
];

/// Fallback templates; `{}` is replaced by the keyword summary.
const QUERY_TEMPLATES: &[&str] = &[
    "很抱歉，我目前没有关于\"{}\"的详细信息。您可以尝试咨询银行客服或前往银行网点获取准确信息。",
    "对于\"{}\"的查询，我暂时没有找到匹配的信息。您可以换个方式提问，或直接联系银行客服热线。",
    "关于\"{}\"的信息，我的知识库暂时没有收录。建议您通过手机银行APP或官方网站查询最新信息。",
];

const APPLY_TEMPLATES: &[&str] = &[
    "关于如何办理\"{}\"，我目前没有具体的操作流程。建议您携带有效身份证件前往银行网点咨询。",
    "办理\"{}\"的具体要求可能因银行而异。建议您致电银行客服热线或访问官方网站了解详情。",
    "很抱歉，我无法提供关于\"{}\"的办理指南。您可以通过银行APP预约办理或前往网点咨询。",
];

const PROBLEM_TEMPLATES: &[&str] = &[
    "对于您遇到的\"{}\"问题，我建议您联系银行客服热线获取专业解答和帮助。",
    "很抱歉，我无法解决您关于\"{}\"的具体问题。请联系银行客服或前往网点寻求帮助。",
    "关于\"{}\"的问题可能需要专业人员处理。建议您拨打银行客服热线或在手机银行APP上提交反馈。",
];

const OTHER_TEMPLATES: &[&str] = &[
    "很抱歉，我无法回答关于\"{}\"的问题。您可以尝试重新表述或咨询更具体的问题。",
    "对于\"{}\"，我目前没有相关信息。您可以联系银行客服获取更准确的答案。",
    "我的知识库中没有关于\"{}\"的信息。建议您通过官方渠道获取准确答案。",
];

/// Keywords shown in a fallback answer.
const FALLBACK_KEYWORDS: usize = 3;
/// Characters of the query shown when there are no keywords.
const FALLBACK_QUERY_CHARS: usize = 10;

fn pick<R: Rng + ?Sized>(phrases: &[&'static str], rng: &mut R) -> &'static str {
    phrases.choose(rng).copied().unwrap_or_default()
}

/// Format a matched record's `answer` for the given match `confidence`.
pub fn compose_match<R: Rng + ?Sized>(
    config: &ComposerConfig,
    answer: &str,
    confidence: f64,
    rng: &mut R,
) -> String {
    if confidence > config.verbatim_above {
        answer.to_string()
    } else if confidence >= config.prefix_from {
        format!("{}{answer}", pick(PREFIXES, rng))
    } else {
        format!("{answer}\n\n{}", pick(SUFFIXES, rng))
    }
}

/// Templated non-answer naming what was asked, followed by numbered
/// `similar` question suggestions when there are any.
pub fn compose_fallback<R: Rng + ?Sized>(
    analysis: &QueryAnalysis,
    similar: &[&str],
    rng: &mut R,
) -> String {
    let templates = match analysis.intent {
        Intent::Query => QUERY_TEMPLATES,
        Intent::Apply => APPLY_TEMPLATES,
        Intent::Problem => PROBLEM_TEMPLATES,
        _ => OTHER_TEMPLATES,
    };
    let subject = if analysis.keywords.is_empty() {
        let head: String = analysis.normalized.chars().take(FALLBACK_QUERY_CHARS).collect();
        format!("{head}...")
    } else {
        analysis
            .keywords
            .iter()
            .take(FALLBACK_KEYWORDS)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("、")
    };

    let mut text = pick(templates, rng).replacen("{}", &subject, 1);
    if !similar.is_empty() {
        text.push_str("\n\n您可能想问的是：\n");
        for (i, question) in similar.iter().enumerate() {
            text.push_str(&format!("{}. {question}\n", i + 1));
        }
    }
    text
}
