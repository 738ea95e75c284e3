//! Fuzzy string similarity on a 0–100 scale.
//!
//! The four scorers follow the usual fuzzy-matching family: a plain indel
//! ratio, the best-window partial ratio, and the sorted-token and token-set
//! variants. Inputs are processed first (lowercase, non-word characters to
//! spaces, trimmed). CJK text is kept; a run of CJK characters without spaces
//! is a single token.

use std::collections::BTreeSet;

/// Lowercase, replace every non-word character with a space, trim.
pub fn process(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

/// Similarity of two strings as `2·LCS / (|a| + |b|)`, scaled to 0–100.
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

fn ratio_chars(a: &[char], b: &[char]) -> u8 {
    let total = a.len() + b.len();
    if total == 0 || a.is_empty() || b.is_empty() {
        return 0;
    }
    let common = lcs_len(a, b);
    (200.0 * common as f64 / total as f64).round() as u8
}

/// Longest common subsequence length, two-row dynamic programme.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(cur[j])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// Best [`ratio`] of the shorter string against every equally long window
/// of the longer one.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = process(a).chars().collect();
    let b: Vec<char> = process(b).chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return 0;
    }
    let mut best = 0;
    for window in long.windows(short.len()) {
        let r = ratio_chars(&short, window);
        if r == 100 {
            return 100;
        }
        best = best.max(r);
    }
    best
}

fn sorted_tokens(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = process(text).split_whitespace().map(str::to_string).collect();
    tokens.sort();
    tokens
}

/// [`ratio`] after sorting each side's tokens alphabetically.
pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    let a = sorted_tokens(a).join(" ");
    let b = sorted_tokens(b).join(" ");
    ratio(&a, &b)
}

/// Token-set ratio: compares the shared tokens against each side's shared
/// plus remaining tokens and keeps the best of the three pairings.
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    let pa = process(a);
    let pb = process(b);
    if pa.is_empty() || pb.is_empty() {
        return 0;
    }
    let ta: BTreeSet<&str> = pa.split_whitespace().collect();
    let tb: BTreeSet<&str> = pb.split_whitespace().collect();

    let join = |set: Vec<&str>| set.join(" ");
    let sect = join(ta.intersection(&tb).copied().collect());
    let only_a = join(ta.difference(&tb).copied().collect());
    let only_b = join(tb.difference(&ta).copied().collect());

    let combined_a = format!("{sect} {only_a}").trim().to_string();
    let combined_b = format!("{sect} {only_b}").trim().to_string();

    ratio(&sect, &combined_a)
        .max(ratio(&sect, &combined_b))
        .max(ratio(&combined_a, &combined_b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_100() {
        assert_eq!(ratio("信用卡年费", "信用卡年费"), 100);
        assert_eq!(token_set_ratio("如何开立银行账户?", "如何开立银行账户"), 100);
        assert_eq!(token_sort_ratio("a b", "b a"), 100);
        assert_eq!(partial_ratio("银行卡", "银行卡丢失了怎么办"), 100);
    }

    #[test]
    fn ratio_uses_common_subsequence() {
        // LCS 2 over 4 + 4 chars.
        assert_eq!(ratio("开户流程", "开卡流水"), 50);
        assert_eq!(ratio("abc", "xyz"), 0);
        assert_eq!(ratio("", "abc"), 0);
    }

    #[test]
    fn process_strips_punctuation_and_case() {
        assert_eq!(process("  LPR？是 什么!"), "lpr 是 什么");
    }

    #[test]
    fn token_set_ignores_duplicates_and_extra_tokens() {
        assert_eq!(token_set_ratio("信用卡 额度", "额度 信用卡 信用卡"), 100);
        // Shared tokens fully cover the shorter side.
        assert_eq!(token_set_ratio("额度", "额度 提升"), 100);
    }

    #[test]
    fn empty_inputs_score_zero() {
        assert_eq!(token_set_ratio("", "abc"), 0);
        assert_eq!(token_sort_ratio("？", "abc"), 0);
        assert_eq!(partial_ratio("", ""), 0);
    }

    #[test]
    fn partial_ratio_finds_best_window() {
        // "开立" window inside the longer string.
        assert_eq!(partial_ratio("开立", "如何开立银行账户"), 100);
        assert!(partial_ratio("开个", "如何开立银行账户") >= 50);
    }
}
