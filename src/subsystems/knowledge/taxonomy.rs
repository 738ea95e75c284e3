//! Banking keyword taxonomy — fixed category → domain-term mapping.
//!
//! Read-only at runtime. Seeds the tokenizer vocabulary and drives category
//! relevance scoring.

/// Label used for records whose category cannot be inferred.
pub const UNCATEGORIZED: &str = "其他";

pub const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "账户服务",
        &["账户", "开户", "开卡", "销户", "冻结", "解冻", "余额", "账号", "卡号", "存折"],
    ),
    (
        "贷款服务",
        &[
            "贷款", "房贷", "车贷", "消费贷", "信用贷", "抵押", "利率", "还款", "本金", "利息",
            "LPR", "贷记", "借记",
        ],
    ),
    (
        "信用卡",
        &[
            "信用卡", "额度", "提额", "账单", "分期", "刷卡", "还款日", "免息期", "年费", "积分",
            "取现",
        ],
    ),
    (
        "理财投资",
        &[
            "理财", "投资", "基金", "股票", "债券", "收益", "风险", "本金", "利息", "收益率",
            "风险等级",
        ],
    ),
    (
        "存款服务",
        &[
            "存款", "定期", "活期", "大额存单", "智能存款", "存单", "利率", "利息", "存期",
            "提前支取",
        ],
    ),
    (
        "电子银行",
        &["网银", "手机银行", "APP", "电子银行", "在线", "线上", "数字", "移动", "指纹", "人脸识别"],
    ),
    (
        "支付结算",
        &["转账", "汇款", "支付", "收款", "二维码", "扫码", "手续费", "到账", "快捷支付", "跨境"],
    ),
    (
        "账户安全",
        &["密码", "挂失", "冻结", "解冻", "风控", "安全", "诈骗", "盗刷", "短信通知", "验证码"],
    ),
    (
        "网点服务",
        &["网点", "柜台", "营业厅", "营业时间", "排队", "预约", "大堂", "工作日", "周末", "假日"],
    ),
    (
        "征信服务",
        &["征信", "信用", "信用记录", "信用报告", "逾期", "黑名单", "白名单", "人行", "央行"],
    ),
];

/// Banking terms added to the segmenter dictionary on top of the taxonomy.
pub const SPECIALIZED_TERMS: &[&str] = &[
    "LPR", "ATM", "POS", "CRS", "ETC", "NFC", "OTP", "CVV", "AUM", "IPO",
    "理财产品", "结构性存款", "大额存单", "智能存款", "存款证明",
    "房贷", "车贷", "消费贷", "经营贷", "按揭贷款", "抵押贷款", "信用贷款",
    "开立", "银行卡", "银行账户",
    "信用卡", "储蓄卡", "借记卡", "贷记卡", "预付卡", "联名卡", "白金卡", "钻石卡",
    "手机银行", "网上银行", "电话银行", "短信银行", "自助银行",
    "跨境汇款", "电子支付", "快捷支付", "二维码支付", "指纹支付", "人脸支付",
    "征信报告", "信用记录", "逾期记录", "失信记录", "征信查询",
    "风险等级", "收益率", "年化收益", "本金保障", "浮动收益",
];

/// Terms of `category`, or `None` for labels outside the taxonomy.
pub fn terms(category: &str) -> Option<&'static [&'static str]> {
    CATEGORIES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, terms)| *terms)
}

/// True when `word` is listed under any category.
pub fn contains_term(word: &str) -> bool {
    CATEGORIES.iter().any(|(_, terms)| terms.contains(&word))
}

/// Every category that has at least one term occurring in `text`, in
/// declaration order.
pub fn categories_in(text: &str) -> Vec<&'static str> {
    CATEGORIES
        .iter()
        .filter(|(_, terms)| terms.iter().any(|t| text.contains(t)))
        .map(|(name, _)| *name)
        .collect()
}

/// Category with the most keyword hits, if any keyword hits at all.
///
/// A keyword hits a category when it is one of its terms, or when
/// `substring_hits` is set and the keyword occurs inside one of its terms.
/// Ties resolve to the category that was hit first, walking `keywords` in
/// order (and categories in declaration order for one keyword).
pub fn best_category(keywords: &[String], substring_hits: bool) -> Option<(&'static str, usize)> {
    let mut tally: Vec<(&'static str, usize)> = Vec::new();
    for kw in keywords {
        for (name, terms) in CATEGORIES {
            let hit = terms.contains(&kw.as_str())
                || (substring_hits && terms.iter().any(|t| t.contains(kw.as_str())));
            if !hit {
                continue;
            }
            match tally.iter_mut().find(|(n, _)| n == name) {
                Some((_, count)) => *count += 1,
                None => tally.push((name, 1)),
            }
        }
    }
    tally
        .into_iter()
        .fold(None, |best, (name, hits)| match best {
            Some((_, n)) if n >= hits => best,
            _ => Some((name, hits)),
        })
}

/// Every distinct domain term (taxonomy + specialised vocabulary).
pub fn vocabulary() -> impl Iterator<Item = &'static str> {
    let mut seen = std::collections::HashSet::new();
    CATEGORIES
        .iter()
        .flat_map(|(_, terms)| terms.iter().copied())
        .chain(SPECIALIZED_TERMS.iter().copied())
        .filter(move |t| seen.insert(*t))
}
