//! キーワード抽出（字句解析）
//!
//! 生クエリを句読点・停止字で区切ってトークン化し、口語表現の標準語と
//! 手作業ルールによる優先キーワードを付け加える。追加は常に加算的で、
//! 元のトークンは削除しない。

use crate::lexicon::{Lexicon, OperateRule};
use regex::Regex;
use tracing::{debug, warn};

/// 区切りとして空白に置き換える文字（句読点と停止字「的・是・在」）
const STOP_CHARS: &[char] = &[
    '，', '。', '、', '！', '？', '：', '；', '“', '”', '‘', '’', '"', '\'', '（', '）', '(',
    ')', '[', ']', '【', '】', ',', '.', '!', '?', ':', ';', '的', '是', '在',
];

/// キーワード抽出結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordExtraction {
    /// 元のトークン＋口語・ルール由来の追加語
    pub keywords: Vec<String>,
    /// 手作業ルールで検出した高信頼の語（スコア90の段に使う）
    pub priority_keywords: Vec<String>,
}

/// 挿入順を保ったまま重複なしで追加
pub(crate) fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|existing| existing == value) {
        list.push(value.to_string());
    }
}

/// クエリからキーワードを抽出
///
/// 空または空白のみのクエリは空の結果を返す。`operate` は語彙の
/// 操作ルールをコンパイルしたもの（[`OperatePattern::from_lexicon`]）。
pub fn extract_keywords(query: &str, lexicon: &Lexicon, operate: Option<&OperatePattern>) -> KeywordExtraction {
    let mut extraction = KeywordExtraction::default();
    if query.trim().is_empty() {
        return extraction;
    }

    let tokens = tokenize(query, &lexicon.role_suffixes);
    for token in &tokens {
        push_unique(&mut extraction.keywords, token);
    }

    // 口語表現（トークンが口語を含めば標準語を追加）
    for token in &tokens {
        for group in &lexicon.colloquial {
            if token.contains(group.term.as_str()) {
                for standard in &group.variants {
                    push_unique(&mut extraction.keywords, standard);
                }
            }
        }
    }

    // 優先ルールは生クエリに対して適用
    for rule in &lexicon.priority_rules {
        if rule.triggers.iter().any(|t| !t.is_empty() && query.contains(t.as_str())) {
            debug!(rule = %rule.name, "priority rule matched");
            for term in &rule.priority {
                push_unique(&mut extraction.priority_keywords, term);
            }
            for term in &rule.expand {
                push_unique(&mut extraction.keywords, term);
            }
        }
    }

    if let Some(pattern) = operate {
        pattern.apply(query, &mut extraction);
    }

    extraction
}

/// 句読点・停止字で区切り、有意なトークンだけ残す
///
/// 2文字以上、または職種接尾字（工・员・师・手など）単独のトークンを残す。
pub fn tokenize(query: &str, role_suffixes: &[String]) -> Vec<String> {
    let cleaned: String = query
        .chars()
        .map(|c| if STOP_CHARS.contains(&c) { ' ' } else { c })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|word| word.chars().count() >= 2 || role_suffixes.iter().any(|s| s.as_str() == *word))
        .map(|word| word.to_string())
        .collect()
}

/// コンパイル済みの「开XX」パターン
///
/// 語彙の読み込み時に一度だけ作り、クエリごとに使い回す。
#[derive(Debug, Clone)]
pub struct OperatePattern {
    regex: Regex,
    rule: OperateRule,
}

impl OperatePattern {
    /// マーカーが空、または目的語の長さが0ならNone
    pub fn compile(rule: &OperateRule) -> Option<Self> {
        if rule.marker.is_empty() || rule.max_object_chars == 0 {
            return None;
        }
        let pattern = format!("{}(.{{1,{}}})", regex::escape(&rule.marker), rule.max_object_chars);
        match Regex::new(&pattern) {
            Ok(regex) => Some(Self {
                regex,
                rule: rule.clone(),
            }),
            Err(e) => {
                warn!(marker = %rule.marker, error = %e, "operate pattern rejected");
                None
            }
        }
    }

    /// 語彙の操作ルールをコンパイル
    pub fn from_lexicon(lexicon: &Lexicon) -> Option<Self> {
        lexicon.operate_rule.as_ref().and_then(Self::compile)
    }

    /// 「开XX」から操作対象XXを取り出す
    pub fn extract(&self, query: &str) -> Option<String> {
        let captured = self.regex.captures(query)?.get(1)?.as_str();

        let object = if self.rule.strip_suffix.is_empty() {
            captured
        } else {
            captured.strip_suffix(self.rule.strip_suffix.as_str()).unwrap_or(captured)
        };
        let object = object.trim();

        (!object.is_empty()).then(|| object.to_string())
    }

    fn apply(&self, query: &str, extraction: &mut KeywordExtraction) {
        let Some(object) = self.extract(query) else {
            return;
        };
        debug!(object = %object, "operate pattern matched");

        push_unique(&mut extraction.keywords, &object);
        push_unique(&mut extraction.priority_keywords, &object);

        for alias in &self.rule.aliases {
            if object.contains(alias.term.as_str()) {
                for standard in &alias.variants {
                    push_unique(&mut extraction.priority_keywords, standard);
                    push_unique(&mut extraction.keywords, standard);
                }
            }
        }
    }
}
