//! 語彙テーブルモジュール
//!
//! 同義語・業種トリガー・口語表現・優先ルールなどの静的な関連データ。
//! 組み込み版は `data/lexicon.json` を埋め込んだもので、外部JSONで
//! 上書き・追加できる（コードを変えずに辞書を更新するため）。

use crate::error::Result;
use serde::{Deserialize, Serialize};

const BUILTIN_LEXICON: &str = include_str!("../data/lexicon.json");

lazy_static::lazy_static! {
    static ref BUILTIN: Lexicon = Lexicon::from_json(BUILTIN_LEXICON)
        .expect("bundled data/lexicon.json must be valid");
}

/// 見出し語とその変形のリスト
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermGroup {
    pub term: String,
    #[serde(default)]
    pub variants: Vec<String>,
}

/// 業種ラベルとトリガー語
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustryTriggers {
    pub industry: String,
    #[serde(default)]
    pub triggers: Vec<String>,
}

/// 生クエリに対する優先キーワードルール
///
/// `triggers` のいずれかがクエリに含まれれば `priority` を優先キーワードに、
/// `expand` を通常キーワードに追加する。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityRule {
    #[serde(default)]
    pub name: String,
    pub triggers: Vec<String>,
    #[serde(default)]
    pub priority: Vec<String>,
    #[serde(default)]
    pub expand: Vec<String>,
}

/// 「开XX」（XXを運転・操作する）パターン
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperateRule {
    pub marker: String,
    #[serde(default = "default_max_object_chars")]
    pub max_object_chars: usize,
    #[serde(default)]
    pub strip_suffix: String,
    /// 目的語がこの語を含む場合に追加する標準語
    #[serde(default)]
    pub aliases: Vec<TermGroup>,
}

fn default_max_object_chars() -> usize {
    4
}

/// 汎用の部分一致では拾いにくい職業の手作業クロスリファレンス
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossReference {
    pub trigger: String,
    #[serde(default)]
    pub name_patterns: Vec<String>,
}

/// 語彙テーブル全体
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lexicon {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub synonyms: Vec<TermGroup>,
    #[serde(default)]
    pub industries: Vec<IndustryTriggers>,
    #[serde(default)]
    pub colloquial: Vec<TermGroup>,
    #[serde(default)]
    pub priority_rules: Vec<PriorityRule>,
    #[serde(default)]
    pub operate_rule: Option<OperateRule>,
    #[serde(default)]
    pub cross_references: Vec<CrossReference>,
    #[serde(default)]
    pub negation_markers: Vec<String>,
    #[serde(default)]
    pub role_suffixes: Vec<String>,
}

impl Lexicon {
    /// 組み込み語彙
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// JSONファイルから読み込み
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// JSON文字列から読み込み
    pub fn from_json(json: &str) -> Result<Self> {
        let lexicon: Self = serde_json::from_str(json)?;
        Ok(lexicon)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 見出し語に完全一致する同義語
    pub fn synonyms_of(&self, term: &str) -> Option<&[String]> {
        self.synonyms
            .iter()
            .find(|group| group.term == term)
            .map(|group| group.variants.as_slice())
    }

    /// 設定をマージ（後から追加した設定が優先）
    ///
    /// 同じ見出し語のエントリは置き換え、新しい見出し語は末尾に追加する。
    /// 優先ルールは `name` で照合し、名前のないルールは常に末尾に追加する。
    pub fn merge(&mut self, other: &Lexicon) {
        self.version = self.version.max(other.version);
        merge_by_key(&mut self.synonyms, &other.synonyms, |g| g.term.as_str());
        merge_by_key(&mut self.industries, &other.industries, |i| i.industry.as_str());
        merge_by_key(&mut self.colloquial, &other.colloquial, |g| g.term.as_str());
        for rule in &other.priority_rules {
            // 名前のないルールは常に追加
            if rule.name.is_empty() {
                self.priority_rules.push(rule.clone());
            } else {
                merge_by_key(&mut self.priority_rules, std::slice::from_ref(rule), |r| r.name.as_str());
            }
        }
        merge_by_key(&mut self.cross_references, &other.cross_references, |c| c.trigger.as_str());
        if other.operate_rule.is_some() {
            self.operate_rule = other.operate_rule.clone();
        }
        for marker in &other.negation_markers {
            if !self.negation_markers.contains(marker) {
                self.negation_markers.push(marker.clone());
            }
        }
        for suffix in &other.role_suffixes {
            if !self.role_suffixes.contains(suffix) {
                self.role_suffixes.push(suffix.clone());
            }
        }
    }
}

fn merge_by_key<T, F>(base: &mut Vec<T>, other: &[T], key: F)
where
    T: Clone,
    F: Fn(&T) -> &str,
{
    for entry in other {
        match base.iter_mut().find(|existing| key(existing) == key(entry)) {
            Some(existing) => *existing = entry.clone(),
            None => base.push(entry.clone()),
        }
    }
}
