//! 分類結果の型定義
//!
//! CLIとライブラリ利用側で共有される型:
//! - OccupationDefinition: 職業分類表の1行
//! - MatchResult / RetrievalResult: 検索（Retrieval）段階の出力
//! - DecisionResult: AI決定段階の出力

use serde::{Deserialize, Serialize};
use std::fmt;

/// リスク等級（0 = 拒保・人手審査, 1〜6 = 引受可能な等級）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct RiskCategory(u8);

impl RiskCategory {
    pub const REJECTED: RiskCategory = RiskCategory(0);
    pub const MAX: u8 = 6;

    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_rejected(self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<u8> for RiskCategory {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("risk category out of range (0-6): {}", value))
    }
}

impl From<RiskCategory> for u8 {
    fn from(category: RiskCategory) -> u8 {
        category.0
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_rejected() {
            write!(f, "拒保")
        } else {
            write!(f, "{}类", self.0)
        }
    }
}

/// 職業定義（分類表の1行、実行中は不変）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupationDefinition {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub group: String,
    pub category: RiskCategory,
}

/// 候補がどのパスで採用されたか
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchType {
    Exact,
    PriorityKeyword,
    SpecialCrossRef,
    Keyword,
    Synonym,
    Industry,
    Fuzzy,
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchType::Exact => "精确匹配",
            MatchType::PriorityKeyword => "核心关键词匹配",
            MatchType::SpecialCrossRef => "特殊匹配",
            MatchType::Keyword => "关键词匹配",
            MatchType::Synonym => "同义词匹配",
            MatchType::Industry => "行业匹配",
            MatchType::Fuzzy => "相似度匹配",
        };
        write!(f, "{}", label)
    }
}

/// 検索候補
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub occupation: OccupationDefinition,
    /// 0〜100
    pub score: f64,
    pub match_type: MatchType,
    pub match_reason: String,
}

/// クエリ解析結果（1リクエストにつき1回だけ生成）
///
/// 各リストは挿入順を保持した重複なしの列。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryAnalysis {
    pub original_query: String,
    pub extracted_keywords: Vec<String>,
    pub expanded_terms: Vec<String>,
    pub possible_industries: Vec<String>,
    pub negative_constraints: Vec<String>,
}

/// 検索段階の出力
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalResult {
    pub candidates: Vec<MatchResult>,
    pub query_analysis: QueryAnalysis,
}

impl RetrievalResult {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn top(&self) -> Option<&MatchResult> {
        self.candidates.first()
    }
}

/// 代替候補（AIが挙げた次点）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeMatch {
    pub occupation: OccupationDefinition,
    pub reason: String,
}

/// 決定結果の出どころ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DecisionSource {
    /// 候補なし
    NoCandidates,
    /// 高スコア単一候補のためAI呼び出しを省略
    ShortCircuit,
    /// AIの応答から決定
    Provider,
    /// AI呼び出し失敗・応答解析失敗による降格
    Fallback,
}

/// AI決定結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResult {
    pub selected_occupation: Option<OccupationDefinition>,
    /// 0〜100
    pub confidence: u8,
    pub reasoning: String,
    pub need_more_info: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_questions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_matches: Option<Vec<AlternativeMatch>>,
    pub source: DecisionSource,
}
