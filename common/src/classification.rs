//! 分類結果の組み立て
//!
//! 検索結果とAI決定から、画面・CLI表示用のランキングを作る。

use crate::decision::short_circuit;
use crate::types::{DecisionResult, DecisionSource, MatchResult, OccupationDefinition, QueryAnalysis, RetrievalResult, RiskCategory};
use serde::{Deserialize, Serialize};

/// 表示する結果の最大件数
pub const MAX_RESULTS: usize = 5;

/// 結果がこれ未満なら検索候補で補充する
pub const MIN_RESULTS: usize = 3;

/// AIが挙げた代替候補の表示上限
pub const MAX_ALTERNATIVES: usize = 2;

/// 代替候補の信頼度
pub const ALTERNATIVE_CONFIDENCE: f64 = 0.6;

/// 分類結果1件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupationResult {
    pub code: String,
    pub industry: String,
    pub standard_name: String,
    pub category: RiskCategory,
    pub description: String,
    /// 0.0〜1.0
    pub confidence_score: f64,
}

impl OccupationResult {
    pub fn new(occupation: &OccupationDefinition, description: String, confidence_score: f64) -> Self {
        Self {
            code: occupation.code.clone(),
            industry: occupation.industry.clone(),
            standard_name: occupation.name.clone(),
            category: occupation.category,
            description,
            confidence_score,
        }
    }

    fn from_candidate(candidate: &MatchResult, label: &str) -> Self {
        Self::new(
            &candidate.occupation,
            format!("{}: {}", label, candidate.match_reason),
            candidate.score / 100.0,
        )
    }
}

/// AI決定の要約
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionSummary {
    pub confidence: u8,
    pub reasoning: String,
    pub need_more_info: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_questions: Option<Vec<String>>,
    pub source: DecisionSource,
}

/// 分類レスポンス全体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResponse {
    pub results: Vec<OccupationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_decision: Option<DecisionSummary>,
    pub query_analysis: QueryAnalysis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ClassificationResponse {
    /// AI決定ありのレスポンス
    pub fn with_decision(retrieval: &RetrievalResult, decision: &DecisionResult) -> Self {
        if retrieval.is_empty() {
            return Self::no_match(retrieval);
        }

        let message = (decision.source == DecisionSource::Fallback)
            .then(|| "AI 精排不可用，显示本地匹配结果".to_string());

        Self {
            results: build_results(retrieval, decision),
            ai_decision: Some(DecisionSummary {
                confidence: decision.confidence,
                reasoning: decision.reasoning.clone(),
                need_more_info: decision.need_more_info,
                suggested_questions: decision.suggested_questions.clone(),
                source: decision.source,
            }),
            query_analysis: retrieval.query_analysis.clone(),
            message,
        }
    }

    /// 検索結果のみのレスポンス
    pub fn local(retrieval: &RetrievalResult) -> Self {
        if retrieval.is_empty() {
            return Self::no_match(retrieval);
        }
        Self {
            results: local_results(retrieval),
            ai_decision: None,
            query_analysis: retrieval.query_analysis.clone(),
            message: Some("本地匹配结果".to_string()),
        }
    }

    fn no_match(retrieval: &RetrievalResult) -> Self {
        Self {
            results: Vec::new(),
            ai_decision: short_circuit(retrieval).map(|d| DecisionSummary {
                confidence: d.confidence,
                reasoning: d.reasoning,
                need_more_info: d.need_more_info,
                suggested_questions: d.suggested_questions,
                source: d.source,
            }),
            query_analysis: retrieval.query_analysis.clone(),
            message: Some("未找到匹配的职业，请尝试更具体的描述".to_string()),
        }
    }
}

/// AI決定を反映したランキング
///
/// 1. 選択された職業
/// 2. 代替候補（最大2件）
/// 3. 何も無ければ検索上位5件
/// 4. 3件未満なら検索候補で5件まで補充
pub fn build_results(retrieval: &RetrievalResult, decision: &DecisionResult) -> Vec<OccupationResult> {
    let mut results = Vec::new();

    if let Some(selected) = &decision.selected_occupation {
        results.push(OccupationResult::new(
            selected,
            format!("AI推荐 ({}%): {}", decision.confidence, decision.reasoning),
            f64::from(decision.confidence) / 100.0,
        ));
    }

    if let Some(alternatives) = &decision.alternative_matches {
        for alt in alternatives.iter().take(MAX_ALTERNATIVES) {
            results.push(OccupationResult::new(
                &alt.occupation,
                format!("备选: {}", alt.reason),
                ALTERNATIVE_CONFIDENCE,
            ));
        }
    }

    if results.is_empty() {
        results.extend(
            retrieval
                .candidates
                .iter()
                .take(MAX_RESULTS)
                .map(|c| OccupationResult::from_candidate(c, "检索匹配")),
        );
    }

    if results.len() < MIN_RESULTS {
        for candidate in &retrieval.candidates {
            if results.len() >= MAX_RESULTS {
                break;
            }
            if results.iter().any(|r| r.code == candidate.occupation.code) {
                continue;
            }
            results.push(OccupationResult::from_candidate(candidate, "其他匹配"));
        }
    }

    results
}

/// AIなしのランキング（検索上位5件）
pub fn local_results(retrieval: &RetrievalResult) -> Vec<OccupationResult> {
    retrieval
        .candidates
        .iter()
        .take(MAX_RESULTS)
        .map(|c| OccupationResult::from_candidate(c, "本地匹配"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlternativeMatch, MatchType};

    fn occupation(code: &str) -> OccupationDefinition {
        OccupationDefinition {
            code: code.to_string(),
            name: format!("职业{}", code),
            industry: "一般行业".to_string(),
            group: "测试".to_string(),
            category: RiskCategory::new(1).unwrap(),
        }
    }

    fn retrieval(n: usize) -> RetrievalResult {
        RetrievalResult {
            candidates: (0..n)
                .map(|i| MatchResult {
                    occupation: occupation(&format!("C{:03}", i)),
                    score: 85.0 - i as f64,
                    match_type: MatchType::Keyword,
                    match_reason: format!("原因{}", i),
                })
                .collect(),
            query_analysis: QueryAnalysis::default(),
        }
    }

    fn decision(selected: Option<&str>, alternatives: &[&str]) -> DecisionResult {
        DecisionResult {
            selected_occupation: selected.map(occupation),
            confidence: 82,
            reasoning: "理由".to_string(),
            need_more_info: false,
            suggested_questions: None,
            alternative_matches: (!alternatives.is_empty()).then(|| {
                alternatives
                    .iter()
                    .map(|c| AlternativeMatch {
                        occupation: occupation(c),
                        reason: "备选原因".to_string(),
                    })
                    .collect()
            }),
            source: DecisionSource::Provider,
        }
    }

    #[test]
    fn test_selected_and_alternatives_first() {
        let r = retrieval(8);
        let results = build_results(&r, &decision(Some("C003"), &["C001", "C002", "C004"]));
        let codes: Vec<&str> = results.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["C003", "C001", "C002"]);
        assert_eq!(results[0].description, "AI推荐 (82%): 理由");
        assert!((results[0].confidence_score - 0.82).abs() < 1e-9);
        assert_eq!(results[1].confidence_score, ALTERNATIVE_CONFIDENCE);
    }

    #[test]
    fn test_topped_up_when_few() {
        let r = retrieval(8);
        let results = build_results(&r, &decision(Some("C003"), &[]));
        let codes: Vec<&str> = results.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["C003", "C000", "C001", "C002", "C004"]);
        assert!(results[1].description.starts_with("其他匹配"));
    }

    #[test]
    fn test_no_selection_uses_retrieval() {
        let r = retrieval(8);
        let results = build_results(&r, &decision(None, &[]));
        assert_eq!(results.len(), MAX_RESULTS);
        assert!(results[0].description.starts_with("检索匹配"));
        assert!((results[0].confidence_score - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_local_results() {
        let results = local_results(&retrieval(2));
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].description, "本地匹配: 原因0");
    }

    #[test]
    fn test_response_no_match() {
        let response = ClassificationResponse::local(&retrieval(0));
        assert!(response.results.is_empty());
        assert_eq!(response.ai_decision.unwrap().source, DecisionSource::NoCandidates);
    }

    #[test]
    fn test_response_fallback_message() {
        let mut d = decision(Some("C000"), &[]);
        d.source = DecisionSource::Fallback;
        let response = ClassificationResponse::with_decision(&retrieval(3), &d);
        assert!(response.message.is_some());

        let response = ClassificationResponse::with_decision(&retrieval(3), &decision(Some("C000"), &[]));
        assert!(response.message.is_none());
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"standardName\""));
        assert!(json.contains("\"aiDecision\""));
    }
}
