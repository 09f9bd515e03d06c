//! AI決定モジュール（同期部分）
//!
//! 検索候補から最終的な職業を1つ選ぶ。プロバイダー呼び出しそのものは
//! 呼び出し側が行い、ここでは短絡判定・プロンプト生成・応答の解決・
//! 降格（フォールバック）を担う。どの経路でもエラーは返さない。

use crate::error::Result;
use crate::parser::{parse_decision_response, RawDecision};
use crate::prompts::{build_decision_prompt, MAX_PROMPT_CANDIDATES};
use crate::types::{AlternativeMatch, DecisionResult, DecisionSource, MatchResult, RetrievalResult};
use tracing::{info, warn};

/// 単一候補をAIなしで確定するスコア
pub const SHORT_CIRCUIT_SCORE: f64 = 90.0;

/// 単一候補を確定したときの信頼度
pub const SHORT_CIRCUIT_CONFIDENCE: u8 = 95;

/// フォールバック時の信頼度上限（この値未満なら追加情報を求める）
pub const FALLBACK_CONFIDENCE_CAP: f64 = 70.0;

/// 候補なしの結果
pub fn no_candidates_decision() -> DecisionResult {
    DecisionResult {
        selected_occupation: None,
        confidence: 0,
        reasoning: "未找到匹配的职业".to_string(),
        need_more_info: true,
        suggested_questions: Some(vec![
            "请提供更具体的职业名称或工作内容描述".to_string(),
            "您从事的是哪个行业？".to_string(),
        ]),
        alternative_matches: None,
        source: DecisionSource::NoCandidates,
    }
}

/// AIを呼ばずに決まる場合の結果
///
/// - 候補0件
/// - 候補が1件だけでスコア90以上
pub fn short_circuit(retrieval: &RetrievalResult) -> Option<DecisionResult> {
    match retrieval.candidates.as_slice() {
        [] => Some(no_candidates_decision()),
        [only] if only.score >= SHORT_CIRCUIT_SCORE => Some(DecisionResult {
            selected_occupation: Some(only.occupation.clone()),
            confidence: SHORT_CIRCUIT_CONFIDENCE,
            reasoning: format!("精确匹配: {}", only.match_reason),
            need_more_info: false,
            suggested_questions: None,
            alternative_matches: None,
            source: DecisionSource::ShortCircuit,
        }),
        _ => None,
    }
}

/// プロンプトに載せる候補（上位8件）
pub fn offered_candidates(retrieval: &RetrievalResult) -> &[MatchResult] {
    let n = retrieval.candidates.len().min(MAX_PROMPT_CANDIDATES);
    &retrieval.candidates[..n]
}

/// 決定用プロンプト
pub fn decision_prompt(query: &str, retrieval: &RetrievalResult, use_few_shot: bool) -> String {
    build_decision_prompt(
        query,
        offered_candidates(retrieval),
        &retrieval.query_analysis,
        use_few_shot,
    )
}

/// 降格結果（最上位の検索候補を返す）
///
/// 信頼度は min(スコア, 70) の切り捨て。候補0件なら候補なしの結果。
pub fn fallback_decision(retrieval: &RetrievalResult) -> DecisionResult {
    let Some(top) = retrieval.top() else {
        return no_candidates_decision();
    };

    DecisionResult {
        selected_occupation: Some(top.occupation.clone()),
        confidence: top.score.min(FALLBACK_CONFIDENCE_CAP).max(0.0).floor() as u8,
        reasoning: format!("AI 调用失败，返回最佳匹配: {}", top.match_reason),
        need_more_info: top.score < FALLBACK_CONFIDENCE_CAP,
        suggested_questions: None,
        alternative_matches: None,
        source: DecisionSource::Fallback,
    }
}

/// 応答のコードを提示した候補に照らして解決
///
/// 候補に無いコードは黙って捨てる。代替候補から選択コードと重複を除く。
pub fn resolve_decision(raw: RawDecision, offered: &[MatchResult]) -> DecisionResult {
    let find = |code: &str| offered.iter().find(|c| c.occupation.code == code);

    let selected = raw.selected_code.as_deref().and_then(|code| {
        let found = find(code);
        if found.is_none() {
            warn!(code = %code, "provider selected a code outside the candidates");
        }
        found
    });

    let mut alternatives: Vec<AlternativeMatch> = Vec::new();
    for code in &raw.alternative_codes {
        if raw.selected_code.as_deref() == Some(code.as_str()) {
            continue;
        }
        if alternatives.iter().any(|a| a.occupation.code == *code) {
            continue;
        }
        match find(code) {
            Some(found) => alternatives.push(AlternativeMatch {
                occupation: found.occupation.clone(),
                reason: found.match_reason.clone(),
            }),
            None => warn!(code = %code, "dropping unknown alternative code"),
        }
    }

    DecisionResult {
        need_more_info: raw.need_more_info || selected.is_none(),
        selected_occupation: selected.map(|c| c.occupation.clone()),
        confidence: raw.confidence,
        reasoning: raw.reasoning,
        suggested_questions: raw.suggested_questions,
        alternative_matches: (!alternatives.is_empty()).then_some(alternatives),
        source: DecisionSource::Provider,
    }
}

/// プロバイダーの応答（または失敗）から決定を組み立てる
pub fn complete_decision(retrieval: &RetrievalResult, response: Result<String>) -> DecisionResult {
    let text = match response {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "provider call failed, falling back to top candidate");
            return fallback_decision(retrieval);
        }
    };

    match parse_decision_response(&text) {
        Ok(raw) => {
            let decision = resolve_decision(raw, offered_candidates(retrieval));
            info!(
                selected = decision.selected_occupation.as_ref().map(|o| o.code.as_str()),
                confidence = decision.confidence,
                "decision resolved"
            );
            decision
        }
        Err(e) => {
            warn!(error = %e, "provider response unparseable, falling back to top candidate");
            fallback_decision(retrieval)
        }
    }
}

/// 同期版の決定
///
/// 非同期ランタイムを持たない呼び出し側向け。`provider` はプロンプトを
/// 受け取り応答テキストを返す。短絡した場合は呼ばれない。
pub fn decide_with<F>(query: &str, retrieval: &RetrievalResult, use_few_shot: bool, provider: F) -> DecisionResult
where
    F: FnOnce(&str) -> Result<String>,
{
    if let Some(decision) = short_circuit(retrieval) {
        return decision;
    }
    let prompt = decision_prompt(query, retrieval, use_few_shot);
    complete_decision(retrieval, provider(&prompt))
}
