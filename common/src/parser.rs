//! AIレスポンスパーサー
//!
//! プロバイダーの応答テキストからJSONオブジェクトを取り出し、
//! 決定フィールドを寛容に読み取る。型が違うフィールドは既定値に落とす。

use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// confidence が無い・数値でない場合の既定値
pub const DEFAULT_CONFIDENCE: u8 = 50;

/// reasoning が無い場合の既定値
pub const DEFAULT_REASONING: &str = "unavailable";

/// 応答から読み取った決定（コードは未解決のまま）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDecision {
    pub selected_code: Option<String>,
    pub confidence: u8,
    pub reasoning: String,
    pub need_more_info: bool,
    pub suggested_questions: Option<Vec<String>>,
    pub alternative_codes: Vec<String>,
}

/// 応答テキストから最初のJSONオブジェクトを抽出
///
/// `{` の位置ごとに対応する `}` を探し（文字列中の括弧は数えない）、
/// オブジェクトとしてパースできた最初の範囲を返す。
/// コードフェンスや前後の説明文は無視される。
///
/// # Examples
/// ```
/// use occupation_ai_common::extract_json_object;
///
/// let response = "结果如下：```json\n{\"selectedCode\": \"F01031\"}\n```";
/// let json = extract_json_object(response).unwrap();
/// assert_eq!(json, "{\"selectedCode\": \"F01031\"}");
/// ```
pub fn extract_json_object(response: &str) -> Result<&str> {
    for (start, _) in response.match_indices('{') {
        let Some(end) = find_matching_brace(&response[start..]) else {
            continue;
        };
        let candidate = &response[start..start + end + 1];
        if matches!(serde_json::from_str::<Value>(candidate), Ok(Value::Object(_))) {
            return Ok(candidate);
        }
    }

    Err(Error::Parse("JSONが見つかりません".into()))
}

/// 先頭の `{` に対応する `}` のバイト位置
fn find_matching_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }

    None
}

/// 決定レスポンスをパース
///
/// JSONオブジェクトが見つからない場合だけエラー。
/// 各フィールドは型が合わなければ既定値を使う。
pub fn parse_decision_response(response: &str) -> Result<RawDecision> {
    let json_str = extract_json_object(response)?;
    let value: Value = serde_json::from_str(json_str)?;
    let Value::Object(map) = value else {
        return Err(Error::Parse("JSONオブジェクトではありません".into()));
    };

    Ok(RawDecision {
        selected_code: read_code(&map, "selectedCode"),
        confidence: read_confidence(&map),
        reasoning: map
            .get("reasoning")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_REASONING)
            .to_string(),
        need_more_info: map.get("needMoreInfo").and_then(Value::as_bool).unwrap_or(false),
        suggested_questions: read_string_list(&map, "suggestedQuestions").filter(|q| !q.is_empty()),
        alternative_codes: read_string_list(&map, "alternativeCodes").unwrap_or_default(),
    })
}

fn read_code(map: &Map<String, Value>, key: &str) -> Option<String> {
    let code = map.get(key)?.as_str()?.trim();
    if code.is_empty() || code.eq_ignore_ascii_case("null") {
        return None;
    }
    Some(code.to_string())
}

fn read_confidence(map: &Map<String, Value>) -> u8 {
    let raw = match map.get("confidence") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    };
    match raw {
        Some(v) if v.is_finite() => v.clamp(0.0, 100.0).round() as u8,
        _ => DEFAULT_CONFIDENCE,
    }
}

fn read_string_list(map: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    let items = map.get(key)?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // =============================================
    // extract_json_object テスト
    // =============================================

    #[test]
    fn test_extract_json_with_fence() {
        let response = r#"好的，分析如下：
```json
{"selectedCode": "F01031", "confidence": 88}
```
以上。"#;
        let json = extract_json_object(response).unwrap();
        assert_eq!(json, r#"{"selectedCode": "F01031", "confidence": 88}"#);
    }

    #[test]
    fn test_extract_json_raw() {
        let response = r#"{"selectedCode": null}"#;
        assert_eq!(extract_json_object(response).unwrap(), response);
    }

    #[test]
    fn test_extract_json_braces_in_strings() {
        let response = r#"说明 {not json} 然后 {"reasoning": "包含}括号{的文本", "confidence": 70}"#;
        let json = extract_json_object(response).unwrap();
        assert_eq!(json, r#"{"reasoning": "包含}括号{的文本", "confidence": 70}"#);
    }

    #[test]
    fn test_extract_json_nested() {
        let response = r#"{"a": {"b": 1}, "c": 2} trailing {"d": 3}"#;
        assert_eq!(extract_json_object(response).unwrap(), r#"{"a": {"b": 1}, "c": 2}"#);
    }

    #[test]
    fn test_extract_json_error() {
        assert!(extract_json_object("没有JSON").is_err());
        assert!(extract_json_object("{unclosed").is_err());
        assert!(extract_json_object("[1, 2, 3]").is_err());
    }

    // =============================================
    // parse_decision_response テスト
    // =============================================

    #[test]
    fn test_parse_full_response() {
        let response = r#"{
            "selectedCode": "F01031",
            "confidence": 88.6,
            "reasoning": "叉车即堆高机",
            "needMoreInfo": false,
            "suggestedQuestions": ["是否在港口作业？"],
            "alternativeCodes": ["F01006", ""]
        }"#;
        let decision = parse_decision_response(response).unwrap();
        assert_eq!(decision.selected_code.as_deref(), Some("F01031"));
        assert_eq!(decision.confidence, 89);
        assert_eq!(decision.reasoning, "叉车即堆高机");
        assert!(!decision.need_more_info);
        assert_eq!(decision.suggested_questions, Some(vec!["是否在港口作业？".to_string()]));
        assert_eq!(decision.alternative_codes, vec!["F01006"]);
    }

    #[test]
    fn test_parse_lenient_defaults() {
        let response = r#"{"selectedCode": 123, "confidence": "high", "needMoreInfo": "yes", "alternativeCodes": "F01006"}"#;
        let decision = parse_decision_response(response).unwrap();
        assert_eq!(decision.selected_code, None);
        assert_eq!(decision.confidence, DEFAULT_CONFIDENCE);
        assert_eq!(decision.reasoning, DEFAULT_REASONING);
        assert!(!decision.need_more_info);
        assert_eq!(decision.suggested_questions, None);
        assert!(decision.alternative_codes.is_empty());
    }

    #[test]
    fn test_parse_confidence_clamped() {
        let decision = parse_decision_response(r#"{"confidence": 150}"#).unwrap();
        assert_eq!(decision.confidence, 100);
        let decision = parse_decision_response(r#"{"confidence": -5}"#).unwrap();
        assert_eq!(decision.confidence, 0);
        let decision = parse_decision_response(r#"{"confidence": "75%"}"#).unwrap();
        assert_eq!(decision.confidence, 75);
    }

    #[test]
    fn test_parse_null_string_code() {
        let decision = parse_decision_response(r#"{"selectedCode": "null", "needMoreInfo": true}"#).unwrap();
        assert_eq!(decision.selected_code, None);
        assert!(decision.need_more_info);
    }

    #[test]
    fn test_parse_no_json() {
        let result = parse_decision_response("抱歉，我无法判断。");
        assert!(matches!(result, Err(Error::Parse(_))));
    }
}
