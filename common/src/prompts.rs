//! プロンプト生成モジュール
//!
//! AI決定段階に渡すプロンプトを組み立てる:
//! - risk_description: リスク等級の説明文
//! - build_decision_prompt: 候補リスト付きの決定用プロンプト
//! - FEW_SHOT_EXAMPLES: 任意で差し込む回答例

use crate::types::{MatchResult, QueryAnalysis, RiskCategory};

/// プロンプトに載せる候補の上限
pub const MAX_PROMPT_CANDIDATES: usize = 8;

/// 展開語をプロンプトに載せる上限
pub const MAX_PROMPT_EXPANDED_TERMS: usize = 10;

/// 決定ルール節の見出し（回答例はこの直前に差し込む）
const DECISION_RULES_HEADING: &str = "## 决策要求";

/// 回答例（Few-Shot）
///
/// 同じ語でも設備操作の意味と事務職の意味を取り違えないよう、
/// 業界標準の用語への対応を示す。
pub const FEW_SHOT_EXAMPLES: &str = r#"## 参考示例（Few-Shot）

### 示例1
用户输入: "开叉车的"
正确选择: F01031 - 堆高机司机（非航运）
理由: "叉车"在保险行业标准术语中对应"堆高机"，用户描述的是操作叉车的工人

### 示例2
用户输入: "村里帮忙处理文件的"
正确选择: A01006 - 村委会/居委会人员
理由: 用户描述的是村委会的行政工作，属于低风险办公类职业

### 示例3
用户输入: "工地上焊钢筋的"
正确选择: H05014 - 建筑焊工（室外/高空）
理由: 工地焊接属于室外高空作业，风险较高

### 示例4
用户输入: "送外卖的骑手"
正确选择: 应选择快递/配送相关职业
理由: 外卖骑手属于配送人员，需要注意交通风险
"#;

/// リスク等級の説明
pub fn risk_description(category: RiskCategory) -> String {
    match category.value() {
        0 => "拒保（高危职业）".to_string(),
        1 => "1类（低风险，如办公室工作）".to_string(),
        2 => "2类（较低风险）".to_string(),
        3 => "3类（中等风险）".to_string(),
        4 => "4类（较高风险）".to_string(),
        5 => "5类（高风险）".to_string(),
        6 => "6类（极高风险）".to_string(),
        n => format!("{}类", n),
    }
}

fn join_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

/// 候補リスト部分（上位8件まで）
fn format_candidates(candidates: &[MatchResult]) -> String {
    candidates
        .iter()
        .take(MAX_PROMPT_CANDIDATES)
        .enumerate()
        .map(|(i, c)| {
            let occ = &c.occupation;
            format!(
                "{}. [代码: {}] {}\n   - 行业: {} > {}\n   - 风险等级: {}\n   - 匹配原因: {}",
                i + 1,
                occ.code,
                occ.name,
                occ.industry,
                occ.group,
                risk_description(occ.category),
                c.match_reason
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// 決定用プロンプト生成
///
/// # Arguments
/// * `query` - ユーザーの入力
/// * `candidates` - 検索候補（スコア降順）。先頭8件だけ使う
/// * `analysis` - クエリ解析結果
/// * `use_few_shot` - 回答例を決定ルールの前に差し込むか
pub fn build_decision_prompt(
    query: &str,
    candidates: &[MatchResult],
    analysis: &QueryAnalysis,
    use_few_shot: bool,
) -> String {
    let keywords = join_or(&analysis.extracted_keywords, "无");
    let expanded = analysis
        .expanded_terms
        .iter()
        .take(MAX_PROMPT_EXPANDED_TERMS)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    let industries = join_or(&analysis.possible_industries, "未识别");
    let negatives = join_or(&analysis.negative_constraints, "无");
    let candidate_list = format_candidates(candidates);
    let rules_heading = DECISION_RULES_HEADING;
    let examples = if use_few_shot {
        format!("{}\n\n", FEW_SHOT_EXAMPLES)
    } else {
        String::new()
    };

    format!(
        r#"你是保险公司的资深核保专家，精通职业分类和风险评估。

## 任务
用户输入了一个职业描述，请从【候选职业列表】中选出最精准匹配的职业。

## 用户输入
"{query}"

## 查询分析
- 提取的关键词: {keywords}
- 扩展的同义词: {expanded}
- 可能的行业: {industries}
- 排除约束: {negatives}

## 候选职业列表
{candidate_list}

{examples}{rules_heading}
1. **理解用户真实意图**：
   - "叉车" 通常指操作叉车的工人，不是办公人员
   - "村委会" 指村委会工作人员
   - 注意区分"参与作业"和"不参与作业"的区别

2. **选择最精准的匹配**：
   - 优先选择职业名称与用户描述最接近的
   - 考虑行业背景是否合理
   - 注意风险等级是否符合职业特点

3. **置信度评估**：
   - 90-100: 非常确定，用户描述与职业完全匹配
   - 70-89: 较为确定，但可能有细微差异
   - 50-69: 有一定把握，但需要确认
   - <50: 不确定，需要用户提供更多信息

4. **如果无法确定**：
   - 设置 needMoreInfo 为 true
   - 提供 1-2 个追问问题帮助澄清

## 输出格式（严格 JSON）
```json
{{
  "selectedCode": "选中的职业代码，如 F01031，如果无法确定则为 null",
  "confidence": 85,
  "reasoning": "选择理由的简要说明",
  "needMoreInfo": false,
  "suggestedQuestions": ["如果需要追问，在这里列出问题"],
  "alternativeCodes": ["备选职业代码1", "备选职业代码2"]
}}
```

请直接输出 JSON，不要有其他内容。"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MatchType, OccupationDefinition};

    fn candidate(code: &str, name: &str, score: f64) -> MatchResult {
        MatchResult {
            occupation: OccupationDefinition {
                code: code.to_string(),
                name: name.to_string(),
                industry: "交通运输业".to_string(),
                group: "陆运".to_string(),
                category: RiskCategory::new(4).unwrap(),
            },
            score,
            match_type: MatchType::Keyword,
            match_reason: "关键词匹配: \"司机\" in 名称".to_string(),
        }
    }

    fn analysis() -> QueryAnalysis {
        QueryAnalysis {
            original_query: "开叉车的".to_string(),
            extracted_keywords: vec!["叉车".to_string()],
            expanded_terms: (0..15).map(|i| format!("词{}", i)).collect(),
            possible_industries: vec![],
            negative_constraints: vec![],
        }
    }

    #[test]
    fn test_risk_description() {
        assert_eq!(risk_description(RiskCategory::REJECTED), "拒保（高危职业）");
        assert_eq!(risk_description(RiskCategory::new(1).unwrap()), "1类（低风险，如办公室工作）");
        assert_eq!(risk_description(RiskCategory::new(6).unwrap()), "6类（极高风险）");
    }

    #[test]
    fn test_prompt_contains_query_and_candidates() {
        let candidates = vec![candidate("F01031", "堆高机司机（非航运）", 90.0)];
        let prompt = build_decision_prompt("开叉车的", &candidates, &analysis(), false);

        assert!(prompt.contains("\"开叉车的\""));
        assert!(prompt.contains("1. [代码: F01031] 堆高机司机（非航运）"));
        assert!(prompt.contains("- 行业: 交通运输业 > 陆运"));
        assert!(prompt.contains("- 风险等级: 4类（较高风险）"));
        assert!(prompt.contains("- 可能的行业: 未识别"));
        assert!(prompt.contains("- 排除约束: 无"));
        assert!(prompt.contains("\"selectedCode\""));
        assert!(!prompt.contains("参考示例"));
    }

    #[test]
    fn test_prompt_limits_candidates_and_terms() {
        let candidates: Vec<MatchResult> = (0..12)
            .map(|i| candidate(&format!("C{:05}", i), "司机", 80.0))
            .collect();
        let prompt = build_decision_prompt("司机", &candidates, &analysis(), false);

        assert!(prompt.contains("8. [代码: C00007]"));
        assert!(!prompt.contains("C00008"));
        assert!(prompt.contains("词9"));
        assert!(!prompt.contains("词10"));
    }

    #[test]
    fn test_few_shot_inserted_before_rules() {
        let candidates = vec![candidate("F01031", "堆高机司机（非航运）", 90.0)];
        let prompt = build_decision_prompt("开叉车的", &candidates, &analysis(), true);

        let examples = prompt.find("## 参考示例").unwrap();
        let rules = prompt.find(DECISION_RULES_HEADING).unwrap();
        let list = prompt.find("## 候选职业列表").unwrap();
        assert!(list < examples && examples < rules);
        assert!(prompt.contains("A01006 - 村委会/居委会人员"));
    }
}
