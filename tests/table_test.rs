//! 職業分類表の読み込み・変換テスト

use occupation_ai_common::{ReferenceTable, RiskCategory};
use occupation_ai_rust::classifier::{build_retriever, load_table};
use occupation_ai_rust::config::Config;
use occupation_ai_rust::error::OccupationAiError;
use tempfile::tempdir;

const MARKDOWN: &str = r#"# 职业分类表

说明文字，不属于表格。

| 行业名称 | 职业类别 | 代码 | 名称 | 分类 |
|---|---|---|---|---|
| 一般行业 | 机关团体公司行号 | A01001 | 内勤人员 | 1 |
| 交通运输业 | 陆运 | F01031 | 堆高机司机（非航运） | 4 |
| 矿业 | 矿业采掘 | E01009 | 海上油田钻井工人 | 拒保 |
| 其他 | 备注 | X00001 | 格式错误 | 未定 |
| 缺列 | Z01 | 只有三列 |
"#;

#[test]
fn test_load_markdown_table() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("occupations.md");
    std::fs::write(&path, MARKDOWN).unwrap();

    let table = load_table(&path).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.find_by_code("E01009").unwrap().category, RiskCategory::REJECTED);
    assert!(table.find_by_code("X00001").is_none());
}

#[test]
fn test_markdown_import_then_json_load() {
    let dir = tempdir().expect("Failed to create temp dir");
    let md_path = dir.path().join("occupations.md");
    std::fs::write(&md_path, MARKDOWN).unwrap();

    let table = load_table(&md_path).unwrap();
    let json_path = md_path.with_extension("json");
    std::fs::write(&json_path, table.to_json().unwrap()).unwrap();

    let reloaded = load_table(&json_path).unwrap();
    assert_eq!(reloaded.rows(), table.rows());
}

#[test]
fn test_markdown_without_records() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("empty.md");
    std::fs::write(&path, "# 空\n\n没有表格\n").unwrap();

    assert!(matches!(load_table(&path), Err(OccupationAiError::InvalidTable(_))));
}

#[test]
fn test_retriever_uses_custom_table() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("occupations.md");
    std::fs::write(&path, MARKDOWN).unwrap();

    let retriever = build_retriever(&Config::default(), Some(&path), None).unwrap();
    assert_eq!(retriever.table().len(), 3);

    let result = retriever.retrieve("开叉车的", 5);
    assert_eq!(result.top().unwrap().occupation.code, "F01031");
}

#[test]
fn test_config_table_path_used() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("occupations.json");
    let table = ReferenceTable::from_markdown(MARKDOWN).unwrap();
    std::fs::write(&path, table.to_json().unwrap()).unwrap();

    let config = Config {
        table_path: Some(path),
        ..Config::default()
    };
    let retriever = build_retriever(&config, None, None).unwrap();
    assert_eq!(retriever.table().len(), 3);
}

#[test]
fn test_verify_reports_duplicates() {
    let json = r#"[
        {"code": "A01001", "name": "内勤人员", "industry": "一般行业", "group": "机关", "category": 1},
        {"code": "A01001", "name": "内勤人员", "industry": "一般行业", "group": "机关", "category": 1},
        {"code": "B01001", "name": "农夫", "category": 2}
    ]"#;
    let report = ReferenceTable::from_json(json).unwrap().verify();

    assert_eq!(report.total, 3);
    assert_eq!(report.duplicate_codes, vec!["A01001".to_string()]);
    assert_eq!(report.incomplete_records, vec![(3, "B01001".to_string())]);
    assert!(!report.is_clean());
}
