//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use occupation_ai_rust::classifier::{build_retriever, load_lexicon, load_table, read_queries};
use occupation_ai_rust::config::Config;
use occupation_ai_rust::error::OccupationAiError;
use occupation_ai_rust::provider::{CliProvider, CompletionProvider, OpenRouterProvider};
use occupation_ai_rust::ai_provider::AiProvider;
use std::path::Path;
use tempfile::tempdir;

/// 存在しない分類表
#[test]
fn test_missing_table() {
    let result = load_table(Path::new("/nonexistent/path/12345.json"));
    assert!(matches!(result, Err(OccupationAiError::FileNotFound(_))));
}

/// 分類表の形式が不正（カテゴリ範囲外）
#[test]
fn test_table_category_out_of_range() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"[{"code": "A1", "name": "测试", "category": 9}]"#).unwrap();

    assert!(matches!(load_table(&path), Err(OccupationAiError::InvalidTable(_))));
}

/// CLI引数の分類表が存在しなければ同梱表に戻らない
#[test]
fn test_build_retriever_missing_table() {
    let result = build_retriever(&Config::default(), Some(Path::new("/nonexistent/table.md")), None);
    assert!(matches!(result, Err(OccupationAiError::FileNotFound(_))));
}

/// 存在しない語彙ファイル
#[test]
fn test_missing_lexicon() {
    let result = load_lexicon(Some(Path::new("/nonexistent/lexicon.json")));
    assert!(matches!(result, Err(OccupationAiError::FileNotFound(_))));
}

/// 不正な語彙JSON
#[test]
fn test_invalid_lexicon() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("lexicon.json");
    std::fs::write(&path, "{ broken").unwrap();

    let result = load_lexicon(Some(&path));
    assert!(matches!(result, Err(OccupationAiError::Common(_))));
}

/// 一括入力ファイルが無い
#[test]
fn test_missing_batch_file() {
    let result = read_queries(Path::new("/nonexistent/queries.txt"));
    assert!(matches!(result, Err(OccupationAiError::FileNotFound(_))));
}

/// 空の一括入力ファイル
#[test]
fn test_empty_batch_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("queries.txt");
    std::fs::write(&path, "\n# only comments\n\n").unwrap();

    assert!(read_queries(&path).unwrap().is_empty());
}

/// 壊れた設定ファイル
#[test]
fn test_corrupted_config() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not valid json").unwrap();

    let result = Config::load_from(&path);
    assert!(matches!(result, Err(OccupationAiError::JsonParse(_))));
}

/// 接続できないエンドポイント
#[tokio::test]
async fn test_openrouter_unreachable() {
    let provider = OpenRouterProvider::new("sk-test".into(), "openai/gpt-4-turbo".into())
        .with_endpoint("http://127.0.0.1:9/v1/chat/completions");

    let result = provider.complete("测试").await;
    assert!(matches!(result, Err(OccupationAiError::ApiCall(_))));
}

/// 存在しないCLI
#[tokio::test]
async fn test_cli_provider_missing_binary() {
    let provider = CliProvider::new(AiProvider::Claude).with_program("occ-ai-nonexistent-binary-12345");

    let result = provider.complete("测试").await;
    assert!(matches!(result, Err(OccupationAiError::CliExecution(_))));
}

/// エラーメッセージの内容
#[test]
fn test_error_messages() {
    let err = OccupationAiError::FileNotFound("/path/to/table.md".into());
    assert!(err.to_string().contains("/path/to/table.md"));

    let err = OccupationAiError::Timeout(30);
    assert!(err.to_string().contains("30"));

    let err = OccupationAiError::MissingApiKey;
    assert!(err.to_string().contains("OPENROUTER_API_KEY"));

    let err: OccupationAiError = occupation_ai_common::Error::Parse("bad".into()).into();
    assert!(err.to_string().contains("bad"));
}
