//! 分類パイプライン
//!
//! 検索（同期・並列可）→ 決定（プロバイダ呼び出し1回、タイムアウト付き）。
//! 決定段階はエラーを返さず、失敗時は検索上位へ降格する。

use crate::config::Config;
use crate::error::{OccupationAiError, Result};
use crate::provider::CompletionProvider;
use indicatif::{ProgressBar, ProgressStyle};
use occupation_ai_common::{
    complete_decision, decision_prompt, short_circuit, ClassificationResponse, DecisionResult, Lexicon,
    ReferenceTable, RetrievalResult, Retriever,
};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const BUNDLED_TABLE: &str = include_str!("../../data/occupations.json");

/// 同梱のサンプル職業分類表
pub fn bundled_table() -> Result<ReferenceTable> {
    ReferenceTable::from_json(BUNDLED_TABLE).map_err(|e| OccupationAiError::InvalidTable(e.to_string()))
}

/// 職業分類表を読み込む（JSONまたはMarkdown）
pub fn load_table(path: &Path) -> Result<ReferenceTable> {
    if !path.exists() {
        return Err(OccupationAiError::FileNotFound(path.display().to_string()));
    }
    let is_markdown = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("md"))
        .unwrap_or(false);

    let table = if is_markdown {
        let content = std::fs::read_to_string(path)?;
        ReferenceTable::from_markdown(&content)
    } else {
        ReferenceTable::from_file(path)
    };
    table.map_err(|e| OccupationAiError::InvalidTable(format!("{}: {}", path.display(), e)))
}

/// 組み込み語彙に外部語彙をマージ
pub fn load_lexicon(path: Option<&Path>) -> Result<Lexicon> {
    let mut lexicon = Lexicon::builtin();
    if let Some(path) = path {
        if !path.exists() {
            return Err(OccupationAiError::FileNotFound(path.display().to_string()));
        }
        let custom = Lexicon::from_file(path)?;
        lexicon.merge(&custom);
        debug!(path = %path.display(), version = lexicon.version, "custom lexicon merged");
    }
    Ok(lexicon)
}

/// CLI引数 → 設定ファイル → 同梱表 の順で検索器を組み立てる
pub fn build_retriever(config: &Config, table: Option<&Path>, lexicon: Option<&Path>) -> Result<Retriever> {
    let table_path: Option<PathBuf> = table.map(Path::to_path_buf).or_else(|| config.table_path.clone());
    let table = match &table_path {
        Some(path) => load_table(path)?,
        None => bundled_table()?,
    };
    if table.is_empty() {
        warn!("occupation table is empty");
    }

    let lexicon_path = lexicon.map(Path::to_path_buf).or_else(|| config.lexicon_path.clone());
    let lexicon = load_lexicon(lexicon_path.as_deref())?;

    info!(rows = table.len(), "occupation table loaded");
    Ok(Retriever::new(Arc::new(table), Arc::new(lexicon)))
}

/// AI決定（タイムアウト付き）
///
/// 短絡できる場合はプロバイダを呼ばない。失敗・タイムアウトは
/// 降格結果になり、呼び出し側にエラーは返らない。
pub async fn decide(
    query: &str,
    retrieval: &RetrievalResult,
    provider: &dyn CompletionProvider,
    use_few_shot: bool,
    timeout: Duration,
) -> DecisionResult {
    if let Some(decision) = short_circuit(retrieval) {
        debug!(source = ?decision.source, "decision short-circuited");
        return decision;
    }

    let prompt = decision_prompt(query, retrieval, use_few_shot);
    debug!(provider = provider.name(), prompt_chars = prompt.chars().count(), "requesting decision");

    let response = match tokio::time::timeout(timeout, provider.complete(&prompt)).await {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(occupation_ai_common::Error::Provider(e.to_string())),
        Err(_) => Err(occupation_ai_common::Error::Provider(
            OccupationAiError::Timeout(timeout.as_secs()).to_string(),
        )),
    };

    complete_decision(retrieval, response)
}

/// 1件分類
///
/// `provider` がNoneなら検索結果のみ。空のクエリはエラー。
pub async fn classify(
    retriever: &Retriever,
    query: &str,
    limit: usize,
    provider: Option<&dyn CompletionProvider>,
    use_few_shot: bool,
    timeout: Duration,
) -> Result<ClassificationResponse> {
    let query = query.trim();
    if query.is_empty() {
        return Err(OccupationAiError::InvalidQuery);
    }

    let retrieval = retriever.retrieve(query, limit);
    info!(query = %query, candidates = retrieval.candidates.len(), "retrieval finished");

    let response = match provider {
        Some(provider) => {
            let decision = decide(query, &retrieval, provider, use_few_shot, timeout).await;
            info!(
                source = ?decision.source,
                confidence = decision.confidence,
                need_more_info = decision.need_more_info,
                "decision finished"
            );
            ClassificationResponse::with_decision(&retrieval, &decision)
        }
        None => ClassificationResponse::local(&retrieval),
    };
    Ok(response)
}

/// 一括分類の1行分
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecord {
    pub query: String,
    #[serde(flatten)]
    pub response: ClassificationResponse,
}

/// 一括入力ファイルを読む（1行1件、空行と # 行は無視）
pub fn read_queries(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(OccupationAiError::FileNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// 検索だけを並列実行（入力順を保持）
pub fn retrieve_batch(retriever: &Retriever, queries: &[String], limit: usize) -> Vec<RetrievalResult> {
    queries.par_iter().map(|q| retriever.retrieve(q, limit)).collect()
}

/// 一括分類
///
/// 検索は並列、決定はプロバイダへの負荷を避けて順番に行う。
pub async fn classify_batch(
    retriever: &Retriever,
    queries: &[String],
    limit: usize,
    provider: Option<&dyn CompletionProvider>,
    use_few_shot: bool,
    timeout: Duration,
    show_progress: bool,
) -> Vec<BatchRecord> {
    let retrievals = retrieve_batch(retriever, queries, limit);

    let pb = if show_progress {
        let pb = ProgressBar::new(queries.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut records = Vec::with_capacity(queries.len());
    for (query, retrieval) in queries.iter().zip(retrievals.iter()) {
        pb.set_message(query.clone());

        let response = match provider {
            Some(provider) => {
                let decision = decide(query, retrieval, provider, use_few_shot, timeout).await;
                ClassificationResponse::with_decision(retrieval, &decision)
            }
            None => ClassificationResponse::local(retrieval),
        };
        records.push(BatchRecord {
            query: query.clone(),
            response,
        });

        pb.inc(1);
    }
    pb.finish_and_clear();

    records
}
