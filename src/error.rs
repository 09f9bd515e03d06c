use thiserror::Error;

#[derive(Error, Debug)]
pub enum OccupationAiError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。`occ-ai config --set-api-key YOUR_KEY` または環境変数 OPENROUTER_API_KEY で設定してください")]
    MissingApiKey,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("API呼び出しエラー: {0}")]
    ApiCall(String),

    #[error("APIレスポンスのパースに失敗: {0}")]
    ApiParse(String),

    #[error("タイムアウト ({0}秒)")]
    Timeout(u64),

    #[error("CLI実行エラー: {0}")]
    CliExecution(String),

    #[error("職業分類表が不正: {0}")]
    InvalidTable(String),

    #[error("職業の説明を入力してください")]
    InvalidQuery,

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] occupation_ai_common::Error),
}

pub type Result<T> = std::result::Result<T, OccupationAiError>;
