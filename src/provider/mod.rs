//! 補完プロバイダ
//!
//! プロンプトを渡してテキスト応答を1回受け取るだけの抽象。
//! - OpenRouterProvider: HTTP API
//! - CliProvider: ローカルのAI CLI（claude / codex / gemini）

mod cli;
mod openrouter;

pub use cli::CliProvider;
pub use openrouter::{OpenRouterProvider, OPENROUTER_ENDPOINT};

use crate::ai_provider::AiProvider;
use crate::config::Config;
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// ログ表示用の名前
    fn name(&self) -> &str;

    /// プロンプトに対する応答テキスト
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// 設定とCLI引数からプロバイダを作成
pub fn build_provider(kind: AiProvider, config: &Config) -> Result<Box<dyn CompletionProvider>> {
    match kind.command_name() {
        None => Ok(Box::new(OpenRouterProvider::from_config(config)?)),
        Some(_) => Ok(Box::new(CliProvider::new(kind))),
    }
}
