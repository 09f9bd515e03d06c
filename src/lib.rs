//! occupation-ai-rust
//!
//! 职业描述の分類CLIとライブラリ。コアロジックは occupation_ai_common にあり、
//! ここでは設定・プロバイダ呼び出し・非同期の決定・一括処理を扱う。

pub mod ai_provider;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod provider;
