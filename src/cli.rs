use clap::{Parser, Subcommand};
use crate::ai_provider::AiProvider;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "occ-ai")]
#[command(about = "职业描述AI分类・职业风险等级判定ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// AIプロバイダ (openrouter/claude/codex/gemini)
    #[arg(long, default_value = "openrouter", global = true)]
    pub ai_provider: AiProvider,

    /// 職業分類表（JSONまたはMarkdown）
    #[arg(long, global = true)]
    pub table: Option<PathBuf>,

    /// 追加の語彙JSON
    #[arg(long, global = true)]
    pub lexicon: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 職業の説明を分類
    Classify {
        /// 職業の説明（例: 开叉车的）
        #[arg(required = true)]
        query: String,

        /// 検索候補の上限（デフォルト: 設定ファイル）
        #[arg(short, long)]
        limit: Option<usize>,

        /// AI決定を行わず検索結果のみ
        #[arg(long)]
        no_ai: bool,

        /// 回答例（Few-Shot）を付けない
        #[arg(long)]
        no_few_shot: bool,

        /// JSONで出力
        #[arg(long)]
        json: bool,
    },

    /// 職業分類表を検索（部分一致）
    Search {
        /// 検索語（名称・コード・業種・職業類別）
        #[arg(required = true)]
        query: String,

        /// 表示件数
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// ファイルの各行を一括分類してJSONを出力
    Batch {
        /// 入力ファイル（1行1件）
        #[arg(required = true)]
        file: PathBuf,

        /// 出力JSONファイル（デフォルト: 標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// AI決定を行わず検索結果のみ
        #[arg(long)]
        no_ai: bool,

        /// 検索候補の上限
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// 職業分類表を検証（重複・欠損・統計）
    Verify,

    /// Markdownの職業分類表をJSONに変換
    Import {
        /// 入力Markdownファイル
        #[arg(required = true)]
        markdown: PathBuf,

        /// 出力JSONファイル（デフォルト: 入力と同じ場所の .json）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 見積（CODE または CODE:人数）
    Quote {
        #[arg(required = true)]
        items: Vec<String>,
    },

    /// 設定
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

/// `CODE[:COUNT]` を分解（人数省略時は1）
pub fn parse_quote_item(item: &str) -> Option<(String, u32)> {
    let (code, count) = match item.split_once(':') {
        Some((code, count)) => (code.trim(), count.trim().parse::<u32>().ok()?),
        None => (item.trim(), 1),
    };
    (!code.is_empty() && count > 0).then(|| (code.to_string(), count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_classify() {
        let cli = Cli::try_parse_from(["occ-ai", "classify", "开叉车的", "--no-ai", "--limit", "3"]).unwrap();
        match cli.command {
            Commands::Classify { query, limit, no_ai, no_few_shot, json } => {
                assert_eq!(query, "开叉车的");
                assert_eq!(limit, Some(3));
                assert!(no_ai);
                assert!(!no_few_shot);
                assert!(!json);
            }
            _ => panic!("expected classify"),
        }
        assert_eq!(cli.ai_provider, AiProvider::OpenRouter);
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from(["occ-ai", "verify", "--ai-provider", "claude", "--table", "t.md", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.ai_provider, AiProvider::Claude);
        assert_eq!(cli.table, Some(PathBuf::from("t.md")));
    }

    #[test]
    fn test_parse_quote_item() {
        assert_eq!(parse_quote_item("F01031:3"), Some(("F01031".to_string(), 3)));
        assert_eq!(parse_quote_item("A01001"), Some(("A01001".to_string(), 1)));
        assert_eq!(parse_quote_item("A01001:0"), None);
        assert_eq!(parse_quote_item("A01001:x"), None);
        assert_eq!(parse_quote_item(":2"), None);
    }
}
