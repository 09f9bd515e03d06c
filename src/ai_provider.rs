use clap::ValueEnum;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AiProvider {
    /// OpenRouter HTTP API
    #[value(name = "openrouter")]
    OpenRouter,
    Claude,
    Codex,
    Gemini,
}

impl AiProvider {
    /// ローカルCLIの実行ファイル名（HTTPプロバイダはNone）
    pub fn command_name(&self) -> Option<&'static str> {
        match self {
            AiProvider::OpenRouter => None,
            AiProvider::Claude => Some("claude"),
            AiProvider::Codex => Some("codex"),
            AiProvider::Gemini => Some("gemini"),
        }
    }

    /// プロンプトを渡すCLI引数
    pub fn command_args(&self, prompt: &str) -> Vec<String> {
        match self {
            AiProvider::OpenRouter => Vec::new(),
            AiProvider::Claude => vec!["-p".into(), prompt.into(), "--output-format".into(), "text".into()],
            AiProvider::Codex => vec!["exec".into(), prompt.into()],
            AiProvider::Gemini => vec!["-p".into(), prompt.into()],
        }
    }
}
