use super::CompletionProvider;
use crate::ai_provider::AiProvider;
use crate::error::{OccupationAiError, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// ローカルAI CLIを呼び出すプロバイダ
#[derive(Debug, Clone)]
pub struct CliProvider {
    kind: AiProvider,
    program: String,
}

impl CliProvider {
    pub fn new(kind: AiProvider) -> Self {
        Self {
            kind,
            program: kind.command_name().unwrap_or("claude").to_string(),
        }
    }

    /// 実行ファイルを差し替える（PATH外のCLIなど）
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn command(&self, prompt: &str) -> Command {
        let args = self.kind.command_args(prompt);

        // Windowsではcmd /c経由
        #[cfg(windows)]
        let mut cmd = {
            let mut cmd = Command::new("cmd");
            cmd.arg("/c").arg(&self.program).args(&args);
            cmd
        };

        #[cfg(not(windows))]
        let mut cmd = {
            let mut cmd = Command::new(&self.program);
            cmd.args(&args);
            cmd
        };

        // タイムアウトで future が破棄されたら子プロセスも終了させる
        cmd.kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl CompletionProvider for CliProvider {
    fn name(&self) -> &str {
        &self.program
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!(program = %self.program, prompt_chars = prompt.chars().count(), "running ai cli");

        let output = self
            .command(prompt)
            .output()
            .await
            .map_err(|e| OccupationAiError::CliExecution(format!("{} 実行エラー: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OccupationAiError::CliExecution(format!(
                "{} failed (code {:?}): {}",
                self.program,
                output.status.code(),
                stderr
            )));
        }

        let response = String::from_utf8_lossy(&output.stdout).to_string();
        let preview: String = response.chars().take(500).collect();
        debug!(response = %preview, "ai cli responded");

        Ok(response)
    }
}
