use super::CompletionProvider;
use crate::config::Config;
use crate::error::{OccupationAiError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

pub const OPENROUTER_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";

const APP_REFERER: &str = "http://localhost:3000";
const APP_TITLE: &str = "occupation-ai";
const TEMPERATURE: f64 = 0.1;
const MAX_TOKENS: u32 = 2000;

/// OpenRouter チャット補完クライアント
#[derive(Clone)]
pub struct OpenRouterProvider {
    api_key: String,
    model: String,
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

impl OpenRouterProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            endpoint: OPENROUTER_ENDPOINT.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// 環境変数・設定ファイルから作成
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.get_api_key()?, config.get_model()))
    }

    /// 互換APIのエンドポイントを使う
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": &self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS
        })
    }
}

/// 応答ボディから本文を取り出す
fn extract_content(body: &str) -> Result<String> {
    let response: ApiResponse =
        serde_json::from_str(body).map_err(|e| OccupationAiError::ApiParse(e.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| OccupationAiError::ApiParse("choices[0].message.content がありません".into()))
}

#[async_trait]
impl CompletionProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "calling openrouter");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", APP_REFERER)
            .header("X-Title", APP_TITLE)
            .header("Content-Type", "application/json")
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| OccupationAiError::ApiCall(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OccupationAiError::ApiCall(e.to_string()))?;

        if !status.is_success() {
            return Err(OccupationAiError::ApiCall(format!("OpenRouter API error {}: {}", status, body)));
        }

        let content = extract_content(&body)?;
        debug!(response_chars = content.chars().count(), "openrouter responded");
        Ok(content)
    }
}
