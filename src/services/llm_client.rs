use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{Error, Result};

/// OpenAI-compatible chat completion request
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<PromptMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: String,
}

/// OpenAI-compatible chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: PromptMessage,
}

/// Client for the generation model behind the glossary helpers
/// (Gemini through its OpenAI-compatible surface by default).
pub struct LlmClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl LlmClient {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    pub fn from_config() -> Result<Self> {
        let config = super::config_service::get_effective_config()?;

        if config.llm_api_key.is_empty() {
            return Err(Error::Config(
                "No model API key configured. Set llm_api_key or CARELINK_LLM_API_KEY.".to_string(),
            ));
        }

        Self::new(&config.llm_base_url, &config.llm_api_key, &config.llm_model)
    }

    fn completions_url(&self) -> String {
        if self.base_url.contains("/chat/completions") {
            self.base_url.clone()
        } else {
            format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
        }
    }

    /// Send a chat completion request and return the first choice's text.
    pub async fn chat_completion(
        &self,
        messages: Vec<PromptMessage>,
        temperature: Option<f32>,
    ) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(%status, body = %error_text, "completion request failed");
            return Err(Error::RequestFailed { status });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::MalformedResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Generation("No response content".to_string()))
    }

    pub fn user_message(content: &str) -> PromptMessage {
        PromptMessage {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}
