use super::{check_status, http_client, require_api_key, ChatMessage, LanguageModel};
use crate::config::LlmConfig;
use crate::error::AgentError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Chat completions against any OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleLlm {
    config: LlmConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompatibleLlm {
    pub fn new(config: LlmConfig) -> Result<Self, AgentError> {
        require_api_key("llm", "GROQ_API_KEY", &config.api_key)?;
        Ok(Self {
            client: http_client("llm")?,
            config,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl LanguageModel for OpenAiCompatibleLlm {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, AgentError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::engine("llm", e.to_string()))?;

        let parsed: ChatResponse = check_status("llm", response)
            .await?
            .json()
            .await
            .map_err(|e| AgentError::engine("llm", format!("invalid response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| AgentError::engine("llm", "response contained no message content"))
    }
}
