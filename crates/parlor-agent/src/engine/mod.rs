//! Speech and language engines a session is wired to.

pub mod llm;
pub mod stt;
pub mod tts;
pub mod vad;

use crate::error::AgentError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use llm::OpenAiCompatibleLlm;
pub use stt::DeepgramStt;
pub use tts::CartesiaTts;
pub use vad::SileroVad;

/// Timeout applied to every vendor HTTP request.
const ENGINE_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Scores 16-bit mono frames for the presence of speech.
pub trait VoiceActivityDetector: Send + Sync {
    /// Probability in `0.0..=1.0` that `frame` contains speech.
    fn speech_probability(&self, frame: &[i16]) -> f32;

    fn threshold(&self) -> f32;

    /// Sample rate, in Hz, that frames must be recorded at.
    fn sample_rate(&self) -> u32;

    fn is_speech(&self, frame: &[i16]) -> bool {
        self.speech_probability(frame) >= self.threshold()
    }
}

#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribes little-endian 16-bit mono PCM.
    async fn transcribe(&self, pcm: &[u8], sample_rate: u32) -> Result<String, AgentError>;
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Returns the assistant's reply to `messages`.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, AgentError>;
}

#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Renders `text` to little-endian 16-bit mono PCM at [`Self::sample_rate`].
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, AgentError>;

    fn sample_rate(&self) -> u32;
}

pub(crate) fn http_client(engine: &'static str) -> Result<reqwest::Client, AgentError> {
    reqwest::Client::builder()
        .timeout(ENGINE_HTTP_TIMEOUT)
        .user_agent(concat!("parlor-agent/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AgentError::engine(engine, format!("failed to build HTTP client: {e}")))
}

pub(crate) fn require_api_key(
    engine: &'static str,
    env_var: &str,
    key: &str,
) -> Result<(), AgentError> {
    if key.is_empty() {
        return Err(AgentError::Config(format!(
            "{engine} API key is missing (set {env_var})"
        )));
    }
    Ok(())
}

/// Turns a non-success response into an engine error carrying the body.
pub(crate) async fn check_status(
    engine: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, AgentError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AgentError::engine(engine, format!("HTTP {status}: {body}")))
}
