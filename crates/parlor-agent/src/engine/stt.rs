use super::{check_status, http_client, require_api_key, SpeechToText};
use crate::config::SttConfig;
use crate::error::AgentError;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;

/// Maximum audio input size for one transcription request (10 MiB).
const MAX_STT_INPUT_BYTES: usize = 10 * 1024 * 1024;

/// Deepgram pre-recorded transcription over raw linear16 audio.
#[derive(Debug, Clone)]
pub struct DeepgramStt {
    config: SttConfig,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ListenResponse {
    results: ListenResults,
}

#[derive(Deserialize)]
struct ListenResults {
    channels: Vec<ListenChannel>,
}

#[derive(Deserialize)]
struct ListenChannel {
    alternatives: Vec<ListenAlternative>,
}

#[derive(Deserialize)]
struct ListenAlternative {
    transcript: String,
}

impl DeepgramStt {
    pub fn new(config: SttConfig) -> Result<Self, AgentError> {
        require_api_key("stt", "DEEPGRAM_API_KEY", &config.api_key)?;
        Ok(Self {
            client: http_client("stt")?,
            config,
        })
    }
}

#[async_trait]
impl SpeechToText for DeepgramStt {
    async fn transcribe(&self, pcm: &[u8], sample_rate: u32) -> Result<String, AgentError> {
        if pcm.len() > MAX_STT_INPUT_BYTES {
            return Err(AgentError::engine(
                "stt",
                format!(
                    "audio data exceeds maximum size: {} bytes (limit: {} bytes)",
                    pcm.len(),
                    MAX_STT_INPUT_BYTES
                ),
            ));
        }

        let url = format!("{}/listen", self.config.base_url.trim_end_matches('/'));
        let sample_rate = sample_rate.to_string();
        let response = self
            .client
            .post(url)
            .query(&[
                ("model", self.config.model.as_str()),
                ("language", self.config.language.as_str()),
                ("encoding", "linear16"),
                ("sample_rate", sample_rate.as_str()),
                ("channels", "1"),
                ("smart_format", "true"),
            ])
            .header(AUTHORIZATION, format!("Token {}", self.config.api_key))
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(pcm.to_vec())
            .send()
            .await
            .map_err(|e| AgentError::engine("stt", e.to_string()))?;

        let parsed: ListenResponse = check_status("stt", response)
            .await?
            .json()
            .await
            .map_err(|e| AgentError::engine("stt", format!("invalid response: {e}")))?;

        let text = parsed
            .results
            .channels
            .into_iter()
            .next()
            .and_then(|channel| channel.alternatives.into_iter().next())
            .map(|alt| alt.transcript.trim().to_string())
            .unwrap_or_default();

        tracing::debug!(chars = text.len(), "transcribed user audio");
        Ok(text)
    }
}
