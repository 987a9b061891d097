use super::{check_status, http_client, require_api_key, TextToSpeech};
use crate::config::TtsConfig;
use crate::error::AgentError;
use async_trait::async_trait;
use serde::Serialize;

/// Maximum text input size for one synthesis request (64 KiB).
const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

/// Cartesia `/tts/bytes` synthesis returning raw PCM.
#[derive(Debug, Clone)]
pub struct CartesiaTts {
    config: TtsConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct TtsRequest<'a> {
    model_id: &'a str,
    transcript: &'a str,
    voice: VoiceSpec<'a>,
    output_format: OutputFormat,
    language: &'a str,
}

#[derive(Serialize)]
struct VoiceSpec<'a> {
    mode: &'static str,
    id: &'a str,
}

#[derive(Serialize)]
struct OutputFormat {
    container: &'static str,
    encoding: &'static str,
    sample_rate: u32,
}

impl CartesiaTts {
    pub fn new(config: TtsConfig) -> Result<Self, AgentError> {
        require_api_key("tts", "CARTESIA_API_KEY", &config.api_key)?;
        Ok(Self {
            client: http_client("tts")?,
            config,
        })
    }
}

#[async_trait]
impl TextToSpeech for CartesiaTts {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, AgentError> {
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(AgentError::engine(
                "tts",
                format!(
                    "text exceeds maximum size: {} bytes (limit: {} bytes)",
                    text.len(),
                    MAX_TTS_INPUT_BYTES
                ),
            ));
        }

        let url = format!("{}/tts/bytes", self.config.base_url.trim_end_matches('/'));
        let request = TtsRequest {
            model_id: &self.config.model,
            transcript: text,
            voice: VoiceSpec {
                mode: "id",
                id: &self.config.voice,
            },
            output_format: OutputFormat {
                container: "raw",
                encoding: "pcm_s16le",
                sample_rate: self.config.sample_rate,
            },
            language: "en",
        };

        let response = self
            .client
            .post(url)
            .header("X-API-Key", &self.config.api_key)
            .header("Cartesia-Version", &self.config.api_version)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::engine("tts", e.to_string()))?;

        let audio = check_status("tts", response)
            .await?
            .bytes()
            .await
            .map_err(|e| AgentError::engine("tts", format!("failed to read audio: {e}")))?;

        tracing::debug!(bytes = audio.len(), "synthesized speech");
        Ok(audio.to_vec())
    }

    fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }
}
