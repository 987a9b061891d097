//! Agent worker configuration loading from file and environment variables.

use parlor_voice::{EnvSource, LiveKitConfig, DEFAULT_ROOM};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Top-level worker configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Room the worker joins.
    #[serde(default = "default_room")]
    pub room: String,

    /// Participant identity the agent joins under.
    #[serde(default = "default_identity")]
    pub identity: String,

    /// How often to poll the room while waiting for a participant.
    #[serde(default = "default_participant_poll_ms")]
    pub participant_poll_ms: u64,

    #[serde(default)]
    pub livekit: LiveKitConfig,

    #[serde(default)]
    pub vad: VadConfig,

    #[serde(default)]
    pub stt: SttConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub tts: TtsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Silero voice activity detector settings.
#[derive(Debug, Clone, Deserialize)]
pub struct VadConfig {
    /// Input sample rate; Silero accepts 8000 or 16000.
    #[serde(default = "default_vad_sample_rate")]
    pub sample_rate: u32,

    /// Speech probability at or above which a frame counts as speech.
    #[serde(default = "default_vad_threshold")]
    pub threshold: f32,
}

/// Deepgram speech recognition settings.
#[derive(Clone, Deserialize)]
pub struct SttConfig {
    #[serde(default = "default_stt_model")]
    pub model: String,

    #[serde(default = "default_stt_base_url")]
    pub base_url: String,

    #[serde(default = "default_stt_language")]
    pub language: String,

    #[serde(default)]
    pub api_key: String,
}

/// OpenAI-compatible chat completion settings (Groq by default).
#[derive(Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default)]
    pub api_key: String,
}

/// Cartesia speech synthesis settings.
#[derive(Clone, Deserialize)]
pub struct TtsConfig {
    #[serde(default = "default_tts_model")]
    pub model: String,

    #[serde(default = "default_tts_voice")]
    pub voice: String,

    #[serde(default = "default_tts_base_url")]
    pub base_url: String,

    #[serde(default = "default_tts_api_version")]
    pub api_version: String,

    #[serde(default = "default_tts_sample_rate")]
    pub sample_rate: u32,

    #[serde(default)]
    pub api_key: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "parlor_agent=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_room() -> String {
    DEFAULT_ROOM.to_string()
}

fn default_identity() -> String {
    "parlor-agent".to_string()
}

fn default_participant_poll_ms() -> u64 {
    500
}

fn default_vad_sample_rate() -> u32 {
    16_000
}

fn default_vad_threshold() -> f32 {
    0.5
}

fn default_stt_model() -> String {
    "nova-2".to_string()
}

fn default_stt_base_url() -> String {
    "https://api.deepgram.com/v1".to_string()
}

fn default_stt_language() -> String {
    "en-US".to_string()
}

fn default_llm_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_llm_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_tts_model() -> String {
    "sonic-english".to_string()
}

fn default_tts_voice() -> String {
    "f786b574-daa5-4673-aa0c-cbe3e8534c02".to_string()
}

fn default_tts_base_url() -> String {
    "https://api.cartesia.ai".to_string()
}

fn default_tts_api_version() -> String {
    "2024-06-10".to_string()
}

fn default_tts_sample_rate() -> u32 {
    24_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            room: default_room(),
            identity: default_identity(),
            participant_poll_ms: default_participant_poll_ms(),
            livekit: LiveKitConfig::default(),
            vad: VadConfig::default(),
            stt: SttConfig::default(),
            llm: LlmConfig::default(),
            tts: TtsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_vad_sample_rate(),
            threshold: default_vad_threshold(),
        }
    }
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model: default_stt_model(),
            base_url: default_stt_base_url(),
            language: default_stt_language(),
            api_key: String::new(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_llm_model(),
            base_url: default_llm_base_url(),
            temperature: None,
            api_key: String::new(),
        }
    }
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            model: default_tts_model(),
            voice: default_tts_voice(),
            base_url: default_tts_base_url(),
            api_version: default_tts_api_version(),
            sample_rate: default_tts_sample_rate(),
            api_key: String::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl fmt::Debug for SttConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SttConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .field("api_key", &mask_secret(&self.api_key))
            .finish()
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("api_key", &mask_secret(&self.api_key))
            .finish()
    }
}

impl fmt::Debug for TtsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtsConfig")
            .field("model", &self.model)
            .field("voice", &self.voice)
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("sample_rate", &self.sample_rate)
            .field("api_key", &mask_secret(&self.api_key))
            .finish()
    }
}

/// Shows only a short prefix of a secret, or a marker when it is unset.
pub fn mask_secret(secret: &str) -> String {
    const VISIBLE: usize = 4;
    if secret.is_empty() {
        return "<unset>".to_string();
    }
    let prefix: String = secret.chars().take(VISIBLE).collect();
    format!("{prefix}...")
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment overrides:
/// - `LIVEKIT_URL`, `LIVEKIT_API_KEY`, `LIVEKIT_API_SECRET` override `livekit.*`
/// - `GROQ_API_KEY` overrides `llm.api_key`
/// - `CARTESIA_API_KEY` overrides `tts.api_key`
/// - `DEEPGRAM_API_KEY` overrides `stt.api_key`
/// - `PARLOR_ROOM` overrides `room`
/// - `PARLOR_LOG_LEVEL` overrides `logging.level`
/// - `PARLOR_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>, env: &EnvSource) -> Result<AgentConfig, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                AgentConfig::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => AgentConfig::default(),
    };

    config.livekit.apply_env(env);

    if let Some(key) = env.get("GROQ_API_KEY") {
        config.llm.api_key = key.to_string();
    }
    if let Some(key) = env.get("CARTESIA_API_KEY") {
        config.tts.api_key = key.to_string();
    }
    if let Some(key) = env.get("DEEPGRAM_API_KEY") {
        config.stt.api_key = key.to_string();
    }
    if let Some(room) = env.get("PARLOR_ROOM") {
        config.room = room.to_string();
    }
    if let Some(level) = env.get("PARLOR_LOG_LEVEL") {
        config.logging.level = level.to_string();
    }
    if let Some(json) = env.get("PARLOR_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    Ok(config)
}
