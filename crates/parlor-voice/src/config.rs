use crate::env::EnvSource;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection settings for a LiveKit deployment.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct LiveKitConfig {
    /// Signalling URL handed to browsers and agents (usually `wss://...`).
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing)]
    pub api_secret: String,
    /// Join token TTL in seconds. `None` keeps the signing library's default.
    #[serde(default)]
    pub token_ttl_seconds: Option<u64>,
}

impl fmt::Debug for LiveKitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveKitConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .finish()
    }
}

impl LiveKitConfig {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            token_ttl_seconds: None,
        }
    }

    /// Overrides fields from `LIVEKIT_URL`, `LIVEKIT_API_KEY` and
    /// `LIVEKIT_API_SECRET` when present.
    pub fn apply_env(&mut self, env: &EnvSource) {
        if let Some(url) = env.get("LIVEKIT_URL") {
            self.url = url.to_string();
        }
        if let Some(key) = env.get("LIVEKIT_API_KEY") {
            self.api_key = key.to_string();
        }
        if let Some(secret) = env.get("LIVEKIT_API_SECRET") {
            self.api_secret = secret.to_string();
        }
    }

    /// Base URL of the room service API.
    ///
    /// The signalling URL uses a websocket scheme; the management API is
    /// served over plain HTTP(S) on the same host.
    pub fn http_url(&self) -> String {
        if let Some(rest) = self.url.strip_prefix("wss://") {
            format!("https://{rest}")
        } else if let Some(rest) = self.url.strip_prefix("ws://") {
            format!("http://{rest}")
        } else {
            self.url.clone()
        }
    }

    /// Returns the names of required fields that are still empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.url.is_empty() {
            missing.push("url");
        }
        if self.api_key.is_empty() {
            missing.push("api_key");
        }
        if self.api_secret.is_empty() {
            missing.push("api_secret");
        }
        missing
    }
}
