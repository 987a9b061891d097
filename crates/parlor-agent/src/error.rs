use parlor_voice::VoiceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("voice service error: {0}")]
    Voice(#[from] VoiceError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{engine} engine error: {message}")]
    Engine {
        engine: &'static str,
        message: String,
    },

    #[error("session error: {0}")]
    Session(String),

    #[error("room error: {0}")]
    Room(String),
}

impl AgentError {
    pub(crate) fn engine(engine: &'static str, message: impl Into<String>) -> Self {
        AgentError::Engine {
            engine,
            message: message.into(),
        }
    }
}

/// Renders an error with every `source()` in its chain, outermost first.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        current = cause.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_includes_sources() {
        let err = AgentError::Voice(VoiceError::RoomNotFound("lobby".into()));
        let chain = error_chain(&err);
        assert!(chain.starts_with("voice service error"));
        assert!(chain.contains("Room not found: lobby"));
    }

    #[test]
    fn engine_error_names_engine() {
        let err = AgentError::engine("tts", "401 Unauthorized");
        assert_eq!(err.to_string(), "tts engine error: 401 Unauthorized");
    }
}
