use livekit_api::services::ServiceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("LiveKit access token error: {0}")]
    LiveKit(#[from] livekit_api::access_token::AccessTokenError),

    #[error("Room service error: {0}")]
    RoomService(#[from] ServiceError),

    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
