//! One-shot creation of the default room at service startup.

use crate::error::VoiceError;
use crate::service::VoiceService;
use async_trait::async_trait;
use std::fmt;

/// Name of the room created at startup and used when a token request omits one.
pub const DEFAULT_ROOM: &str = "default";

/// Room management calls needed by [`bootstrap_room`].
#[async_trait]
pub trait RoomProvisioner: Send + Sync {
    async fn room_exists(&self, name: &str) -> Result<bool, VoiceError>;

    /// Creates the room and returns the name the server assigned.
    async fn create_room(&self, name: &str) -> Result<String, VoiceError>;
}

#[async_trait]
impl RoomProvisioner for VoiceService {
    async fn room_exists(&self, name: &str) -> Result<bool, VoiceError> {
        Ok(self.find_room(name).await?.is_some())
    }

    async fn create_room(&self, name: &str) -> Result<String, VoiceError> {
        VoiceService::create_room(self, name)
            .await
            .map(|room| room.name)
    }
}

/// Result of trying to provision a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomBootstrap {
    Created(String),
    AlreadyExists(String),
    TransportError { room: String, message: String },
}

impl RoomBootstrap {
    pub fn room(&self) -> &str {
        match self {
            RoomBootstrap::Created(room) | RoomBootstrap::AlreadyExists(room) => room,
            RoomBootstrap::TransportError { room, .. } => room,
        }
    }

    /// Whether the room is known to exist afterwards.
    pub fn is_ready(&self) -> bool {
        !matches!(self, RoomBootstrap::TransportError { .. })
    }

    /// Logs the outcome. Failures are warnings; startup continues either way.
    pub fn log(&self) {
        match self {
            RoomBootstrap::Created(room) => {
                tracing::info!(room = %room, outcome = "created", "room bootstrap finished");
            }
            RoomBootstrap::AlreadyExists(room) => {
                tracing::info!(room = %room, outcome = "already_exists", "room bootstrap finished");
            }
            RoomBootstrap::TransportError { room, message } => {
                tracing::warn!(
                    room = %room,
                    outcome = "transport_error",
                    error = %message,
                    "room bootstrap failed, continuing startup"
                );
            }
        }
    }
}

impl fmt::Display for RoomBootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomBootstrap::Created(room) => write!(f, "room '{room}' created"),
            RoomBootstrap::AlreadyExists(room) => write!(f, "room '{room}' already exists"),
            RoomBootstrap::TransportError { room, message } => {
                write!(f, "room '{room}' could not be created: {message}")
            }
        }
    }
}

/// Ensures `name` exists. Never fails: every error becomes
/// [`RoomBootstrap::TransportError`]. No retry.
pub async fn bootstrap_room<P>(provisioner: &P, name: &str) -> RoomBootstrap
where
    P: RoomProvisioner + ?Sized,
{
    let transport_error = |e: VoiceError| RoomBootstrap::TransportError {
        room: name.to_string(),
        message: e.to_string(),
    };

    match provisioner.room_exists(name).await {
        Ok(true) => return RoomBootstrap::AlreadyExists(name.to_string()),
        Ok(false) => {}
        Err(e) => return transport_error(e),
    }

    match provisioner.create_room(name).await {
        Ok(created) => RoomBootstrap::Created(created),
        Err(e) => transport_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livekit_api::services::{ServiceError, TwirpError, TwirpErrorCode};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn unavailable(msg: &str) -> VoiceError {
        VoiceError::RoomService(ServiceError::Twirp(TwirpError::Twirp(TwirpErrorCode {
            code: TwirpErrorCode::UNAVAILABLE.to_string(),
            msg: msg.to_string(),
        })))
    }

    struct StubProvisioner {
        exists: Result<bool, &'static str>,
        create: Result<(), &'static str>,
        create_calls: AtomicUsize,
    }

    impl StubProvisioner {
        fn new(exists: Result<bool, &'static str>, create: Result<(), &'static str>) -> Self {
            Self {
                exists,
                create,
                create_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RoomProvisioner for StubProvisioner {
        async fn room_exists(&self, _name: &str) -> Result<bool, VoiceError> {
            self.exists.map_err(unavailable)
        }

        async fn create_room(&self, name: &str) -> Result<String, VoiceError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            self.create
                .map(|()| name.to_string())
                .map_err(unavailable)
        }
    }

    #[tokio::test]
    async fn creates_missing_room() {
        let stub = StubProvisioner::new(Ok(false), Ok(()));
        let outcome = bootstrap_room(&stub, DEFAULT_ROOM).await;
        assert_eq!(outcome, RoomBootstrap::Created("default".to_string()));
        assert!(outcome.is_ready());
        assert_eq!(stub.create_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn existing_room_is_not_recreated() {
        let stub = StubProvisioner::new(Ok(true), Ok(()));
        let outcome = bootstrap_room(&stub, DEFAULT_ROOM).await;
        assert_eq!(outcome, RoomBootstrap::AlreadyExists("default".to_string()));
        assert_eq!(stub.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn lookup_failure_is_transport_error() {
        let stub = StubProvisioner::new(Err("connection refused"), Ok(()));
        let outcome = bootstrap_room(&stub, DEFAULT_ROOM).await;
        assert!(!outcome.is_ready());
        assert_eq!(outcome.room(), "default");
        match outcome {
            RoomBootstrap::TransportError { message, .. } => {
                assert!(message.contains("connection refused"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(stub.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn create_failure_is_transport_error() {
        let stub = StubProvisioner::new(Ok(false), Err("unauthorized"));
        let outcome = bootstrap_room(&stub, "lobby").await;
        match outcome {
            RoomBootstrap::TransportError { room, message } => {
                assert_eq!(room, "lobby");
                assert!(message.starts_with("Room service error"));
                assert!(message.contains("unauthorized"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
