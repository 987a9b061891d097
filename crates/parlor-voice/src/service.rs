use crate::config::LiveKitConfig;
use crate::error::VoiceError;
use livekit_api::access_token::{AccessToken, VideoGrants};
use livekit_api::services::room::{CreateRoomOptions, RoomClient};
use livekit_api::services::{ServiceError, TwirpError, TwirpErrorCode};
use livekit_protocol::{ParticipantInfo, Room};
use std::time::Duration;

#[derive(Debug)]
pub struct VoiceService {
    config: LiveKitConfig,
    room_client: RoomClient,
}

impl VoiceService {
    pub fn new(config: LiveKitConfig) -> Self {
        let room_client =
            RoomClient::with_api_key(&config.http_url(), &config.api_key, &config.api_secret);
        Self {
            config,
            room_client,
        }
    }

    /// Returns the signalling URL clients connect to.
    pub fn get_url(&self) -> &str {
        &self.config.url
    }

    /// Signs a join token for `participant_identity` scoped to `room_name`,
    /// with publish and subscribe rights.
    pub fn generate_join_token(
        &self,
        room_name: &str,
        participant_identity: &str,
    ) -> Result<String, VoiceError> {
        let mut token = AccessToken::with_api_key(&self.config.api_key, &self.config.api_secret)
            .with_identity(participant_identity)
            .with_grants(VideoGrants {
                room_join: true,
                room: room_name.to_string(),
                can_publish: true,
                can_subscribe: true,
                ..Default::default()
            });

        if let Some(ttl) = self.config.token_ttl_seconds {
            token = token.with_ttl(Duration::from_secs(ttl));
        }

        token.to_jwt().map_err(VoiceError::LiveKit)
    }

    pub async fn create_room(&self, name: &str) -> Result<Room, VoiceError> {
        let options = CreateRoomOptions::default();

        Ok(self.room_client.create_room(name, options).await?)
    }

    /// Looks up a room by name. `Ok(None)` means the server answered and the
    /// room does not exist.
    pub async fn find_room(&self, name: &str) -> Result<Option<Room>, VoiceError> {
        let rooms = self
            .room_client
            .list_rooms(vec![name.to_string()])
            .await?;

        Ok(rooms.into_iter().find(|room| room.name == name))
    }

    /// Lists the participants in `room_name`. A room the server does not
    /// know yields [`VoiceError::RoomNotFound`].
    pub async fn list_participants(
        &self,
        room_name: &str,
    ) -> Result<Vec<ParticipantInfo>, VoiceError> {
        self.room_client
            .list_participants(room_name)
            .await
            .map_err(|e| {
                if is_not_found(&e) {
                    VoiceError::RoomNotFound(room_name.to_string())
                } else {
                    VoiceError::RoomService(e)
                }
            })
    }
}

fn is_not_found(err: &ServiceError) -> bool {
    matches!(
        err,
        ServiceError::Twirp(TwirpError::Twirp(code)) if code.code == TwirpErrorCode::NOT_FOUND
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn twirp(code: &str) -> ServiceError {
        ServiceError::Twirp(TwirpError::Twirp(TwirpErrorCode {
            code: code.to_string(),
            msg: "requested room does not exist".to_string(),
        }))
    }

    #[test]
    fn only_twirp_not_found_counts_as_missing_room() {
        assert!(is_not_found(&twirp(TwirpErrorCode::NOT_FOUND)));
        assert!(!is_not_found(&twirp(TwirpErrorCode::UNAUTHENTICATED)));
        assert!(!is_not_found(&twirp(TwirpErrorCode::UNAVAILABLE)));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_service_error() {
        let config = LiveKitConfig::new("ws://127.0.0.1:9", "devkey", "secret");
        let service = VoiceService::new(config);
        let err = service
            .list_participants("default")
            .await
            .expect_err("nothing listens on the discard port");
        assert!(matches!(err, VoiceError::RoomService(_)));
    }
}
