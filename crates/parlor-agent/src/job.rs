//! The room side of a job: joining, participants and outbound audio.

use crate::error::AgentError;
use async_trait::async_trait;
use parlor_voice::{VoiceError, VoiceService};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Default capacity for the per-room outbound audio broadcast channel.
const DEFAULT_AUDIO_BROADCAST_CAPACITY: usize = 64;

/// A remote participant in a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub identity: String,
    pub name: String,
}

/// A chunk of synthesized speech headed for the room.
#[derive(Debug, Clone)]
pub struct OutboundAudio {
    pub room_name: String,
    pub sample_rate: u32,
    pub pcm: Arc<[u8]>,
}

/// A connected media room.
#[async_trait]
pub trait RoomHandle: Send + Sync {
    fn name(&self) -> &str;

    /// Remote participants as last observed, excluding the agent itself.
    fn remote_participants(&self) -> Vec<Participant>;

    /// Plays little-endian 16-bit mono PCM into the room.
    async fn publish_audio(&self, pcm: &[u8], sample_rate: u32) -> Result<(), AgentError>;
}

/// One job: a room to join and the participants in it.
#[async_trait]
pub trait JobContext: Send {
    /// Room named in the job request.
    fn room_name(&self) -> &str;

    async fn connect(&mut self) -> Result<Arc<dyn RoomHandle>, AgentError>;

    /// Suspends until a remote participant is present and returns it.
    async fn wait_for_participant(&mut self) -> Result<Participant, AgentError>;
}

/// A LiveKit room joined with a signed agent token.
///
/// Outbound audio is fanned out on a broadcast channel; the media transport
/// that carries it to WebRTC subscribers attaches through [`Self::subscribe_audio`].
#[derive(Debug)]
pub struct LiveKitRoom {
    token: String,
    room_name: String,
    participants: RwLock<Vec<Participant>>,
    audio_tx: broadcast::Sender<OutboundAudio>,
}

impl LiveKitRoom {
    pub fn new(
        token: impl Into<String>,
        room_name: impl Into<String>,
        participants: Vec<Participant>,
    ) -> Self {
        let (audio_tx, _) = broadcast::channel(DEFAULT_AUDIO_BROADCAST_CAPACITY);
        Self {
            token: token.into(),
            room_name: room_name.into(),
            participants: RwLock::new(participants),
            audio_tx,
        }
    }

    /// Join token the agent connected with.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn subscribe_audio(&self) -> broadcast::Receiver<OutboundAudio> {
        self.audio_tx.subscribe()
    }

    fn set_participants(&self, participants: Vec<Participant>) {
        match self.participants.write() {
            Ok(mut guard) => *guard = participants,
            Err(poisoned) => *poisoned.into_inner() = participants,
        }
    }
}

#[async_trait]
impl RoomHandle for LiveKitRoom {
    fn name(&self) -> &str {
        &self.room_name
    }

    fn remote_participants(&self) -> Vec<Participant> {
        match self.participants.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    async fn publish_audio(&self, pcm: &[u8], sample_rate: u32) -> Result<(), AgentError> {
        info!(
            room = %self.room_name,
            bytes = pcm.len(),
            sample_rate,
            "publishing audio to room"
        );

        let frame = OutboundAudio {
            room_name: self.room_name.clone(),
            sample_rate,
            pcm: Arc::from(pcm),
        };
        if self.audio_tx.send(frame).is_err() {
            debug!(room = %self.room_name, "no audio subscribers attached");
        }
        Ok(())
    }
}

/// Job context backed by the LiveKit room service.
///
/// Participant presence is observed by polling the room's participant list.
pub struct LiveKitJobContext {
    service: Arc<VoiceService>,
    room_name: String,
    identity: String,
    poll_interval: Duration,
    room: Option<Arc<LiveKitRoom>>,
}

impl LiveKitJobContext {
    pub fn new(
        service: Arc<VoiceService>,
        room_name: impl Into<String>,
        identity: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            service,
            room_name: room_name.into(),
            identity: identity.into(),
            poll_interval,
            room: None,
        }
    }

    /// Remote participants, excluding the agent's own identity. A room that
    /// does not exist yet has no participants; any other failure is returned.
    async fn fetch_participants(&self) -> Result<Vec<Participant>, AgentError> {
        match self.service.list_participants(&self.room_name).await {
            Ok(infos) => Ok(infos
                .into_iter()
                .filter(|info| info.identity != self.identity)
                .map(|info| Participant {
                    identity: info.identity,
                    name: info.name,
                })
                .collect()),
            Err(VoiceError::RoomNotFound(_)) => {
                debug!(room = %self.room_name, "room not created yet");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl JobContext for LiveKitJobContext {
    fn room_name(&self) -> &str {
        &self.room_name
    }

    async fn connect(&mut self) -> Result<Arc<dyn RoomHandle>, AgentError> {
        let token = self
            .service
            .generate_join_token(&self.room_name, &self.identity)?;

        info!(
            room = %self.room_name,
            url = %self.service.get_url(),
            identity = %self.identity,
            "agent connecting to LiveKit room"
        );

        let participants = self.fetch_participants().await?;
        let room = Arc::new(LiveKitRoom::new(
            token,
            self.room_name.clone(),
            participants,
        ));
        self.room = Some(Arc::clone(&room));
        let handle: Arc<dyn RoomHandle> = room;
        Ok(handle)
    }

    async fn wait_for_participant(&mut self) -> Result<Participant, AgentError> {
        let room = self
            .room
            .clone()
            .ok_or_else(|| AgentError::Room("wait_for_participant called before connect".into()))?;

        loop {
            let participants = self.fetch_participants().await?;
            if let Some(first) = participants.first().cloned() {
                room.set_participants(participants);
                return Ok(first);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
