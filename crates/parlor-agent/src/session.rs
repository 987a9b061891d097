//! Sessions bind the four engines to a room and a persona.

use crate::config::AgentConfig;
use crate::engine::{
    CartesiaTts, ChatMessage, DeepgramStt, LanguageModel, OpenAiCompatibleLlm, SileroVad,
    SpeechToText, TextToSpeech, VoiceActivityDetector,
};
use crate::error::AgentError;
use crate::job::RoomHandle;
use crate::persona::Agent;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// A conversation running in a room.
#[async_trait]
pub trait Session: Send {
    /// Joins the session to `room` speaking as `agent`. Called once.
    async fn start(&mut self, room: Arc<dyn RoomHandle>, agent: Agent) -> Result<(), AgentError>;

    /// Produces and speaks one reply steered by `instructions`, returning its text.
    async fn generate_reply(&mut self, instructions: &str) -> Result<String, AgentError>;
}

/// Builds a fresh session for each job.
pub trait SessionFactory: Send + Sync {
    type Session: Session;

    fn create_session(&self) -> Result<Self::Session, AgentError>;
}

struct Started {
    room: Arc<dyn RoomHandle>,
    history: Vec<ChatMessage>,
}

/// Listen → transcribe → think → speak, one turn at a time.
pub struct PipelineSession {
    vad: Arc<dyn VoiceActivityDetector>,
    stt: Arc<dyn SpeechToText>,
    llm: Arc<dyn LanguageModel>,
    tts: Arc<dyn TextToSpeech>,
    started: Option<Started>,
}

impl PipelineSession {
    pub fn new(
        vad: Arc<dyn VoiceActivityDetector>,
        stt: Arc<dyn SpeechToText>,
        llm: Arc<dyn LanguageModel>,
        tts: Arc<dyn TextToSpeech>,
    ) -> Self {
        Self {
            vad,
            stt,
            llm,
            tts,
            started: None,
        }
    }

    pub fn is_started(&self) -> bool {
        self.started.is_some()
    }

    /// Conversation so far, starting with the persona instructions.
    pub fn history(&self) -> &[ChatMessage] {
        self.started
            .as_ref()
            .map(|s| s.history.as_slice())
            .unwrap_or_default()
    }

    /// Handles one utterance of user audio at `sample_rate`, which must match
    /// the VAD's rate.
    ///
    /// Returns `None` when the audio holds no speech or transcribes to
    /// nothing; otherwise the spoken reply.
    pub async fn hear(
        &mut self,
        pcm: &[i16],
        sample_rate: u32,
    ) -> Result<Option<String>, AgentError> {
        if self.started.is_none() {
            return Err(AgentError::Session("session has not been started".into()));
        }

        if sample_rate != self.vad.sample_rate() {
            return Err(AgentError::Session(format!(
                "audio sampled at {} Hz, expected {} Hz",
                sample_rate,
                self.vad.sample_rate()
            )));
        }

        if !self.vad.is_speech(pcm) {
            debug!(samples = pcm.len(), "no speech detected");
            return Ok(None);
        }

        let bytes: Vec<u8> = pcm.iter().flat_map(|s| s.to_le_bytes()).collect();
        let text = self.stt.transcribe(&bytes, sample_rate).await?;
        if text.is_empty() {
            return Ok(None);
        }

        info!(chars = text.len(), "user turn transcribed");
        if let Some(started) = self.started.as_mut() {
            started.history.push(ChatMessage::user(text));
        }
        self.respond(None).await.map(Some)
    }

    async fn respond(&mut self, instructions: Option<&str>) -> Result<String, AgentError> {
        let started = self
            .started
            .as_mut()
            .ok_or_else(|| AgentError::Session("session has not been started".into()))?;

        let mut messages = started.history.clone();
        if let Some(instructions) = instructions {
            messages.push(ChatMessage::system(instructions));
        }

        let reply = self.llm.chat(&messages).await?;
        let audio = self.tts.synthesize(&reply).await?;
        started
            .room
            .publish_audio(&audio, self.tts.sample_rate())
            .await?;

        // Only replies the room actually heard become part of the history.
        started.history.push(ChatMessage::assistant(reply.clone()));
        Ok(reply)
    }
}

#[async_trait]
impl Session for PipelineSession {
    async fn start(&mut self, room: Arc<dyn RoomHandle>, agent: Agent) -> Result<(), AgentError> {
        if self.started.is_some() {
            return Err(AgentError::Session("session already started".into()));
        }

        info!(room = room.name(), "starting agent session");
        self.started = Some(Started {
            room,
            history: vec![ChatMessage::system(agent.instructions())],
        });
        Ok(())
    }

    async fn generate_reply(&mut self, instructions: &str) -> Result<String, AgentError> {
        self.respond(Some(instructions)).await
    }
}

/// Builds [`PipelineSession`]s over Silero, Deepgram, an OpenAI-compatible
/// chat endpoint and Cartesia.
#[derive(Debug, Clone)]
pub struct EngineSessionFactory {
    config: AgentConfig,
}

impl EngineSessionFactory {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }
}

impl SessionFactory for EngineSessionFactory {
    type Session = PipelineSession;

    fn create_session(&self) -> Result<PipelineSession, AgentError> {
        let stt = DeepgramStt::new(self.config.stt.clone())?;
        let llm = OpenAiCompatibleLlm::new(self.config.llm.clone())?;
        let tts = CartesiaTts::new(self.config.tts.clone())?;
        // Credentials are checked before the VAD model is loaded.
        let vad = SileroVad::new(&self.config.vad)?;

        info!(
            stt = %self.config.stt.model,
            llm = %llm.model(),
            tts = %self.config.tts.model,
            "agent session created"
        );

        Ok(PipelineSession::new(
            Arc::new(vad),
            Arc::new(stt),
            Arc::new(llm),
            Arc::new(tts),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Role;
    use crate::job::Participant;
    use std::sync::Mutex;

    struct ThresholdVad;

    impl VoiceActivityDetector for ThresholdVad {
        fn speech_probability(&self, frame: &[i16]) -> f32 {
            if frame.iter().any(|s| s.unsigned_abs() > 1000) {
                0.9
            } else {
                0.1
            }
        }

        fn threshold(&self) -> f32 {
            0.5
        }

        fn sample_rate(&self) -> u32 {
            16_000
        }
    }

    struct FixedStt(&'static str);

    #[async_trait]
    impl SpeechToText for FixedStt {
        async fn transcribe(&self, _pcm: &[u8], _sample_rate: u32) -> Result<String, AgentError> {
            Ok(self.0.to_string())
        }
    }

    #[derive(Default)]
    struct RecordingLlm {
        calls: Mutex<Vec<Vec<ChatMessage>>>,
    }

    #[async_trait]
    impl LanguageModel for RecordingLlm {
        async fn chat(&self, messages: &[ChatMessage]) -> Result<String, AgentError> {
            let mut calls = self.calls.lock().expect("lock");
            calls.push(messages.to_vec());
            Ok(format!("reply {}", calls.len()))
        }
    }

    struct EchoTts;

    #[async_trait]
    impl TextToSpeech for EchoTts {
        async fn synthesize(&self, text: &str) -> Result<Vec<u8>, AgentError> {
            Ok(text.as_bytes().to_vec())
        }

        fn sample_rate(&self) -> u32 {
            24_000
        }
    }

    struct FailingTts;

    #[async_trait]
    impl TextToSpeech for FailingTts {
        async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, AgentError> {
            Err(AgentError::engine("tts", "503 Service Unavailable"))
        }

        fn sample_rate(&self) -> u32 {
            24_000
        }
    }

    #[derive(Default)]
    struct RecordingRoom {
        published: Mutex<Vec<(Vec<u8>, u32)>>,
    }

    #[async_trait]
    impl RoomHandle for RecordingRoom {
        fn name(&self) -> &str {
            "test-room"
        }

        fn remote_participants(&self) -> Vec<Participant> {
            Vec::new()
        }

        async fn publish_audio(&self, pcm: &[u8], sample_rate: u32) -> Result<(), AgentError> {
            self.published
                .lock()
                .expect("lock")
                .push((pcm.to_vec(), sample_rate));
            Ok(())
        }
    }

    fn session(stt: &'static str) -> (PipelineSession, Arc<RecordingLlm>) {
        let llm = Arc::new(RecordingLlm::default());
        let session = PipelineSession::new(
            Arc::new(ThresholdVad),
            Arc::new(FixedStt(stt)),
            llm.clone(),
            Arc::new(EchoTts),
        );
        (session, llm)
    }

    #[tokio::test]
    async fn generate_reply_speaks_into_room() {
        let (mut session, llm) = session("");
        let room = Arc::new(RecordingRoom::default());

        session
            .start(room.clone(), Agent::default())
            .await
            .expect("start");
        let reply = session
            .generate_reply("Say hello.")
            .await
            .expect("reply");

        assert_eq!(reply, "reply 1");
        let calls = llm.calls.lock().expect("lock");
        assert_eq!(calls[0][0], ChatMessage::system(crate::AGENT_INSTRUCTIONS));
        assert_eq!(calls[0][1], ChatMessage::system("Say hello."));

        let published = room.published.lock().expect("lock");
        assert_eq!(published.as_slice(), &[(b"reply 1".to_vec(), 24_000)]);

        // One-off instructions are not kept in the history.
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn reply_before_start_is_rejected() {
        let (mut session, llm) = session("");
        let err = session.generate_reply("hi").await.expect_err("should fail");
        assert!(matches!(err, AgentError::Session(_)));
        assert!(llm.calls.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn start_twice_is_rejected() {
        let (mut session, _) = session("");
        let room: Arc<dyn RoomHandle> = Arc::new(RecordingRoom::default());
        session
            .start(room.clone(), Agent::default())
            .await
            .expect("start");
        assert!(session.start(room, Agent::default()).await.is_err());
    }

    #[tokio::test]
    async fn silence_is_ignored() {
        let (mut session, llm) = session("should not be used");
        session
            .start(Arc::new(RecordingRoom::default()), Agent::default())
            .await
            .expect("start");

        let reply = session.hear(&[0; 512], 16_000).await.expect("hear");
        assert_eq!(reply, None);
        assert!(llm.calls.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn speech_becomes_user_turn() {
        let (mut session, llm) = session("what's the weather?");
        session
            .start(Arc::new(RecordingRoom::default()), Agent::default())
            .await
            .expect("start");

        let reply = session.hear(&[5000; 512], 16_000).await.expect("hear");
        assert_eq!(reply.as_deref(), Some("reply 1"));

        let calls = llm.calls.lock().expect("lock");
        assert_eq!(
            calls[0].last(),
            Some(&ChatMessage::user("what's the weather?"))
        );
        assert_eq!(session.history().len(), 3);
    }

    #[tokio::test]
    async fn failed_synthesis_leaves_history_unchanged() {
        let llm = Arc::new(RecordingLlm::default());
        let mut session = PipelineSession::new(
            Arc::new(ThresholdVad),
            Arc::new(FixedStt("")),
            llm.clone(),
            Arc::new(FailingTts),
        );
        let room = Arc::new(RecordingRoom::default());
        session
            .start(room.clone(), Agent::default())
            .await
            .expect("start");

        let err = session
            .generate_reply("Say hello.")
            .await
            .expect_err("synthesis fails");
        assert!(matches!(err, AgentError::Engine { engine: "tts", .. }));
        assert_eq!(llm.calls.lock().expect("lock").len(), 1);
        assert_eq!(session.history().len(), 1);
        assert!(room.published.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn mismatched_sample_rate_is_rejected() {
        let (mut session, llm) = session("should not be used");
        session
            .start(Arc::new(RecordingRoom::default()), Agent::default())
            .await
            .expect("start");

        let err = session
            .hear(&[5000; 1536], 48_000)
            .await
            .expect_err("48 kHz audio is not what the VAD expects");
        assert!(matches!(err, AgentError::Session(msg) if msg.contains("48000")));
        assert!(llm.calls.lock().expect("lock").is_empty());
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn factory_without_keys_fails() {
        let factory = EngineSessionFactory::new(AgentConfig::default());
        assert!(factory.create_session().is_err());
    }
}
