//! Parlor voice agent.
//!
//! A job joins a LiveKit room, waits until somebody is there to talk to,
//! builds a session over four engines (voice activity detection, speech
//! recognition, a chat model and speech synthesis) and greets the user.
//!
//! The engines and the room are trait objects so the sequencing in
//! [`entrypoint`] can be driven by stubs in tests and by the HTTP-backed
//! engines plus [`LiveKitJobContext`] in the worker binary.

pub mod config;
pub mod engine;
pub mod entrypoint;
pub mod error;
pub mod job;
pub mod persona;
pub mod session;
pub mod worker;

pub use config::AgentConfig;
pub use entrypoint::entrypoint;
pub use error::AgentError;
pub use job::{JobContext, LiveKitJobContext, LiveKitRoom, Participant, RoomHandle};
pub use persona::{Agent, AGENT_INSTRUCTIONS, GREETING_INSTRUCTIONS};
pub use session::{EngineSessionFactory, PipelineSession, Session, SessionFactory};
pub use worker::{run_app, WorkerOptions};
