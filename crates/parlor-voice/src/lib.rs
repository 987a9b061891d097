//! LiveKit integration shared by the Parlor agent worker and token service.
//!
//! Holds the LiveKit connection settings, signs participant access tokens,
//! talks to the LiveKit room service (room creation, lookup, participant
//! listing) and reports the outcome of the startup room bootstrap.
//!
//! Components never read the process environment themselves. Binaries
//! build an [`EnvSource`] once and pass the resulting configuration down.

pub mod bootstrap;
pub mod config;
pub mod env;
pub mod error;
pub mod service;

pub use bootstrap::{bootstrap_room, RoomBootstrap, RoomProvisioner, DEFAULT_ROOM};
pub use config::LiveKitConfig;
pub use env::EnvSource;
pub use error::VoiceError;
pub use service::VoiceService;
