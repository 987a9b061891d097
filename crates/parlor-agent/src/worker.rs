//! Worker process: runs one job and keeps its session alive until shutdown.

use crate::config::{mask_secret, AgentConfig};
use crate::entrypoint::entrypoint;
use crate::error::AgentError;
use crate::job::LiveKitJobContext;
use crate::session::EngineSessionFactory;
use parlor_voice::{VoiceError, VoiceService};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Everything the worker needs to run a job.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    pub config: AgentConfig,
}

impl WorkerOptions {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }
}

/// Runs the agent for the configured room.
///
/// Returns after SIGINT/SIGTERM, or early if the job fails to start.
pub async fn run_app(options: WorkerOptions) -> Result<(), AgentError> {
    let config = options.config;

    let missing = config.livekit.missing_fields();
    if !missing.is_empty() {
        return Err(VoiceError::Config(format!(
            "LiveKit settings missing: {} (set LIVEKIT_URL, LIVEKIT_API_KEY, LIVEKIT_API_SECRET)",
            missing.join(", ")
        ))
        .into());
    }

    info!(
        groq_api_key = %mask_secret(&config.llm.api_key),
        cartesia_api_key = %mask_secret(&config.tts.api_key),
        deepgram_api_key = %mask_secret(&config.stt.api_key),
        "engine credentials"
    );
    for (name, value) in [
        ("GROQ_API_KEY", &config.llm.api_key),
        ("CARTESIA_API_KEY", &config.tts.api_key),
        ("DEEPGRAM_API_KEY", &config.stt.api_key),
    ] {
        if value.is_empty() {
            warn!("{} not found", name);
        }
    }

    info!(room = %config.room, identity = %config.identity, "starting LiveKit agent worker");

    let service = Arc::new(VoiceService::new(config.livekit.clone()));
    let mut ctx = LiveKitJobContext::new(
        service,
        config.room.clone(),
        config.identity.clone(),
        Duration::from_millis(config.participant_poll_ms.max(1)),
    );
    let factory = EngineSessionFactory::new(config);

    let session = tokio::select! {
        result = entrypoint(&mut ctx, &factory) => result?,
        () = shutdown_signal() => {
            info!("shutdown requested before the session started");
            return Ok(());
        }
    };

    info!("agent session running");
    shutdown_signal().await;
    drop(session);
    info!("agent worker shut down");
    Ok(())
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT, shutting down"); }
        () = terminate => { info!("received SIGTERM, shutting down"); }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_livekit_settings_fail_fast() {
        let result = run_app(WorkerOptions::new(AgentConfig::default())).await;
        match result {
            Err(AgentError::Voice(VoiceError::Config(msg))) => {
                assert!(msg.contains("url"));
                assert!(msg.contains("api_secret"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
