use crate::error::{error_chain, AgentError};
use crate::job::{JobContext, RoomHandle};
use crate::persona::{Agent, GREETING_INSTRUCTIONS};
use crate::session::{Session, SessionFactory};
use std::sync::Arc;
use tracing::{error, info};

/// Runs one job: join the room, wait for someone to talk to, start a session
/// and greet them.
///
/// The session is not built until a remote participant is present. Errors
/// from building, starting or greeting are logged with their full cause
/// chain and returned to the caller; nothing is retried.
pub async fn entrypoint<C, F>(ctx: &mut C, factory: &F) -> Result<F::Session, AgentError>
where
    C: JobContext + ?Sized,
    F: SessionFactory,
{
    info!(room = ctx.room_name(), "job request received");

    let room = ctx.connect().await?;
    let participant_count = room.remote_participants().len();
    info!(room = room.name(), participant_count, "room connected");

    if participant_count == 0 {
        info!("waiting for participant to join");
        let participant = ctx.wait_for_participant().await?;
        info!(identity = %participant.identity, "participant joined");
    }

    match start_session(room, factory).await {
        Ok(session) => Ok(session),
        Err(e) => {
            error!(error = %error_chain(&e), "agent entrypoint failed");
            Err(e)
        }
    }
}

async fn start_session<F>(room: Arc<dyn RoomHandle>, factory: &F) -> Result<F::Session, AgentError>
where
    F: SessionFactory,
{
    info!("creating agent session");
    let mut session = factory.create_session()?;

    let agent = Agent::default();
    let room_name = room.name().to_string();
    session.start(room, agent).await?;
    info!(room = %room_name, "agent session started");

    session.generate_reply(GREETING_INSTRUCTIONS).await?;
    info!("initial greeting sent");

    Ok(session)
}
