//! Parlor agent worker binary.
//!
//! Loads configuration from `config.toml` (or `--config`), the `.env` file
//! and the process environment, then runs one voice-assistant job.

use clap::Parser;
use parlor_agent::config::load_config;
use parlor_agent::{run_app, WorkerOptions};
use parlor_voice::EnvSource;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "parlor-agent", version, about = "LiveKit voice assistant worker")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, env = "PARLOR_AGENT_CONFIG", default_value = "config.toml")]
    config: String,

    /// Path to a dotenv file with API keys.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Room to join, overriding the configuration.
    #[arg(long)]
    room: Option<String>,

    /// Participant identity for the agent, overriding the configuration.
    #[arg(long)]
    identity: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let env = EnvSource::load(&cli.env_file);
    let mut config = match load_config(Some(cli.config.as_str()), &env) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            for issue in env.issues() {
                eprintln!("{issue}");
            }
            return ExitCode::FAILURE;
        }
    };
    if let Some(room) = cli.room {
        config.room = room;
    }
    if let Some(identity) = cli.identity {
        config.identity = identity;
    }

    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    env.log_issues();

    tracing::info!(path = %cli.config, "resolved startup configuration path");

    match run_app(WorkerOptions::new(config)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %parlor_agent::error::error_chain(&e), "agent worker failed");
            ExitCode::FAILURE
        }
    }
}
