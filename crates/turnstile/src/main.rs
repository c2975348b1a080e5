//! Turnstile - unified CLI.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command, PolicyArg};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;
use turnstile::{LocalClient, Lobby, ServerConfig, SimpleBot, TracingPresenter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,turnstile=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            host,
            port,
            tick_millis,
            timeout_policy,
        } => run_server(config, host, port, tick_millis, timeout_policy).await,
        Command::Demo {
            tick_millis,
            timeout_policy,
        } => run_demo(tick_millis, timeout_policy).await,
    }
}

/// Run the game server
#[instrument]
async fn run_server(
    config_path: Option<std::path::PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    tick_millis: Option<u64>,
    timeout_policy: Option<PolicyArg>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    }
    .with_env();
    if let Some(host) = host {
        config = config.with_host(host);
    }
    if let Some(port) = port {
        config = config.with_port(port);
    }
    if let Some(tick_millis) = tick_millis {
        config = config.with_tick_millis(tick_millis)?;
    }
    if let Some(policy) = timeout_policy {
        config = config.with_timeout_policy(policy.into());
    }

    info!(?config, "Starting turnstile server");
    turnstile::serve(&config).await
}

/// Play one bot-vs-bot game in-process
#[instrument]
async fn run_demo(tick_millis: u64, timeout_policy: PolicyArg) -> Result<()> {
    let config = ServerConfig::default()
        .with_tick_millis(tick_millis)?
        .with_timeout_policy(timeout_policy.into());
    let lobby = Lobby::new(config.room_config());

    let first = LocalClient::connect(&lobby).await?;
    let second = LocalClient::connect(&lobby).await?;
    info!(room_id = %first.room_id(), "Bots seated");

    let (first, second) = tokio::join!(
        SimpleBot::new(first, TracingPresenter::new("X".to_string())).run(),
        SimpleBot::new(second, TracingPresenter::new("O".to_string())).run(),
    );
    info!(x = ?first, o = ?second, "Demo finished");
    Ok(())
}
