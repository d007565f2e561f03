//! Arena Client - headless networked player
//!
//! Connects to a relay hub and keeps a local player simulated:
//! - frame loop stepping movement and collisions
//! - periodic state snapshots to the hub
//! - remote player roster sync from hub ticks

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arena_client::app::{AppState, FrameLoop};
use arena_client::config::{Config, LogFormat};
use arena_client::game::roster::LoggingHooks;
use arena_client::net::{Disconnect, MessageChannel};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level, config.log_format);

    info!("Starting Arena Client");
    info!(
        hub = %config.hub_url,
        player_name = %config.player_name,
        seed = config.sim_seed,
        "Client configuration"
    );

    let state = AppState::new(config.clone());

    // Frame loop runs regardless of network state
    let frame_loop = tokio::spawn(FrameLoop::new(state.simulation.clone(), config.frame_duration()).run());

    let channel = MessageChannel::connect_ws(&config.hub_url).await?;
    let mut dispatcher = state.dispatcher(channel.outbound, LoggingHooks);

    tokio::select! {
        outcome = dispatcher.run(channel.inbound) => {
            match outcome.disconnect {
                Disconnect::Closed => info!("Hub connection closed"),
                Disconnect::Failed(reason) => warn!(error = %reason, "Hub connection failed"),
                Disconnect::HubSilent => warn!("Hub went silent"),
            }
            info!(
                messages = outcome.stats.messages,
                roster_ticks = outcome.stats.roster_ticks,
                unrecognized = outcome.stats.unrecognized,
                snapshots_sent = outcome.session.map(|r| r.stats.total_snapshots).unwrap_or(0),
                "Session summary"
            );
        }
        _ = shutdown_signal() => {}
    }

    frame_loop.abort();

    info!("Client shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str, format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init(),
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
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
                warn!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
