//! Driver alert terminal (abus-driver) - Main entry point

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use abus_common::audio::{self, ClipLibrary, SpeakerAnnouncer};
use abus_common::config::Config;
use abus_driver::{api, DriverTerminal};
use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for abus-driver
#[derive(Parser, Debug)]
#[command(name = "abus-driver")]
#[command(about = "Driver alert terminal for the assistive bus-call system")]
#[command(version)]
struct Args {
    /// Configuration file (overrides ABUS_CONFIG and the default locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides [driver] port)
    #[arg(short, long, env = "ABUS_DRIVER_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "abus_driver=debug,abus_common=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!(
        "Starting abus-driver v{} [{}] backends: {}",
        env!("CARGO_PKG_VERSION"),
        env!("ABUS_GIT_HASH"),
        env!("ABUS_BACKENDS"),
    );

    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    let routes = config.route_table().context("Invalid route table")?;
    let port = args.port.unwrap_or(config.driver.port);

    let amp = audio::open_amp(&config.audio, config.driver.amp_pin)
        .context("Failed to open amplifier line")?;
    let player = audio::open_player(&config.audio).context("Failed to open audio output")?;
    let announcer = Arc::new(SpeakerAnnouncer::new(
        ClipLibrary::new(config.audio.tts_dir.clone()),
        player,
        Arc::clone(&amp),
        config.audio.amp_settle(),
    ));

    let terminal = Arc::new(DriverTerminal::new(
        routes,
        config.driver.default_stop_name.clone(),
        announcer,
    ));
    let app = api::create_router(api::AppState { terminal });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    amp.shutdown();

    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
