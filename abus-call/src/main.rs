//! Passenger call station (abus-call) - Main entry point

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use abus_call::{api, input, CallStation};
use abus_common::audio::{self, ClipLibrary, SpeakerAnnouncer};
use abus_common::bus::NotificationBus;
use abus_common::config::Config;
use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for abus-call
#[derive(Parser, Debug)]
#[command(name = "abus-call")]
#[command(about = "Passenger call station for the assistive bus-call system")]
#[command(version)]
struct Args {
    /// Configuration file (overrides ABUS_CONFIG and the default locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides [call] port)
    #[arg(short, long, env = "ABUS_CALL_PORT")]
    port: Option<u16>,

    /// Read button presses from stdin, one route per line
    #[arg(long)]
    stdin_buttons: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "abus_call=debug,abus_common=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!(
        "Starting abus-call v{} [{}] backends: {}",
        env!("CARGO_PKG_VERSION"),
        env!("ABUS_GIT_HASH"),
        env!("ABUS_BACKENDS"),
    );

    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    let routes = config.route_table().context("Invalid route table")?;
    let port = args.port.unwrap_or(config.call.port);
    info!(
        "Stop '{}', {} routes, peers: {:?}",
        config.call.stop_name,
        routes.len(),
        config.call.peers
    );

    let amp = audio::open_amp(&config.audio, config.call.amp_pin)
        .context("Failed to open amplifier line")?;
    let player = audio::open_player(&config.audio).context("Failed to open audio output")?;
    let announcer = Arc::new(SpeakerAnnouncer::new(
        ClipLibrary::new(config.audio.tts_dir.clone()),
        player,
        Arc::clone(&amp),
        config.audio.amp_settle(),
    ));

    let bus = NotificationBus::new(config.bus.call_timeout())
        .context("Failed to create notification client")?;
    let station = Arc::new(CallStation::new(
        routes,
        bus,
        config.call.peers.clone(),
        config.call.stop_name.clone(),
        announcer,
    ));

    // Button inputs
    let stop_polling = Arc::new(AtomicBool::new(false));
    let buttons = input::open_buttons(&config.audio.gpio_root, station.routes());
    let poller = if buttons.is_empty() {
        warn!("No button lines available");
        None
    } else {
        info!("{} button lines ready", buttons.len());
        Some(
            input::spawn_button_poller(
                Arc::clone(&station),
                buttons,
                Duration::from_millis(config.call.button_poll_ms),
                Arc::clone(&stop_polling),
            )
            .context("Failed to start button poller")?,
        )
    };
    if args.stdin_buttons {
        tokio::spawn(input::read_stdin_presses(Arc::clone(&station)));
    }

    let app = api::create_router(api::AppState {
        station: Arc::clone(&station),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    stop_polling.store(true, Ordering::Relaxed);
    if let Some(poller) = poller {
        if poller.join().is_err() {
            warn!("Button poller panicked");
        }
    }
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
