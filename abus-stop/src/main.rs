//! Stop station (abus-stop) - Main entry point

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use abus_common::audio::{self, ClipLibrary, SpeakerAnnouncer};
use abus_common::bus::NotificationBus;
use abus_common::config::Config;
use abus_stop::{api, ArrivalSequencer, BusReleaseNotifier, RouteBoard, StopStation};
use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for abus-stop
#[derive(Parser, Debug)]
#[command(name = "abus-stop")]
#[command(about = "Stop station for the assistive bus-call system")]
#[command(version)]
struct Args {
    /// Configuration file (overrides ABUS_CONFIG and the default locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides [stop] port)
    #[arg(short, long, env = "ABUS_STOP_PORT")]
    port: Option<u16>,

    /// Serve CALLs without starting the camera
    #[arg(long)]
    no_camera: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "abus_stop=debug,abus_common=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!(
        "Starting abus-stop v{} [{}] backends: {}",
        env!("CARGO_PKG_VERSION"),
        env!("ABUS_GIT_HASH"),
        env!("ABUS_BACKENDS"),
    );

    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    let routes = config.route_table().context("Invalid route table")?;
    let port = args.port.unwrap_or(config.stop.port);
    info!("Release endpoint: {}", config.stop.release_url);

    let amp = audio::open_amp(&config.audio, config.stop.amp_pin)
        .context("Failed to open amplifier line")?;
    let player = audio::open_player(&config.audio).context("Failed to open audio output")?;
    let announcer = Arc::new(SpeakerAnnouncer::new(
        ClipLibrary::new(config.audio.tts_dir.clone()),
        player,
        Arc::clone(&amp),
        config.audio.amp_settle(),
    ));

    let bus = NotificationBus::new(config.bus.release_timeout())
        .context("Failed to create notification client")?;
    let board = Arc::new(RouteBoard::new());
    let sequencer = ArrivalSequencer::new(
        announcer,
        board.clone(),
        Arc::new(BusReleaseNotifier::new(bus, config.stop.release_url.clone())),
    );
    let station = Arc::new(StopStation::new(routes, board, sequencer));

    let stop_detection = Arc::new(AtomicBool::new(false));
    let detection = if args.no_camera {
        info!("Camera disabled on the command line");
        None
    } else {
        start_detection(&config, Arc::clone(&station), Arc::clone(&stop_detection))?
    };

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

    stop_detection.store(true, Ordering::Relaxed);
    if let Some(handle) = detection {
        if handle.join().is_err() {
            warn!("Detection thread panicked");
        }
    }
    amp.shutdown();

    info!("Shutdown complete");
    Ok(())
}

#[cfg(all(feature = "camera", feature = "onnx"))]
fn start_detection(
    config: &Config,
    station: Arc<StopStation>,
    stop: Arc<AtomicBool>,
) -> Result<Option<std::thread::JoinHandle<()>>> {
    use abus_stop::detection::{
        self, camera::OpenCvCamera, detector::OnnxSignDetector, DetectionPipeline,
        PipelineSettings, TesseractCli,
    };

    let camera = OpenCvCamera::open(
        config.stop.camera_index,
        config.stop.frame_width,
        config.stop.frame_height,
    )
    .context("Failed to open camera")?;
    let detector = OnnxSignDetector::load(&config.detection.model_path)
        .context("Failed to load sign detector")?;
    let pipeline = DetectionPipeline::new(
        PipelineSettings::from(&config.detection),
        Box::new(detector),
        Box::new(TesseractCli::new(config.detection.tesseract.clone())),
    );

    let handle = detection::spawn_detection_loop(Box::new(camera), pipeline, station, stop)
        .context("Failed to start detection thread")?;
    Ok(Some(handle))
}

#[cfg(not(all(feature = "camera", feature = "onnx")))]
fn start_detection(
    _config: &Config,
    _station: Arc<StopStation>,
    _stop: Arc<AtomicBool>,
) -> Result<Option<std::thread::JoinHandle<()>>> {
    warn!("Built without the camera and onnx features, arrival detection disabled");
    Ok(None)
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
