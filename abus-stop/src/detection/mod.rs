//! Arrival detection
//!
//! A dedicated thread pulls frames from the camera, runs the pipeline on each
//! and hands route readings to the stop station. The thread never waits on
//! audio or the network: matches are dispatched onto the runtime.

pub mod camera;
pub mod detector;
pub mod imaging;
pub mod pipeline;
pub mod recognizer;

pub use camera::{FrameSequence, FrameSource};
pub use detector::{Candidate, SignDetector};
pub use imaging::{BoundingBox, GrayImage, RgbFrame};
pub use pipeline::{DetectionPipeline, DetectionResult, PipelineSettings};
pub use recognizer::{TesseractCli, TextRecognizer};

use crate::station::StopStation;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Run capture → detect → match until the source ends, fails, or `stop` is set
pub fn run_detection_loop(
    mut source: Box<dyn FrameSource>,
    mut pipeline: DetectionPipeline,
    station: Arc<StopStation>,
    stop: Arc<AtomicBool>,
) {
    info!("Detection loop started");
    let mut frames: u64 = 0;

    while !stop.load(Ordering::Relaxed) {
        let frame = match source.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                info!("Frame source ended");
                break;
            }
            Err(e) => {
                error!("Camera read failed, detection stopped: {}", e);
                break;
            }
        };
        frames += 1;

        if let Some(result) = pipeline.detect(&frame) {
            debug!(bus = %result.route, confidence = result.confidence, "Route seen");
            station.handle_detection(&result);
        }
    }

    info!(frames, "Detection loop stopped");
}

/// Start [`run_detection_loop`] on its own thread
pub fn spawn_detection_loop(
    source: Box<dyn FrameSource>,
    pipeline: DetectionPipeline,
    station: Arc<StopStation>,
    stop: Arc<AtomicBool>,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("detection".to_string())
        .spawn(move || run_detection_loop(source, pipeline, station, stop))
}
