//! Frame → route
//!
//! Colour correction, sign detection, crop, binarization and digit
//! recognition, in that order. Any failure along the way means "no route in
//! this frame"; the next frame is another chance.

use super::detector::{Candidate, SignDetector};
use super::imaging::{self, RgbFrame};
use super::recognizer::TextRecognizer;
use abus_common::config::{ChannelOrder, DetectionConfig};
use abus_common::RouteId;
use tracing::{debug, warn};

/// Route read off a frame
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    pub route: RouteId,
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub confidence_threshold: f32,
    pub gamma: f32,
    pub saturation: f32,
    pub input_size: u32,
    pub channel_order: ChannelOrder,
}

impl From<&DetectionConfig> for PipelineSettings {
    fn from(config: &DetectionConfig) -> Self {
        Self {
            confidence_threshold: config.confidence_threshold,
            gamma: config.gamma,
            saturation: config.saturation,
            input_size: config.input_size,
            channel_order: config.input_channel_order,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&DetectionConfig::default())
    }
}

pub struct DetectionPipeline {
    settings: PipelineSettings,
    gamma_lut: [u8; 256],
    detector: Box<dyn SignDetector>,
    recognizer: Box<dyn TextRecognizer>,
}

impl DetectionPipeline {
    pub fn new(
        settings: PipelineSettings,
        detector: Box<dyn SignDetector>,
        recognizer: Box<dyn TextRecognizer>,
    ) -> Self {
        Self {
            gamma_lut: imaging::gamma_lut(settings.gamma),
            settings,
            detector,
            recognizer,
        }
    }

    /// Look for a route number in an RGB frame
    pub fn detect(&mut self, frame: &RgbFrame) -> Option<DetectionResult> {
        if frame.width() == 0 || frame.height() == 0 {
            return None;
        }

        let mut corrected = frame.clone();
        imaging::apply_lut(&mut corrected, &self.gamma_lut);
        imaging::boost_saturation(&mut corrected, self.settings.saturation);

        let size = self.settings.input_size;
        let tensor = imaging::to_chw_tensor(
            &imaging::resize_bilinear(&corrected, size, size),
            self.settings.channel_order,
        );
        let candidates = match self.detector.detect(&tensor, size as usize) {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Sign detector failed: {}", e);
                return None;
            }
        };

        let best = best_candidate(&candidates)?;
        if best.confidence < self.settings.confidence_threshold {
            debug!(confidence = best.confidence, "Best sign below threshold");
            return None;
        }

        let bbox = best.bbox.scaled(
            corrected.width() as f32 / size as f32,
            corrected.height() as f32 / size as f32,
        );
        let Some(roi) = imaging::crop(&corrected, &bbox) else {
            debug!(?bbox, "Sign box outside the frame");
            return None;
        };

        let binary = imaging::binarize_for_ocr(&roi);
        let raw = match self.recognizer.recognize(&binary) {
            Ok(text) => text,
            Err(e) => {
                warn!("Text recognition failed: {}", e);
                return None;
            }
        };
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            debug!(raw = %raw, confidence = best.confidence, "Sign without digits");
            return None;
        }

        let route = RouteId::parse(&digits).ok()?;
        debug!(bus = %route, confidence = best.confidence, "Route sign read");
        Some(DetectionResult {
            route,
            confidence: best.confidence,
        })
    }
}

fn best_candidate(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates
        .iter()
        .filter(|c| c.confidence.is_finite())
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
}
