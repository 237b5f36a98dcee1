//! In-process clip playback using symphonia, rubato and cpal
//!
//! Decodes the whole clip to interleaved stereo f32, resamples it to the
//! device rate, then streams it to the output device and blocks until the
//! callback has consumed every sample.

use super::player::ClipPlayer;
use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, StreamConfig};
use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, error, info, warn};

const DRAIN_POLL: Duration = Duration::from_millis(20);

/// Output device player
pub struct CpalPlayer {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
}

impl CpalPlayer {
    /// Open the named output device (None = default device)
    pub fn open(device_name: Option<String>) -> Result<Self> {
        let host = cpal::default_host();

        let device = match device_name.as_ref() {
            Some(name) => host
                .output_devices()
                .map_err(|e| Error::Audio(format!("Failed to enumerate devices: {}", e)))?
                .find(|d| d.name().ok().as_ref() == Some(name))
                .ok_or_else(|| Error::Audio(format!("Output device '{}' not found", name)))?,
            None => host
                .default_output_device()
                .ok_or_else(|| Error::Audio("No default output device found".to_string()))?,
        };

        let supported = device
            .default_output_config()
            .map_err(|e| Error::Audio(format!("Failed to get default config: {}", e)))?;
        let sample_format = supported.sample_format();
        let config = supported.config();

        info!(
            device = %device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate = config.sample_rate.0,
            channels = config.channels,
            "Audio output ready"
        );

        Ok(Self {
            device,
            config,
            sample_format,
        })
    }

    fn build_stream(&self, samples: Arc<Vec<f32>>, cursor: Arc<AtomicUsize>, failed: Arc<AtomicBool>) -> Result<cpal::Stream> {
        let channels = self.config.channels as usize;
        let err_fn = move |err| {
            error!("Audio stream error: {}", err);
            failed.store(true, Ordering::SeqCst);
        };

        let stream = match self.sample_format {
            SampleFormat::F32 => self.device.build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    fill(data, channels, &samples, &cursor, |s| s);
                },
                err_fn,
                None,
            ),
            SampleFormat::I16 => self.device.build_output_stream(
                &self.config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    fill(data, channels, &samples, &cursor, |s| (s * i16::MAX as f32) as i16);
                },
                err_fn,
                None,
            ),
            SampleFormat::U16 => self.device.build_output_stream(
                &self.config,
                move |data: &mut [u16], _: &cpal::OutputCallbackInfo| {
                    fill(data, channels, &samples, &cursor, |s| ((s + 1.0) * 32767.5) as u16);
                },
                err_fn,
                None,
            ),
            other => {
                return Err(Error::Audio(format!("Unsupported sample format: {:?}", other)));
            }
        };

        stream.map_err(|e| Error::Audio(format!("Failed to build stream: {}", e)))
    }
}

impl ClipPlayer for CpalPlayer {
    fn play(&self, path: &Path) -> Result<()> {
        let (stereo, rate) = decode_stereo(path)?;
        let stereo = resample(stereo, rate, self.config.sample_rate.0)?;
        let total = stereo.len();
        debug!(clip = %path.display(), frames = total / 2, "Decoded clip");

        let samples = Arc::new(stereo);
        let cursor = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicBool::new(false));
        let stream = self.build_stream(Arc::clone(&samples), Arc::clone(&cursor), Arc::clone(&failed))?;
        stream
            .play()
            .map_err(|e| Error::Audio(format!("Failed to start stream: {}", e)))?;

        while cursor.load(Ordering::Acquire) < total {
            if failed.load(Ordering::SeqCst) {
                return Err(Error::Audio("output stream failed during playback".to_string()));
            }
            std::thread::sleep(DRAIN_POLL);
        }
        // Let the device play out its last buffer
        std::thread::sleep(DRAIN_POLL * 5);
        drop(stream);
        Ok(())
    }
}

/// Copy the next frames into a device buffer, padding with silence at the end
fn fill<T: Copy>(
    data: &mut [T],
    channels: usize,
    samples: &[f32],
    cursor: &AtomicUsize,
    convert: impl Fn(f32) -> T,
) {
    let mut pos = cursor.load(Ordering::Acquire);
    for frame in data.chunks_mut(channels) {
        let (left, right) = if pos + 1 < samples.len() {
            let pair = (samples[pos], samples[pos + 1]);
            pos += 2;
            pair
        } else {
            pos = samples.len();
            (0.0, 0.0)
        };
        frame[0] = convert(left.clamp(-1.0, 1.0));
        if channels > 1 {
            frame[1] = convert(right.clamp(-1.0, 1.0));
        }
        for extra in frame.iter_mut().skip(2) {
            *extra = convert(0.0);
        }
    }
    cursor.store(pos, Ordering::Release);
}

/// Decode a clip to interleaved stereo f32 at its native rate
fn decode_stereo(path: &Path) -> Result<(Vec<f32>, u32)> {
    let file = std::fs::File::open(path)
        .map_err(|e| Error::Audio(format!("Failed to open {}: {}", path.display(), e)))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| Error::Audio(format!("Failed to probe format: {}", e)))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::Audio("No audio track found".to_string()))?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| Error::Audio("Sample rate not found".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| Error::Audio(format!("Failed to create decoder: {}", e)))?;

    let mut stereo = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                warn!("Error reading packet: {}", e);
                break;
            }
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!("Decode error: {}", e);
                continue;
            }
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count();
        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);

        for frame in buf.samples().chunks(channels) {
            let left = frame[0];
            let right = if channels > 1 { frame[1] } else { left };
            stereo.push(left);
            stereo.push(right);
        }
    }

    Ok((stereo, sample_rate))
}

/// Resample interleaved stereo to the device rate
fn resample(stereo: Vec<f32>, input_rate: u32, output_rate: u32) -> Result<Vec<f32>> {
    if input_rate == output_rate || stereo.is_empty() {
        return Ok(stereo);
    }

    let frames = stereo.len() / 2;
    let planar: Vec<Vec<f32>> = (0..2)
        .map(|ch| stereo.iter().skip(ch).step_by(2).copied().collect())
        .collect();

    let mut resampler = FastFixedIn::<f32>::new(
        output_rate as f64 / input_rate as f64,
        1.0,
        PolynomialDegree::Septic,
        frames,
        2,
    )
    .map_err(|e| Error::Audio(format!("Failed to create resampler: {}", e)))?;

    let out = resampler
        .process(&planar, None)
        .map_err(|e| Error::Audio(format!("Resampling failed: {}", e)))?;

    let mut interleaved = Vec::with_capacity(out[0].len() * 2);
    for (l, r) in out[0].iter().zip(out[1].iter()) {
        interleaved.push(*l);
        interleaved.push(*r);
    }
    Ok(interleaved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_pads_with_silence_and_marks_done() {
        let samples = vec![0.5, -0.5, 0.25, -0.25];
        let cursor = AtomicUsize::new(0);
        let mut data = [1.0f32; 8];

        fill(&mut data, 2, &samples, &cursor, |s| s);

        assert_eq!(data, [0.5, -0.5, 0.25, -0.25, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(cursor.load(Ordering::SeqCst), samples.len());
    }

    #[test]
    fn test_resample_same_rate_is_identity() {
        let input = vec![0.1, 0.2, 0.3, 0.4];
        assert_eq!(resample(input.clone(), 44100, 44100).unwrap(), input);
    }
}
