//! Spoken announcements
//!
//! Every node has one speaker behind an amplifier whose shutdown pin is a GPIO
//! line. An announcement plays the pre-generated Korean clip and then the
//! English clip for a route and category, with the amplifier enabled only
//! for the duration of playback.
//!
//! Playback is exclusive per node: two announcements never overlap, because
//! toggling the shared amplifier from two playbacks at once corrupts the
//! output.

pub mod amp;
pub mod announcer;
pub mod clips;
pub mod player;

#[cfg(feature = "cpal-audio")]
pub mod output;

pub use amp::{AmpLine, GpioAmp, NullAmp};
pub use announcer::{Announcer, SpeakerAnnouncer};
pub use clips::{AnnounceCategory, ClipLibrary};
pub use player::{ClipPlayer, CommandPlayer};

use crate::config::{AudioConfig, PlayerBackend};
use crate::Result;
use std::sync::Arc;

/// Open the clip player selected by `[audio] backend`
///
/// Fails when the configured output device is unavailable; nodes treat that
/// as fatal at startup.
pub fn open_player(config: &AudioConfig) -> Result<Arc<dyn ClipPlayer>> {
    match config.backend {
        PlayerBackend::Command => Ok(Arc::new(CommandPlayer::from_command_line(
            &config.player_command,
        )?)),
        #[cfg(feature = "cpal-audio")]
        PlayerBackend::Cpal => Ok(Arc::new(output::CpalPlayer::open(config.device.clone())?)),
        #[cfg(not(feature = "cpal-audio"))]
        PlayerBackend::Cpal => Err(crate::Error::Config(
            "audio.backend = \"cpal\" requires the cpal-audio feature".to_string(),
        )),
    }
}

/// Open the amplifier enable line, or a no-op line when no pin is configured
pub fn open_amp(config: &AudioConfig, pin: Option<u32>) -> Result<Arc<dyn AmpLine>> {
    match pin {
        Some(number) => Ok(Arc::new(GpioAmp::open(&config.gpio_root, number)?)),
        None => Ok(Arc::new(NullAmp)),
    }
}
