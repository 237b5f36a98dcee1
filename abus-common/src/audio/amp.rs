//! Amplifier enable line
//!
//! The speaker amplifier is held in shutdown (line low) except while a clip is
//! playing, which keeps the idle speaker silent.

use crate::gpio::{Direction, GpioPin};
use crate::Result;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Amplifier shutdown control
pub trait AmpLine: Send + Sync {
    /// Drive the amplifier on or off
    fn set_enabled(&self, enabled: bool) -> Result<()>;

    /// Drive the line low and release it; safe to call more than once
    fn shutdown(&self) {}
}

/// Amplifier hard-wired on, or no amplifier at all
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAmp;

impl AmpLine for NullAmp {
    fn set_enabled(&self, _enabled: bool) -> Result<()> {
        Ok(())
    }
}

/// Amplifier shutdown pin on a sysfs GPIO line
#[derive(Debug)]
pub struct GpioAmp {
    pin: GpioPin,
    released: AtomicBool,
}

impl GpioAmp {
    /// Export the line as an output, initially low (amplifier off)
    pub fn open(gpio_root: &Path, number: u32) -> Result<Self> {
        let pin = GpioPin::export(gpio_root, number, Direction::OutLow)?;
        info!(pin = number, "Amplifier line ready (low)");
        Ok(Self {
            pin,
            released: AtomicBool::new(false),
        })
    }
}

impl AmpLine for GpioAmp {
    fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.pin.write(enabled)
    }

    fn shutdown(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.pin.write(false) {
            warn!(pin = self.pin.number(), "Failed to drive amplifier line low: {}", e);
        }
        if let Err(e) = self.pin.unexport() {
            warn!(pin = self.pin.number(), "Failed to release amplifier line: {}", e);
        }
        info!(pin = self.pin.number(), "Amplifier line released");
    }
}

impl Drop for GpioAmp {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_drives_low_and_unexports_once() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("gpio22")).unwrap();

        let amp = GpioAmp::open(root.path(), 22).unwrap();
        amp.set_enabled(true).unwrap();
        assert_eq!(std::fs::read_to_string(root.path().join("gpio22/value")).unwrap(), "1");

        amp.shutdown();
        assert_eq!(std::fs::read_to_string(root.path().join("gpio22/value")).unwrap(), "0");
        assert_eq!(std::fs::read_to_string(root.path().join("unexport")).unwrap(), "22");

        // Second shutdown (and the one from Drop) is a no-op
        std::fs::remove_file(root.path().join("unexport")).unwrap();
        amp.shutdown();
        drop(amp);
        assert!(!root.path().join("unexport").exists());
    }
}
