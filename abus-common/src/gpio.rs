//! sysfs GPIO lines
//!
//! The nodes only need two things from GPIO: drive the amplifier shutdown pin
//! and read button levels. Both go through the kernel's sysfs interface
//! (`/sys/class/gpio`), which keeps the nodes free of board-specific
//! libraries.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const EXPORT_WAIT_ATTEMPTS: u32 = 10;
const EXPORT_WAIT_STEP: Duration = Duration::from_millis(20);

/// Line direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    /// Output, initially driven low
    OutLow,
}

/// One exported sysfs GPIO line
#[derive(Debug)]
pub struct GpioPin {
    root: PathBuf,
    number: u32,
}

impl GpioPin {
    /// Export the line (if not already exported) and set its direction
    pub fn export(root: &Path, number: u32, direction: Direction) -> Result<Self> {
        let pin = Self {
            root: root.to_path_buf(),
            number,
        };

        if !pin.line_dir().exists() {
            debug!(pin = number, "Exporting GPIO line");
            write_attr(&root.join("export"), &number.to_string())?;
        }

        // udev may take a moment to create the line directory
        let mut attempts = 0;
        while !pin.line_dir().exists() {
            attempts += 1;
            if attempts > EXPORT_WAIT_ATTEMPTS {
                return Err(Error::Hardware(format!(
                    "GPIO {} did not appear under {}",
                    number,
                    root.display()
                )));
            }
            std::thread::sleep(EXPORT_WAIT_STEP);
        }

        let value = match direction {
            Direction::In => "in",
            Direction::OutLow => "low",
        };
        write_attr(&pin.line_dir().join("direction"), value)?;
        if direction == Direction::OutLow {
            pin.write(false)?;
        }
        Ok(pin)
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Drive the line
    pub fn write(&self, high: bool) -> Result<()> {
        write_attr(&self.line_dir().join("value"), if high { "1" } else { "0" })
    }

    /// Read the line level
    pub fn read(&self) -> Result<bool> {
        let path = self.line_dir().join("value");
        let text = std::fs::read_to_string(&path)
            .map_err(|e| Error::Hardware(format!("read {}: {}", path.display(), e)))?;
        Ok(text.trim() == "1")
    }

    /// Give the line back to the kernel
    pub fn unexport(&self) -> Result<()> {
        write_attr(&self.root.join("unexport"), &self.number.to_string())
    }

    fn line_dir(&self) -> PathBuf {
        self.root.join(format!("gpio{}", self.number))
    }
}

fn write_attr(path: &Path, value: &str) -> Result<()> {
    std::fs::write(path, value)
        .map_err(|e| Error::Hardware(format!("write {:?} to {}: {}", value, path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_root(lines: &[u32]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for line in lines {
            std::fs::create_dir(dir.path().join(format!("gpio{}", line))).unwrap();
        }
        dir
    }

    #[test]
    fn test_output_line_starts_low() {
        let root = fake_root(&[25]);
        let pin = GpioPin::export(root.path(), 25, Direction::OutLow).unwrap();

        let direction = std::fs::read_to_string(root.path().join("gpio25/direction")).unwrap();
        assert_eq!(direction, "low");
        assert!(!pin.read().unwrap());

        pin.write(true).unwrap();
        assert!(pin.read().unwrap());
    }

    #[test]
    fn test_missing_line_is_hardware_error() {
        let root = fake_root(&[]);
        let result = GpioPin::export(root.path(), 7, Direction::In);
        assert!(matches!(result, Err(Error::Hardware(_))));
        // The export request itself was still written
        let export = std::fs::read_to_string(root.path().join("export")).unwrap();
        assert_eq!(export, "7");
    }

    #[test]
    fn test_unexport_writes_number() {
        let root = fake_root(&[11]);
        let pin = GpioPin::export(root.path(), 11, Direction::In).unwrap();
        pin.unexport().unwrap();
        let unexport = std::fs::read_to_string(root.path().join("unexport")).unwrap();
        assert_eq!(unexport, "11");
    }
}
