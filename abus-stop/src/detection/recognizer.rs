//! Digit recognition on a binarized sign crop

use super::imaging::GrayImage;
use crate::error::{Error, Result};
use image::ImageFormat;
use std::io::{Cursor, Write};
use std::process::{Command, Stdio};
use tracing::debug;

pub trait TextRecognizer: Send {
    /// Raw recognized text; callers filter it
    fn recognize(&mut self, image: &GrayImage) -> Result<String>;
}

/// `tesseract` command line, single text line, digits only
///
/// The image goes in as PGM on stdin and the text comes back on stdout.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    program: String,
}

impl TesseractCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args([
            "stdin",
            "stdout",
            "--oem",
            "3",
            "--psm",
            "7",
            "-c",
            "tessedit_char_whitelist=0123456789",
        ]);
        cmd
    }
}

/// Binary PGM (P5), the one format `tesseract` reliably reads from a pipe
pub fn encode_pgm(image: &GrayImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Pnm)?;
    Ok(buf.into_inner())
}

impl TextRecognizer for TesseractCli {
    fn recognize(&mut self, image: &GrayImage) -> Result<String> {
        let mut child = self
            .command()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Recognizer(format!("failed to start {}: {}", self.program, e)))?;

        let pgm = encode_pgm(image)?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&pgm)?;
        }
        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(Error::Recognizer(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(raw = %text, "Recognized text");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line() {
        let cmd = TesseractCli::new("tesseract").command();
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().to_string()).collect();
        assert_eq!(
            args,
            vec![
                "stdin",
                "stdout",
                "--oem",
                "3",
                "--psm",
                "7",
                "-c",
                "tessedit_char_whitelist=0123456789"
            ]
        );
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let mut cli = TesseractCli::new("/nonexistent/tesseract");
        let image = GrayImage::new(1, 1);
        assert!(matches!(cli.recognize(&image), Err(Error::Recognizer(_))));
    }

    #[test]
    fn test_pgm_encoding() {
        let image = GrayImage::from_raw(2, 1, vec![0, 255]).unwrap();
        let pgm = encode_pgm(&image).unwrap();
        assert!(pgm.starts_with(b"P5"));
        assert!(pgm.ends_with(&[0, 255]));
    }
}
