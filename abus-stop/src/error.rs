//! Error types for abus-stop

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the stop station
#[derive(Error, Debug)]
pub enum Error {
    /// Shared-layer failure (config, audio, GPIO)
    #[error(transparent)]
    Common(#[from] abus_common::Error),

    /// Frame buffer does not match its declared dimensions
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Sign detector could not be loaded or failed on a frame
    #[error("Detector error: {0}")]
    Detector(String),

    /// Text recognizer failed on a crop
    #[error("Recognizer error: {0}")]
    Recognizer(String),

    /// Image encoding failed
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Camera could not be opened or read
    #[error("Camera error: {0}")]
    Camera(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "onnx")]
impl From<ort::Error> for Error {
    fn from(e: ort::Error) -> Self {
        Error::Detector(e.to_string())
    }
}

#[cfg(feature = "camera")]
impl From<opencv::Error> for Error {
    fn from(e: opencv::Error) -> Self {
        Error::Camera(e.to_string())
    }
}
