//! Common error types for abus

use thiserror::Error;

/// Common result type for abus operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the abus nodes
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Audio decode or output device error
    #[error("Audio error: {0}")]
    Audio(String),

    /// Signal line (amplifier enable, buttons) could not be driven
    #[error("Hardware error: {0}")]
    Hardware(String),

    /// Peer could not be reached
    #[error("Network error: {0}")]
    Network(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
