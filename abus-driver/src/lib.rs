//! Driver alert terminal
//!
//! Receives CALLs from the call station, shows a boarding notice in Korean and
//! English and plays the driver alert until the driver acknowledges.

pub mod api;
pub mod notices;
pub mod terminal;

pub use notices::{DriverNotice, NotificationLog};
pub use terminal::DriverTerminal;
