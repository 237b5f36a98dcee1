//! # Assistive Bus Call Common Library
//!
//! Shared code for the three roadside nodes (call station, stop station,
//! driver terminal):
//! - Route table (which routes exist and how they are spoken)
//! - Wire types exchanged between nodes
//! - Best-effort notification bus (HTTP POST, no retries)
//! - Clip announcements with exclusive speaker/amplifier access
//! - Configuration loading

pub mod audio;
pub mod bus;
pub mod config;
pub mod error;
pub mod gpio;
pub mod message;
pub mod route;

pub use error::{Error, Result};
pub use route::{RouteId, RouteInfo, RouteTable};
