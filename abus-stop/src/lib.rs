//! Stop station
//!
//! Watches the road for the buses passengers have called. CALLs from the call
//! station are shown on the route display; when the camera reads a watched
//! route off an approaching bus the stop announces the arrival, clears the
//! display entry and sends RELEASE back to the call station.

pub mod api;
pub mod arrival;
pub mod detection;
pub mod display;
pub mod error;
pub mod pending;
pub mod station;

pub use arrival::{ArrivalSequencer, ArrivalStage, BusReleaseNotifier, ReleaseNotifier};
pub use display::{RouteBoard, RouteDisplay};
pub use error::{Error, Result};
pub use pending::PendingArrivalSet;
pub use station::StopStation;
