//! Passenger call station
//!
//! Route buttons at the stop. A press debounces, becomes an active call, is
//! broadcast as CALL to the stop station and the driver terminal, and is
//! confirmed to the passenger by speaker. The stop station answers with
//! RELEASE once the bus has arrived.

pub mod api;
pub mod call_state;
pub mod debounce;
pub mod input;
pub mod station;

pub use call_state::{ActiveCall, CallStateStore};
pub use debounce::{DebounceGate, DEBOUNCE_WINDOW};
pub use station::{CallStation, PressOutcome};
