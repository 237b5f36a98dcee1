//! Button debounce
//!
//! Mechanical buttons bounce and passengers double-press. Any press for a route
//! within [`DEBOUNCE_WINDOW`] of that route's last admitted press is dropped
//! before it reaches the call state.

use abus_common::RouteId;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Minimum spacing between two admitted presses of the same route
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

/// Per-route press filter
#[derive(Debug)]
pub struct DebounceGate {
    window: Duration,
    last_admitted: Mutex<HashMap<RouteId, Instant>>,
}

impl DebounceGate {
    pub fn new() -> Self {
        Self::with_window(DEBOUNCE_WINDOW)
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            last_admitted: Mutex::new(HashMap::new()),
        }
    }

    /// Admit a press observed at `now`
    ///
    /// Returns `false` when the route's previous admitted press is less than
    /// the window before `now`. Rejected presses do not extend the window.
    pub fn admit(&self, route: &RouteId, now: Instant) -> bool {
        let mut last = self
            .last_admitted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(previous) = last.get(route) {
            if now.saturating_duration_since(*previous) < self.window {
                return false;
            }
        }
        last.insert(route.clone(), now);
        true
    }
}

impl Default for DebounceGate {
    fn default() -> Self {
        Self::new()
    }
}
