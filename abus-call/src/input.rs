//! Button input sources
//!
//! Each route button pulls its GPIO line low when pressed. Lines are polled
//! and a falling edge counts as one press; bounce is left to the debounce
//! gate. A line-oriented stdin source is available for bench testing without
//! buttons.

use crate::station::CallStation;
use abus_common::gpio::{Direction, GpioPin};
use abus_common::{RouteId, RouteTable};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

/// Falling-edge detector for one line (idle high)
#[derive(Debug, Clone, Copy)]
pub struct EdgeDetector {
    last_high: bool,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self { last_high: true }
    }

    /// Feed the current level; returns `true` on a high → low transition
    pub fn update(&mut self, high: bool) -> bool {
        let fell = self.last_high && !high;
        self.last_high = high;
        fell
    }
}

impl Default for EdgeDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// A route button bound to its input line
pub struct ButtonLine {
    route: RouteId,
    pin: GpioPin,
    edge: EdgeDetector,
}

/// Export every button line listed in the route table
///
/// A line that cannot be exported is logged and skipped; the remaining buttons
/// keep working.
pub fn open_buttons(gpio_root: &Path, routes: &RouteTable) -> Vec<ButtonLine> {
    routes
        .iter()
        .filter_map(|info| {
            let number = info.button_pin?;
            match GpioPin::export(gpio_root, number, Direction::In) {
                Ok(pin) => {
                    info!(bus = %info.id, pin = number, "Button line ready");
                    Some(ButtonLine {
                        route: info.id.clone(),
                        pin,
                        edge: EdgeDetector::new(),
                    })
                }
                Err(e) => {
                    warn!(bus = %info.id, pin = number, "Button line unavailable: {}", e);
                    None
                }
            }
        })
        .collect()
}

/// Poll button lines on a dedicated thread until `stop` is set
///
/// Lines are unexported when the thread exits.
pub fn spawn_button_poller(
    station: Arc<CallStation>,
    mut buttons: Vec<ButtonLine>,
    interval: Duration,
    stop: Arc<AtomicBool>,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("button-poller".to_string())
        .spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                for button in buttons.iter_mut() {
                    match button.pin.read() {
                        Ok(high) => {
                            if button.edge.update(high) {
                                debug!(bus = %button.route, "Button pressed");
                                station.press(&button.route);
                            }
                        }
                        Err(e) => debug!(bus = %button.route, "Button read failed: {}", e),
                    }
                }
                std::thread::sleep(interval);
            }

            for button in &buttons {
                if let Err(e) = button.pin.unexport() {
                    debug!(pin = button.pin.number(), "Failed to release button line: {}", e);
                }
            }
            info!("Button poller stopped");
        })
}

/// Treat each stdin line as a press of the route it names
pub async fn read_stdin_presses(station: Arc<CallStation>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!("Reading button presses from stdin (one route per line)");

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                match RouteId::parse(&line) {
                    Ok(route) => {
                        let outcome = station.press(&route);
                        info!(bus = %route, outcome = ?outcome, "stdin press");
                    }
                    Err(e) => warn!("Ignoring stdin line {:?}: {}", line, e),
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("stdin read failed: {}", e);
                break;
            }
        }
    }
    debug!("stdin closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_falling_edges_count() {
        let mut edge = EdgeDetector::new();
        let levels = [true, true, false, false, true, false, true, true];
        let presses: Vec<bool> = levels.iter().map(|l| edge.update(*l)).collect();
        assert_eq!(
            presses,
            vec![false, false, true, false, false, true, false, false]
        );
    }

    #[test]
    fn test_line_held_low_at_startup_is_a_press() {
        // Matches edge-triggered hardware: a stuck-low line fires once
        let mut edge = EdgeDetector::new();
        assert!(edge.update(false));
        assert!(!edge.update(false));
    }

    #[test]
    fn test_open_buttons_skips_unavailable_lines() {
        let root = tempfile::tempdir().unwrap();
        // Only the line for "47" (pin 12) exists
        std::fs::create_dir(root.path().join("gpio12")).unwrap();

        let buttons = open_buttons(root.path(), &RouteTable::default_site());
        assert_eq!(buttons.len(), 1);
        assert_eq!(buttons[0].route.as_str(), "47");
    }
}
