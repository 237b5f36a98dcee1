//! Route display board
//!
//! The stop shows the routes being waited for as one scrolling line, in the
//! order they were called. The panel driver only needs the rendered text;
//! this module owns the list.

use abus_common::RouteId;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

/// Something that shows the awaited routes
///
/// Both operations are idempotent: adding a shown route or removing a route
/// that is not shown changes nothing.
pub trait RouteDisplay: Send + Sync {
    fn add(&self, route: &RouteId);
    fn remove(&self, route: &RouteId);
}

/// In-memory display board rendering the scrolling message
#[derive(Debug, Default)]
pub struct RouteBoard {
    routes: Mutex<Vec<RouteId>>,
}

impl RouteBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes in display order
    pub fn routes(&self) -> Vec<RouteId> {
        self.lock().clone()
    }

    /// Scrolling text for the panel, e.g. `"03, 47   "`; empty when idle
    pub fn message(&self) -> String {
        render(&self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RouteId>> {
        self.routes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RouteDisplay for RouteBoard {
    fn add(&self, route: &RouteId) {
        let mut routes = self.lock();
        if routes.contains(route) {
            return;
        }
        routes.push(route.clone());
        info!(bus = %route, message = %render(&routes), "Display updated");
    }

    fn remove(&self, route: &RouteId) {
        let mut routes = self.lock();
        let before = routes.len();
        routes.retain(|r| r != route);
        if routes.len() != before {
            info!(bus = %route, message = %render(&routes), "Display updated");
        }
    }
}

fn render(routes: &[RouteId]) -> String {
    if routes.is_empty() {
        return String::new();
    }
    let joined: Vec<&str> = routes.iter().map(RouteId::as_str).collect();
    format!("{}   ", joined.join(", "))
}
