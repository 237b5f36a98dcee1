//! Call station logic
//!
//! A press travels: debounce gate → call state check-and-set → side effects.
//! Side effects (CALL broadcast to the stop and driver nodes, spoken
//! feedback to the passenger) run on spawned tasks so the input source is
//! never held up by the network or the speaker.

use crate::call_state::CallStateStore;
use crate::debounce::DebounceGate;
use abus_common::audio::{AnnounceCategory, Announcer};
use abus_common::bus::NotificationBus;
use abus_common::message::Notification;
use abus_common::{RouteId, RouteTable};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

/// What a press led to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PressOutcome {
    /// Route not served at this stop
    UnknownRoute,
    /// Dropped by the debounce gate
    Debounced,
    /// Route already active; passenger hears "already selected"
    AlreadyCalling,
    /// New call accepted and broadcast
    Called,
}

/// Call station state and collaborators
pub struct CallStation {
    routes: RouteTable,
    gate: DebounceGate,
    calls: CallStateStore,
    bus: NotificationBus,
    peers: Vec<String>,
    stop_name: String,
    announcer: Arc<dyn Announcer>,
    runtime: Handle,
}

impl CallStation {
    /// Create the station; must be called from within a tokio runtime
    pub fn new(
        routes: RouteTable,
        bus: NotificationBus,
        peers: Vec<String>,
        stop_name: String,
        announcer: Arc<dyn Announcer>,
    ) -> Self {
        Self {
            routes,
            gate: DebounceGate::new(),
            calls: CallStateStore::new(),
            bus,
            peers,
            stop_name,
            announcer,
            runtime: Handle::current(),
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn calls(&self) -> &CallStateStore {
        &self.calls
    }

    /// Handle a button press observed now
    ///
    /// Safe to call from any thread, including non-runtime input threads.
    pub fn press(&self, route: &RouteId) -> PressOutcome {
        self.press_at(route, Instant::now())
    }

    /// Handle a button press observed at `now`
    pub fn press_at(&self, route: &RouteId, now: Instant) -> PressOutcome {
        if !self.routes.contains(route) {
            warn!(bus = %route, "Press for a route not served here, ignoring");
            return PressOutcome::UnknownRoute;
        }

        if !self.gate.admit(route, now) {
            debug!(bus = %route, "Press debounced");
            return PressOutcome::Debounced;
        }

        if !self.calls.try_activate(route) {
            info!(bus = %route, "Already calling");
            self.spawn_announcement(route, AnnounceCategory::Already);
            return PressOutcome::AlreadyCalling;
        }

        info!(bus = %route, "New call, notifying stop and driver");
        self.spawn_broadcast(route);
        self.spawn_announcement(route, AnnounceCategory::Select);
        PressOutcome::Called
    }

    /// Handle a RELEASE from the stop station; unknown routes are a no-op
    pub fn release(&self, route: &RouteId) -> bool {
        let released = self.calls.release(route);
        if released {
            info!(bus = %route, "Call released");
        } else {
            debug!(bus = %route, "Release for a route that was not active");
        }
        released
    }

    fn spawn_broadcast(&self, route: &RouteId) {
        let bus = self.bus.clone();
        let peers = self.peers.clone();
        let message = Notification::call(route.clone(), self.stop_name.clone());
        self.runtime.spawn(async move {
            let results = bus.broadcast(&peers, &message).await;
            let delivered = results.iter().filter(|d| d.is_delivered()).count();
            debug!(
                bus = %message.bus,
                delivered,
                peers = peers.len(),
                "CALL broadcast finished"
            );
        });
    }

    fn spawn_announcement(&self, route: &RouteId, category: AnnounceCategory) {
        let announcer = Arc::clone(&self.announcer);
        let route = route.clone();
        self.runtime.spawn(async move {
            announcer.announce(&route, category).await;
        });
    }
}
