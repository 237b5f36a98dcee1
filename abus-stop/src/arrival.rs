//! Arrival handling
//!
//! When a watched bus is recognized, the stop announces it, takes it off the
//! display board, then tells the call station it may be called again. The
//! three steps run in that order on a task of their own, so the camera keeps
//! scanning while the speaker plays.

use crate::display::RouteDisplay;
use crate::pending::PendingArrivalSet;
use abus_common::audio::{AnnounceCategory, Announcer};
use abus_common::bus::{Delivery, NotificationBus};
use abus_common::message::Notification;
use abus_common::RouteId;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::info;

/// Progress of one arrival
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalStage {
    Matched,
    Announcing,
    DisplayClearing,
    ReleaseSent,
    Done,
}

impl fmt::Display for ArrivalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArrivalStage::Matched => "matched",
            ArrivalStage::Announcing => "announcing",
            ArrivalStage::DisplayClearing => "display_clearing",
            ArrivalStage::ReleaseSent => "release_sent",
            ArrivalStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Tells the call station a route has arrived
#[async_trait]
pub trait ReleaseNotifier: Send + Sync {
    async fn release(&self, route: &RouteId) -> Delivery;
}

/// RELEASE over the notification bus
pub struct BusReleaseNotifier {
    bus: NotificationBus,
    url: String,
}

impl BusReleaseNotifier {
    pub fn new(bus: NotificationBus, url: impl Into<String>) -> Self {
        Self {
            bus,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ReleaseNotifier for BusReleaseNotifier {
    async fn release(&self, route: &RouteId) -> Delivery {
        self.bus
            .send(&self.url, &Notification::release(route.clone()))
            .await
    }
}

/// Runs the announce → clear → release sequence per matched route
#[derive(Clone)]
pub struct ArrivalSequencer {
    announcer: Arc<dyn Announcer>,
    display: Arc<dyn RouteDisplay>,
    notifier: Arc<dyn ReleaseNotifier>,
    awaited: Option<Arc<PendingArrivalSet>>,
    runtime: Handle,
}

impl ArrivalSequencer {
    /// Create the sequencer; must be called from within a tokio runtime
    pub fn new(
        announcer: Arc<dyn Announcer>,
        display: Arc<dyn RouteDisplay>,
        notifier: Arc<dyn ReleaseNotifier>,
    ) -> Self {
        Self {
            announcer,
            display,
            notifier,
            awaited: None,
            runtime: Handle::current(),
        }
    }

    /// Keep a route on the display when it is called again mid-arrival
    ///
    /// `awaited` is checked after the display step; a route found there
    /// goes straight back on the display.
    pub fn with_awaited(mut self, awaited: Arc<PendingArrivalSet>) -> Self {
        self.awaited = Some(awaited);
        self
    }

    /// Start the sequence for `route` on its own task
    ///
    /// Callable from any thread. The handle resolves to the last stage
    /// reached.
    pub fn dispatch(&self, route: RouteId) -> JoinHandle<ArrivalStage> {
        let this = self.clone();
        self.runtime.spawn(async move { this.run(route).await })
    }

    async fn run(&self, route: RouteId) -> ArrivalStage {
        let mut stage = ArrivalStage::Matched;
        info!(bus = %route, stage = %stage, "Arrival");

        stage = ArrivalStage::Announcing;
        info!(bus = %route, stage = %stage, "Arrival");
        self.announcer
            .announce(&route, AnnounceCategory::Arrival)
            .await;

        stage = ArrivalStage::DisplayClearing;
        info!(bus = %route, stage = %stage, "Arrival");
        self.display.remove(&route);
        if self.awaited.as_ref().is_some_and(|set| set.contains(&route)) {
            self.display.add(&route);
            info!(bus = %route, "Called again during arrival, kept on display");
        }

        stage = ArrivalStage::ReleaseSent;
        let delivery = self.notifier.release(&route).await;
        info!(bus = %route, stage = %stage, delivered = delivery.is_delivered(), "Arrival");

        stage = ArrivalStage::Done;
        info!(bus = %route, stage = %stage, "Arrival");
        stage
    }
}
