//! Stop station state
//!
//! CALL messages put a route on the watch list and the display board;
//! a detection of a watched route takes it off the watch list and starts the
//! arrival sequence.

use crate::arrival::{ArrivalSequencer, ArrivalStage};
use crate::detection::DetectionResult;
use crate::display::{RouteBoard, RouteDisplay};
use crate::pending::PendingArrivalSet;
use abus_common::{RouteId, RouteTable};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub struct StopStation {
    routes: RouteTable,
    pending: Arc<PendingArrivalSet>,
    board: Arc<RouteBoard>,
    sequencer: ArrivalSequencer,
}

impl StopStation {
    /// `board` must be the display the sequencer clears
    pub fn new(routes: RouteTable, board: Arc<RouteBoard>, sequencer: ArrivalSequencer) -> Self {
        let pending = Arc::new(PendingArrivalSet::new());
        Self {
            routes,
            sequencer: sequencer.with_awaited(Arc::clone(&pending)),
            pending,
            board,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn pending(&self) -> &PendingArrivalSet {
        &self.pending
    }

    pub fn board(&self) -> &RouteBoard {
        &self.board
    }

    /// Start watching for `route`; repeated calls are harmless
    ///
    /// A route called while its arrival is still running is watched again
    /// and stays on the display.
    pub fn handle_call(&self, route: &RouteId, stop: Option<&str>) {
        if self.pending.insert(route.clone()) {
            info!(bus = %route, stop = stop.unwrap_or(""), "Watching for bus");
        } else {
            debug!(bus = %route, "Bus already watched");
        }
        self.board.add(route);
    }

    /// React to a route read off a frame
    ///
    /// Starts the arrival sequence when the route was being watched; readings
    /// of unwatched routes, or of a route whose arrival already started, are
    /// ignored.
    pub fn handle_detection(&self, result: &DetectionResult) -> Option<JoinHandle<ArrivalStage>> {
        if !self.pending.take(&result.route) {
            debug!(bus = %result.route, "Seen bus not awaited");
            return None;
        }
        info!(bus = %result.route, confidence = result.confidence, "Awaited bus arrived");
        Some(self.sequencer.dispatch(result.route.clone()))
    }
}
