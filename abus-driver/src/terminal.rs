//! Driver terminal logic

use crate::notices::{DriverNotice, NotificationLog};
use abus_common::audio::{AnnounceCategory, Announcer};
use abus_common::{RouteId, RouteTable};
use std::sync::Arc;
use tracing::info;

pub struct DriverTerminal {
    routes: RouteTable,
    log: NotificationLog,
    default_stop: String,
    announcer: Arc<dyn Announcer>,
}

impl DriverTerminal {
    pub fn new(routes: RouteTable, default_stop: String, announcer: Arc<dyn Announcer>) -> Self {
        Self {
            routes,
            log: NotificationLog::new(),
            default_stop,
            announcer,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn log(&self) -> &NotificationLog {
        &self.log
    }

    /// Record a CALL and alert the driver by speaker
    ///
    /// Must be called from within a tokio runtime; the alert plays on its own
    /// task.
    pub fn handle_call(&self, route: &RouteId, stop: Option<&str>) -> DriverNotice {
        let stop = stop
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.default_stop);
        let notice = DriverNotice::new(route.clone(), stop);
        info!(bus = %route, stop = %stop, id = %notice.id, "Boarding notice");
        self.log.push(notice.clone());

        let announcer = Arc::clone(&self.announcer);
        let route = route.clone();
        tokio::spawn(async move {
            announcer.announce(&route, AnnounceCategory::DriverAlert).await;
        });
        notice
    }

    /// Driver acknowledged every notice
    pub fn acknowledge(&self) -> usize {
        let cleared = self.log.clear();
        info!(cleared, "Notices acknowledged");
        cleared
    }
}
