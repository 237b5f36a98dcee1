//! Driver notice log
//!
//! Every CALL becomes a notice on the driver's screen, in Korean and English,
//! until the driver acknowledges them all at once.

use abus_common::RouteId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// One boarding notice
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverNotice {
    pub id: Uuid,
    pub route: RouteId,
    pub stop: String,
    pub message_ko: String,
    pub message_en: String,
    pub received_at: DateTime<Utc>,
}

impl DriverNotice {
    pub fn new(route: RouteId, stop: impl Into<String>) -> Self {
        let stop = stop.into();
        Self {
            id: Uuid::new_v4(),
            message_ko: format!(
                "{}에서 도움이 필요한 승객이 {}번 버스를 탑승할 예정입니다.",
                stop, route
            ),
            message_en: format!(
                "A passenger requiring assistance will board bus {} at {}.",
                route, stop
            ),
            route,
            stop,
            received_at: Utc::now(),
        }
    }
}

/// Notices in arrival order
#[derive(Debug, Default)]
pub struct NotificationLog {
    notices: Mutex<Vec<DriverNotice>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a notice; repeated CALLs for one route each get their own
    pub fn push(&self, notice: DriverNotice) {
        self.lock().push(notice);
    }

    pub fn snapshot(&self) -> Vec<DriverNotice> {
        self.lock().clone()
    }

    /// Drop every notice; returns how many were cleared
    pub fn clear(&self) -> usize {
        let mut notices = self.lock();
        let count = notices.len();
        notices.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DriverNotice>> {
        self.notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_messages() {
        let notice = DriverNotice::new(RouteId::parse("47").unwrap(), "광주대학교 정류장");
        assert_eq!(
            notice.message_ko,
            "광주대학교 정류장에서 도움이 필요한 승객이 47번 버스를 탑승할 예정입니다."
        );
        assert_eq!(
            notice.message_en,
            "A passenger requiring assistance will board bus 47 at 광주대학교 정류장."
        );
    }

    #[test]
    fn test_log_keeps_order_and_clears() {
        let log = NotificationLog::new();
        log.push(DriverNotice::new(RouteId::parse("03").unwrap(), "a"));
        log.push(DriverNotice::new(RouteId::parse("03").unwrap(), "a"));
        log.push(DriverNotice::new(RouteId::parse("77").unwrap(), "b"));

        let routes: Vec<String> = log.snapshot().iter().map(|n| n.route.to_string()).collect();
        assert_eq!(routes, vec!["03", "03", "77"]);
        let ids = log.snapshot();
        assert_ne!(ids[0].id, ids[1].id);

        assert_eq!(log.clear(), 3);
        assert!(log.is_empty());
    }
}
