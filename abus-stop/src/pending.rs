//! Routes the stop is waiting for
//!
//! Filled by CALL messages, drained by detection matches. A route leaves the
//! set through [`PendingArrivalSet::take`] only, so a bus that stays in view
//! for many frames triggers exactly one arrival.

use abus_common::RouteId;
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct PendingArrivalSet {
    routes: Mutex<BTreeSet<RouteId>>,
}

impl PendingArrivalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route; returns `false` if it was already pending
    pub fn insert(&self, route: RouteId) -> bool {
        self.lock().insert(route)
    }

    /// Remove `route` if pending; returns whether this call removed it
    ///
    /// Of any number of concurrent callers for the same route exactly one
    /// gets `true`.
    pub fn take(&self, route: &RouteId) -> bool {
        self.lock().remove(route)
    }

    pub fn contains(&self, route: &RouteId) -> bool {
        self.lock().contains(route)
    }

    /// Pending routes in route order
    pub fn snapshot(&self) -> Vec<RouteId> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeSet<RouteId>> {
        self.routes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn route(id: &str) -> RouteId {
        RouteId::parse(id).unwrap()
    }

    #[test]
    fn test_insert_is_idempotent() {
        let pending = PendingArrivalSet::new();
        assert!(pending.insert(route("03")));
        assert!(!pending.insert(route("03")));
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn test_take_only_once() {
        let pending = PendingArrivalSet::new();
        pending.insert(route("47"));
        assert!(pending.take(&route("47")));
        assert!(!pending.take(&route("47")));
        assert!(!pending.take(&route("77")));
        assert!(pending.is_empty());
    }

    #[test]
    fn test_concurrent_take_has_single_winner() {
        let pending = Arc::new(PendingArrivalSet::new());
        pending.insert(route("177"));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pending = Arc::clone(&pending);
                std::thread::spawn(move || pending.take(&route("177")))
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|took| *took)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn test_snapshot_sorted() {
        let pending = PendingArrivalSet::new();
        pending.insert(route("77"));
        pending.insert(route("03"));
        assert_eq!(pending.snapshot(), vec![route("03"), route("77")]);
    }
}
