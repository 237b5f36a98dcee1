//! Active call state
//!
//! The call station is the single owner of "which routes are being called".
//! A route is active from the moment its call is accepted until a RELEASE for
//! it arrives from the stop station. Nothing expires locally: if the RELEASE is
//! lost the route stays active until the process restarts.

use abus_common::RouteId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;

/// One active call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveCall {
    pub bus: RouteId,
    pub requested_at: DateTime<Utc>,
}

/// Authoritative set of active routes
#[derive(Debug, Default)]
pub struct CallStateStore {
    active: Mutex<HashMap<RouteId, DateTime<Utc>>>,
}

impl CallStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `route` active
    ///
    /// Returns `false` without touching the state when the route is already
    /// active. The check and the insert happen under one lock, so of any
    /// number of concurrent callers exactly one sees `true`.
    pub fn try_activate(&self, route: &RouteId) -> bool {
        let mut active = self.lock();
        if active.contains_key(route) {
            return false;
        }
        active.insert(route.clone(), Utc::now());
        true
    }

    /// Remove `route`; returns whether it was active. Never fails.
    pub fn release(&self, route: &RouteId) -> bool {
        self.lock().remove(route).is_some()
    }

    pub fn contains(&self, route: &RouteId) -> bool {
        self.lock().contains_key(route)
    }

    /// Active calls, ordered by route
    pub fn active_calls(&self) -> Vec<ActiveCall> {
        let mut calls: Vec<ActiveCall> = self
            .lock()
            .iter()
            .map(|(bus, at)| ActiveCall {
                bus: bus.clone(),
                requested_at: *at,
            })
            .collect();
        calls.sort_by(|a, b| a.bus.cmp(&b.bus));
        calls
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<RouteId, DateTime<Utc>>> {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
