//! Best-effort notification bus
//!
//! Nodes tell each other about calls and releases with a single HTTP POST.
//! There is no retry and no queue: a send either lands within the timeout or
//! it is logged and forgotten. Receivers are idempotent, so a duplicate is
//! harmless and a lost message only leaves the peer's view stale until the
//! next message for the same route (a lost RELEASE keeps the route active at
//! the call station until the process restarts).

use crate::message::Notification;
use crate::{Error, Result};
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound on how long a node waits for a peer
pub const MAX_SEND_TIMEOUT: Duration = Duration::from_millis(1000);

/// Outcome of one best-effort send
///
/// Callers are free to ignore it; failures have already been logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Peer answered with a 2xx status
    Delivered,
    /// Peer answered with a non-success status
    Rejected(u16),
    /// Peer unreachable, timed out, or the request could not be built
    Failed(String),
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered)
    }
}

/// HTTP client used for every node-to-node message
#[derive(Debug, Clone)]
pub struct NotificationBus {
    http_client: reqwest::Client,
    timeout: Duration,
}

impl NotificationBus {
    /// Create a bus client; the timeout is clamped to [`MAX_SEND_TIMEOUT`]
    pub fn new(timeout: Duration) -> Result<Self> {
        let timeout = timeout.min(MAX_SEND_TIMEOUT);
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POST one notification to one peer
    pub async fn send(&self, url: &str, message: &Notification) -> Delivery {
        debug!(url = %url, kind = ?message.kind, bus = %message.bus, "Sending notification");

        let response = match self.http_client.post(url).json(message).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %url, bus = %message.bus, "Notification not delivered: {}", e);
                return Delivery::Failed(e.to_string());
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!(url = %url, bus = %message.bus, "Notification delivered");
            Delivery::Delivered
        } else {
            warn!(url = %url, bus = %message.bus, status = %status, "Notification rejected by peer");
            Delivery::Rejected(status.as_u16())
        }
    }

    /// POST the same notification to every peer concurrently
    ///
    /// Results are returned in the order of `urls`.
    pub async fn broadcast(&self, urls: &[String], message: &Notification) -> Vec<Delivery> {
        let handles: Vec<_> = urls
            .iter()
            .map(|url| {
                let bus = self.clone();
                let url = url.clone();
                let message = message.clone();
                tokio::spawn(async move { bus.send(&url, &message).await })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(
                handle
                    .await
                    .unwrap_or_else(|e| Delivery::Failed(format!("send task failed: {}", e))),
            );
        }
        results
    }
}
