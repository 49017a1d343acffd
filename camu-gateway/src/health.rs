use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

#[derive(Debug, Serialize, Deserialize)]
pub struct GatewayHealth {
    pub started_at: String,
    pub uptime_seconds: u64,
    pub relayed_total: u64,
    pub upstream_failures: u64,
    pub rejected_requests: u64,
    pub upstream: String,
    pub last_upstream_error: Option<String>,
}

/// Counters shared by every request handler.
#[derive(Clone)]
pub struct HealthTracker {
    start_time: Instant,
    started_at: OffsetDateTime,
    relayed: Arc<AtomicU64>,
    failures: Arc<AtomicU64>,
    rejected: Arc<AtomicU64>,
    last_error: Arc<parking_lot::Mutex<Option<String>>>,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            started_at: OffsetDateTime::now_utc(),
            relayed: Arc::new(AtomicU64::new(0)),
            failures: Arc::new(AtomicU64::new(0)),
            rejected: Arc::new(AtomicU64::new(0)),
            last_error: Arc::new(parking_lot::Mutex::new(None)),
        }
    }

    pub fn record_relayed(&self) {
        self.relayed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upstream_failure(&self, detail: &str) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        *self.last_error.lock() = Some(detail.to_string());
    }

    /// Request refused before reaching upstream (400s).
    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_health(&self, upstream: &str) -> GatewayHealth {
        GatewayHealth {
            started_at: self.started_at.format(&Rfc3339).unwrap_or_default(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            relayed_total: self.relayed.load(Ordering::Relaxed),
            upstream_failures: self.failures.load(Ordering::Relaxed),
            rejected_requests: self.rejected.load(Ordering::Relaxed),
            upstream: upstream.to_string(),
            last_upstream_error: self.last_error.lock().clone(),
        }
    }
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_shared_between_clones() {
        let tracker = HealthTracker::new();
        let clone = tracker.clone();
        clone.record_relayed();
        clone.record_relayed();
        tracker.record_rejected();
        tracker.record_upstream_failure("upstream answered 502");

        let health = tracker.get_health("http://up");
        assert_eq!(health.relayed_total, 2);
        assert_eq!(health.rejected_requests, 1);
        assert_eq!(health.upstream_failures, 1);
        assert_eq!(health.last_upstream_error.as_deref(), Some("upstream answered 502"));
        assert_eq!(health.upstream, "http://up");
        assert!(!health.started_at.is_empty());
    }
}
