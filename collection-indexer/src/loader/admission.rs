//! Admission control for outbound bulk requests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::info;

/// Gates sink requests on the number of requests still awaiting a response.
///
/// The counter is shared by every task of the process. Delays are best
/// effort: after `max_cycles` sleeps the request proceeds regardless.
#[derive(Debug, Clone)]
pub struct AdmissionControl {
    in_flight: Arc<AtomicU64>,
    threshold: u64,
    sleep_interval: Duration,
    max_cycles: u32,
}

/// Marks one request as in flight until dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    in_flight: Arc<AtomicU64>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

impl AdmissionControl {
    pub fn new(threshold: u64, sleep_interval: Duration, max_cycles: u32) -> Self {
        Self {
            in_flight: Arc::new(AtomicU64::new(0)),
            threshold,
            sleep_interval,
            max_cycles,
        }
    }

    pub fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Count a new request, then wait while the backlog is above threshold.
    pub async fn admit(&self) -> InFlightGuard {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        let guard = InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
        };

        let mut cycles = 0;
        while self.in_flight() > self.threshold && cycles < self.max_cycles {
            info!(
                sleep_ms = self.sleep_interval.as_millis() as u64,
                in_flight = self.in_flight() - 1,
                threshold = self.threshold,
                "Delaying bulk request, too many requests in flight"
            );
            sleep(self.sleep_interval).await;
            cycles += 1;
        }
        guard
    }

    /// True when the backlog has run away past twice the threshold.
    pub fn is_overloaded(&self) -> bool {
        self.in_flight() > self.threshold.saturating_mul(2)
    }
}
