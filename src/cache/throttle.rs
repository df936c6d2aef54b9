//! Per-host politeness throttle
//!
//! Callers reserve the next free slot for a host under the lock, then sleep
//! outside it. Concurrent callers therefore queue up behind each other and the
//! minimum interval holds in aggregate, not just per call site.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

pub struct HostThrottle {
    min_interval: Duration,
    last_call: Mutex<HashMap<String, Instant>>,
}

impl HostThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(HashMap::new()),
        }
    }

    /// A throttle that never sleeps.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Block until `host` may be contacted again and record the call.
    ///
    /// Returns how long the caller slept.
    pub fn wait(&self, host: &str) -> Duration {
        if self.min_interval.is_zero() {
            return Duration::ZERO;
        }

        let slot = {
            // A poisoned map only holds timestamps; keep using it
            let mut last_call = self
                .last_call
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let now = Instant::now();
            let slot = match last_call.get(host) {
                Some(&last) => (last + self.min_interval).max(now),
                None => now,
            };
            last_call.insert(host.to_string(), slot);
            slot
        };

        let gap = slot.saturating_duration_since(Instant::now());
        if !gap.is_zero() {
            debug!("Throttling {} for {:?}", host, gap);
            std::thread::sleep(gap);
        }
        gap
    }
}

impl Default for HostThrottle {
    fn default() -> Self {
        Self::disabled()
    }
}
