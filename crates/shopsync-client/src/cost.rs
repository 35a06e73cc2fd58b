//! Cost-extension bookkeeping (spec §4.1 "Cost observation"). The server
//! reports a query-cost bucket with every response; when the remaining
//! balance drops below a small threshold we voluntarily sleep before the
//! next request rather than waiting to get throttled.

use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;

/// Below this many points of remaining bucket capacity we start pacing
/// ourselves proportionally to the bucket's restore rate.
const LOW_WATERMARK: f64 = 50.0;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    currently_available: f64,
    restore_rate: f64,
}

impl Default for Bucket {
    fn default() -> Self {
        // Shopify's default bulk-query bucket: 1000pt capacity, 50pt/s restore.
        Bucket {
            currently_available: 1000.0,
            restore_rate: 50.0,
        }
    }
}

pub struct CostTracker {
    bucket: Mutex<Bucket>,
}

impl CostTracker {
    pub fn new() -> Self {
        CostTracker {
            bucket: Mutex::new(Bucket::default()),
        }
    }

    /// Parses the `extensions.cost` object from a GraphQL response, if
    /// present, and records the throttle status it reports.
    pub fn observe(&self, extensions: Option<&Value>) {
        let Some(extensions) = extensions else { return };
        let Some(cost) = extensions.get("cost") else { return };
        let Some(status) = cost.get("throttleStatus") else { return };
        let available = status.get("currentlyAvailable").and_then(Value::as_f64);
        let restore = status.get("restoreRate").and_then(Value::as_f64);
        if let (Some(available), Some(restore)) = (available, restore) {
            let mut bucket = self.bucket.lock().unwrap();
            bucket.currently_available = available;
            bucket.restore_rate = restore.max(1.0);
        }
    }

    /// How long to voluntarily sleep before the next request, given the last
    /// observed bucket state. Zero if there's ample headroom.
    pub fn throttle_delay(&self) -> Duration {
        let bucket = self.bucket.lock().unwrap();
        if bucket.currently_available >= LOW_WATERMARK {
            return Duration::ZERO;
        }
        let deficit = LOW_WATERMARK - bucket.currently_available;
        Duration::from_secs_f64((deficit / bucket.restore_rate).max(0.0))
    }
}

impl Default for CostTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_delay_when_bucket_healthy() {
        let tracker = CostTracker::new();
        assert_eq!(tracker.throttle_delay(), Duration::ZERO);
    }

    #[test]
    fn sleeps_proportionally_when_bucket_low() {
        let tracker = CostTracker::new();
        tracker.observe(Some(&serde_json::json!({
            "cost": {
                "requestedQueryCost": 10,
                "actualQueryCost": 10,
                "throttleStatus": {
                    "maximumAvailable": 1000.0,
                    "currentlyAvailable": 20.0,
                    "restoreRate": 50.0
                }
            }
        })));
        let delay = tracker.throttle_delay();
        assert!(delay > Duration::ZERO);
        assert!(delay <= Duration::from_secs(1));
    }

    #[test]
    fn ignores_missing_extensions() {
        let tracker = CostTracker::new();
        tracker.observe(None);
        tracker.observe(Some(&serde_json::json!({})));
        assert_eq!(tracker.throttle_delay(), Duration::ZERO);
    }
}
