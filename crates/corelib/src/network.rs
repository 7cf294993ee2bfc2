//! Network latency estimates shared across the workspace.
//!
//! The RPC layer records round-trip samples as heartbeats come back; readers
//! only ever see the cached estimate.

use std::time::Duration;

use dashmap::DashMap;

/// Estimated round-trip latency to a node address.
///
/// `None` means no valid estimate exists. Callers must not read that as zero.
pub trait LatencyEstimator: Send + Sync + 'static {
    fn estimate(&self, address: &str) -> Option<Duration>;
}

/// Plain functions returning `(latency, valid)` are estimators.
impl<F> LatencyEstimator for F
where
    F: Fn(&str) -> (Duration, bool) + Send + Sync + 'static,
{
    fn estimate(&self, address: &str) -> Option<Duration> {
        match self(address) {
            (latency, true) => Some(latency),
            (_, false) => None,
        }
    }
}

/// Smoothing factor applied to each new sample.
const EWMA_ALPHA: f64 = 0.3;

/// Moving-average latency per address, fed by the RPC heartbeat loop.
#[derive(Debug, Default)]
pub struct LatencyCache {
    averages: DashMap<String, Duration>,
}

impl LatencyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a measured round trip into the address's average.
    pub fn record(&self, address: &str, sample: Duration) {
        self.averages
            .entry(address.to_string())
            .and_modify(|avg| {
                *avg = avg.mul_f64(1.0 - EWMA_ALPHA) + sample.mul_f64(EWMA_ALPHA);
            })
            .or_insert(sample);
    }

    /// Drop the estimate for a torn-down connection.
    pub fn forget(&self, address: &str) -> bool {
        self.averages.remove(address).is_some()
    }
}

impl LatencyEstimator for LatencyCache {
    fn estimate(&self, address: &str) -> Option<Duration> {
        self.averages.get(address).map(|avg| *avg.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_estimator_validity() {
        let est = |addr: &str| {
            if addr.ends_with('2') {
                (Duration::from_nanos(1), true)
            } else {
                (Duration::ZERO, false)
            }
        };
        assert_eq!(est.estimate("host:2"), Some(Duration::from_nanos(1)));
        // Invalid is not zero latency.
        assert_eq!(est.estimate("host:3"), None);
    }

    #[test]
    fn test_cache_ewma() {
        let cache = LatencyCache::new();
        assert_eq!(cache.estimate("a"), None);

        cache.record("a", Duration::from_millis(10));
        assert_eq!(cache.estimate("a"), Some(Duration::from_millis(10)));

        cache.record("a", Duration::from_millis(20));
        let avg = cache.estimate("a").unwrap();
        // 10 * 0.7 + 20 * 0.3 = 13ms
        assert!(avg > Duration::from_micros(12_900) && avg < Duration::from_micros(13_100));

        assert!(cache.forget("a"));
        assert_eq!(cache.estimate("a"), None);
    }
}
