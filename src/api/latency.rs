//! In-memory fetch latency histograms, one per check.
//! The poller records every upstream round-trip; the API reads percentiles.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

use crate::types::CheckKind;

/// Percentiles in milliseconds. `None` until the first sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatencySummary {
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
    pub sample_count: u64,
}

/// Values stored in microseconds. Tracks 1us to 100s, 3 significant figures.
pub struct LatencyStats {
    inner: Mutex<HashMap<CheckKind, hdrhistogram::Histogram<u64>>>,
}

impl LatencyStats {
    pub fn new() -> Self {
        Self { inner: Mutex::new(HashMap::new()) }
    }

    pub fn record(&self, check: CheckKind, d: Duration) {
        let us = d.as_micros().clamp(1, 100_000_000) as u64;
        let Ok(mut map) = self.inner.lock() else {
            return;
        };
        let histogram = match map.entry(check) {
            std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
            std::collections::hash_map::Entry::Vacant(e) => {
                match hdrhistogram::Histogram::new_with_bounds(1, 100_000_000, 3) {
                    Ok(h) => e.insert(h),
                    Err(_) => return,
                }
            }
        };
        let _ = histogram.record(us);
    }

    pub fn summary(&self, check: CheckKind) -> LatencySummary {
        let Ok(map) = self.inner.lock() else {
            return LatencySummary::default();
        };
        let Some(h) = map.get(&check).filter(|h| h.len() > 0) else {
            return LatencySummary::default();
        };
        let ms = |q: f64| Some(h.value_at_quantile(q) as f64 / 1000.0);
        LatencySummary {
            p50_ms: ms(0.5),
            p95_ms: ms(0.95),
            p99_ms: ms(0.99),
            sample_count: h.len(),
        }
    }

    pub fn len(&self, check: CheckKind) -> u64 {
        self.inner
            .lock()
            .map(|map| map.get(&check).map_or(0, |h| h.len()))
            .unwrap_or(0)
    }
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}
