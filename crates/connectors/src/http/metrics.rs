//! Per-call metrics
//!
//! Each provider call is recorded once, tagged with the connector, the URL
//! path and an operation label chosen by the caller. Backends plug in through
//! [`MetricsRecorder`]; [`InMemoryMetrics`] keeps counts and latency samples
//! in process.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Labels attached to one recorded call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallLabels {
    pub connector: String,
    /// URL path of the request
    pub endpoint: String,
    /// Caller-supplied operation name, e.g. `list_payments`
    pub operation: String,
}

/// Sink for call metrics
pub trait MetricsRecorder: Send + Sync {
    /// Record one call; `status` is 0 when no response was received
    fn record_call(&self, labels: &CallLabels, status: u16, elapsed: Duration);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsRecorder for NoopMetrics {
    fn record_call(&self, _labels: &CallLabels, _status: u16, _elapsed: Duration) {}
}

const MAX_SAMPLES: usize = 1000;

/// Aggregated stats for one label set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallStats {
    pub calls: u64,
    /// Calls per status code
    pub statuses: HashMap<u16, u64>,
    /// Most recent latencies, oldest first
    pub latencies: VecDeque<Duration>,
}

impl CallStats {
    /// Median of the retained latency samples
    pub fn p50(&self) -> Option<Duration> {
        let mut sorted: Vec<_> = self.latencies.iter().copied().collect();
        sorted.sort();
        sorted.get(sorted.len() / 2).copied()
    }
}

/// In-process metrics store
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    total_calls: AtomicU64,
    by_labels: Mutex<HashMap<CallLabels, CallStats>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total calls recorded across all labels
    pub fn total_calls(&self) -> u64 {
        self.total_calls.load(Ordering::SeqCst)
    }

    /// Stats for one label set
    pub fn stats(&self, labels: &CallLabels) -> Option<CallStats> {
        let guard = match self.by_labels.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.get(labels).cloned()
    }

    /// All label sets seen so far
    pub fn labels(&self) -> Vec<CallLabels> {
        let guard = match self.by_labels.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.keys().cloned().collect()
    }
}

impl MetricsRecorder for InMemoryMetrics {
    fn record_call(&self, labels: &CallLabels, status: u16, elapsed: Duration) {
        self.total_calls.fetch_add(1, Ordering::SeqCst);

        let mut guard = match self.by_labels.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("metrics lock poisoned, recovering");
                poisoned.into_inner()
            }
        };
        let stats = guard.entry(labels.clone()).or_default();
        stats.calls += 1;
        *stats.statuses.entry(status).or_default() += 1;
        stats.latencies.push_back(elapsed);
        if stats.latencies.len() > MAX_SAMPLES {
            stats.latencies.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(operation: &str) -> CallLabels {
        CallLabels {
            connector: "acme".into(),
            endpoint: "/payments".into(),
            operation: operation.into(),
        }
    }

    #[test]
    fn test_records_per_label_set() {
        let metrics = InMemoryMetrics::new();
        metrics.record_call(&labels("list_payments"), 200, Duration::from_millis(10));
        metrics.record_call(&labels("list_payments"), 500, Duration::from_millis(30));
        metrics.record_call(&labels("get_payment"), 200, Duration::from_millis(20));

        assert_eq!(metrics.total_calls(), 3);
        let stats = metrics.stats(&labels("list_payments")).unwrap();
        assert_eq!(stats.calls, 2);
        assert_eq!(stats.statuses.get(&500), Some(&1));
        assert_eq!(stats.p50(), Some(Duration::from_millis(30)));
        assert_eq!(metrics.labels().len(), 2);
    }

    #[test]
    fn test_latency_samples_are_bounded() {
        let metrics = InMemoryMetrics::new();
        for ms in 0..(MAX_SAMPLES as u64 + 5) {
            metrics.record_call(&labels("list"), 200, Duration::from_millis(ms));
        }
        let stats = metrics.stats(&labels("list")).unwrap();
        assert_eq!(stats.latencies.len(), MAX_SAMPLES);
        assert_eq!(stats.latencies.front(), Some(&Duration::from_millis(5)));
    }
}
