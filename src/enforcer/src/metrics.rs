//! Resolution metrics for enforcer provider observability
//!
//! Counters are atomics so the resolved path never waits on a reader.
//! Per-strategy counts and construction latency only change during a
//! pipeline run and sit behind a mutex.

use crate::enforcer::ResolutionStrategy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Provider resolution metrics
#[derive(Debug, Clone, Default)]
pub struct ResolutionMetrics {
    /// Pipeline runs started
    pub attempts: u64,

    /// Pipeline runs that produced an enforcer
    pub successes: u64,

    /// Pipeline runs that failed
    pub failures: u64,

    /// Calls answered from the resolved enforcer
    pub cache_hits: u64,

    /// Successful constructions per strategy
    pub strategies: HashMap<ResolutionStrategy, u64>,

    /// Duration of the most recent pipeline run
    pub last_construction_ms: f64,
}

impl ResolutionMetrics {
    /// Fraction of pipeline runs that failed
    pub fn failure_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.failures as f64 / self.attempts as f64
        }
    }

    /// Successful constructions by `strategy`
    pub fn strategy_count(&self, strategy: ResolutionStrategy) -> u64 {
        self.strategies.get(&strategy).copied().unwrap_or(0)
    }
}

#[derive(Debug, Default)]
struct ConstructionStats {
    strategies: HashMap<ResolutionStrategy, u64>,
    last_construction_ms: f64,
}

/// Metrics collector for the enforcer provider
#[derive(Debug, Default)]
pub struct ProviderMetrics {
    attempts_total: AtomicU64,
    successes_total: AtomicU64,
    failures_total: AtomicU64,
    cache_hits_total: AtomicU64,
    construction: Mutex<ConstructionStats>,
}

impl ProviderMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of a pipeline run
    pub fn record_attempt(&self) {
        self.attempts_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful construction
    pub fn record_success(&self, strategy: ResolutionStrategy, elapsed: Duration) {
        self.successes_total.fetch_add(1, Ordering::Relaxed);

        let mut stats = self.construction.lock();
        *stats.strategies.entry(strategy).or_insert(0) += 1;
        stats.last_construction_ms = elapsed.as_secs_f64() * 1000.0;
    }

    /// Record a failed construction
    pub fn record_failure(&self, elapsed: Duration) {
        self.failures_total.fetch_add(1, Ordering::Relaxed);
        self.construction.lock().last_construction_ms = elapsed.as_secs_f64() * 1000.0;
    }

    /// Record a call served by the resolved enforcer
    pub fn record_cache_hit(&self) {
        self.cache_hits_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn get_metrics(&self) -> ResolutionMetrics {
        let stats = self.construction.lock();

        ResolutionMetrics {
            attempts: self.attempts_total.load(Ordering::Relaxed),
            successes: self.successes_total.load(Ordering::Relaxed),
            failures: self.failures_total.load(Ordering::Relaxed),
            cache_hits: self.cache_hits_total.load(Ordering::Relaxed),
            strategies: stats.strategies.clone(),
            last_construction_ms: stats.last_construction_ms,
        }
    }

    /// Export metrics in Prometheus format
    pub fn export_prometheus(&self) -> String {
        let metrics = self.get_metrics();

        let mut out = format!(
            r#"# HELP enforcer_resolution_attempts_total Enforcer resolution attempts
# TYPE enforcer_resolution_attempts_total counter
enforcer_resolution_attempts_total {}

# HELP enforcer_resolution_failures_total Failed enforcer resolutions
# TYPE enforcer_resolution_failures_total counter
enforcer_resolution_failures_total {}

# HELP enforcer_cache_hits_total Calls served by the resolved enforcer
# TYPE enforcer_cache_hits_total counter
enforcer_cache_hits_total {}

# HELP enforcer_construction_seconds Duration of the last construction
# TYPE enforcer_construction_seconds gauge
enforcer_construction_seconds {}

# HELP enforcer_resolutions_total Successful resolutions by strategy
# TYPE enforcer_resolutions_total counter
"#,
            metrics.attempts,
            metrics.failures,
            metrics.cache_hits,
            metrics.last_construction_ms / 1000.0,
        );

        for strategy in ResolutionStrategy::ALL {
            out.push_str(&format!(
                "enforcer_resolutions_total{{strategy=\"{}\"}} {}\n",
                strategy,
                metrics.strategy_count(strategy)
            ));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_metrics_creation() {
        let collector = ProviderMetrics::new();
        let metrics = collector.get_metrics();

        assert_eq!(metrics.attempts, 0);
        assert_eq!(metrics.cache_hits, 0);
        assert_eq!(metrics.failure_rate(), 0.0);
    }

    #[test]
    fn test_record_outcomes() {
        let collector = ProviderMetrics::new();

        collector.record_attempt();
        collector.record_failure(Duration::from_millis(2));
        collector.record_attempt();
        collector.record_success(ResolutionStrategy::PolicyFile, Duration::from_millis(8));
        collector.record_cache_hit();

        let metrics = collector.get_metrics();
        assert_eq!(metrics.attempts, 2);
        assert_eq!(metrics.successes, 1);
        assert_eq!(metrics.failures, 1);
        assert_eq!(metrics.cache_hits, 1);
        assert_eq!(metrics.strategy_count(ResolutionStrategy::PolicyFile), 1);
        assert_eq!(metrics.strategy_count(ResolutionStrategy::Factory), 0);
        assert!((metrics.failure_rate() - 0.5).abs() < f64::EPSILON);
        assert!((metrics.last_construction_ms - 8.0).abs() < 0.5);
    }

    #[test]
    fn test_cache_hits_not_blocked_by_construction_stats() {
        let collector = Arc::new(ProviderMetrics::new());

        // Hold the construction stats while another thread records hits
        let stats = collector.construction.lock();

        let worker = {
            let collector = Arc::clone(&collector);
            std::thread::spawn(move || {
                for _ in 0..1_000 {
                    collector.record_cache_hit();
                }
            })
        };
        worker.join().unwrap();

        assert_eq!(collector.cache_hits_total.load(Ordering::Relaxed), 1_000);
        drop(stats);

        assert_eq!(collector.get_metrics().cache_hits, 1_000);
    }

    #[test]
    fn test_prometheus_export() {
        let collector = ProviderMetrics::new();

        collector.record_attempt();
        collector.record_success(ResolutionStrategy::ModelOnly, Duration::from_millis(1));

        let prometheus = collector.export_prometheus();
        assert!(prometheus.contains("enforcer_resolution_attempts_total 1"));
        assert!(prometheus.contains("enforcer_resolutions_total{strategy=\"model_only\"} 1"));
        assert!(prometheus.contains("enforcer_resolutions_total{strategy=\"factory\"} 0"));
    }
}
