//! Prometheus-style metrics for the access engine

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::filter::FilterSpec;
use crate::scope::ScopeType;

/// Engine counters
#[derive(Debug, Clone, Default)]
pub struct EngineMetrics {
    /// Resolved scopes by scope type
    pub resolutions: BTreeMap<ScopeType, u64>,

    /// Built filters by filter kind
    pub filters: BTreeMap<&'static str, u64>,

    /// Entity checks
    pub entity_allowed: u64,
    pub entity_denied: u64,

    /// Approval checks
    pub approvals_granted: u64,
    pub approvals_denied: u64,

    /// Decision cache
    pub cache_hits: u64,
    pub cache_misses: u64,

    /// Snapshot rebuilds from the repository
    pub snapshot_reloads: u64,

    /// Errors returned to callers
    pub error_count: u64,

    pub latency_p50_ms: f64,
    pub latency_p99_ms: f64,
    pub avg_latency_ms: f64,
}

impl EngineMetrics {
    pub fn total_resolutions(&self) -> u64 {
        self.resolutions.values().sum()
    }

    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

/// Collects [`EngineMetrics`]
pub struct MetricsCollector {
    metrics: Arc<RwLock<EngineMetrics>>,

    /// Recent latency samples in milliseconds
    latency_samples: Arc<RwLock<Vec<f64>>>,

    max_samples: usize,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(RwLock::new(EngineMetrics::default())),
            latency_samples: Arc::new(RwLock::new(Vec::with_capacity(10_000))),
            max_samples: 10_000,
        }
    }

    pub async fn record_resolution(&self, scope: ScopeType) {
        let mut metrics = self.metrics.write().await;
        *metrics.resolutions.entry(scope).or_insert(0) += 1;
    }

    pub async fn record_filter(&self, spec: &FilterSpec) {
        let mut metrics = self.metrics.write().await;
        *metrics.filters.entry(spec.kind()).or_insert(0) += 1;
    }

    pub async fn record_entity_check(&self, allowed: bool) {
        let mut metrics = self.metrics.write().await;
        if allowed {
            metrics.entity_allowed += 1;
        } else {
            metrics.entity_denied += 1;
        }
    }

    pub async fn record_approval(&self, granted: bool) {
        let mut metrics = self.metrics.write().await;
        if granted {
            metrics.approvals_granted += 1;
        } else {
            metrics.approvals_denied += 1;
        }
    }

    pub async fn record_cache_hit(&self) {
        self.metrics.write().await.cache_hits += 1;
    }

    pub async fn record_cache_miss(&self) {
        self.metrics.write().await.cache_misses += 1;
    }

    pub async fn record_snapshot_reload(&self) {
        self.metrics.write().await.snapshot_reloads += 1;
    }

    pub async fn record_error(&self) {
        self.metrics.write().await.error_count += 1;
    }

    pub async fn record_latency(&self, latency: Duration) {
        let latency_ms = latency.as_secs_f64() * 1000.0;

        let mut samples = self.latency_samples.write().await;
        samples.push(latency_ms);
        if samples.len() > self.max_samples {
            samples.drain(0..1_000);
        }

        let mut sorted = samples.clone();
        sorted.sort_by(f64::total_cmp);

        let mut metrics = self.metrics.write().await;
        metrics.avg_latency_ms = sorted.iter().sum::<f64>() / sorted.len() as f64;
        metrics.latency_p50_ms = Self::percentile(&sorted, 0.50);
        metrics.latency_p99_ms = Self::percentile(&sorted, 0.99);
    }

    pub async fn get_metrics(&self) -> EngineMetrics {
        self.metrics.read().await.clone()
    }

    pub async fn reset(&self) {
        *self.metrics.write().await = EngineMetrics::default();
        self.latency_samples.write().await.clear();
    }

    /// Render in the Prometheus text exposition format
    pub async fn export_prometheus(&self) -> String {
        let metrics = self.metrics.read().await;
        let mut out = String::new();

        out.push_str("# HELP orgscope_resolutions_total Scope resolutions by scope type\n");
        out.push_str("# TYPE orgscope_resolutions_total counter\n");
        for scope in ScopeType::ORDERED {
            let count = metrics.resolutions.get(&scope).copied().unwrap_or(0);
            let _ = writeln!(out, "orgscope_resolutions_total{{scope=\"{}\"}} {}", scope, count);
        }

        out.push_str("\n# HELP orgscope_filters_total Filters built by kind\n");
        out.push_str("# TYPE orgscope_filters_total counter\n");
        for (kind, count) in &metrics.filters {
            let _ = writeln!(out, "orgscope_filters_total{{kind=\"{}\"}} {}", kind, count);
        }

        let counters = [
            ("orgscope_entity_checks_total{result=\"allowed\"}", "Entity checks", metrics.entity_allowed),
            ("orgscope_entity_checks_total{result=\"denied\"}", "", metrics.entity_denied),
            ("orgscope_approvals_total{result=\"granted\"}", "Approval checks", metrics.approvals_granted),
            ("orgscope_approvals_total{result=\"denied\"}", "", metrics.approvals_denied),
            ("orgscope_cache_hits_total", "Decision cache hits", metrics.cache_hits),
            ("orgscope_cache_misses_total", "Decision cache misses", metrics.cache_misses),
            ("orgscope_snapshot_reloads_total", "Snapshot rebuilds", metrics.snapshot_reloads),
            ("orgscope_errors_total", "Errors returned to callers", metrics.error_count),
        ];
        for (series, help, value) in counters {
            if !help.is_empty() {
                let name = series.split('{').next().unwrap_or(series);
                let _ = write!(out, "\n# HELP {name} {help}\n# TYPE {name} counter\n");
            }
            let _ = writeln!(out, "{} {}", series, value);
        }

        out.push_str("\n# HELP orgscope_latency_seconds Request latency\n");
        out.push_str("# TYPE orgscope_latency_seconds summary\n");
        let _ = writeln!(out, "orgscope_latency_seconds{{quantile=\"0.5\"}} {}", metrics.latency_p50_ms / 1000.0);
        let _ = writeln!(out, "orgscope_latency_seconds{{quantile=\"0.99\"}} {}", metrics.latency_p99_ms / 1000.0);

        out
    }

    fn percentile(sorted: &[f64], p: f64) -> f64 {
        if sorted.is_empty() {
            return 0.0;
        }

        let idx = ((sorted.len() as f64) * p) as usize;
        sorted[idx.min(sorted.len() - 1)]
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
