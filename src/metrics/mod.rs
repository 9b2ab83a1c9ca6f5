//! Metrics collection for observability

use prometheus::{
    Counter, CounterVec, HistogramVec, Opts, Registry,
    register_counter_vec_with_registry, register_counter_with_registry,
    register_histogram_vec_with_registry,
};
use std::sync::Arc;
use once_cell::sync::Lazy;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| {
    Arc::new(Metrics::new().expect("Failed to initialize metrics"))
});

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Streaming plan metrics
    pub plan_chunks: Counter,
    pub plan_parse_outcomes: CounterVec,
    pub plan_sections_written: CounterVec,

    // Feed metrics
    pub feed_fetch_attempts: CounterVec,
    pub feed_fetch_duration: HistogramVec,

    // Curation metrics
    pub articles_duplicates: Counter,
    pub articles_relevance: CounterVec,

    // API metrics
    pub api_requests: CounterVec,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let registry = Registry::new();

        let plan_chunks = register_counter_with_registry!(
            Opts::new("plan_chunks_total", "Total streamed plan chunks processed"),
            registry
        )?;

        let plan_parse_outcomes = register_counter_vec_with_registry!(
            Opts::new("plan_parse_outcomes_total", "JSON parse cascade outcomes by strategy"),
            &["strategy"],
            registry
        )?;

        let plan_sections_written = register_counter_vec_with_registry!(
            Opts::new("plan_sections_written_total", "Plan sections written"),
            &["mode"],
            registry
        )?;

        let feed_fetch_attempts = register_counter_vec_with_registry!(
            Opts::new("feed_fetch_attempts_total", "Feed fetch attempts by outcome"),
            &["outcome"],
            registry
        )?;

        let feed_fetch_duration = register_histogram_vec_with_registry!(
            "feed_fetch_duration_seconds",
            "Feed fetch duration in seconds, retries included",
            &["outcome"],
            registry
        )?;

        let articles_duplicates = register_counter_with_registry!(
            Opts::new("articles_duplicates_total", "Articles dropped as duplicates"),
            registry
        )?;

        let articles_relevance = register_counter_vec_with_registry!(
            Opts::new("articles_relevance_total", "Relevance filter decisions"),
            &["result"],
            registry
        )?;

        let api_requests = register_counter_vec_with_registry!(
            Opts::new("api_requests_total", "API requests by endpoint and status"),
            &["endpoint", "status"],
            registry
        )?;

        Ok(Self {
            registry,
            plan_chunks,
            plan_parse_outcomes,
            plan_sections_written,
            feed_fetch_attempts,
            feed_fetch_duration,
            articles_duplicates,
            articles_relevance,
            api_requests,
        })
    }

    /// Record which parse strategy succeeded, or `"none"`
    pub fn record_parse(&self, strategy: Option<&str>) {
        self.plan_parse_outcomes
            .with_label_values(&[strategy.unwrap_or("none")])
            .inc();
    }

    /// Record a section write
    pub fn record_section(&self, complete: bool) {
        let mode = if complete { "complete" } else { "partial" };
        self.plan_sections_written.with_label_values(&[mode]).inc();
    }

    /// Record a single fetch attempt
    pub fn record_fetch_attempt(&self, success: bool) {
        let outcome = if success { "success" } else { "error" };
        self.feed_fetch_attempts.with_label_values(&[outcome]).inc();
    }

    /// Record relevance decisions for a batch
    pub fn record_relevance(&self, kept: usize, rejected: usize) {
        self.articles_relevance
            .with_label_values(&["kept"])
            .inc_by(kept as f64);
        self.articles_relevance
            .with_label_values(&["rejected"])
            .inc_by(rejected as f64);
    }

    /// Record an API request
    pub fn record_api(&self, endpoint: &str, success: bool) {
        let status = if success { "success" } else { "error" };
        self.api_requests.with_label_values(&[endpoint, status]).inc();
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap_or_default();

        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        let metrics = Metrics::new();
        assert!(metrics.is_ok());
    }

    #[test]
    fn test_record_and_export() {
        let metrics = Metrics::new().unwrap();
        metrics.plan_chunks.inc();
        metrics.record_parse(Some("whole_buffer"));
        metrics.record_parse(None);
        metrics.record_fetch_attempt(false);
        metrics.record_relevance(2, 3);

        let text = metrics.export_prometheus();
        assert!(text.contains("plan_chunks_total 1"));
        assert!(text.contains("plan_parse_outcomes_total{strategy=\"none\"} 1"));
        assert!(text.contains("articles_relevance_total{result=\"rejected\"} 3"));
    }
}
