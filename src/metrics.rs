//! Run metrics for the extraction pipeline
//!
//! Counters and histograms are emitted through the `metrics` facade and are
//! no-ops unless a recorder is installed. [`init_metrics`] installs the
//! Prometheus exporter for long-running or scheduled invocations.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

static CORRELATION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Install the Prometheus exporter and register metric descriptions
///
/// Idempotent: later calls are ignored.
///
/// # Arguments
/// * `addr` - Socket address for the scrape endpoint (e.g., "0.0.0.0:9090")
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    info!("Initializing metrics system on {}", addr);

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| {
            METRICS_INITIALIZED.store(false, Ordering::SeqCst);
            format!("Failed to install Prometheus exporter: {e}")
        })?;

    describe_counter!(
        "http_requests_total",
        Unit::Count,
        "Total number of HTTP requests made to the API"
    );
    describe_counter!(
        "http_retries_total",
        Unit::Count,
        "Total number of retry attempts"
    );
    describe_histogram!(
        "http_request_duration_seconds",
        Unit::Seconds,
        "HTTP request duration in seconds"
    );
    describe_histogram!(
        "retry_backoff_duration_seconds",
        Unit::Seconds,
        "Duration of retry backoff in seconds"
    );
    describe_counter!(
        "pages_fetched_total",
        Unit::Count,
        "Pages successfully fetched from paginated endpoints"
    );
    describe_counter!(
        "enrich_fallbacks_total",
        Unit::Count,
        "Roster records kept unenriched after a failed detail request"
    );

    Ok(())
}

/// Generate a new correlation ID for request tracing
pub fn generate_correlation_id() -> String {
    let id = CORRELATION_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    format!("req-{id:08x}")
}

/// Timing and outcome of one HTTP attempt
pub struct HttpRequestMetrics {
    endpoint: String,
    start_time: Instant,
    correlation_id: String,
    attempt: u32,
}

impl HttpRequestMetrics {
    /// Start recording a new HTTP attempt
    pub fn start(endpoint: impl Into<String>, attempt: u32) -> Self {
        let endpoint = endpoint.into();
        let correlation_id = generate_correlation_id();

        debug!(
            correlation_id = %correlation_id,
            endpoint = %endpoint,
            attempt = attempt,
            "Starting HTTP request"
        );

        Self {
            endpoint,
            start_time: Instant::now(),
            correlation_id,
            attempt,
        }
    }

    /// Correlation id assigned to this attempt
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Record an attempt that produced a response
    pub fn record_complete(&self, status_code: u16) {
        self.record(status_code.to_string());
    }

    /// Record an attempt that failed before a response arrived
    pub fn record_failure(&self) {
        self.record("error".to_string());
    }

    fn record(&self, status: String) {
        counter!(
            "http_requests_total",
            "endpoint" => self.endpoint.clone(),
            "status" => status,
        )
        .increment(1);

        histogram!(
            "http_request_duration_seconds",
            "endpoint" => self.endpoint.clone(),
        )
        .record(self.start_time.elapsed().as_secs_f64());

        debug!(
            correlation_id = %self.correlation_id,
            endpoint = %self.endpoint,
            attempt = self.attempt,
            elapsed_ms = self.start_time.elapsed().as_millis() as u64,
            "HTTP request finished"
        );
    }
}

/// Record a retry and the backoff that precedes it
pub fn record_retry(endpoint: &str, backoff: Duration) {
    counter!("http_retries_total", "endpoint" => endpoint.to_string()).increment(1);
    histogram!("retry_backoff_duration_seconds").record(backoff.as_secs_f64());
}

/// Record a page fetched from a paginated endpoint
pub fn record_page(endpoint: &str, records: usize) {
    counter!("pages_fetched_total", "endpoint" => endpoint.to_string()).increment(1);
    counter!("records_fetched_total", "endpoint" => endpoint.to_string()).increment(records as u64);
}

/// Record a roster record kept unenriched
pub fn record_enrich_fallback() {
    counter!("enrich_fallbacks_total").increment(1);
}
