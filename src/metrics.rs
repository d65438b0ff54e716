//! Prometheus metrics collection for roomd.
//!
//! Exposed on an HTTP endpoint (see [`crate::http`]) when a metrics port is
//! configured.
//!
//! - `roomd_authorizations_total{decision}` - Gate decisions (self, public, denied, or an error code)
//! - `roomd_active_sessions` - Currently open sessions
//! - `roomd_command_total{command}` - Requests processed by method
//! - `roomd_command_duration_seconds{command}` - Request latency histogram
//! - `roomd_command_errors_total{command, error}` - Failed requests by error kind

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Gate decisions by outcome.
pub static AUTHORIZATIONS: OnceLock<IntCounterVec> = OnceLock::new();

/// Requests processed by method.
pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Request errors by method and error kind.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Gauges and histograms
// ========================================================================

/// Currently open sessions.
pub static ACTIVE_SESSIONS: OnceLock<IntGauge> = OnceLock::new();

/// Request latency by method.
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Call once at startup before any metrics are recorded. Recording before
/// this is a no-op.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::error!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(AUTHORIZATIONS, IntCounterVec::new(Opts::new("roomd_authorizations_total", "Connection authorization decisions"), &["decision"]));
    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("roomd_command_total", "Requests processed by method"), &["command"]));
    register!(COMMAND_ERRORS, IntCounterVec::new(Opts::new("roomd_command_errors_total", "Request errors by method"), &["command", "error"]));
    register!(ACTIVE_SESSIONS, IntGauge::new("roomd_active_sessions", "Currently open sessions"));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("roomd_command_duration_seconds", "Request latency by method")
            .buckets(vec![0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        &["command"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

/// Record one gate decision.
#[inline]
pub fn record_authorization(decision: &str) {
    if let Some(c) = AUTHORIZATIONS.get() {
        c.with_label_values(&[decision]).inc();
    }
}

/// Record a request execution with latency.
#[inline]
pub fn record_command(method: &str, duration_secs: f64) {
    if let Some(c) = COMMAND_COUNTER.get() {
        c.with_label_values(&[method]).inc();
    }
    if let Some(h) = COMMAND_LATENCY.get() {
        h.with_label_values(&[method]).observe(duration_secs);
    }
}

/// Record a request error.
#[inline]
pub fn record_command_error(method: &str, error: &str) {
    if let Some(c) = COMMAND_ERRORS.get() {
        c.with_label_values(&[method, error]).inc();
    }
}

#[inline]
pub fn session_opened() {
    if let Some(g) = ACTIVE_SESSIONS.get() {
        g.inc();
    }
}

#[inline]
pub fn session_closed() {
    if let Some(g) = ACTIVE_SESSIONS.get() {
        g.dec();
    }
}
