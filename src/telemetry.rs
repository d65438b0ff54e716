//! Telemetry utilities for request timing and tracing spans.

use std::time::Instant;

/// Guard for timing request execution and recording metrics.
///
/// Records latency when dropped.
pub struct CommandTimer {
    method: String,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a request.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_command(&self.method, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use std::net::SocketAddr;
    use tracing::{Span, info_span};

    /// Span for one accepted connection.
    pub fn connection(session: &str, addr: &SocketAddr) -> Span {
        info_span!("connection", session = %session, addr = %addr)
    }

    /// Span for one request.
    pub fn command(method: &str, peer: &str) -> Span {
        info_span!("command", method = %method, peer = %peer)
    }
}
