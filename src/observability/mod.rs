//! Observability module providing metrics and tracing hooks for the dispatcher.

use reqwest::header::HeaderMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, instrument, trace, warn, Level};

/// Counters for dispatcher activity.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Logical requests dispatched.
    requests_total: AtomicU64,
    /// Requests that produced a successful response.
    requests_success: AtomicU64,
    /// Requests that surfaced an error.
    requests_failed: AtomicU64,
    /// Extra attempts made after a retryable outcome.
    attempts_retried: AtomicU64,
    /// 429 responses received.
    rate_limited: AtomicU64,
    /// Global pauses opened.
    global_pauses: AtomicU64,
    /// Bucket releases deferred by an exhausted window.
    deferred_releases: AtomicU64,
    /// Total request latency in microseconds.
    latency_total_us: AtomicU64,
    /// Request count for latency calculation.
    latency_count: AtomicU64,
}

impl DispatchMetrics {
    /// Creates a new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_success(&self, duration: Duration) {
        self.requests_success.fetch_add(1, Ordering::Relaxed);
        self.record_latency(duration);
    }

    pub(crate) fn record_failure(&self, duration: Duration) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
        self.record_latency(duration);
    }

    pub(crate) fn record_retry(&self) {
        self.attempts_retried.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_global_pause(&self) {
        self.global_pauses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_deferred_release(&self) {
        self.deferred_releases.fetch_add(1, Ordering::Relaxed);
    }

    fn record_latency(&self, duration: Duration) {
        let us = duration.as_micros() as u64;
        self.latency_total_us.fetch_add(us, Ordering::Relaxed);
        self.latency_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Gets the average latency in microseconds.
    pub fn average_latency_us(&self) -> u64 {
        let total = self.latency_total_us.load(Ordering::Relaxed);
        let count = self.latency_count.load(Ordering::Relaxed);
        if count == 0 {
            0
        } else {
            total / count
        }
    }

    /// Gets a snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_success: self.requests_success.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            attempts_retried: self.attempts_retried.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            global_pauses: self.global_pauses.load(Ordering::Relaxed),
            deferred_releases: self.deferred_releases.load(Ordering::Relaxed),
            average_latency_us: self.average_latency_us(),
        }
    }
}

/// A snapshot of [`DispatchMetrics`] at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Logical requests dispatched.
    pub requests_total: u64,
    /// Successful requests.
    pub requests_success: u64,
    /// Failed requests.
    pub requests_failed: u64,
    /// Retried attempts.
    pub attempts_retried: u64,
    /// 429 responses.
    pub rate_limited: u64,
    /// Global pauses.
    pub global_pauses: u64,
    /// Deferred bucket releases.
    pub deferred_releases: u64,
    /// Average latency in microseconds.
    pub average_latency_us: u64,
}

/// Tracing hooks for dispatcher events.
pub struct TracingHooks;

impl TracingHooks {
    /// Logs the start of an attempt.
    #[instrument(skip_all)]
    pub fn on_request_start(method: &str, url: &str, bucket: &str, attempt: u32) {
        debug!(
            method = %method,
            url = %url,
            bucket = %bucket,
            attempt = attempt,
            "Instatus API request started"
        );
    }

    /// Logs outgoing headers at trace level, credentials redacted.
    pub fn on_request_headers(headers: &HeaderMap) {
        if !tracing::enabled!(Level::TRACE) {
            return;
        }
        for (name, value) in headers {
            let value = value.to_str().unwrap_or("<binary>");
            trace!(
                header = %name,
                value = %redact_header(name.as_str(), value),
                "Request header"
            );
        }
    }

    /// Logs a completed attempt.
    #[instrument(skip_all)]
    pub fn on_request_complete(method: &str, url: &str, status: u16, duration: Duration) {
        info!(
            method = %method,
            url = %url,
            status = status,
            duration_ms = duration.as_millis() as u64,
            "Instatus API request completed"
        );
    }

    /// Logs a request that surfaced an error.
    #[instrument(skip_all)]
    pub fn on_request_error(method: &str, url: &str, error: &str) {
        error!(
            method = %method,
            url = %url,
            error = %error,
            "Instatus API request failed"
        );
    }

    /// Logs a retry.
    #[instrument(skip_all)]
    pub fn on_retry(method: &str, url: &str, attempt: u32, delay: Duration, reason: &str) {
        warn!(
            method = %method,
            url = %url,
            attempt = attempt,
            delay_ms = delay.as_millis() as u64,
            reason = %reason,
            "Retrying Instatus API request"
        );
    }

    /// Logs a bucket held past its response.
    #[instrument(skip_all)]
    pub fn on_bucket_exhausted(bucket: &str, delay: Duration) {
        debug!(
            bucket = %bucket,
            delay_ms = delay.as_millis() as u64,
            "Bucket exhausted, holding until reset"
        );
    }

    /// Logs a 429.
    #[instrument(skip_all)]
    pub fn on_rate_limited(bucket: &str, retry_after: Duration, global: bool) {
        warn!(
            bucket = %bucket,
            retry_after_ms = retry_after.as_millis() as u64,
            global = global,
            "Rate limit exceeded"
        );
    }

    /// Logs a 429 not issued by the API.
    #[instrument(skip_all)]
    pub fn on_unexpected_rate_limit(url: &str) {
        error!(
            url = %url,
            "Received 429 without the API proxy marker, not retrying"
        );
    }
}

/// Sensitive headers that should be redacted in logs.
pub const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
];

/// Redacts sensitive values in headers.
pub fn redact_header(name: &str, value: &str) -> String {
    if SENSITIVE_HEADERS.contains(&name.to_lowercase().as_str()) {
        "[REDACTED]".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_snapshot() {
        let metrics = DispatchMetrics::new();

        metrics.record_request();
        metrics.record_request();
        metrics.record_success(Duration::from_millis(100));
        metrics.record_failure(Duration::from_millis(300));
        metrics.record_retry();
        metrics.record_rate_limited();
        metrics.record_global_pause();
        metrics.record_deferred_release();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_total, 2);
        assert_eq!(snapshot.requests_success, 1);
        assert_eq!(snapshot.requests_failed, 1);
        assert_eq!(snapshot.attempts_retried, 1);
        assert_eq!(snapshot.rate_limited, 1);
        assert_eq!(snapshot.global_pauses, 1);
        assert_eq!(snapshot.deferred_releases, 1);
        assert_eq!(snapshot.average_latency_us, 200_000);
    }

    #[test]
    fn test_empty_latency() {
        assert_eq!(DispatchMetrics::new().average_latency_us(), 0);
    }

    #[test]
    fn test_request_headers_hook() {
        use reqwest::header::{HeaderValue, AUTHORIZATION};

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer secret"));
        headers.insert("x-raw", HeaderValue::from_bytes(&[0xfa, 0xfb]).unwrap());

        TracingHooks::on_request_headers(&headers);
    }

    #[test]
    fn test_redact_header() {
        assert_eq!(redact_header("Authorization", "Bearer token"), "[REDACTED]");
        assert_eq!(redact_header("proxy-authorization", "Basic abc"), "[REDACTED]");
        assert_eq!(redact_header("Content-Type", "application/json"), "application/json");
    }
}
