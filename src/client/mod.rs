//! Instatus API client implementation.

mod request;

pub use request::{FileUpload, RequestOptions, APPLICATION_JSON};

use crate::config::{InstatusConfig, InstatusConfigBuilder, RateLimitConfig, RetryConfig};
use crate::errors::{InstatusError, InstatusErrorKind, InstatusResult};
use crate::observability::{DispatchMetrics, MetricsSnapshot, TracingHooks};
use crate::resilience::{
    bucket_exhausted, is_transient_io, reset_delay, BucketGuard, RateLimited, RateLimiter,
    RetryPolicy, X_RATELIMIT_PRECISION,
};
use crate::route::Route;
use crate::serialization::{json_or_text, ResponseBody};
use crate::services::*;
use bytes::Bytes;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Proxy, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};

struct ClientInner {
    config: InstatusConfig,
    /// Connection pool. `None` once closed.
    http: RwLock<Option<Client>>,
    rate_limiter: RateLimiter,
    retry: RetryPolicy,
    metrics: DispatchMetrics,
    /// `true` once the client is closed.
    shutdown: watch::Sender<bool>,
    /// Dispatches currently running.
    in_flight: watch::Sender<usize>,
}

/// Instatus API client.
///
/// Cloning is cheap; clones share the connection pool and rate-limit state.
#[derive(Clone)]
pub struct InstatusClient {
    inner: Arc<ClientInner>,
}

impl InstatusClient {
    /// Creates a new Instatus client.
    pub fn new(config: InstatusConfig) -> InstatusResult<Self> {
        config.validate()?;

        let http = build_http(&config)?;
        let retry = RetryPolicy::new(&config.retry);
        let (shutdown, _) = watch::channel(false);
        let (in_flight, _) = watch::channel(0usize);

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                http: RwLock::new(Some(http)),
                rate_limiter: RateLimiter::new(),
                retry,
                metrics: DispatchMetrics::new(),
                shutdown,
                in_flight,
            }),
        })
    }

    /// Creates a new client builder.
    pub fn builder() -> InstatusClientBuilder {
        InstatusClientBuilder::new()
    }

    /// Creates a client from environment variables.
    pub fn from_env() -> InstatusResult<Self> {
        Self::new(InstatusConfig::from_env()?)
    }

    /// Gets the base URL.
    pub fn base_url(&self) -> &str {
        &self.inner.config.base_url
    }

    /// Gets the configuration.
    pub fn config(&self) -> &InstatusConfig {
        &self.inner.config
    }

    /// Gets the rate limit tracker.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.inner.rate_limiter
    }

    /// Gets a snapshot of the dispatch counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    // Service accessors

    /// Gets the public summary service.
    pub fn summary(&self) -> SummaryService {
        SummaryService::new(self)
    }

    /// Gets the status pages service.
    pub fn pages(&self) -> PagesService {
        PagesService::new(self)
    }

    /// Gets the components service.
    pub fn components(&self) -> ComponentsService {
        ComponentsService::new(self)
    }

    /// Gets the incidents service.
    pub fn incidents(&self) -> IncidentsService {
        IncidentsService::new(self)
    }

    /// Gets the incident updates service.
    pub fn incident_updates(&self) -> IncidentUpdatesService {
        IncidentUpdatesService::new(self)
    }

    /// Gets the maintenances service.
    pub fn maintenances(&self) -> MaintenancesService {
        MaintenancesService::new(self)
    }

    /// Gets the maintenance updates service.
    pub fn maintenance_updates(&self) -> MaintenanceUpdatesService {
        MaintenanceUpdatesService::new(self)
    }

    /// Gets the team service.
    pub fn team(&self) -> TeamService {
        TeamService::new(self)
    }

    /// Gets the subscribers service.
    pub fn subscribers(&self) -> SubscribersService {
        SubscribersService::new(self)
    }

    /// Gets the metrics service.
    pub fn status_metrics(&self) -> MetricsService {
        MetricsService::new(self)
    }

    /// Gets the user profile service.
    pub fn user(&self) -> UserService {
        UserService::new(self)
    }

    // HTTP methods

    /// Makes a GET request.
    pub async fn get<T: DeserializeOwned>(&self, route: Route) -> InstatusResult<T> {
        self.request(route, RequestOptions::new())
            .await?
            .deserialize()
    }

    /// Makes a POST request with a JSON body.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        route: Route,
        body: &B,
    ) -> InstatusResult<T> {
        self.request(route, RequestOptions::json(body)?)
            .await?
            .deserialize()
    }

    /// Makes a PUT request with a JSON body.
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        route: Route,
        body: &B,
    ) -> InstatusResult<T> {
        self.request(route, RequestOptions::json(body)?)
            .await?
            .deserialize()
    }

    /// Makes a PATCH request with a JSON body.
    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        route: Route,
        body: &B,
    ) -> InstatusResult<T> {
        self.request(route, RequestOptions::json(body)?)
            .await?
            .deserialize()
    }

    /// Makes a DELETE request, discarding the response body.
    pub async fn delete(&self, route: Route) -> InstatusResult<()> {
        self.request(route, RequestOptions::new()).await?;
        Ok(())
    }

    /// Dispatches one logical request.
    ///
    /// Requests sharing a bucket run one at a time. Rate limits, 500/502
    /// responses and reset connections are retried up to the configured
    /// attempt budget; every other failure is returned as a typed error.
    /// Closing the client cancels the dispatch with a `Closed` error.
    pub async fn request(
        &self,
        route: Route,
        options: RequestOptions,
    ) -> InstatusResult<ResponseBody> {
        self.inner.metrics.record_request();
        let start = Instant::now();

        let result = self.cancellable(self.dispatch(&route, &options)).await;

        match &result {
            Ok(_) => self.inner.metrics.record_success(start.elapsed()),
            Err(e) => {
                self.inner.metrics.record_failure(start.elapsed());
                TracingHooks::on_request_error(route.method().as_str(), route.path(), &e.to_string());
            }
        }

        result
    }

    /// Downloads an arbitrary URL, bypassing buckets and retries.
    pub async fn get_from_cdn(&self, url: &str) -> InstatusResult<Bytes> {
        self.cancellable(self.fetch_asset(url)).await
    }

    // Lifecycle

    /// Returns true once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        *self.inner.shutdown.borrow()
    }

    /// Cancels in-flight dispatches, waits for them to unwind, then drops
    /// the connection pool. Later requests fail with `Closed`.
    pub async fn close(&self) {
        if self.inner.shutdown.send_replace(true) {
            return;
        }

        let mut in_flight = self.inner.in_flight.subscribe();
        let _ = in_flight.wait_for(|count| *count == 0).await;

        // A recreate during the wait keeps its fresh pool.
        let mut http = self.inner.http.write();
        if *self.inner.shutdown.borrow() {
            http.take();
            info!("Instatus client closed");
        }
    }

    /// Reopens a closed client with a fresh connection pool.
    pub fn recreate(&self) -> InstatusResult<()> {
        let mut http = self.inner.http.write();
        if !self.is_closed() {
            return Ok(());
        }

        *http = Some(build_http(&self.inner.config)?);
        self.inner.shutdown.send_replace(false);
        info!("Instatus client recreated");
        Ok(())
    }

    // Internal methods

    /// Runs `operation` unless the client is closed, abandoning it if the
    /// client closes first.
    async fn cancellable<T>(
        &self,
        operation: impl Future<Output = InstatusResult<T>>,
    ) -> InstatusResult<T> {
        let _in_flight = self.enter()?;
        let mut shutdown = self.inner.shutdown.subscribe();

        tokio::select! {
            result = operation => result,
            _ = shutdown.wait_for(|closed| *closed) => Err(InstatusError::closed()),
        }
    }

    fn enter(&self) -> InstatusResult<InFlight<'_>> {
        self.inner.in_flight.send_modify(|count| *count += 1);
        let guard = InFlight {
            counter: &self.inner.in_flight,
        };
        if self.is_closed() {
            return Err(InstatusError::closed());
        }
        Ok(guard)
    }

    fn http(&self) -> InstatusResult<Client> {
        self.inner.http.read().clone().ok_or_else(InstatusError::closed)
    }

    fn build_headers(&self, options: &RequestOptions) -> InstatusResult<HeaderMap> {
        let config = &self.inner.config;
        let mut headers = HeaderMap::new();

        headers.insert(USER_AGENT, header_value("User-Agent", &config.user_agent)?);
        headers.insert(X_RATELIMIT_PRECISION, HeaderValue::from_static("millisecond"));

        if let Some(ref key) = config.api_key {
            let mut value =
                header_value("Authorization", &format!("Bearer {}", key.expose_secret()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        // The multipart encoder supplies its own boundary-bearing content type.
        if !options.is_multipart() {
            headers.insert(
                CONTENT_TYPE,
                header_value("Content-Type", options.content_type_or_default())?,
            );
        }

        Ok(headers)
    }

    async fn dispatch(
        &self,
        route: &Route,
        options: &RequestOptions,
    ) -> InstatusResult<ResponseBody> {
        let inner = &*self.inner;
        let rate_limit: &RateLimitConfig = &inner.config.rate_limit;

        let url = route.url(&inner.config.base_url)?;
        let bucket = route.bucket();
        let method = route.method().as_str();
        let headers = self.build_headers(options)?;

        let mut guard = inner.rate_limiter.acquire(bucket).await;
        // Time may have passed waiting for the bucket.
        inner.rate_limiter.wait_global().await;

        let mut last: Option<(StatusCode, ResponseBody)> = None;

        for attempt in 0..inner.retry.max_attempts() {
            if attempt > 0 {
                inner.metrics.record_retry();
            }
            TracingHooks::on_request_start(method, &url, bucket, attempt);
            TracingHooks::on_request_headers(&headers);

            let mut request = self
                .http()?
                .request(route.method().clone(), &url)
                .headers(headers.clone());
            if options.is_multipart() {
                request = request.multipart(options.multipart()?);
            } else if let Some(body) = options.body() {
                request = request.body(body.clone());
            }

            let sent_at = Instant::now();
            let response = match request.send().await {
                Ok(response) => response,
                Err(e) if inner.retry.has_next(attempt) && is_transient_io(&e) => {
                    TracingHooks::on_retry(
                        method,
                        &url,
                        attempt + 1,
                        Duration::ZERO,
                        "connection reset",
                    );
                    continue;
                }
                Err(e) => return Err(InstatusError::from_transport(e)),
            };

            let status = response.status();
            let response_headers = response.headers().clone();
            let text = match response.text().await {
                Ok(text) => text,
                Err(e) if inner.retry.has_next(attempt) && is_transient_io(&e) => {
                    TracingHooks::on_retry(
                        method,
                        &url,
                        attempt + 1,
                        Duration::ZERO,
                        "connection reset",
                    );
                    continue;
                }
                Err(e) => return Err(InstatusError::from_transport(e)),
            };
            let data = json_or_text(&response_headers, text);
            TracingHooks::on_request_complete(method, &url, status.as_u16(), sent_at.elapsed());

            if status != StatusCode::TOO_MANY_REQUESTS && bucket_exhausted(&response_headers) {
                self.hold_bucket(&mut guard, &response_headers);
            }

            if status.is_success() {
                return Ok(data);
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                inner.metrics.record_rate_limited();

                let marked = response_headers
                    .get(rate_limit.proxy_marker_header.as_str())
                    .is_some_and(|v| !v.is_empty());
                if !marked {
                    TracingHooks::on_unexpected_rate_limit(&url);
                    return Err(InstatusError::from_body(
                        InstatusErrorKind::HttpException,
                        status,
                        &data,
                    ));
                }

                let signal = RateLimited::from_response(&response_headers, &data);
                let retry_after = signal
                    .retry_after
                    .map(|seconds| server_delay(seconds, rate_limit.default_retry_after))
                    .unwrap_or(rate_limit.default_retry_after);
                TracingHooks::on_rate_limited(bucket, retry_after, signal.global);

                if signal.global {
                    inner.metrics.record_global_pause();
                    let _pause = inner.rate_limiter.pause_global();
                    tokio::time::sleep(retry_after).await;
                    debug!("Global rate limit is now over");
                } else {
                    tokio::time::sleep(retry_after).await;
                }

                last = Some((status, data));
                continue;
            }

            if RetryPolicy::is_retryable_status(status) {
                if inner.retry.has_next(attempt) {
                    let delay = inner.retry.server_error_backoff(attempt);
                    TracingHooks::on_retry(method, &url, attempt + 1, delay, status.as_str());
                    tokio::time::sleep(delay).await;
                }
                last = Some((status, data));
                continue;
            }

            return Err(InstatusError::from_response(status, &data));
        }

        Err(match last {
            Some((status, data)) if status.is_server_error() => {
                InstatusError::from_body(InstatusErrorKind::ServerError, status, &data)
            }
            Some((status, data)) => {
                InstatusError::from_body(InstatusErrorKind::HttpException, status, &data)
            }
            None => InstatusError::new(
                InstatusErrorKind::ConnectionFailed,
                format!("{} {} failed after {} attempts", method, url, inner.retry.max_attempts()),
            ),
        })
    }

    async fn fetch_asset(&self, url: &str) -> InstatusResult<Bytes> {
        let response = self
            .http()?
            .get(url)
            .header(USER_AGENT, &self.inner.config.user_agent)
            .send()
            .await
            .map_err(InstatusError::from_transport)?;

        let status = response.status();
        let (kind, message) = match status {
            StatusCode::OK => {
                return response.bytes().await.map_err(InstatusError::from_transport);
            }
            StatusCode::NOT_FOUND => (InstatusErrorKind::NotFound, "asset not found"),
            StatusCode::FORBIDDEN => (InstatusErrorKind::Forbidden, "cannot retrieve asset"),
            _ => (InstatusErrorKind::HttpException, "failed to get asset"),
        };

        Err(InstatusError::from_body(
            kind,
            status,
            &ResponseBody::Text(message.to_string()),
        ))
    }

    fn hold_bucket(&self, guard: &mut BucketGuard, headers: &HeaderMap) {
        let rate_limit = &self.inner.config.rate_limit;
        match reset_delay(headers, rate_limit.use_clock) {
            Some(seconds) => {
                let delay = server_delay(seconds, rate_limit.default_retry_after);
                TracingHooks::on_bucket_exhausted(guard.bucket(), delay);
                guard.defer(delay);
                self.inner.metrics.record_deferred_release();
            }
            None => {
                warn!(
                    bucket = %guard.bucket(),
                    "Bucket exhausted without reset headers, releasing immediately"
                );
            }
        }
    }
}

impl std::fmt::Debug for InstatusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstatusClient")
            .field("base_url", &self.inner.config.base_url)
            .field("closed", &self.is_closed())
            .field("rate_limiter", &self.inner.rate_limiter)
            .finish()
    }
}

/// Counts a running dispatch until dropped.
struct InFlight<'a> {
    counter: &'a watch::Sender<usize>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.counter
            .send_modify(|count| *count = count.saturating_sub(1));
    }
}

/// Longest delay taken from a response before falling back to the default.
const MAX_SERVER_DELAY: Duration = Duration::from_secs(3600);

/// Converts a server-supplied delay, falling back to `fallback` when it is
/// out of range.
fn server_delay(seconds: f64, fallback: Duration) -> Duration {
    match Duration::try_from_secs_f64(seconds) {
        Ok(delay) if delay <= MAX_SERVER_DELAY => delay,
        _ => {
            warn!(seconds, "Server delay out of range, using the default");
            fallback
        }
    }
}

fn header_value(name: &str, value: &str) -> InstatusResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| {
        InstatusError::configuration(format!("Invalid {} header value: {}", name, e))
    })
}

fn build_http(config: &InstatusConfig) -> InstatusResult<Client> {
    let mut builder = Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .pool_max_idle_per_host(config.pool.max_idle_per_host)
        .pool_idle_timeout(config.pool.idle_timeout);

    if let Some(ref proxy) = config.proxy {
        let mut proxy_config = Proxy::all(&proxy.url).map_err(|e| {
            InstatusError::configuration(format!("Invalid proxy {}: {}", proxy.url, e))
        })?;
        if let Some((ref username, ref password)) = proxy.auth {
            proxy_config = proxy_config.basic_auth(username, password.expose_secret());
        }
        builder = builder.proxy(proxy_config);
    }

    builder.build().map_err(|e| {
        InstatusError::configuration(format!("Failed to create HTTP client: {}", e))
    })
}

/// Builder for InstatusClient.
pub struct InstatusClientBuilder {
    config_builder: InstatusConfigBuilder,
}

impl InstatusClientBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            config_builder: InstatusConfig::builder(),
        }
    }

    /// Sets the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.base_url(url);
        self
    }

    /// Sets the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.api_key(key);
        self
    }

    /// Sets the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config_builder = self.config_builder.timeout(timeout);
        self
    }

    /// Sets the User-Agent.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.user_agent(ua);
        self
    }

    /// Routes requests through an HTTP proxy.
    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.proxy(url);
        self
    }

    /// Sets the retry configuration.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.config_builder = self.config_builder.retry(config);
        self
    }

    /// Sets the rate limit configuration.
    pub fn rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.config_builder = self.config_builder.rate_limit(config);
        self
    }

    /// Trusts the local clock over `X-Ratelimit-Reset-After`.
    pub fn use_clock(mut self, use_clock: bool) -> Self {
        self.config_builder = self.config_builder.use_clock(use_clock);
        self
    }

    /// Builds the client.
    pub fn build(self) -> InstatusResult<InstatusClient> {
        let config = self.config_builder.build()?;
        InstatusClient::new(config)
    }
}

impl Default for InstatusClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = InstatusClient::builder()
            .api_key("key")
            .user_agent("test-client/1.0")
            .build()
            .unwrap();

        assert_eq!(client.base_url(), "https://api.instatus.com/");
        assert!(!client.is_closed());
    }

    #[test]
    fn test_default_headers() {
        let client = InstatusClient::builder().api_key("secret").build().unwrap();
        let headers = client.build_headers(&RequestOptions::new()).unwrap();

        assert_eq!(headers[AUTHORIZATION], "Bearer secret");
        assert!(headers[AUTHORIZATION].is_sensitive());
        assert_eq!(headers[CONTENT_TYPE], APPLICATION_JSON);
        assert_eq!(headers[X_RATELIMIT_PRECISION], "millisecond");
    }

    #[test]
    fn test_headers_without_key() {
        let client = InstatusClient::builder().build().unwrap();
        let headers = client
            .build_headers(&RequestOptions::raw("x", "text/plain"))
            .unwrap();

        assert!(!headers.contains_key(AUTHORIZATION));
        assert_eq!(headers[CONTENT_TYPE], "text/plain");
    }

    #[test]
    fn test_multipart_leaves_content_type_to_encoder() {
        let client = InstatusClient::builder().build().unwrap();
        let headers = client
            .build_headers(&RequestOptions::new().field("a", "b"))
            .unwrap();
        assert!(!headers.contains_key(CONTENT_TYPE));
    }

    #[test]
    fn test_server_delay_bounds() {
        let fallback = Duration::from_secs(1);

        assert_eq!(server_delay(0.25, fallback), Duration::from_millis(250));
        assert_eq!(server_delay(1e30, fallback), fallback);
        assert_eq!(server_delay(1e300, fallback), fallback);
        assert_eq!(server_delay(7200.0, fallback), fallback);
        assert_eq!(server_delay(-1.0, fallback), fallback);
    }

    #[tokio::test]
    async fn test_close_and_recreate() {
        let client = InstatusClient::builder().build().unwrap();

        client.close().await;
        assert!(client.is_closed());
        let error = client.get_from_cdn("http://127.0.0.1:1/x").await.unwrap_err();
        assert_eq!(error.kind(), InstatusErrorKind::Closed);

        client.recreate().unwrap();
        assert!(!client.is_closed());
    }
}
