//! Configuration types for the Instatus client.

use crate::errors::{InstatusError, InstatusResult};
use secrecy::SecretString;
use std::time::Duration;
use url::Url;

/// Default Instatus API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.instatus.com/";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default User-Agent header.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "APIWrapper (https://github.com/integrations/instatus ",
    env!("CARGO_PKG_VERSION"),
    ") reqwest"
);

/// Header whose presence marks a 429 as a genuine API rate limit.
pub const DEFAULT_PROXY_MARKER_HEADER: &str = "via";

/// Default timeout for the blocking runner.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(30);

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts per logical request, including the first.
    pub max_attempts: u32,
    /// Sleep before the first retry of a 500/502.
    pub server_error_backoff: Duration,
    /// Added to the sleep for every further attempt.
    pub server_error_backoff_step: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            server_error_backoff: Duration::from_secs(1),
            server_error_backoff_step: Duration::from_secs(2),
        }
    }
}

/// Rate limit configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Compute bucket resets from `X-Ratelimit-Reset` and the local clock
    /// instead of trusting `X-Ratelimit-Reset-After`.
    pub use_clock: bool,
    /// Header that must be present on a 429 for it to be retried.
    pub proxy_marker_header: String,
    /// Sleep used for a marked 429 whose body and headers carry no delay.
    pub default_retry_after: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            use_clock: false,
            proxy_marker_header: DEFAULT_PROXY_MARKER_HEADER.to_string(),
            default_retry_after: Duration::from_secs(1),
        }
    }
}

/// Connection pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum idle connections per host.
    pub max_idle_per_host: usize,
    /// Idle connection timeout.
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 20,
            idle_timeout: Duration::from_secs(90),
        }
    }
}

/// Blocking runner configuration.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Default bound on a blocking run. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Return `Ok(None)` instead of a timeout error when the bound is hit.
    pub ignore_timeouts: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_RUN_TIMEOUT),
            ignore_timeouts: true,
        }
    }
}

/// Proxy settings.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Proxy URL.
    pub url: String,
    /// Basic auth user name and password.
    pub auth: Option<(String, SecretString)>,
}

/// Instatus client configuration.
#[derive(Debug, Clone)]
pub struct InstatusConfig {
    /// API base URL.
    pub base_url: String,
    /// API key sent as a bearer token.
    pub api_key: Option<SecretString>,
    /// Request timeout.
    pub timeout: Duration,
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// User-Agent header.
    pub user_agent: String,
    /// Optional HTTP proxy.
    pub proxy: Option<ProxyConfig>,
    /// Retry configuration.
    pub retry: RetryConfig,
    /// Rate limit configuration.
    pub rate_limit: RateLimitConfig,
    /// Connection pool configuration.
    pub pool: PoolConfig,
    /// Blocking runner configuration.
    pub run: RunConfig,
}

impl Default for InstatusConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
            retry: RetryConfig::default(),
            rate_limit: RateLimitConfig::default(),
            pool: PoolConfig::default(),
            run: RunConfig::default(),
        }
    }
}

impl InstatusConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> InstatusConfigBuilder {
        InstatusConfigBuilder::new()
    }

    /// Creates a configuration from environment variables.
    ///
    /// Reads:
    /// - `INSTATUS_API_KEY` - API key
    /// - `INSTATUS_BASE_URL` - API base URL
    /// - `INSTATUS_TIMEOUT` - request timeout in seconds
    /// - `INSTATUS_PROXY` - HTTP proxy URL
    pub fn from_env() -> InstatusResult<Self> {
        let mut builder = InstatusConfigBuilder::new();

        if let Ok(key) = std::env::var("INSTATUS_API_KEY") {
            builder = builder.api_key(key);
        }

        if let Ok(url) = std::env::var("INSTATUS_BASE_URL") {
            builder = builder.base_url(url);
        }

        if let Ok(timeout) = std::env::var("INSTATUS_TIMEOUT") {
            let secs = timeout.parse::<u64>().map_err(|_| {
                InstatusError::configuration(format!(
                    "INSTATUS_TIMEOUT must be a whole number of seconds, got {}",
                    timeout
                ))
            })?;
            builder = builder.timeout(Duration::from_secs(secs));
        }

        if let Ok(proxy) = std::env::var("INSTATUS_PROXY") {
            builder = builder.proxy(proxy);
        }

        builder.build()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> InstatusResult<()> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            InstatusError::configuration(format!("Invalid base URL {}: {}", self.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(InstatusError::configuration(
                "Base URL must start with http:// or https://",
            ));
        }

        if self.user_agent.is_empty() {
            return Err(InstatusError::configuration("User-Agent cannot be empty"));
        }

        if self.retry.max_attempts == 0 {
            return Err(InstatusError::configuration(
                "retry.max_attempts must be at least 1",
            ));
        }

        if self.rate_limit.proxy_marker_header.is_empty() {
            return Err(InstatusError::configuration(
                "rate_limit.proxy_marker_header cannot be empty",
            ));
        }

        if let Some(ref proxy) = self.proxy {
            Url::parse(&proxy.url).map_err(|e| {
                InstatusError::configuration(format!("Invalid proxy URL {}: {}", proxy.url, e))
            })?;
        }

        Ok(())
    }
}

/// Builder for InstatusConfig.
#[derive(Debug, Default)]
pub struct InstatusConfigBuilder {
    base_url: Option<String>,
    api_key: Option<SecretString>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
    proxy: Option<ProxyConfig>,
    retry: Option<RetryConfig>,
    rate_limit: Option<RateLimitConfig>,
    pool: Option<PoolConfig>,
    run: Option<RunConfig>,
}

impl InstatusConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(key.into()));
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the User-Agent header.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Routes requests through an HTTP proxy.
    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.proxy = Some(ProxyConfig {
            url: url.into(),
            auth: None,
        });
        self
    }

    /// Routes requests through an HTTP proxy with basic auth.
    pub fn proxy_with_auth(
        mut self,
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.proxy = Some(ProxyConfig {
            url: url.into(),
            auth: Some((username.into(), SecretString::new(password.into()))),
        });
        self
    }

    /// Sets the retry configuration.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = Some(config);
        self
    }

    /// Sets the rate limit configuration.
    pub fn rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = Some(config);
        self
    }

    /// Trusts the local clock over `X-Ratelimit-Reset-After`.
    pub fn use_clock(mut self, use_clock: bool) -> Self {
        let mut config = self.rate_limit.take().unwrap_or_default();
        config.use_clock = use_clock;
        self.rate_limit = Some(config);
        self
    }

    /// Sets the connection pool configuration.
    pub fn pool(mut self, config: PoolConfig) -> Self {
        self.pool = Some(config);
        self
    }

    /// Sets the blocking runner configuration.
    pub fn run(mut self, config: RunConfig) -> Self {
        self.run = Some(config);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> InstatusResult<InstatusConfig> {
        let config = InstatusConfig {
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: self.api_key,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            connect_timeout: self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            user_agent: self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            proxy: self.proxy,
            retry: self.retry.unwrap_or_default(),
            rate_limit: self.rate_limit.unwrap_or_default(),
            pool: self.pool.unwrap_or_default(),
            run: self.run.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::InstatusErrorKind;

    #[test]
    fn test_default_config() {
        let config = InstatusConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.api_key.is_none());
        assert_eq!(config.retry.max_attempts, 5);
        assert!(!config.rate_limit.use_clock);
        assert_eq!(config.rate_limit.proxy_marker_header, "via");
        assert!(config.run.ignore_timeouts);
    }

    #[test]
    fn test_config_builder() {
        let config = InstatusConfig::builder()
            .base_url("http://127.0.0.1:9000")
            .api_key("secret")
            .user_agent("test-client/1.0")
            .timeout(Duration::from_secs(60))
            .use_clock(true)
            .build()
            .unwrap();

        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.user_agent, "test-client/1.0");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.rate_limit.use_clock);
        assert!(config.api_key.is_some());
    }

    #[test]
    fn test_invalid_base_url() {
        let result = InstatusConfig::builder().base_url("invalid-url").build();
        assert_eq!(
            result.unwrap_err().kind(),
            InstatusErrorKind::InvalidConfiguration
        );

        let result = InstatusConfig::builder().base_url("ftp://example.com").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let result = InstatusConfig::builder()
            .retry(RetryConfig {
                max_attempts: 0,
                ..Default::default()
            })
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_proxy() {
        let result = InstatusConfig::builder().proxy("not a url").build();
        assert!(result.is_err());
    }
}
