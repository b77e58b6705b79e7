//! Resilience patterns for the Instatus client.
//!
//! Provides:
//! - Per-bucket request serialization with deferred release
//! - A global pause gate driven by global rate limits
//! - Retry policy for server errors and dropped connections
//! - Parsing of the rate-limit headers and 429 bodies

mod rate_limiter;
mod retry;
mod headers;

pub use rate_limiter::{BucketGuard, GlobalPause, RateLimiter};
pub use retry::{is_transient_io, RetryPolicy};
pub use headers::{
    bucket_exhausted, reset_delay, RateLimited, X_RATELIMIT_PRECISION, X_RATELIMIT_REMAINING,
    X_RATELIMIT_RESET, X_RATELIMIT_RESET_AFTER,
};
