//! Rate-limit signals carried by API responses.

use crate::serialization::ResponseBody;
use chrono::Utc;
use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Requests left in the current bucket window.
pub const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";
/// Seconds until the bucket window resets.
pub const X_RATELIMIT_RESET_AFTER: &str = "x-ratelimit-reset-after";
/// Epoch seconds (UTC) at which the bucket window resets.
pub const X_RATELIMIT_RESET: &str = "x-ratelimit-reset";
/// Precision requested for the reset headers.
pub const X_RATELIMIT_PRECISION: &str = "x-ratelimit-precision";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim)
}

fn header_f64(headers: &HeaderMap, name: &str) -> Option<f64> {
    header_str(headers, name)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Returns true when the response reports no requests left in its bucket.
pub fn bucket_exhausted(headers: &HeaderMap) -> bool {
    header_str(headers, X_RATELIMIT_REMAINING) == Some("0")
}

/// Seconds to wait before the bucket may be used again.
///
/// `X-Ratelimit-Reset-After` is used as-is unless `use_clock` is set or the
/// header is missing, in which case the wait is `X-Ratelimit-Reset` minus the
/// current UTC time. Returns `None` when neither header is usable. The result
/// is never negative.
pub fn reset_delay(headers: &HeaderMap, use_clock: bool) -> Option<f64> {
    let reset_after = header_f64(headers, X_RATELIMIT_RESET_AFTER);

    let delay = match reset_after {
        Some(seconds) if !use_clock => seconds,
        _ => {
            let reset = header_f64(headers, X_RATELIMIT_RESET)?;
            let now = Utc::now().timestamp_micros() as f64 / 1_000_000.0;
            reset - now
        }
    };

    Some(delay.max(0.0))
}

/// Body of a 429 response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimited {
    /// Seconds to sleep before retrying, if the response said.
    pub retry_after: Option<f64>,
    /// Whether the limit applies to every bucket.
    pub global: bool,
}

impl RateLimited {
    /// Reads `{"retry_after": <ms>, "global": <bool>}`, falling back to the
    /// `Retry-After` header (seconds) when the body has no delay.
    pub fn from_response(headers: &HeaderMap, body: &ResponseBody) -> Self {
        let json = body.as_json();

        let from_body = json
            .and_then(|v| v.get("retry_after"))
            .and_then(|v| v.as_f64())
            .map(|ms| ms / 1000.0);
        let retry_after = from_body
            .or_else(|| header_f64(headers, RETRY_AFTER.as_str()))
            .map(|secs| secs.max(0.0));

        let global = json
            .and_then(|v| v.get("global"))
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        Self { retry_after, global }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use serde_json::json;

    fn headers(pairs: &[(&'static str, String)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_reset_after_used_directly() {
        let h = headers(&[(X_RATELIMIT_RESET_AFTER, "5".to_string())]);
        assert_eq!(reset_delay(&h, false), Some(5.0));
    }

    #[test]
    fn test_clock_mode_uses_reset_timestamp() {
        let reset = Utc::now().timestamp() as f64 + 10.0;
        let h = headers(&[
            (X_RATELIMIT_RESET_AFTER, "60".to_string()),
            (X_RATELIMIT_RESET, format!("{:.3}", reset)),
        ]);

        let delay = reset_delay(&h, true).unwrap();
        assert!(delay > 8.5 && delay <= 10.0, "delay was {}", delay);
    }

    #[test]
    fn test_missing_reset_after_falls_back_to_clock() {
        let reset = Utc::now().timestamp() as f64 + 3.0;
        let h = headers(&[(X_RATELIMIT_RESET, reset.to_string())]);

        let delay = reset_delay(&h, false).unwrap();
        assert!(delay > 1.5 && delay <= 3.0, "delay was {}", delay);
    }

    #[test]
    fn test_past_reset_is_zero() {
        let reset = Utc::now().timestamp() - 30;
        let h = headers(&[(X_RATELIMIT_RESET, reset.to_string())]);
        assert_eq!(reset_delay(&h, true), Some(0.0));
    }

    #[test]
    fn test_no_headers() {
        assert_eq!(reset_delay(&HeaderMap::new(), false), None);
        assert_eq!(reset_delay(&HeaderMap::new(), true), None);
    }

    #[test]
    fn test_bucket_exhausted() {
        assert!(bucket_exhausted(&headers(&[(X_RATELIMIT_REMAINING, "0".to_string())])));
        assert!(!bucket_exhausted(&headers(&[(X_RATELIMIT_REMAINING, "3".to_string())])));
        assert!(!bucket_exhausted(&HeaderMap::new()));
    }

    #[test]
    fn test_rate_limited_body() {
        let body = ResponseBody::Json(json!({ "retry_after": 2000, "global": true }));
        let signal = RateLimited::from_response(&HeaderMap::new(), &body);

        assert_eq!(signal.retry_after, Some(2.0));
        assert!(signal.global);
    }

    #[test]
    fn test_rate_limited_header_fallback() {
        let h = headers(&[("retry-after", "3".to_string())]);
        let signal = RateLimited::from_response(&h, &ResponseBody::Text("slow down".into()));

        assert_eq!(signal.retry_after, Some(3.0));
        assert!(!signal.global);
    }
}
