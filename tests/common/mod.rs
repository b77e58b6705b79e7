//! Shared helpers for the integration tests.

#![allow(dead_code)]

use integrations_instatus::config::{RateLimitConfig, RetryConfig};
use integrations_instatus::InstatusClient;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

pub const API_KEY: &str = "test-api-key";

/// Helper to start a mock server
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Client pointed at `server` with millisecond server error backoff.
pub fn client_for(server: &MockServer) -> InstatusClient {
    InstatusClient::builder()
        .base_url(server.uri())
        .api_key(API_KEY)
        .retry(RetryConfig {
            max_attempts: 5,
            server_error_backoff: Duration::from_millis(10),
            server_error_backoff_step: Duration::from_millis(10),
        })
        .build()
        .expect("client should build")
}

/// Client pointed at `base_url` with the given fallback rate-limit delay.
pub fn client_with_default_retry_after(
    base_url: &str,
    default_retry_after: Duration,
) -> InstatusClient {
    InstatusClient::builder()
        .base_url(base_url)
        .api_key(API_KEY)
        .retry(RetryConfig {
            max_attempts: 5,
            server_error_backoff: Duration::from_millis(10),
            server_error_backoff_step: Duration::from_millis(10),
        })
        .rate_limit(RateLimitConfig {
            default_retry_after,
            ..RateLimitConfig::default()
        })
        .build()
        .expect("client should build")
}

/// Helper to create an authenticated mock
pub fn mock_with_auth(method_matcher: &str, path_matcher: &str) -> MockBuilder {
    Mock::given(method(method_matcher))
        .and(path(path_matcher))
        .and(header("authorization", format!("Bearer {}", API_KEY).as_str()))
}

/// Helper to create success response templates
pub fn success_response(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

/// Helper to create error response templates
pub fn error_response(status: u16, code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(serde_json::json!({
        "error": { "code": code, "message": message }
    }))
}

/// A 429 as sent by the API proxy.
pub fn rate_limited(retry_after_ms: u64, global: bool) -> ResponseTemplate {
    ResponseTemplate::new(429)
        .insert_header("via", "1.1 google")
        .set_body_json(serde_json::json!({
            "retry_after": retry_after_ms,
            "global": global
        }))
}
