//! Authenticated Google API HTTP client
//!
//! Injects the OAuth bearer token, enforces per-request timeouts, maps
//! Google's REST error conventions onto the error taxonomy, retries
//! rate-limited requests with exponential backoff (at most 3 attempts),
//! and bounds in-flight concurrency with a semaphore shared across all
//! clients built from the same service.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Retry budget for rate-limited requests.
const MAX_ATTEMPTS: u32 = 3;
/// Base delay for exponential backoff.
const BACKOFF_BASE_MS: u64 = 500;

/// Per-request timeout classes.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Metadata calls: search, list, files.get.
    pub metadata: Duration,
    /// Native content fetches, which can be much larger.
    pub content: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            metadata: Duration::from_secs(3),
            content: Duration::from_secs(15),
        }
    }
}

pub struct GoogleClient {
    http: reqwest::Client,
    access_token: String,
    limiter: Arc<Semaphore>,
    timeouts: Timeouts,
}

impl GoogleClient {
    /// `http` is the service's shared pool; cloning a `reqwest::Client`
    /// reuses its connections.
    pub fn new(
        http: reqwest::Client,
        access_token: String,
        limiter: Arc<Semaphore>,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            http,
            access_token,
            limiter,
            timeouts,
        }
    }

    /// GET with the metadata timeout.
    pub async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
        self.get_with_timeout(url, query, self.timeouts.metadata)
            .await
    }

    /// GET with the content timeout.
    pub async fn get_content(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
        self.get_with_timeout(url, query, self.timeouts.content)
            .await
    }

    async fn get_with_timeout(
        &self,
        url: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<Value> {
        let mut attempt = 0;
        loop {
            match self.execute_once(url, query, timeout).await {
                Err(e) if e.is_retryable() && attempt + 1 < MAX_ATTEMPTS => {
                    let delay = backoff_delay(attempt);
                    warn!(
                        attempt = attempt + 1,
                        "Rate limited by Google API, backing off {:?}", delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn execute_once(
        &self,
        url: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<Value> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| Error::Internal("request limiter closed".to_string()))?;

        debug!(url, "Executing Google API request");

        let response = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(&self.access_token)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(format!("no response within {:?}", timeout))
                } else {
                    Error::Internal(format!("HTTP request failed: {}", e))
                }
            })?;

        let status = response.status();
        debug!(%status, "Response received");

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(format!("response body not read within {:?}", timeout))
            } else {
                Error::Internal(format!("failed to read response body: {}", e))
            }
        })?;

        if status.is_success() && body.is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }

        let parsed: Value = serde_json::from_str(&body)
            .map_err(|e| Error::Internal(format!("failed to parse JSON response: {}", e)))?;

        if !status.is_success() {
            return Err(classify_error(status, &parsed));
        }

        Ok(parsed)
    }
}

/// Map an HTTP error status plus Google's error envelope onto the taxonomy.
///
/// Google reports quota exhaustion both as 429 and as 403 with a
/// rate-limit reason, so 403 needs the reason to disambiguate.
fn classify_error(status: StatusCode, response: &Value) -> Error {
    let message = extract_error_message(response, status);

    match status {
        StatusCode::UNAUTHORIZED => Error::AuthExpired(message),
        StatusCode::NOT_FOUND => Error::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited(message),
        StatusCode::FORBIDDEN => {
            if is_rate_limit_reason(response) {
                Error::RateLimited(message)
            } else {
                Error::PermissionDenied(message)
            }
        }
        _ => Error::Internal(message),
    }
}

/// Check the error reasons Google uses for quota exhaustion on 403s.
fn is_rate_limit_reason(response: &Value) -> bool {
    response
        .pointer("/error/errors")
        .and_then(|v| v.as_array())
        .map(|errors| {
            errors.iter().any(|e| {
                matches!(
                    e.get("reason").and_then(|r| r.as_str()),
                    Some("rateLimitExceeded")
                        | Some("userRateLimitExceeded")
                        | Some("quotaExceeded")
                )
            })
        })
        .unwrap_or(false)
        || response.pointer("/error/status").and_then(|v| v.as_str())
            == Some("RESOURCE_EXHAUSTED")
}

/// Extract the message from Google's `{"error": {"code", "message"}}` envelope.
fn extract_error_message(response: &Value, status: StatusCode) -> String {
    if let Some(error_obj) = response.get("error") {
        if let Some(message) = error_obj.get("message").and_then(|v| v.as_str()) {
            let code = error_obj
                .get("code")
                .and_then(|v| v.as_i64())
                .unwrap_or(status.as_u16() as i64);
            return format!("Google API error {}: {}", code, message);
        }
    }
    format!("HTTP {} error", status)
}

/// Exponential backoff: 500ms, 1s, 2s, ...
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(BACKOFF_BASE_MS << attempt)
}
