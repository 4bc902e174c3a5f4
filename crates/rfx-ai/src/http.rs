//! HTTP plumbing shared by the provider adapters.

use std::error::Error as _;
use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use rfx_types::{GatewayError, Result, TransportErrorKind};
use serde_json::Value;

const DEFAULT_RETRY_AFTER_MS: u64 = 1000;

/// Send a prepared request and decode the JSON body of a successful response.
pub(crate) async fn send_json(provider: &str, request: reqwest::RequestBuilder) -> Result<Value> {
    let resp = request
        .send()
        .await
        .map_err(|e| map_transport_error(provider, e))?;

    let status = resp.status();
    let retry_after = retry_after_hint(resp.headers());
    let body = resp
        .text()
        .await
        .map_err(|e| map_transport_error(provider, e))?;

    if !status.is_success() {
        tracing::warn!(provider, status = status.as_u16(), "Provider returned error status");
        return Err(map_status_error(provider, status, retry_after, &body));
    }

    serde_json::from_str(&body).map_err(|e| GatewayError::InvalidResponseFormat {
        provider: provider.to_string(),
        message: format!("Failed to parse response JSON: {e}"),
    })
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

pub(crate) fn map_status_error(
    provider: &str,
    status: StatusCode,
    retry_after: Option<Duration>,
    body: &str,
) -> GatewayError {
    let provider = provider.to_string();
    match status.as_u16() {
        429 => {
            let retry_after_ms = retry_after
                .map(|d| d.as_millis() as u64)
                .or_else(|| {
                    serde_json::from_str::<Value>(body)
                        .ok()
                        .and_then(|v| v["error"]["retry_after"].as_f64())
                        .map(|s| (s * 1000.0) as u64)
                })
                .unwrap_or(DEFAULT_RETRY_AFTER_MS);
            GatewayError::RateLimited {
                provider,
                retry_after_ms,
            }
        }
        503 => GatewayError::ServiceOverloaded {
            provider,
            status: 503,
        },
        401 | 403 => GatewayError::AuthError { provider },
        code => GatewayError::ProviderError {
            provider,
            status: code,
            message: extract_error_message(body),
        },
    }
}

/// The request URL is dropped from the message; it may carry credentials.
pub(crate) fn map_transport_error(provider: &str, err: reqwest::Error) -> GatewayError {
    GatewayError::Transport {
        provider: provider.to_string(),
        kind: classify_transport(&err),
        message: err.without_url().to_string(),
    }
}

fn classify_transport(err: &reqwest::Error) -> TransportErrorKind {
    let mut source = err.source();
    while let Some(inner) = source {
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            match io.kind() {
                std::io::ErrorKind::ConnectionRefused => return TransportErrorKind::ConnectionRefused,
                std::io::ErrorKind::TimedOut => return TransportErrorKind::ConnectTimeout,
                _ => {}
            }
        }
        let text = inner.to_string().to_ascii_lowercase();
        if text.contains("dns error") || text.contains("failed to lookup address") {
            return TransportErrorKind::DnsNotFound;
        }
        source = inner.source();
    }

    if err.is_timeout() {
        TransportErrorKind::ConnectTimeout
    } else if err.is_connect() {
        TransportErrorKind::ConnectionRefused
    } else {
        TransportErrorKind::Other
    }
}

/// `Retry-After` in its delta-seconds form.
fn retry_after_hint(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// OpenAI and Gemini both nest the human-readable message under `error.message`.
pub(crate) fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn rate_limit_prefers_header_hint() {
        let err = map_status_error(
            "openai",
            StatusCode::TOO_MANY_REQUESTS,
            Some(Duration::from_secs(7)),
            r#"{"error":{"retry_after":2.5}}"#,
        );
        match err {
            GatewayError::RateLimited { retry_after_ms, .. } => assert_eq!(retry_after_ms, 7000),
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn rate_limit_falls_back_to_body_then_default() {
        let err = map_status_error(
            "openai",
            StatusCode::TOO_MANY_REQUESTS,
            None,
            r#"{"error":{"retry_after":2.5}}"#,
        );
        assert!(matches!(err, GatewayError::RateLimited { retry_after_ms: 2500, .. }));

        let err = map_status_error("gemini", StatusCode::TOO_MANY_REQUESTS, None, "slow down");
        assert!(matches!(err, GatewayError::RateLimited { retry_after_ms: 1000, .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn overloaded_and_auth_statuses() {
        let err = map_status_error("gemini", StatusCode::SERVICE_UNAVAILABLE, None, "");
        assert!(matches!(err, GatewayError::ServiceOverloaded { status: 503, .. }));
        assert!(err.is_retryable());

        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let err = map_status_error("openai", status, None, "");
            assert!(matches!(err, GatewayError::AuthError { .. }));
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn other_statuses_keep_provider_message() {
        let err = map_status_error(
            "openai",
            StatusCode::BAD_REQUEST,
            None,
            r#"{"error":{"message":"Invalid model"}}"#,
        );
        match err {
            GatewayError::ProviderError {
                status, message, ..
            } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid model");
            }
            other => panic!("expected ProviderError, got {other:?}"),
        }

        let err = map_status_error("openai", StatusCode::INTERNAL_SERVER_ERROR, None, "boom");
        assert!(!err.is_retryable());
    }

    #[test]
    fn retry_after_header_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after_hint(&headers), None);
        headers.insert(RETRY_AFTER, HeaderValue::from_static("12"));
        assert_eq!(retry_after_hint(&headers), Some(Duration::from_secs(12)));
        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(retry_after_hint(&headers), None);
    }

    #[tokio::test]
    async fn refused_connection_is_transient() {
        // Bind then drop a listener so the port is very likely closed.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = reqwest::Client::new();
        let err = send_json(
            "openai",
            client.post(format!("http://127.0.0.1:{port}/v1?token=hidden")),
        )
        .await
        .unwrap_err();
        match &err {
            GatewayError::Transport { kind, message, .. } => {
                assert!(kind.is_transient());
                assert!(!message.contains("127.0.0.1"));
                assert!(!message.contains("hidden"));
            }
            other => panic!("expected Transport, got {other:?}"),
        }
        assert!(err.is_retryable());
    }
}
