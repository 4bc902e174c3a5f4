//! Shared error taxonomy for the RFx AI provider gateway.
//!
//! - `GatewayError`: every failure a provider call, the registry or the gateway can raise
//! - `TransportErrorKind`: classification of network-level failures
//! - `Result`: convenience alias used by every crate in the workspace

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TransportErrorKind
// ---------------------------------------------------------------------------

/// Network-level failure classes. All but `Other` are transient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorKind {
    ConnectionRefused,
    ConnectTimeout,
    DnsNotFound,
    Other,
}

impl TransportErrorKind {
    pub fn is_transient(self) -> bool {
        !matches!(self, TransportErrorKind::Other)
    }
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransportErrorKind::ConnectionRefused => "connection refused",
            TransportErrorKind::ConnectTimeout => "connection timed out",
            TransportErrorKind::DnsNotFound => "dns lookup failed",
            TransportErrorKind::Other => "transport error",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// GatewayError
// ---------------------------------------------------------------------------

/// Unified error type for the AI provider gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    // === Selection / configuration ===
    #[error("Provider {provider} is not configured (missing credentials)")]
    ProviderNotConfigured { provider: String },

    #[error("Provider {provider} is not registered")]
    ProviderNotFound { provider: String },

    #[error("Provider {provider} is not available")]
    ProviderUnavailable { provider: String },

    #[error("Configuration error: {0}")]
    Config(String),

    // === Transient provider failures ===
    #[error("Rate limited by {provider}, retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    #[error("Provider {provider} is overloaded (HTTP {status})")]
    ServiceOverloaded { provider: String, status: u16 },

    #[error("Transport error talking to {provider} ({kind}): {message}")]
    Transport {
        provider: String,
        kind: TransportErrorKind,
        message: String,
    },

    #[error("Invalid response format from {provider}: {message}")]
    InvalidResponseFormat { provider: String, message: String },

    // === Fatal provider failures ===
    #[error("Request to {provider} timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    #[error("Authentication failed for provider {provider}")]
    AuthError { provider: String },

    #[error("Provider {provider} returned HTTP {status}: {message}")]
    ProviderError {
        provider: String,
        status: u16,
        message: String,
    },

    // === Gateway ===
    #[error("All providers exhausted (tried: {}): {last_error}", .attempted.join(", "))]
    AllProvidersExhausted {
        attempted: Vec<String>,
        last_error: String,
    },

    #[error("Request cancelled")]
    Cancelled,

    // === Generic ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl GatewayError {
    /// Returns `true` if the error is transient and the same provider may succeed on retry.
    ///
    /// `Timeout` is excluded; the retry policy decides whether it is retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::RateLimited { .. }
            | GatewayError::ServiceOverloaded { .. }
            | GatewayError::InvalidResponseFormat { .. } => true,
            GatewayError::Transport { kind, .. } => kind.is_transient(),
            _ => false,
        }
    }

    /// Returns `true` for timeout errors.
    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::Timeout { .. })
    }

    /// Returns `true` if the failure is attributable to a provider, so another
    /// provider may be tried when the caller did not pin one.
    pub fn triggers_fallback(&self) -> bool {
        !matches!(self, GatewayError::Cancelled | GatewayError::Config(_))
    }

    /// The provider the error is attributed to, if any.
    pub fn provider(&self) -> Option<&str> {
        match self {
            GatewayError::ProviderNotConfigured { provider }
            | GatewayError::ProviderNotFound { provider }
            | GatewayError::ProviderUnavailable { provider }
            | GatewayError::RateLimited { provider, .. }
            | GatewayError::ServiceOverloaded { provider, .. }
            | GatewayError::Transport { provider, .. }
            | GatewayError::InvalidResponseFormat { provider, .. }
            | GatewayError::Timeout { provider, .. }
            | GatewayError::AuthError { provider }
            | GatewayError::ProviderError { provider, .. } => Some(provider),
            _ => None,
        }
    }

    /// Maps the error to an HTTP status code for a controller layer.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            GatewayError::RateLimited { .. } => Some(429),
            GatewayError::ServiceOverloaded { status, .. } => Some(*status),
            GatewayError::ProviderUnavailable { .. }
            | GatewayError::ProviderNotConfigured { .. }
            | GatewayError::AllProvidersExhausted { .. } => Some(503),
            GatewayError::ProviderNotFound { .. } => Some(404),
            GatewayError::Timeout { .. } => Some(504),
            GatewayError::Transport { .. } | GatewayError::InvalidResponseFormat { .. } => {
                Some(502)
            }
            GatewayError::AuthError { .. } => Some(401),
            GatewayError::ProviderError { status, .. } => Some(*status),
            GatewayError::Config(_) => Some(500),
            _ => None,
        }
    }
}

/// A convenience alias for `Result<T, GatewayError>`.
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_rate_limited() {
        let err = GatewayError::RateLimited {
            provider: "openai".into(),
            retry_after_ms: 3000,
        };
        assert_eq!(err.to_string(), "Rate limited by openai, retry after 3000ms");
    }

    #[test]
    fn error_display_exhausted_lists_providers() {
        let err = GatewayError::AllProvidersExhausted {
            attempted: vec!["openai".into(), "gemini".into()],
            last_error: "boom".into(),
        };
        assert_eq!(
            err.to_string(),
            "All providers exhausted (tried: openai, gemini): boom"
        );
    }

    #[test]
    fn error_display_transport() {
        let err = GatewayError::Transport {
            provider: "gemini".into(),
            kind: TransportErrorKind::DnsNotFound,
            message: "no such host".into(),
        };
        assert_eq!(
            err.to_string(),
            "Transport error talking to gemini (dns lookup failed): no such host"
        );
    }

    #[test]
    fn retryable_classification() {
        assert!(GatewayError::RateLimited {
            provider: "p".into(),
            retry_after_ms: 0
        }
        .is_retryable());
        assert!(GatewayError::ServiceOverloaded {
            provider: "p".into(),
            status: 503
        }
        .is_retryable());
        assert!(GatewayError::InvalidResponseFormat {
            provider: "p".into(),
            message: "MODE is missing".into()
        }
        .is_retryable());
        for kind in [
            TransportErrorKind::ConnectionRefused,
            TransportErrorKind::ConnectTimeout,
            TransportErrorKind::DnsNotFound,
        ] {
            assert!(GatewayError::Transport {
                provider: "p".into(),
                kind,
                message: String::new()
            }
            .is_retryable());
        }
    }

    #[test]
    fn fatal_classification() {
        assert!(!GatewayError::Transport {
            provider: "p".into(),
            kind: TransportErrorKind::Other,
            message: String::new()
        }
        .is_retryable());
        assert!(!GatewayError::AuthError { provider: "p".into() }.is_retryable());
        assert!(!GatewayError::ProviderNotConfigured { provider: "p".into() }.is_retryable());
        assert!(!GatewayError::ProviderError {
            provider: "p".into(),
            status: 500,
            message: String::new()
        }
        .is_retryable());

        let timeout = GatewayError::Timeout {
            provider: "p".into(),
            timeout_ms: 30_000,
        };
        assert!(!timeout.is_retryable());
        assert!(timeout.is_timeout());
    }

    #[test]
    fn fallback_eligibility() {
        assert!(GatewayError::ProviderUnavailable { provider: "p".into() }.triggers_fallback());
        assert!(GatewayError::AuthError { provider: "p".into() }.triggers_fallback());
        assert!(!GatewayError::Cancelled.triggers_fallback());
        assert!(!GatewayError::Config("bad".into()).triggers_fallback());
    }

    #[test]
    fn provider_attribution() {
        let err = GatewayError::Timeout {
            provider: "gemini".into(),
            timeout_ms: 1,
        };
        assert_eq!(err.provider(), Some("gemini"));
        assert_eq!(GatewayError::Cancelled.provider(), None);
    }

    #[test]
    fn http_status_mapping() {
        assert_eq!(
            GatewayError::RateLimited {
                provider: "p".into(),
                retry_after_ms: 1
            }
            .http_status(),
            Some(429)
        );
        assert_eq!(
            GatewayError::Timeout {
                provider: "p".into(),
                timeout_ms: 1
            }
            .http_status(),
            Some(504)
        );
        assert_eq!(
            GatewayError::ProviderNotFound { provider: "p".into() }.http_status(),
            Some(404)
        );
        assert_eq!(GatewayError::Cancelled.http_status(), None);
    }

    #[test]
    fn json_error_converts() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        let err: GatewayError = parse_err.into();
        assert!(matches!(err, GatewayError::Json(_)));
    }
}
