//! Startup configuration for the gateway.
//!
//! Configuration is read exactly once, from a read-only key-value source, and is
//! immutable afterwards. [`GatewayConfig::from_env`] reads the process environment;
//! [`GatewayConfig::from_lookup`] accepts any lookup function.

use std::time::Duration;

use rfx_types::{GatewayError, Result};

use crate::retry::RetryPolicy;
use crate::ProviderType;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_OPENAI_SEARCH_MODEL: &str = "gpt-4o-search-preview";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// ProviderConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub search_model: Option<String>,
    pub base_url: String,
}

impl ProviderConfig {
    pub fn openai(api_key: Option<String>) -> Self {
        Self {
            api_key,
            model: DEFAULT_OPENAI_MODEL.to_string(),
            search_model: Some(DEFAULT_OPENAI_SEARCH_MODEL.to_string()),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        }
    }

    pub fn gemini(api_key: Option<String>) -> Self {
        Self {
            api_key,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            search_model: None,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// True when a non-blank credential is present.
    pub fn has_credentials(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// GatewayConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub default_provider: ProviderType,
    pub openai: ProviderConfig,
    pub gemini: ProviderConfig,
    pub retry: RetryPolicy,
    pub timeout: Duration,
}

impl GatewayConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration from an arbitrary key-value source.
    ///
    /// Blank values are treated as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let default_provider = match get("AI_PROVIDER") {
            Some(v) => v.parse()?,
            None => ProviderType::OpenAi,
        };

        let mut openai = ProviderConfig::openai(get("OPENAI_API_KEY"));
        if let Some(model) = get("OPENAI_MODEL") {
            openai.model = model;
        }
        if let Some(model) = get("OPENAI_SEARCH_MODEL") {
            openai.search_model = Some(model);
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            openai.base_url = url;
        }

        let mut gemini =
            ProviderConfig::gemini(get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY")));
        if let Some(model) = get("GEMINI_MODEL") {
            gemini.model = model;
        }
        if let Some(url) = get("GEMINI_BASE_URL") {
            gemini.base_url = url;
        }

        let mut retry = RetryPolicy::default();
        if let Some(v) = get("AI_MAX_RETRIES") {
            retry.max_retries = parse_number("AI_MAX_RETRIES", &v)?;
        }
        if let Some(v) = get("AI_RETRY_INITIAL_DELAY_MS") {
            retry.initial_delay = Duration::from_millis(parse_number("AI_RETRY_INITIAL_DELAY_MS", &v)?);
        }
        if let Some(v) = get("AI_RETRY_BACKOFF_MULTIPLIER") {
            let m: f64 = parse_number("AI_RETRY_BACKOFF_MULTIPLIER", &v)?;
            if !(m.is_finite() && m >= 1.0) {
                return Err(GatewayError::Config(format!(
                    "AI_RETRY_BACKOFF_MULTIPLIER must be >= 1.0, got {v}"
                )));
            }
            retry.backoff_multiplier = m;
        }
        if let Some(v) = get("AI_RETRY_TIMEOUTS") {
            retry.retry_on_timeout = parse_bool("AI_RETRY_TIMEOUTS", &v)?;
        }
        if let Some(v) = get("AI_RETRY_JITTER") {
            retry.jitter = parse_bool("AI_RETRY_JITTER", &v)?;
        }

        let timeout = match get("AI_TIMEOUT_MS") {
            Some(v) => Duration::from_millis(parse_number("AI_TIMEOUT_MS", &v)?),
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            default_provider,
            openai,
            gemini,
            retry,
            timeout,
        })
    }

    /// Settings for a built-in provider; `None` for custom ones.
    pub fn provider(&self, provider_type: ProviderType) -> Option<&ProviderConfig> {
        match provider_type {
            ProviderType::OpenAi => Some(&self.openai),
            ProviderType::Gemini => Some(&self.gemini),
            ProviderType::Custom(_) => None,
        }
    }

    /// Startup check: the default provider must have credentials.
    pub fn validate(&self) -> Result<()> {
        let configured = self
            .provider(self.default_provider)
            .is_some_and(ProviderConfig::has_credentials);
        if !configured {
            return Err(GatewayError::ProviderNotConfigured {
                provider: self.default_provider.to_string(),
            });
        }
        if self.timeout.is_zero() {
            return Err(GatewayError::Config("AI_TIMEOUT_MS must be positive".into()));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| GatewayError::Config(format!("{key} has invalid value '{value}'")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(GatewayError::Config(format!("{key} has invalid value '{value}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_empty() {
        let cfg = GatewayConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.default_provider, ProviderType::OpenAi);
        assert_eq!(cfg.openai.model, "gpt-4o");
        assert_eq!(cfg.openai.search_model.as_deref(), Some("gpt-4o-search-preview"));
        assert_eq!(cfg.gemini.model, "gemini-2.5-pro");
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.retry.max_retries, 3);
        assert_eq!(cfg.retry.initial_delay, Duration::from_millis(2000));
        assert_eq!(cfg.retry.backoff_multiplier, 1.5);
        assert!(!cfg.retry.retry_on_timeout);
        assert!(!cfg.retry.jitter);
    }

    #[test]
    fn reads_provider_settings() {
        let cfg = GatewayConfig::from_lookup(lookup(&[
            ("AI_PROVIDER", "gemini"),
            ("GEMINI_API_KEY", "g-key"),
            ("GEMINI_MODEL", "gemini-2.5-flash"),
            ("OPENAI_API_KEY", "o-key"),
            ("OPENAI_SEARCH_MODEL", "gpt-4o-mini-search"),
            ("AI_TIMEOUT_MS", "5000"),
            ("AI_MAX_RETRIES", "5"),
            ("AI_RETRY_BACKOFF_MULTIPLIER", "2"),
            ("AI_RETRY_TIMEOUTS", "true"),
        ]))
        .unwrap();
        assert_eq!(cfg.default_provider, ProviderType::Gemini);
        assert_eq!(cfg.gemini.api_key.as_deref(), Some("g-key"));
        assert_eq!(cfg.gemini.model, "gemini-2.5-flash");
        assert_eq!(cfg.openai.search_model.as_deref(), Some("gpt-4o-mini-search"));
        assert_eq!(cfg.timeout, Duration::from_millis(5000));
        assert_eq!(cfg.retry.max_retries, 5);
        assert_eq!(cfg.retry.backoff_multiplier, 2.0);
        assert!(cfg.retry.retry_on_timeout);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn google_api_key_is_an_alias() {
        let cfg = GatewayConfig::from_lookup(lookup(&[("GOOGLE_API_KEY", "k")])).unwrap();
        assert!(cfg.gemini.has_credentials());
    }

    #[test]
    fn unknown_provider_is_config_error() {
        let err = GatewayConfig::from_lookup(lookup(&[("AI_PROVIDER", "claude")])).unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[test]
    fn invalid_numbers_are_config_errors() {
        let err = GatewayConfig::from_lookup(lookup(&[("AI_TIMEOUT_MS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("AI_TIMEOUT_MS"));
        let err = GatewayConfig::from_lookup(lookup(&[("AI_RETRY_BACKOFF_MULTIPLIER", "0.5")]))
            .unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
        let err =
            GatewayConfig::from_lookup(lookup(&[("AI_RETRY_JITTER", "maybe")])).unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[test]
    fn missing_default_credentials_fail_validation() {
        let cfg = GatewayConfig::from_lookup(lookup(&[
            ("AI_PROVIDER", "gemini"),
            ("OPENAI_API_KEY", "o-key"),
        ]))
        .unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(
            matches!(err, GatewayError::ProviderNotConfigured { ref provider } if provider == "gemini")
        );
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let cfg = GatewayConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "   ")])).unwrap();
        assert!(!cfg.openai.has_credentials());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn custom_default_has_no_env_config() {
        let mut cfg = GatewayConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "o-key")])).unwrap();
        assert!(cfg.provider(ProviderType::Custom("local")).is_none());
        cfg.default_provider = ProviderType::Custom("local");
        assert!(matches!(
            cfg.validate().unwrap_err(),
            GatewayError::ProviderNotConfigured { ref provider } if provider == "local"
        ));
    }
}
