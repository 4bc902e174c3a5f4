use std::sync::Arc;

use rfx_types::{GatewayError, Result};

use crate::config::GatewayConfig;
use crate::{AiProvider, GeminiProvider, OpenAiProvider, ProviderType};

// ---------------------------------------------------------------------------
// ProviderRegistry
// ---------------------------------------------------------------------------

/// Read-only set of providers, kept in registration order.
///
/// Registration order is the fallback order. The registry is built once at
/// startup and shared immutably afterwards.
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn AiProvider>>,
    default_type: ProviderType,
}

impl ProviderRegistry {
    pub fn new(default_type: ProviderType) -> Self {
        Self {
            providers: Vec::new(),
            default_type,
        }
    }

    /// Add a provider. Registering the same type twice replaces the earlier
    /// instance in place.
    pub fn register(&mut self, provider: Arc<dyn AiProvider>) {
        let kind = provider.provider_type();
        match self.providers.iter().position(|p| p.provider_type() == kind) {
            Some(idx) => self.providers[idx] = provider,
            None => self.providers.push(provider),
        }
    }

    pub fn with_provider(mut self, provider: impl AiProvider + 'static) -> Self {
        self.register(Arc::new(provider));
        self
    }

    pub fn default_type(&self) -> ProviderType {
        self.default_type
    }

    /// Resolve `provider_type`, or the default when `None`.
    pub fn get_provider(&self, provider_type: Option<ProviderType>) -> Result<Arc<dyn AiProvider>> {
        let kind = provider_type.unwrap_or(self.default_type);
        let provider = self
            .providers
            .iter()
            .find(|p| p.provider_type() == kind)
            .ok_or_else(|| GatewayError::ProviderNotFound {
                provider: kind.to_string(),
            })?;
        if !provider.is_available() {
            return Err(GatewayError::ProviderUnavailable {
                provider: kind.to_string(),
            });
        }
        Ok(Arc::clone(provider))
    }

    /// Types whose provider reports `is_available()`, in registration order.
    pub fn list_available(&self) -> Vec<ProviderType> {
        self.providers
            .iter()
            .filter(|p| p.is_available())
            .map(|p| p.provider_type())
            .collect()
    }

    /// Every registered provider, in registration order.
    pub fn providers(&self) -> impl Iterator<Item = &Arc<dyn AiProvider>> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Build the process-wide registry: OpenAI first, then Gemini.
///
/// Providers without credentials are still registered and simply report
/// themselves unavailable. Custom providers can be appended afterwards with
/// [`ProviderRegistry::register`].
pub fn build_registry(config: &GatewayConfig) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new(config.default_provider);
    for kind in ProviderType::ALL {
        let provider: Arc<dyn AiProvider> = match kind {
            ProviderType::OpenAi => Arc::new(OpenAiProvider::new(config.openai.clone())),
            ProviderType::Gemini => Arc::new(GeminiProvider::new(config.gemini.clone())),
            ProviderType::Custom(_) => continue,
        };
        tracing::debug!(
            provider = %kind,
            model = provider.default_model(),
            available = provider.is_available(),
            "Registered provider"
        );
        registry.register(provider);
    }
    tracing::info!(
        default = %registry.default_type(),
        available = ?registry.list_available(),
        "Provider registry ready"
    );
    registry
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
