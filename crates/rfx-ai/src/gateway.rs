//! The orchestrator in front of the providers.
//!
//! Every call goes through the same sequence: resolve a provider, run the call
//! under the timeout guard inside the retry executor, and on failure of an
//! unpinned call walk the remaining available providers in registration order.
//! The content operations degrade to the static catalog when every provider is
//! exhausted; `chat`, procurement analysis and bid evaluation have no such
//! fallback.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rfx_types::{GatewayError, Result};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{GatewayConfig, DEFAULT_TIMEOUT};
use crate::registry::{build_registry, ProviderRegistry};
use crate::retry::{execute_with_retry, RetryPolicy};
use crate::timeout::with_timeout;
use crate::{
    fallback, AiProvider, AnalyzeProcurementRequest, Availability, ChatRequest, ChatResponse,
    ContentGeneration, EvaluateBidRequest, FieldSuggestion, GenerateContentRequest,
    GenerateTemplateRequest, ImproveContentRequest, ProviderType, SuggestFieldsRequest,
};

// ---------------------------------------------------------------------------
// Settings and per-call options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct GatewaySettings {
    pub retry: RetryPolicy,
    /// Deadline for a single attempt.
    pub timeout: Duration,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl From<&GatewayConfig> for GatewaySettings {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            retry: config.retry.clone(),
            timeout: config.timeout,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Pin the call to one provider; pinned calls never fall back.
    pub provider: Option<ProviderType>,
    pub cancel: CancellationToken,
}

impl CallOptions {
    pub fn pinned(provider: ProviderType) -> Self {
        Self {
            provider: Some(provider),
            ..Self::default()
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

// ---------------------------------------------------------------------------
// AiGateway
// ---------------------------------------------------------------------------

pub struct AiGateway {
    registry: ProviderRegistry,
    settings: GatewaySettings,
}

impl AiGateway {
    pub fn new(registry: ProviderRegistry, settings: GatewaySettings) -> Self {
        Self { registry, settings }
    }

    /// Validate `config` and build the gateway with the standard provider set.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(build_registry(config), GatewaySettings::from(config)))
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    // -- Content generation ------------------------------------------------

    /// Never fails; degrades to static content.
    pub async fn generate_field_content(&self, req: &GenerateContentRequest) -> ContentGeneration {
        self.generate_field_content_with(req, &CallOptions::default())
            .await
            .unwrap_or_else(|_| fallback::content_for(&req.field_label, req.rfx_type))
    }

    pub async fn generate_field_content_with(
        &self,
        req: &GenerateContentRequest,
        opts: &CallOptions,
    ) -> Result<ContentGeneration> {
        let result = self
            .dispatch("generate_content", opts, |p| async move {
                p.generate_content(req).await
            })
            .await;
        degrade(result, opts, || {
            fallback::content_for(&req.field_label, req.rfx_type)
        })
    }

    pub async fn suggest_fields(&self, req: &SuggestFieldsRequest) -> Vec<FieldSuggestion> {
        self.suggest_fields_with(req, &CallOptions::default())
            .await
            .unwrap_or_else(|_| fallback::field_suggestions(&req.section_title))
    }

    pub async fn suggest_fields_with(
        &self,
        req: &SuggestFieldsRequest,
        opts: &CallOptions,
    ) -> Result<Vec<FieldSuggestion>> {
        let result = self
            .dispatch("suggest_fields", opts, |p| async move {
                p.suggest_fields(req).await
            })
            .await;
        degrade(result, opts, || fallback::field_suggestions(&req.section_title))
    }

    /// On total failure the original content comes back unchanged.
    pub async fn improve_content(&self, req: &ImproveContentRequest) -> ContentGeneration {
        self.improve_content_with(req, &CallOptions::default())
            .await
            .unwrap_or_else(|_| fallback::improved_content(&req.current_content))
    }

    pub async fn improve_content_with(
        &self,
        req: &ImproveContentRequest,
        opts: &CallOptions,
    ) -> Result<ContentGeneration> {
        let result = self
            .dispatch("improve_content", opts, |p| async move {
                p.improve_content(req).await
            })
            .await;
        degrade(result, opts, || fallback::improved_content(&req.current_content))
    }

    pub async fn generate_template(&self, req: &GenerateTemplateRequest) -> Value {
        self.generate_template_with(req, &CallOptions::default())
            .await
            .unwrap_or_else(|_| fallback::template(req))
    }

    pub async fn generate_template_with(
        &self,
        req: &GenerateTemplateRequest,
        opts: &CallOptions,
    ) -> Result<Value> {
        let result = self
            .dispatch("generate_template", opts, |p| async move {
                p.generate_template(req).await
            })
            .await;
        degrade(result, opts, || fallback::template(req))
    }

    // -- Procurement analysis --------------------------------------------------

    /// Risk, sourcing, budget and timeline assessment of a purchase request.
    /// Unpinned exhaustion yields `AllProvidersExhausted`.
    pub async fn analyze_procurement_request(
        &self,
        req: &AnalyzeProcurementRequest,
        opts: &CallOptions,
    ) -> Result<Value> {
        self.dispatch("analyze_procurement_request", opts, |p| async move {
            p.analyze_procurement_request(req).await
        })
        .await
    }

    /// Score a supplier bid against evaluation criteria.
    pub async fn evaluate_bid(&self, req: &EvaluateBidRequest, opts: &CallOptions) -> Result<Value> {
        self.dispatch("evaluate_bid", opts, |p| async move { p.evaluate_bid(req).await })
            .await
    }

    // -- Conversational completion ------------------------------------------

    /// Structured chatbot completion. There is no static fallback: unpinned
    /// exhaustion yields `AllProvidersExhausted`.
    pub async fn chat(&self, req: &ChatRequest, opts: &CallOptions) -> Result<ChatResponse> {
        self.dispatch("chat", opts, |p| async move { p.chat(req).await })
            .await
    }

    // -- Health ----------------------------------------------------------------

    /// Live availability of the default provider. Any failure reports `false`.
    pub async fn check_availability(&self) -> Availability {
        let kind = self.registry.default_type();
        let available = match self.registry.get_provider(None) {
            Ok(provider) => {
                let probe = async { Ok(provider.probe().await) };
                with_timeout(self.settings.timeout, provider.name(), probe)
                    .await
                    .unwrap_or(false)
            }
            Err(e) => {
                tracing::debug!(provider = %kind, error = %e, "Default provider not usable");
                false
            }
        };
        Availability {
            available,
            provider: kind.to_string(),
        }
    }

    pub fn list_available(&self) -> Vec<ProviderType> {
        self.registry.list_available()
    }

    // -- Dispatch ----------------------------------------------------------------

    async fn dispatch<T, F, Fut>(&self, operation: &'static str, opts: &CallOptions, call: F) -> Result<T>
    where
        F: Fn(Arc<dyn AiProvider>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("ai_call", %request_id, operation);
        self.dispatch_inner(operation, opts, &call).instrument(span).await
    }

    async fn dispatch_inner<T, F, Fut>(&self, operation: &str, opts: &CallOptions, call: &F) -> Result<T>
    where
        F: Fn(Arc<dyn AiProvider>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        // Pinned: one provider, errors propagate unchanged.
        if let Some(kind) = opts.provider {
            let provider = self.registry.get_provider(Some(kind))?;
            tracing::info!(provider = %kind, pinned = true, "Selected provider");
            return self.attempt(&provider, operation, opts, call).await;
        }

        let default = self.registry.default_type();
        let mut attempted: Vec<String> = Vec::new();
        let mut last_error: Option<GatewayError> = None;

        match self.registry.get_provider(None) {
            Ok(provider) => {
                tracing::info!(provider = %default, pinned = false, "Selected provider");
                match self.attempt(&provider, operation, opts, call).await {
                    Ok(value) => return Ok(value),
                    Err(e) if !e.triggers_fallback() => return Err(e),
                    Err(e) => {
                        tracing::warn!(provider = %default, error = %e, "Default provider failed, falling back");
                        attempted.push(default.to_string());
                        last_error = Some(e);
                    }
                }
            }
            Err(e) => {
                tracing::warn!(provider = %default, error = %e, "Default provider not usable, falling back");
                attempted.push(default.to_string());
                last_error = Some(e);
            }
        }

        for kind in self.registry.list_available() {
            if kind == default {
                continue;
            }
            let provider = match self.registry.get_provider(Some(kind)) {
                Ok(p) => p,
                Err(e) => {
                    last_error = Some(e);
                    continue;
                }
            };
            tracing::info!(provider = %kind, "Selected fallback provider");
            match self.attempt(&provider, operation, opts, call).await {
                Ok(value) => {
                    tracing::info!(provider = %kind, "Fallback provider succeeded");
                    return Ok(value);
                }
                Err(e) if !e.triggers_fallback() => return Err(e),
                Err(e) => {
                    tracing::warn!(provider = %kind, error = %e, "Fallback provider failed");
                    attempted.push(kind.to_string());
                    last_error = Some(e);
                }
            }
        }

        let last_error = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no provider available".to_string());
        tracing::error!(attempted = ?attempted, last_error = %last_error, "All providers exhausted");
        Err(GatewayError::AllProvidersExhausted {
            attempted,
            last_error,
        })
    }

    /// One provider: timeout guard per attempt, retry executor around it.
    async fn attempt<T, F, Fut>(
        &self,
        provider: &Arc<dyn AiProvider>,
        operation: &str,
        opts: &CallOptions,
        call: &F,
    ) -> Result<T>
    where
        F: Fn(Arc<dyn AiProvider>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let name = provider.name().to_string();
        let label = format!("{operation}@{name}");
        tracing::debug!(provider = %name, model = provider.default_model(), "Calling provider");
        execute_with_retry(
            || with_timeout(self.settings.timeout, &name, call(Arc::clone(provider))),
            &self.settings.retry,
            &opts.cancel,
            &label,
        )
        .await
    }
}

/// Unpinned, uncancelled failures become static content.
fn degrade<T>(result: Result<T>, opts: &CallOptions, fallback: impl FnOnce() -> T) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if opts.provider.is_some() || matches!(e, GatewayError::Cancelled) => Err(e),
        Err(e) => {
            tracing::warn!(error = %e, "Serving static fallback content");
            Ok(fallback())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
