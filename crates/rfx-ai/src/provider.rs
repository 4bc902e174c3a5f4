use async_trait::async_trait;
use rfx_types::Result;
use serde_json::Value;

use crate::prompts::{self, Prompt};
use crate::{
    fallback, normalize, AnalyzeProcurementRequest, ChatRequest, ChatResponse, ContentGeneration,
    EvaluateBidRequest, FieldSuggestion, GenerateContentRequest, GenerateTemplateRequest,
    ImproveContentRequest, ProviderType, SuggestFieldsRequest,
};

// ---------------------------------------------------------------------------
// AiProvider
// ---------------------------------------------------------------------------

/// A text-generation backend.
///
/// Adapters implement the transport-level `complete` and `chat`; the content
/// operations are built on top of `complete` and share prompt construction and
/// output normalization across providers.
#[async_trait]
pub trait AiProvider: Send + Sync {
    fn provider_type(&self) -> ProviderType;

    fn name(&self) -> &str {
        self.provider_type().as_str()
    }

    fn default_model(&self) -> &str;

    /// Local check only: credentials are present. Never touches the network.
    fn is_available(&self) -> bool;

    /// Live check with a minimal request. Never errors.
    async fn probe(&self) -> bool {
        self.is_available()
    }

    /// Run a single-turn prompt and return the raw completion text.
    async fn complete(&self, prompt: &Prompt) -> Result<String>;

    /// Multi-turn structured completion.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;

    fn content_confidence(&self) -> f64 {
        0.9
    }

    fn improve_confidence(&self) -> f64 {
        0.85
    }

    async fn generate_content(&self, req: &GenerateContentRequest) -> Result<ContentGeneration> {
        let raw = self.complete(&prompts::content(req)).await?;
        let content = normalize::non_empty_text(self.name(), &raw)?;
        Ok(ContentGeneration::new(
            content,
            self.content_confidence(),
            fallback::field_tips(&req.field_label),
        ))
    }

    async fn suggest_fields(&self, req: &SuggestFieldsRequest) -> Result<Vec<FieldSuggestion>> {
        let raw = self.complete(&prompts::field_suggestions(req)).await?;
        normalize::parse_field_suggestions(self.name(), &raw)
    }

    async fn improve_content(&self, req: &ImproveContentRequest) -> Result<ContentGeneration> {
        let raw = self.complete(&prompts::improve(req)).await?;
        let content = normalize::non_empty_text(self.name(), &raw)?;
        Ok(ContentGeneration::new(
            content,
            self.improve_confidence(),
            fallback::improvement_tips(),
        ))
    }

    async fn generate_template(&self, req: &GenerateTemplateRequest) -> Result<Value> {
        let raw = self.complete(&prompts::template(req)).await?;
        normalize::parse_template(self.name(), &raw)
    }

    async fn analyze_procurement_request(&self, req: &AnalyzeProcurementRequest) -> Result<Value> {
        let raw = self.complete(&prompts::procurement_analysis(req)).await?;
        normalize::parse_object(self.name(), &raw, "procurement analysis")
    }

    async fn evaluate_bid(&self, req: &EvaluateBidRequest) -> Result<Value> {
        let raw = self.complete(&prompts::bid_evaluation(req)).await?;
        normalize::parse_object(self.name(), &raw, "bid evaluation")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
