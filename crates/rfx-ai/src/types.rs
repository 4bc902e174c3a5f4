use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use rfx_types::GatewayError;

// ---------------------------------------------------------------------------
// ProviderType
// ---------------------------------------------------------------------------

/// Provider identity. `Custom` covers providers registered from outside this
/// crate; its name must not collide with a built-in one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderType {
    OpenAi,
    Gemini,
    Custom(&'static str),
}

impl ProviderType {
    /// Built-in providers in registration order, which is also the fallback order.
    pub const ALL: [ProviderType; 2] = [ProviderType::OpenAi, ProviderType::Gemini];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderType::OpenAi => "openai",
            ProviderType::Gemini => "gemini",
            ProviderType::Custom(name) => name,
        }
    }

    pub fn is_builtin(self) -> bool {
        !matches!(self, ProviderType::Custom(_))
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses built-in names only; custom providers are named in code.
impl FromStr for ProviderType {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderType::OpenAi),
            "gemini" | "google" => Ok(ProviderType::Gemini),
            other => Err(GatewayError::Config(format!("unknown AI provider '{other}'"))),
        }
    }
}

impl Serialize for ProviderType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProviderType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// RfxType
// ---------------------------------------------------------------------------

/// The closed set of RFx document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RfxType {
    Rfq,
    Rfp,
    Rfi,
}

impl RfxType {
    pub fn as_str(self) -> &'static str {
        match self {
            RfxType::Rfq => "RFQ",
            RfxType::Rfp => "RFP",
            RfxType::Rfi => "RFI",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RfxType::Rfq => "Request for Quotation - price comparison for well-defined products/services",
            RfxType::Rfp => "Request for Proposal - technical solution, methodology and price",
            RfxType::Rfi => "Request for Information - gathering information about capabilities",
        }
    }
}

impl fmt::Display for RfxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RfxType {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RFQ" => Ok(RfxType::Rfq),
            "RFP" => Ok(RfxType::Rfp),
            "RFI" => Ok(RfxType::Rfi),
            other => Err(GatewayError::Config(format!("unknown RFx type '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub field_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_description: Option<String>,
    pub rfx_type: RfxType,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_context: Option<String>,
    /// Details of the procurement request the document is being written for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procurement_context: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestFieldsRequest {
    pub section_title: String,
    #[serde(default)]
    pub existing_fields: Vec<String>,
    pub rfx_type: RfxType,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImproveContentRequest {
    pub current_content: String,
    pub field_label: String,
    pub rfx_type: RfxType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub improvements: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTemplateRequest {
    pub rfx_type: RfxType,
    pub category: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub specific_requirements: Vec<String>,
}

/// A purchase request to assess before sourcing starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeProcurementRequest {
    pub item_title: String,
    pub quantity: f64,
    pub uom: String,
    pub simple_definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub technical_specs: Value,
}

/// A supplier bid scored against free-form evaluation criteria.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateBidRequest {
    pub bid: Value,
    pub criteria: Value,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentGeneration {
    pub content: String,
    /// In `[0, 1]`.
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

impl ContentGeneration {
    pub fn new(content: impl Into<String>, confidence: f64, suggestions: Vec<String>) -> Self {
        Self {
            content: content.into(),
            confidence: confidence.clamp(0.0, 1.0),
            suggestions: if suggestions.is_empty() {
                None
            } else {
                Some(suggestions)
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSuggestion {
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// Live availability of the default provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub available: bool,
    pub provider: String,
}

// ---------------------------------------------------------------------------
// Conversational completion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A function the model may call, in provider-neutral form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub system_prompt: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    pub message: String,
    #[serde(default)]
    pub web_search: bool,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub tools: Vec<ToolDeclaration>,
    /// When set, the structured reply must carry a non-empty `MODE` discriminator.
    #[serde(default = "default_true")]
    pub require_mode: bool,
}

fn default_true() -> bool {
    true
}

impl ChatRequest {
    pub fn new(system_prompt: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            history: Vec::new(),
            message: message.into(),
            web_search: false,
            model: None,
            tools: Vec::new(),
            require_mode: true,
        }
    }

    /// Whether the provider should be asked for a bare JSON object.
    pub fn wants_json(&self) -> bool {
        !self.web_search && self.tools.is_empty()
    }
}

/// A structured chatbot reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The `MODE` discriminator; empty only when the request did not require one.
    pub mode: String,
    /// The full parsed object, including `MODE`.
    pub body: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_type_parses_aliases() {
        assert_eq!("openai".parse::<ProviderType>().unwrap(), ProviderType::OpenAi);
        assert_eq!(" Gemini ".parse::<ProviderType>().unwrap(), ProviderType::Gemini);
        assert_eq!("google".parse::<ProviderType>().unwrap(), ProviderType::Gemini);
        assert!("claude".parse::<ProviderType>().is_err());
        assert_eq!(ProviderType::OpenAi.to_string(), "openai");
    }

    #[test]
    fn custom_provider_types_are_distinct_by_name() {
        let local = ProviderType::Custom("local-llm");
        assert_eq!(local.as_str(), "local-llm");
        assert!(!local.is_builtin());
        assert_ne!(local, ProviderType::Custom("other"));
        assert_ne!(local, ProviderType::OpenAi);
        assert_eq!(serde_json::to_string(&local).unwrap(), "\"local-llm\"");
        let parsed: ProviderType = serde_json::from_str("\"gemini\"").unwrap();
        assert_eq!(parsed, ProviderType::Gemini);
    }

    #[test]
    fn rfx_type_roundtrips_through_serde() {
        let json = serde_json::to_string(&RfxType::Rfp).unwrap();
        assert_eq!(json, "\"RFP\"");
        let back: RfxType = serde_json::from_str("\"RFI\"").unwrap();
        assert_eq!(back, RfxType::Rfi);
        assert_eq!("rfq".parse::<RfxType>().unwrap(), RfxType::Rfq);
    }

    #[test]
    fn content_generation_clamps_confidence() {
        let c = ContentGeneration::new("x", 1.7, vec![]);
        assert_eq!(c.confidence, 1.0);
        assert!(c.suggestions.is_none());
        let c = ContentGeneration::new("x", -0.2, vec!["tip".into()]);
        assert_eq!(c.confidence, 0.0);
        assert_eq!(c.suggestions.unwrap(), vec!["tip".to_string()]);
    }

    #[test]
    fn field_suggestion_uses_camel_case() {
        let s: FieldSuggestion = serde_json::from_str(
            r#"{"label":"Garanti","description":"d","isRequired":true,"reasoning":"r"}"#,
        )
        .unwrap();
        assert!(s.is_required);
        assert_eq!(s.reasoning.as_deref(), Some("r"));
    }

    #[test]
    fn chat_request_defaults_require_mode() {
        let req: ChatRequest =
            serde_json::from_str(r#"{"system_prompt":"s","message":"m"}"#).unwrap();
        assert!(req.require_mode);
        assert!(req.wants_json());

        let mut req = ChatRequest::new("s", "m");
        req.web_search = true;
        assert!(!req.wants_json());
    }
}
