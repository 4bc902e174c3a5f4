use async_trait::async_trait;
use rfx_types::{GatewayError, Result};
use serde_json::{json, Value};

use crate::config::ProviderConfig;
use crate::http;
use crate::normalize;
use crate::prompts::Prompt;
use crate::{AiProvider, ChatRequest, ChatResponse, ChatRole, ProviderType};

const PROVIDER: &str = "gemini";
const API_KEY_HEADER: &str = "x-goog-api-key";
const CHAT_TEMPERATURE: f64 = 0.3;
const CHAT_MAX_TOKENS: u32 = 4096;

// ---------------------------------------------------------------------------
// GeminiProvider
// ---------------------------------------------------------------------------

/// `generateContent` adapter for the Gemini API.
#[derive(Debug)]
pub struct GeminiProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn api_key(&self) -> Result<&str> {
        match self.config.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(GatewayError::ProviderNotConfigured {
                provider: PROVIDER.into(),
            }),
        }
    }

    fn build_completion_body(&self, prompt: &Prompt) -> Value {
        let mut generation_config = json!({
            "temperature": prompt.temperature,
            "maxOutputTokens": prompt.max_tokens,
        });
        if prompt.json {
            generation_config["responseMimeType"] = json!("application/json");
        }
        json!({
            "systemInstruction": { "parts": [{ "text": prompt.system }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt.user }] }],
            "generationConfig": generation_config,
        })
    }

    fn build_chat_body(&self, request: &ChatRequest) -> Value {
        // 1. History, with assistant turns renamed to "model"
        let mut contents: Vec<Value> = request
            .history
            .iter()
            .map(|turn| {
                let role = match turn.role {
                    ChatRole::User => "user",
                    ChatRole::Assistant => "model",
                };
                json!({ "role": role, "parts": [{ "text": turn.content }] })
            })
            .collect();

        // 2. The system prompt travels inside the final user message
        let full_prompt = format!(
            "{}\n\nUser Message: \"{}\"",
            request.system_prompt, request.message
        );
        contents.push(json!({ "role": "user", "parts": [{ "text": full_prompt }] }));

        // 3. Tools: declared functions plus Google Search grounding
        let mut tools: Vec<Value> = Vec::new();
        if !request.tools.is_empty() {
            let declarations: Vec<Value> = request
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    })
                })
                .collect();
            tools.push(json!({ "functionDeclarations": declarations }));
        }
        if request.web_search {
            tools.push(json!({ "googleSearch": {} }));
        }

        // 4. JSON mime type only when no tools are in play
        let mut generation_config = json!({
            "temperature": CHAT_TEMPERATURE,
            "maxOutputTokens": CHAT_MAX_TOKENS,
        });
        if tools.is_empty() {
            generation_config["responseMimeType"] = json!("application/json");
        }

        let mut body = json!({
            "contents": contents,
            "generationConfig": generation_config,
            "safetySettings": safety_settings(),
        });
        if !tools.is_empty() {
            body["tools"] = json!(tools);
        }
        body
    }

    async fn post(&self, model: &str, body: &Value) -> Result<Value> {
        let key = self.api_key()?;
        let request = self
            .client
            .post(format!("{}/models/{}:generateContent", self.config.base_url, model))
            .header(API_KEY_HEADER, key)
            .json(body);
        http::send_json(PROVIDER, request).await
    }
}

fn safety_settings() -> Value {
    json!([
        { "category": "HARM_CATEGORY_HARASSMENT", "threshold": "BLOCK_MEDIUM_AND_ABOVE" },
        { "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": "BLOCK_MEDIUM_AND_ABOVE" },
    ])
}

/// Concatenated text parts of the first candidate.
fn parse_candidate_text(body: &Value) -> Result<String> {
    if let Some(reason) = body["promptFeedback"]["blockReason"].as_str() {
        return Err(GatewayError::ProviderError {
            provider: PROVIDER.into(),
            status: 400,
            message: format!("prompt blocked: {reason}"),
        });
    }

    let text: String = body["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let finish = body["candidates"][0]["finishReason"]
            .as_str()
            .unwrap_or("unknown");
        return Err(GatewayError::InvalidResponseFormat {
            provider: PROVIDER.into(),
            message: format!("Empty response from Gemini (finish reason: {finish})"),
        });
    }
    Ok(text)
}

// ---------------------------------------------------------------------------
// AiProvider implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl AiProvider for GeminiProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Gemini
    }

    fn default_model(&self) -> &str {
        &self.config.model
    }

    fn is_available(&self) -> bool {
        self.config.has_credentials()
    }

    async fn probe(&self) -> bool {
        if !self.is_available() {
            return false;
        }
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": "Test" }] }],
            "generationConfig": { "maxOutputTokens": 5 },
        });
        match self.post(&self.config.model, &body).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(provider = PROVIDER, error = %e, "Availability probe failed");
                false
            }
        }
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        let body = self.build_completion_body(prompt);
        let response = self.post(&self.config.model, &body).await?;
        parse_candidate_text(&response)
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let model = request.model.as_deref().unwrap_or(&self.config.model);
        let body = self.build_chat_body(request);
        tracing::debug!(
            provider = PROVIDER,
            model,
            web_search = request.web_search,
            "Sending chat message"
        );
        let response = self.post(model, &body).await?;
        let text = parse_candidate_text(&response)?;
        tracing::debug!(provider = PROVIDER, raw = %text, "Raw chat response");
        normalize::normalize_chat(PROVIDER, &text, request.require_mode)
    }

    fn content_confidence(&self) -> f64 {
        0.88
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
