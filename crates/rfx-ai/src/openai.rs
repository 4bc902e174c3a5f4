use async_trait::async_trait;
use rfx_types::{GatewayError, Result};
use serde_json::{json, Value};

use crate::config::ProviderConfig;
use crate::http;
use crate::normalize;
use crate::prompts::{Prompt, CHAT_SAFETY_RULES};
use crate::{AiProvider, ChatRequest, ChatResponse, ChatRole, ProviderType, ToolDeclaration};

const PROVIDER: &str = "openai";
const CHAT_TEMPERATURE: f64 = 0.3;
const CHAT_MAX_TOKENS: u32 = 4096;

// ---------------------------------------------------------------------------
// OpenAiProvider
// ---------------------------------------------------------------------------

/// Chat Completions adapter.
#[derive(Debug)]
pub struct OpenAiProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl OpenAiProvider {
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

    fn search_model(&self) -> &str {
        self.config
            .search_model
            .as_deref()
            .unwrap_or(&self.config.model)
    }

    fn build_completion_body(&self, prompt: &Prompt) -> Value {
        let mut body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": prompt.system },
                { "role": "user", "content": prompt.user },
            ],
            "temperature": prompt.temperature,
            "max_tokens": prompt.max_tokens,
        });
        if prompt.json {
            body["response_format"] = json!({ "type": "json_object" });
        }
        body
    }

    fn build_chat_body(&self, request: &ChatRequest) -> Value {
        // 1. System prompt with the safety rules appended, then history, then the new message
        let mut messages = vec![json!({
            "role": "system",
            "content": format!("{}\n\n{}", request.system_prompt, CHAT_SAFETY_RULES),
        })];
        messages.extend(request.history.iter().map(|turn| {
            let role = match turn.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            };
            json!({ "role": role, "content": turn.content })
        }));
        messages.push(json!({ "role": "user", "content": request.message }));

        // 2. Search models accept neither temperature nor response_format
        let model = if request.web_search {
            self.search_model()
        } else {
            request.model.as_deref().unwrap_or(&self.config.model)
        };
        let mut body = json!({
            "model": model,
            "messages": messages,
            "max_tokens": CHAT_MAX_TOKENS,
        });
        if !request.web_search {
            body["temperature"] = json!(CHAT_TEMPERATURE);
            if request.wants_json() {
                body["response_format"] = json!({ "type": "json_object" });
            }
        }

        // 3. Tools
        if !request.tools.is_empty() {
            let tools: Vec<Value> = request.tools.iter().map(convert_tool).collect();
            body["tools"] = json!(tools);
            body["tool_choice"] = json!("auto");
        }

        body
    }

    async fn post(&self, body: &Value) -> Result<Value> {
        let key = self.api_key()?;
        let request = self
            .client
            .post(format!("{}/v1/chat/completions", self.config.base_url))
            .bearer_auth(key)
            .json(body);
        http::send_json(PROVIDER, request).await
    }
}

fn convert_tool(tool: &ToolDeclaration) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters,
        }
    })
}

/// Text of the first choice; a missing or empty message is a format error.
fn parse_message_text(body: &Value) -> Result<String> {
    match body["choices"][0]["message"]["content"].as_str() {
        Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
        _ => Err(GatewayError::InvalidResponseFormat {
            provider: PROVIDER.into(),
            message: "Empty response from OpenAI".into(),
        }),
    }
}

// ---------------------------------------------------------------------------
// AiProvider implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl AiProvider for OpenAiProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::OpenAi
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
            "model": self.config.model,
            "messages": [{ "role": "user", "content": "Test" }],
            "max_tokens": 5,
        });
        match self.post(&body).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(provider = PROVIDER, error = %e, "Availability probe failed");
                false
            }
        }
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        let body = self.build_completion_body(prompt);
        let response = self.post(&body).await?;
        parse_message_text(&response)
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let body = self.build_chat_body(request);
        tracing::debug!(
            provider = PROVIDER,
            model = %body["model"],
            web_search = request.web_search,
            "Sending chat completion"
        );
        let response = self.post(&body).await?;
        let text = parse_message_text(&response)?;
        tracing::debug!(provider = PROVIDER, raw = %text, "Raw chat response");
        normalize::normalize_chat(PROVIDER, &text, request.require_mode)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
