//! AI provider gateway for RFx content generation.
//!
//! Provides the `AiProvider` trait with OpenAI and Gemini adapters, a
//! `ProviderRegistry` that fixes the fallback order, and `AiGateway`, which
//! wraps every call in a timeout guard and retry executor and falls back to
//! other providers or to static content.

pub mod config;
pub mod fallback;
mod gateway;
mod gemini;
mod http;
pub mod normalize;
mod openai;
pub mod prompts;
mod provider;
mod registry;
pub mod retry;
#[cfg(test)]
mod testing;
pub mod timeout;
mod types;

pub use config::{GatewayConfig, ProviderConfig};
pub use gateway::{AiGateway, CallOptions, GatewaySettings};
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use provider::AiProvider;
pub use registry::{build_registry, ProviderRegistry};
pub use retry::RetryPolicy;
pub use types::*;

pub use rfx_types::{GatewayError, Result, TransportErrorKind};
