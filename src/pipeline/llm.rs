//! Default extraction capability backed by an `edgequake_llm` provider.
//!
//! This module turns an [`ExtractionRequest`] into a multimodal chat call and
//! exposes the answer as a [`TokenStream`]. It stays thin: prompt
//! text lives in [`crate::prompts`], request shaping in
//! [`crate::pipeline::request`], and parsing in [`crate::pipeline::assemble`].
//!
//! The provider's chat API is single-shot, so the stream yields exactly one
//! chunk holding the whole response. The dispatcher treats that exactly like
//! a token stream that happened to arrive in one piece.
//!
//! No retries happen here: upstream failures are reported to the caller,
//! who decides whether to resubmit.

use crate::capability::{ExtractionCapability, TokenStream};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::pipeline::request::ExtractionRequest;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Model used when a provider is named without a model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// [`ExtractionCapability`] over any `edgequake_llm` provider.
#[derive(Clone)]
pub struct LlmCapability {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl LlmCapability {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &AnalysisConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Resolve a provider from `config` and wrap it.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        Ok(Self::new(resolve_provider(config)?, config))
    }
}

impl ExtractionCapability for LlmCapability {
    fn extract(&self, request: ExtractionRequest) -> TokenStream {
        let provider = Arc::clone(&self.provider);
        let options = build_options(self.temperature, self.max_tokens);
        stream::once(async move {
            let messages = build_messages(&request);
            let start = Instant::now();
            match provider.chat(&messages, Some(&options)).await {
                Ok(response) => {
                    debug!(
                        "Extraction: {} input tokens, {} output tokens, {:?}",
                        response.prompt_tokens,
                        response.completion_tokens,
                        start.elapsed()
                    );
                    Ok(response.content)
                }
                Err(e) => {
                    warn!("Extraction call failed: {}", e);
                    Err(AnalysisError::UpstreamFailure {
                        message: e.to_string(),
                    })
                }
            }
        })
        .boxed()
    }

    fn name(&self) -> &str {
        "edgequake-llm"
    }
}

/// Message layout: system instruction, then one user turn carrying the
/// instruction text and the base64 attachment.
fn build_messages(request: &ExtractionRequest) -> Vec<ChatMessage> {
    let attachment = ImageData::new(
        STANDARD.encode(&request.attachment.bytes),
        request.attachment.media_type.clone(),
    );
    vec![
        ChatMessage::system(request.system_instruction.as_str()),
        ChatMessage::user_with_images(request.user_instruction.as_str(), vec![attachment]),
    ]
}

fn build_options(temperature: f32, max_tokens: usize) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(temperature),
        max_tokens: Some(max_tokens),
        ..Default::default()
    }
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, AnalysisError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        AnalysisError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`).
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **OpenAI key present** (`OPENAI_API_KEY`): OpenAI with the configured
///    or default model.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_provider(config: &AnalysisConfig) -> Result<Arc<dyn LLMProvider>, AnalysisError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| AnalysisError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, GEMINI_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::request::{build_request, Document};

    #[test]
    fn build_options_defaults() {
        let config = AnalysisConfig::default();
        let opts = build_options(config.temperature, config.max_tokens);
        assert_eq!(opts.temperature, Some(0.1));
        assert_eq!(opts.max_tokens, Some(4096));
    }

    #[test]
    fn messages_are_system_then_user() {
        let doc = Document::new(b"%PDF-1.4".to_vec());
        let req = build_request(&doc, &AnalysisConfig::default());
        assert_eq!(build_messages(&req).len(), 2);
    }
}
