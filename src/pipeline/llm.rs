//! Inference calls: layout synthesis and prose analysis.
//!
//! Both operations are single-shot request/response calls with a fixed
//! system prompt from [`crate::prompts`]. The network lives behind the
//! [`InferenceBackend`] trait so the session can be driven by a real
//! provider ([`LlmBackend`]) or by a test double.
//!
//! ## Failure policy
//!
//! One attempt per user action, no retry. Whatever goes wrong (no
//! credential, timeout, provider error) is logged here with full detail and
//! returned as [`InferenceError`]; the session turns it into the generic
//! localized message.

use crate::config::StudioConfig;
use crate::document::ReferenceImage;
use crate::error::InferenceError;
use crate::pipeline::postprocess::{plain_text, strip_code_fences};
use crate::prompts::{
    analysis_user_message, layout_user_message, ANALYSIS_SYSTEM_PROMPT, LAYOUT_SYSTEM_PROMPT,
};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info};

/// An image attached to an inference request.
#[derive(Debug, Clone)]
pub struct InlineImage {
    /// Base64 payload without data-URL prefix.
    pub data: String,
    pub mime_type: String,
}

/// One request to the inference service.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub system_prompt: &'static str,
    pub user_text: String,
    pub image: Option<InlineImage>,
    pub temperature: Option<f32>,
}

/// Something that can answer an [`InferenceRequest`] with text.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn complete(&self, request: InferenceRequest) -> Result<String, InferenceError>;
}

/// Synthesize document markup that mimics the reference image's layout.
///
/// Returns the model output with code fences stripped.
pub async fn synthesize_layout(
    backend: &dyn InferenceBackend,
    narrative_markup: &str,
    image: &ReferenceImage,
    config: &StudioConfig,
) -> Result<String, InferenceError> {
    let start = Instant::now();
    let request = InferenceRequest {
        system_prompt: LAYOUT_SYSTEM_PROMPT,
        user_text: layout_user_message(narrative_markup),
        image: Some(InlineImage {
            data: image.encoded_payload.clone(),
            mime_type: image.mime_type.clone(),
        }),
        temperature: Some(config.layout_temperature),
    };

    match backend.complete(request).await {
        Ok(text) => {
            info!(
                "Layout synthesized: {} chars in {:?}",
                text.len(),
                start.elapsed()
            );
            Ok(strip_code_fences(&text))
        }
        Err(e) => {
            error!("Layout synthesis failed: {}", e);
            Err(e)
        }
    }
}

/// Analyze the prose quality of a narrative. Tags are stripped first.
pub async fn analyze_text(
    backend: &dyn InferenceBackend,
    narrative_markup: &str,
    config: &StudioConfig,
) -> Result<String, InferenceError> {
    let request = InferenceRequest {
        system_prompt: ANALYSIS_SYSTEM_PROMPT,
        user_text: analysis_user_message(&plain_text(narrative_markup)),
        image: None,
        temperature: config.analysis_temperature,
    };

    match backend.complete(request).await {
        Ok(text) => {
            debug!("Analysis returned {} chars", text.len());
            Ok(strip_code_fences(&text))
        }
        Err(e) => {
            error!("Text analysis failed: {}", e);
            Err(e)
        }
    }
}

// ── edgequake-llm backend ────────────────────────────────────────────────

/// [`InferenceBackend`] over an `edgequake_llm` provider.
///
/// The provider is resolved on each call, so a missing credential surfaces
/// as an ordinary call failure rather than at construction.
pub struct LlmBackend {
    config: StudioConfig,
}

impl LlmBackend {
    pub fn new(config: StudioConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl InferenceBackend for LlmBackend {
    async fn complete(&self, request: InferenceRequest) -> Result<String, InferenceError> {
        let provider = resolve_provider(&self.config)?;

        let mut messages = vec![ChatMessage::system(request.system_prompt)];
        match request.image {
            Some(img) => messages.push(ChatMessage::user_with_images(
                request.user_text.as_str(),
                vec![ImageData::new(img.data, img.mime_type)],
            )),
            None => messages.push(ChatMessage::user(request.user_text.as_str())),
        }

        let options = CompletionOptions {
            temperature: request.temperature,
            max_tokens: Some(self.config.max_tokens),
            ..Default::default()
        };

        let secs = self.config.api_timeout_secs;
        let response = timeout(
            Duration::from_secs(secs),
            provider.chat(&messages, Some(&options)),
        )
        .await
        .map_err(|_| InferenceError::Timeout { secs })?
        .map_err(|e| InferenceError::Provider(format!("{e}")))?;

        debug!(
            "{} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

/// Instantiate a named provider with the given model.
fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, InferenceError> {
    ProviderFactory::create_llm_provider(provider_name, model)
        .map_err(|e| InferenceError::Unavailable(format!("{provider_name}: {e}")))
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`).
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **Gemini key present** (`GEMINI_API_KEY`), using the configured model.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_provider(config: &StudioConfig) -> Result<Arc<dyn LLMProvider>, InferenceError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_provider(name, config.model_or_default());
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.is_empty() {
            return create_provider("gemini", config.model_or_default());
        }
    }

    let (llm_provider, _embedding) = ProviderFactory::from_env().map_err(|e| {
        InferenceError::Unavailable(format!(
            "no LLM provider could be auto-detected from environment \
             (set GEMINI_API_KEY, OPENAI_API_KEY or ANTHROPIC_API_KEY): {e}"
        ))
    })?;

    Ok(llm_provider)
}
