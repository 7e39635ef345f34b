//! Configuration for a docmimic session.
//!
//! All session behaviour is controlled through [`StudioConfig`], built via
//! its [`StudioConfigBuilder`]. Callers set only what they care about and
//! rely on documented defaults for the rest.

use crate::editor::SyncPolicy;
use crate::error::DocMimicError;
use crate::export::pdf::PdfOptions;
use crate::messages::Locale;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Default model when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default base name for exported artifacts (extension is added per format).
pub const DEFAULT_EXPORT_BASE_NAME: &str = "dokumen-tersusun";

/// Configuration for a docmimic session.
///
/// # Example
/// ```rust
/// use docmimic::{Locale, StudioConfig};
///
/// let config = StudioConfig::builder()
///     .model("gemini-2.5-flash")
///     .locale(Locale::English)
///     .api_timeout_secs(90)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct StudioConfig {
    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "anthropic").
    /// If None along with `provider`, the provider is resolved from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for layout synthesis. Default: 0.3.
    ///
    /// Low enough to keep the narrative intact, high enough to let the model
    /// choose sensible spacing and emphasis.
    pub layout_temperature: f32,

    /// Sampling temperature for analysis. Default: None (provider default).
    pub analysis_temperature: Option<f32>,

    /// Maximum tokens the LLM may generate per call. Default: 8192.
    pub max_tokens: usize,

    /// Per-call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Download timeout for reference images given as URLs. Default: 120.
    pub download_timeout_secs: u64,

    /// Language of user-facing messages. Default: Indonesian.
    pub locale: Locale,

    /// Conflict policy of the editing surface. Default: [`SyncPolicy::ForceExternal`].
    pub sync_policy: SyncPolicy,

    /// Base name for exported files. Default: `dokumen-tersusun`.
    pub export_base_name: String,

    /// PDF export parameters.
    pub pdf: PdfOptions,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            layout_temperature: 0.3,
            analysis_temperature: None,
            max_tokens: 8192,
            api_timeout_secs: 120,
            download_timeout_secs: 120,
            locale: Locale::default(),
            sync_policy: SyncPolicy::default(),
            export_base_name: DEFAULT_EXPORT_BASE_NAME.to_string(),
            pdf: PdfOptions::default(),
        }
    }
}

impl fmt::Debug for StudioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudioConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("layout_temperature", &self.layout_temperature)
            .field("analysis_temperature", &self.analysis_temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("locale", &self.locale)
            .field("sync_policy", &self.sync_policy)
            .field("export_base_name", &self.export_base_name)
            .field("pdf", &self.pdf)
            .finish()
    }
}

impl StudioConfig {
    /// Create a new builder for `StudioConfig`.
    pub fn builder() -> StudioConfigBuilder {
        StudioConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model to request, falling back to [`DEFAULT_MODEL`].
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`StudioConfig`].
#[derive(Debug)]
pub struct StudioConfigBuilder {
    config: StudioConfig,
}

impl StudioConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn layout_temperature(mut self, t: f32) -> Self {
        self.config.layout_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn analysis_temperature(mut self, t: f32) -> Self {
        self.config.analysis_temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.config.locale = locale;
        self
    }

    pub fn sync_policy(mut self, policy: SyncPolicy) -> Self {
        self.config.sync_policy = policy;
        self
    }

    pub fn export_base_name(mut self, name: impl Into<String>) -> Self {
        self.config.export_base_name = name.into();
        self
    }

    pub fn pdf_options(mut self, options: PdfOptions) -> Self {
        self.config.pdf = options;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<StudioConfig, DocMimicError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(DocMimicError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(DocMimicError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        let name = c.export_base_name.trim();
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(DocMimicError::InvalidConfig(format!(
                "export base name must be a plain file name, got '{}'",
                c.export_base_name
            )));
        }
        c.pdf.validate()?;
        Ok(self.config)
    }
}
