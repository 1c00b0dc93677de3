//! Configuration types for document analysis.
//!
//! All pipeline behaviour is controlled through [`AnalysisConfig`], built via
//! its [`AnalysisConfigBuilder`]. The builder lets callers set only what they
//! care about and rely on documented defaults for the rest.

use crate::cache::CachePolicy;
use crate::error::AnalysisError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Media type used when a document does not declare one.
pub const DEFAULT_MEDIA_TYPE: &str = "application/pdf";

/// Configuration for analysing documents.
///
/// Built via [`AnalysisConfig::builder()`] or using
/// [`AnalysisConfig::default()`].
///
/// # Example
/// ```rust
/// use doc_scorecard::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .model("gemini-2.0-flash")
///     .provider_name("gemini")
///     .timeout_secs(90)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// LLM model identifier, e.g. "gpt-4o-mini", "gemini-2.0-flash".
    /// If None, uses provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "gemini").
    /// If None along with `provider`, the provider is detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the LLM completion. Default: 0.1.
    ///
    /// Structured extraction wants the model to be repeatable; the same
    /// document should score the same way twice.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate. Default: 4096.
    pub max_tokens: usize,

    /// Custom system instruction. If None, uses the built-in default.
    pub system_prompt: Option<String>,

    /// Custom user instruction. If None, uses the built-in default.
    pub user_prompt: Option<String>,

    /// Media type attached to documents that do not set one. Default: `application/pdf`.
    pub media_type: String,

    /// Upper bound on the whole pipeline in seconds. Default: 60.
    ///
    /// Covers the request, the full token stream and validation. Exceeding it
    /// fails the analysis with [`AnalysisError::Timeout`] and clears the
    /// pending cache entry.
    pub timeout_secs: u64,

    /// Age in seconds after which a pending cache entry is reclaimed. Default: 120.
    ///
    /// Must be at least `timeout_secs`; it only matters when an in-flight
    /// computation dies without resolving.
    pub pending_ttl_secs: u64,

    /// Lifetime of completed cache entries in seconds. Default: None (process lifetime).
    pub completed_ttl_secs: Option<u64>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 4096,
            system_prompt: None,
            user_prompt: None,
            media_type: DEFAULT_MEDIA_TYPE.to_string(),
            timeout_secs: 60,
            pending_ttl_secs: 120,
            completed_ttl_secs: None,
            download_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("media_type", &self.media_type)
            .field("timeout_secs", &self.timeout_secs)
            .field("pending_ttl_secs", &self.pending_ttl_secs)
            .field("completed_ttl_secs", &self.completed_ttl_secs)
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }

    /// Pipeline wall-clock budget.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Cache policy derived from the TTL settings.
    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            pending_ttl: Duration::from_secs(self.pending_ttl_secs),
            completed_ttl: self.completed_ttl_secs.map(Duration::from_secs),
        }
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
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

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn user_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.user_prompt = Some(prompt.into());
        self
    }

    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.config.media_type = media_type.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn pending_ttl_secs(mut self, secs: u64) -> Self {
        self.config.pending_ttl_secs = secs;
        self
    }

    pub fn completed_ttl_secs(mut self, secs: u64) -> Self {
        self.config.completed_ttl_secs = Some(secs);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, AnalysisError> {
        let c = &self.config;
        if c.timeout_secs == 0 {
            return Err(AnalysisError::InvalidConfig(
                "Timeout must be ≥ 1 second".into(),
            ));
        }
        if c.pending_ttl_secs < c.timeout_secs {
            return Err(AnalysisError::InvalidConfig(format!(
                "Pending TTL ({}s) must be ≥ timeout ({}s)",
                c.pending_ttl_secs, c.timeout_secs
            )));
        }
        if c.max_tokens == 0 {
            return Err(AnalysisError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.media_type.trim().is_empty() {
            return Err(AnalysisError::InvalidConfig(
                "Media type must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
