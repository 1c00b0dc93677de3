//! Terminal analysis entry points.
//!
//! [`Analyzer`] owns the pieces a long-lived process shares between
//! requests: the configuration, the extraction capability and the result
//! cache. Use [`Analyzer::analyze`] to wait for the finalized result, or
//! [`Analyzer::analyze_stream`](crate::stream) to watch it being built.
//!
//! [`analyze_file`] is the one-shot convenience used by the CLI: resolve a
//! path or URL, analyse it once, return.

use crate::cache::{Fingerprint, ResultCache};
use crate::capability::ExtractionCapability;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::output::{AnalysisOutput, ScoredAnalysis};
use crate::pipeline::dispatch;
use crate::pipeline::input;
use crate::pipeline::llm::LlmCapability;
use crate::pipeline::request::{build_request, single_document, Document, Submission};
use crate::stream::AnalysisEvent;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

/// Shared analysis service. Cheap to clone; clones share one cache.
#[derive(Clone)]
pub struct Analyzer {
    config: Arc<AnalysisConfig>,
    capability: Arc<dyn ExtractionCapability>,
    cache: ResultCache<ScoredAnalysis>,
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer")
            .field("config", &self.config)
            .field("capability", &self.capability.name())
            .field("cache", &self.cache)
            .finish()
    }
}

impl Analyzer {
    /// Build an analyzer over the LLM provider `config` resolves to.
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        let capability = LlmCapability::from_config(&config)?;
        Ok(Self::with_capability(config, Arc::new(capability)))
    }

    /// Build an analyzer over any capability, e.g. a test double.
    pub fn with_capability(config: AnalysisConfig, capability: Arc<dyn ExtractionCapability>) -> Self {
        let cache = ResultCache::new(config.cache_policy());
        Self {
            config: Arc::new(config),
            capability,
            cache,
        }
    }

    /// Share an existing cache, e.g. between analyzers with different
    /// capabilities.
    pub fn with_cache(mut self, cache: ResultCache<ScoredAnalysis>) -> Self {
        self.cache = cache;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResultCache<ScoredAnalysis> {
        &self.cache
    }

    /// Analyse one submitted document and wait for the finalized result.
    ///
    /// # Errors
    /// - `MalformedRequest` for zero, several or empty documents, before any
    ///   network call.
    /// - `UpstreamFailure` / `Timeout` (retryable) and `ValidationFailure`
    ///   from the extraction itself. None of these are cached.
    pub async fn analyze(&self, submission: impl Into<Submission>) -> Result<AnalysisOutput, AnalysisError> {
        let document = single_document(submission.into())?;
        let fingerprint = Fingerprint::of(&document.bytes);
        self.run(document, fingerprint, None).await
    }

    /// Analyse raw document bytes with the configured media type.
    pub async fn analyze_bytes(&self, bytes: impl Into<Arc<[u8]>>) -> Result<AnalysisOutput, AnalysisError> {
        self.analyze(Document::new(bytes)).await
    }

    /// Shared path of the terminal and streaming APIs. Partial events only
    /// reach `events` when this call is the one that starts the computation.
    pub(crate) async fn run(
        &self,
        document: Document,
        fingerprint: Fingerprint,
        events: Option<UnboundedSender<AnalysisEvent>>,
    ) -> Result<AnalysisOutput, AnalysisError> {
        let start = Instant::now();
        info!(
            "Analyzing {} ({} bytes, {})",
            document.name.as_deref().unwrap_or("<bytes>"),
            document.bytes.len(),
            fingerprint.short()
        );

        let capability = Arc::clone(&self.capability);
        let config = Arc::clone(&self.config);
        let cached = self
            .cache
            .get_or_compute(&fingerprint, move || {
                let request = build_request(&document, &config);
                dispatch::drive(capability, request, config.timeout(), events)
            })
            .await?;

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Analysis {} ready in {}ms ({:?})",
            fingerprint.short(),
            duration_ms,
            cached.status
        );
        Ok(AnalysisOutput {
            fingerprint,
            scored: cached.value,
            cache: cached.status,
            duration_ms,
        })
    }
}

/// Resolve `input` (path or URL) and analyse it with a fresh [`Analyzer`].
pub async fn analyze_file(
    input_str: impl AsRef<str>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, AnalysisError> {
    let input_str = input_str.as_ref();
    info!("Starting analysis: {}", input_str);
    let document = input::resolve_input(input_str, config.download_timeout_secs).await?;
    Analyzer::new(config.clone())?.analyze(document).await
}
