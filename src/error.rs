//! Error types for the doc-scorecard library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`AnalysisError`] — **Terminal**: the analysis of a document cannot
//!   produce a result (no document submitted, the model never returned a
//!   valid object, the provider failed or timed out). Returned as
//!   `Err(AnalysisError)` from [`crate::Analyzer::analyze`] and carried by
//!   [`crate::stream::AnalysisEvent::Failed`].
//!
//! * [`SchemaError`] — **Per-increment**: a single fragment of the model's
//!   streamed output does not satisfy the schema. While streaming these are
//!   logged and skipped; only the final assembled object has to be valid.
//!
//! `AnalysisError` is `Clone` because one in-flight computation may resolve
//! several callers that all joined it through the result cache.

use std::path::PathBuf;
use thiserror::Error;

/// All terminal errors returned by the doc-scorecard library.
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    // ── Request errors ────────────────────────────────────────────────────
    /// No document, several documents, or an empty payload was submitted.
    #[error("Malformed request: {reason}")]
    MalformedRequest { reason: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The extraction capability reported an error. May be transient.
    #[error("Extraction failed upstream: {message}")]
    UpstreamFailure { message: String },

    /// The whole pipeline exceeded its wall-clock budget.
    #[error("Analysis timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The model output never converged to a valid document analysis.
    #[error("Model output failed validation: {detail}")]
    ValidationFailure { detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// Whether a caller may reasonably resubmit the same document.
    ///
    /// Upstream errors and timeouts are not retried internally; they are
    /// surfaced so the caller decides.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AnalysisError::UpstreamFailure { .. } | AnalysisError::Timeout { .. }
        )
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        AnalysisError::MalformedRequest {
            reason: reason.into(),
        }
    }
}

/// A schema violation found in (a fragment of) the model output.
///
/// `path` uses JSON-pointer-like notation, e.g. `expectedFields[2].riskLevel`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// The text could not be parsed as JSON at all.
    #[error("not a JSON object: {detail}")]
    NotJson { detail: String },

    /// A required key is absent.
    #[error("{path}: required field is missing")]
    MissingField { path: String },

    /// A key holds a value of the wrong JSON type.
    #[error("{path}: expected {expected}")]
    WrongType { path: String, expected: &'static str },

    /// A numeric value lies outside its allowed range.
    #[error("{path}: {value} is outside {min}..={max}")]
    OutOfRange {
        path: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// The model answered with the retired `confidence` key instead of `riskLevel`.
    #[error("{path}: found legacy 'confidence' instead of 'riskLevel'")]
    LegacyConfidence { path: String },

    /// Every risk score lies in 0..=1 with fractions: a 0–1 scale, not 0–100.
    #[error("risk scores look like a 0–1 scale (max {max}); expected 0–100")]
    ScaleMismatch { max: f64 },
}
