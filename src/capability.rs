//! The extraction capability: the one seam between the pipeline and a model.
//!
//! A capability takes an [`ExtractionRequest`] (instructions, attachment,
//! target schema) and returns a [`TokenStream`] of text chunks that, once
//! concatenated, should form the JSON object described by the schema.
//!
//! The trait is deliberately minimal so it can front any of:
//!
//! - a single-shot provider (one chunk holding the whole object),
//! - a token-streaming provider (many small chunks),
//! - a test double scripted with canned chunks, delays or errors.
//!
//! The stream is lazy: no network traffic happens until it is first polled,
//! and dropping it cancels the call. [`crate::pipeline::llm::LlmCapability`]
//! is the default implementation over `edgequake_llm`.

use crate::error::AnalysisError;
use crate::pipeline::request::ExtractionRequest;
use futures::stream::BoxStream;

/// Text chunks produced by a capability, or the error that ended the call.
pub type TokenStream = BoxStream<'static, Result<String, AnalysisError>>;

/// Converts a document attachment into (streamed) structured output.
///
/// Implementations must be `Send + Sync`: one capability is shared by every
/// concurrent analysis.
pub trait ExtractionCapability: Send + Sync {
    /// Start an extraction. Errors belong inside the stream.
    fn extract(&self, request: ExtractionRequest) -> TokenStream;

    /// Short name used in log lines.
    fn name(&self) -> &str {
        "extraction"
    }
}
