//! Request building: one submitted document → one extraction request.
//!
//! Pure functions only. Given the same document and config,
//! [`build_request`] returns an identical request, which keeps the outbound
//! call easy to assert on in tests.

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::prompts::{output_contract, DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_PROMPT};
use crate::schema::target_schema;
use serde_json::Value;
use std::sync::Arc;

/// One document payload as received from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Original file name, for display only. Never part of the cache key.
    pub name: Option<String>,
    pub bytes: Arc<[u8]>,
    /// Declared media type. `None` falls back to the configured default.
    pub media_type: Option<String>,
}

impl Document {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: None,
            bytes: bytes.into(),
            media_type: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }
}

/// An inbound submission. Exactly one document is accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    pub documents: Vec<Document>,
}

impl Submission {
    pub fn single(document: Document) -> Self {
        Self {
            documents: vec![document],
        }
    }
}

impl From<Document> for Submission {
    fn from(document: Document) -> Self {
        Self::single(document)
    }
}

/// The binary part of a request, tagged with its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub bytes: Arc<[u8]>,
    pub media_type: String,
}

/// Everything the extraction capability needs for one call.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    pub system_instruction: String,
    pub user_instruction: String,
    pub attachment: Attachment,
    /// JSON Schema the response must satisfy.
    pub schema: Value,
}

/// Pull the single document out of a submission.
///
/// Zero documents, more than one document, or an empty payload are all
/// rejected before any network call.
pub fn single_document(submission: Submission) -> Result<Document, AnalysisError> {
    let mut documents = submission.documents.into_iter();
    let document = documents
        .next()
        .ok_or_else(|| AnalysisError::malformed("no document provided"))?;
    let extra = documents.count();
    if extra > 0 {
        return Err(AnalysisError::malformed(format!(
            "expected exactly one document, got {}",
            extra + 1
        )));
    }
    if document.bytes.is_empty() {
        return Err(AnalysisError::malformed("document payload is empty"));
    }
    Ok(document)
}

/// Build the extraction request for `document`.
pub fn build_request(document: &Document, config: &AnalysisConfig) -> ExtractionRequest {
    let schema = target_schema();
    let user_prompt = config.user_prompt.as_deref().unwrap_or(DEFAULT_USER_PROMPT);
    ExtractionRequest {
        system_instruction: config
            .system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
            .to_string(),
        user_instruction: format!("{user_prompt}\n\n{}", output_contract(&schema)),
        attachment: Attachment {
            bytes: Arc::clone(&document.bytes),
            media_type: document
                .media_type
                .clone()
                .unwrap_or_else(|| config.media_type.clone()),
        },
        schema,
    }
}
