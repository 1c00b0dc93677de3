//! # doc-scorecard
//!
//! Analyse a PDF document with a multimodal model and turn the answer into a
//! risk scorecard.
//!
//! ## Why this crate?
//!
//! Reviewing contracts and forms for missing signatures, blank fields or
//! skipped pages is tedious. A multimodal model can read the whole PDF and
//! report what it finds, but its answer is free text that may be wrapped in
//! fences, arrive token by token, or simply be wrong. This crate pins the
//! answer to a schema, validates it while it streams, scores every field,
//! and makes sure the same document is never paid for twice.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF bytes
//!  │
//!  ├─ 1. Request   exactly one document → instructions + attachment + schema
//!  ├─ 2. Cache     SHA-256 fingerprint; join in-flight or return completed
//!  ├─ 3. Extract   one model call, streamed as text chunks
//!  ├─ 4. Validate  repair each prefix, validate partially, emit snapshots
//!  ├─ 5. Finalize  full validation of the complete object
//!  └─ 6. Score     Low / Medium / High per field and missing page
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doc_scorecard::{analyze_file, scorecard, AnalysisConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = AnalysisConfig::default();
//!     let output = analyze_file("contract.pdf", &config).await?;
//!     println!("{}", scorecard::render(&output.scored));
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc-scorecard` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! doc-scorecard = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod cache;
pub mod capability;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod risk;
pub mod schema;
pub mod scorecard;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze_file, Analyzer};
pub use cache::{CachePolicy, CacheStatus, EntryState, Fingerprint, ResultCache};
pub use capability::{ExtractionCapability, TokenStream};
pub use config::{AnalysisConfig, AnalysisConfigBuilder};
pub use error::{AnalysisError, SchemaError};
pub use output::{AnalysisOutput, Inconsistency, RiskDistribution, ScoredAnalysis, ScoredField, ScoredMissingPage};
pub use pipeline::dispatch::DispatchState;
pub use pipeline::llm::LlmCapability;
pub use pipeline::request::{Document, ExtractionRequest, Submission};
pub use risk::{classify, Severity};
pub use schema::{DocumentAnalysis, FieldResult, MissingPage, PageIntegrity, PartialAnalysis};
pub use stream::{AnalysisEvent, AnalysisStream};
