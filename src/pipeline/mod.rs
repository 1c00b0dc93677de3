//! Pipeline stages for document analysis.
//!
//! Each submodule implements one step. Keeping them apart lets each be tested
//! without a model, and lets the extraction backend change without touching
//! the rest.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ request ──▶ llm ──▶ dispatch ──▶ assemble
//! (path/URL) (prompt)  (model)  (states)    (JSON repair)
//! ```
//!
//! 1. [`input`]    — read a local file or download a URL into a `Document`
//! 2. [`request`]  — validate the submission and build the extraction request
//! 3. [`llm`]      — default extraction capability over `edgequake_llm`
//! 4. [`dispatch`] — consume the token stream, emit partials, finalize
//! 5. [`assemble`] — turn streamed text into JSON, complete or repaired

pub mod assemble;
pub mod dispatch;
pub mod input;
pub mod llm;
pub mod request;
