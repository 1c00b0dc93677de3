//! Streaming analysis API: watch the result take shape.
//!
//! ## Why stream?
//!
//! A document analysis takes tens of seconds. The event feed lets callers
//! show the fields as the model reports them, drive a spinner, or bail out
//! early, instead of staring at nothing until the final object arrives.
//!
//! Unlike the terminal [`Analyzer::analyze`], [`Analyzer::analyze_stream`]
//! yields [`AnalysisEvent`]s:
//!
//! ```text
//! Started ─▶ Partial* ─▶ Finalized | Failed
//! ```
//!
//! Partial snapshots are a preview only. They are never scored and never
//! cached; rendering consumers should wait for `Finalized`.

use crate::analyze::Analyzer;
use crate::cache::Fingerprint;
use crate::error::AnalysisError;
use crate::output::AnalysisOutput;
use crate::pipeline::request::{single_document, Submission};
use crate::schema::PartialAnalysis;
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::Stream;
use tracing::debug;

/// One step in the life of a streamed analysis.
#[derive(Debug, Clone)]
pub enum AnalysisEvent {
    /// The submission was accepted. Always the first event.
    Started { fingerprint: Fingerprint },
    /// A changed, valid-so-far snapshot of the model output.
    Partial(PartialAnalysis),
    /// The scored result. Terminal.
    Finalized(AnalysisOutput),
    /// The analysis failed. Terminal.
    Failed(AnalysisError),
}

impl AnalysisEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisEvent::Finalized(_) | AnalysisEvent::Failed(_))
    }
}

/// A boxed stream of analysis events.
pub type AnalysisStream = Pin<Box<dyn Stream<Item = AnalysisEvent> + Send>>;

impl Analyzer {
    /// Analyse one submitted document, streaming events as it progresses.
    ///
    /// The submission is checked before the stream is built, so a malformed
    /// request is an `Err` here rather than a `Failed` event. Must be called
    /// from within a Tokio runtime.
    ///
    /// Only the call that starts a computation sees `Partial` events. A call
    /// that joins an in-flight computation for the same bytes, or hits the
    /// cache, goes straight from `Started` to its terminal event.
    ///
    /// Dropping the stream does not cancel the computation: it still
    /// completes and is cached for the next caller.
    ///
    /// # Example
    /// ```rust,no_run
    /// use doc_scorecard::{AnalysisConfig, AnalysisEvent, Analyzer, Document};
    /// use futures::StreamExt;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let analyzer = Analyzer::new(AnalysisConfig::default())?;
    /// let bytes = std::fs::read("contract.pdf")?;
    /// let mut events = analyzer.analyze_stream(Document::new(bytes))?;
    /// while let Some(event) = events.next().await {
    ///     match event {
    ///         AnalysisEvent::Partial(p) => eprintln!("{} field(s) so far", p.field_count()),
    ///         AnalysisEvent::Finalized(out) => println!("{:?}", out.scored.distribution()),
    ///         AnalysisEvent::Failed(e) => eprintln!("Error: {e}"),
    ///         AnalysisEvent::Started { .. } => {}
    ///     }
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn analyze_stream(&self, submission: impl Into<Submission>) -> Result<AnalysisStream, AnalysisError> {
        let document = single_document(submission.into())?;
        let fingerprint = Fingerprint::of(&document.bytes);

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(AnalysisEvent::Started {
            fingerprint: fingerprint.clone(),
        });

        let analyzer = self.clone();
        tokio::spawn(async move {
            let terminal = match analyzer.run(document, fingerprint, Some(tx.clone())).await {
                Ok(output) => AnalysisEvent::Finalized(output),
                Err(e) => AnalysisEvent::Failed(e),
            };
            if tx.send(terminal).is_err() {
                debug!("Event receiver dropped before the terminal event");
            }
        });

        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }
}
