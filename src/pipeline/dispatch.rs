//! The streaming dispatcher: one extraction call, from first chunk to a
//! finalized [`ScoredAnalysis`].
//!
//! ```text
//! Idle ──▶ Requesting ──▶ Streaming ──┬──▶ Finalized
//!                │            ⟲ chunk  │
//!                └────────────────────┴──▶ Failed
//! ```
//!
//! Every chunk is appended to a buffer and scanned once. When the scan moves
//! past a completed value, the buffer is repaired into the largest complete
//! JSON prefix and partially validated; a snapshot that
//! differs from the previous one is forwarded as
//! [`AnalysisEvent::Partial`]. An increment that fails partial validation is
//! logged and skipped, since the next chunk may well fix it. Only the full
//! buffer, once the stream has ended, decides success.

use crate::capability::ExtractionCapability;
use crate::error::AnalysisError;
use crate::output::ScoredAnalysis;
use crate::pipeline::assemble::{parse_final, PrefixScanner};
use crate::pipeline::request::ExtractionRequest;
use crate::schema::{validate, validate_partial, DocumentAnalysis, PartialAnalysis, PartialStatus};
use crate::stream::AnalysisEvent;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// Lifecycle of one extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Requesting,
    Streaming,
    Finalized,
    Failed,
}

impl DispatchState {
    pub fn is_terminal(self) -> bool {
        matches!(self, DispatchState::Finalized | DispatchState::Failed)
    }
}

/// Accumulates streamed text and tracks the dispatch state.
#[derive(Debug)]
pub struct Dispatch {
    state: DispatchState,
    buffer: String,
    scanner: PrefixScanner,
    last: Option<PartialAnalysis>,
    chunks: usize,
    skipped: usize,
}

impl Default for Dispatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatch {
    pub fn new() -> Self {
        Self {
            state: DispatchState::Idle,
            buffer: String::new(),
            scanner: PrefixScanner::default(),
            last: None,
            chunks: 0,
            skipped: 0,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Raw text received so far.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Increments that failed partial validation.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Idle → Requesting.
    pub fn begin(&mut self) {
        if self.state == DispatchState::Idle {
            self.state = DispatchState::Requesting;
        }
    }

    /// Feed one chunk. Returns a snapshot only when it changed.
    pub fn on_chunk(&mut self, chunk: &str) -> Option<PartialAnalysis> {
        if self.state.is_terminal() {
            return None;
        }
        self.state = DispatchState::Streaming;
        self.chunks += 1;
        self.buffer.push_str(chunk);

        if !self.scanner.advance(&self.buffer) {
            return None;
        }
        let fragment = self.scanner.snapshot(&self.buffer)?;
        let snapshot = match validate_partial(&fragment) {
            PartialStatus::ValidSoFar(partial) => partial,
            PartialStatus::Complete(full) => PartialAnalysis::from(&full),
            PartialStatus::Invalid(e) => {
                self.skipped += 1;
                warn!("Skipping invalid increment after chunk {}: {}", self.chunks, e);
                return None;
            }
        };

        if self.last.as_ref() == Some(&snapshot) {
            return None;
        }
        debug!(
            "Partial after chunk {}: {} field(s)",
            self.chunks,
            snapshot.field_count()
        );
        self.last = Some(snapshot.clone());
        Some(snapshot)
    }

    /// Stream ended: parse and fully validate the whole buffer.
    pub fn finish(&mut self) -> Result<DocumentAnalysis, AnalysisError> {
        if self.state != DispatchState::Streaming {
            self.state = DispatchState::Failed;
            return Err(AnalysisError::ValidationFailure {
                detail: "extraction produced no output".into(),
            });
        }
        let parsed = parse_final(&self.buffer).and_then(|value| validate(&value));
        match parsed {
            Ok(analysis) => {
                self.state = DispatchState::Finalized;
                Ok(analysis)
            }
            Err(e) => {
                self.state = DispatchState::Failed;
                Err(AnalysisError::ValidationFailure {
                    detail: e.to_string(),
                })
            }
        }
    }

    pub fn fail(&mut self) {
        self.state = DispatchState::Failed;
    }
}

/// Run one extraction to completion, bounded by `timeout`.
///
/// Partial snapshots go to `events` when a sender is given. A closed
/// receiver is not an error: the computation carries on for whoever else is
/// waiting on it.
pub async fn drive(
    capability: Arc<dyn ExtractionCapability>,
    request: ExtractionRequest,
    timeout: Duration,
    events: Option<UnboundedSender<AnalysisEvent>>,
) -> Result<ScoredAnalysis, AnalysisError> {
    match tokio::time::timeout(timeout, run(capability, request, events)).await {
        Ok(result) => result,
        Err(_) => {
            warn!("Extraction exceeded {:?}; giving up", timeout);
            Err(AnalysisError::Timeout {
                secs: timeout.as_secs(),
            })
        }
    }
}

async fn run(
    capability: Arc<dyn ExtractionCapability>,
    request: ExtractionRequest,
    events: Option<UnboundedSender<AnalysisEvent>>,
) -> Result<ScoredAnalysis, AnalysisError> {
    let mut dispatch = Dispatch::new();
    dispatch.begin();
    info!("Requesting extraction via {}", capability.name());

    let mut tokens = capability.extract(request);
    while let Some(chunk) = tokens.next().await {
        match chunk {
            Ok(text) => {
                if let (Some(snapshot), Some(tx)) = (dispatch.on_chunk(&text), events.as_ref()) {
                    let _ = tx.send(AnalysisEvent::Partial(snapshot));
                }
            }
            Err(e) => {
                dispatch.fail();
                warn!("Extraction stream failed: {}", e);
                return Err(upstream(e));
            }
        }
    }

    let analysis = dispatch.finish().map_err(|e| {
        warn!("{} ({} bytes received)", e, dispatch.buffer().len());
        e
    })?;
    if dispatch.skipped() > 0 {
        debug!("{} increment(s) were skipped before finalization", dispatch.skipped());
    }
    info!(
        "Extraction finalized: {} field(s), {} missing page(s)",
        analysis.expected_fields.len(),
        analysis.page_integrity.missing_pages.len()
    );
    Ok(ScoredAnalysis::annotate(analysis))
}

/// Errors raised inside a capability stream surface as upstream failures,
/// except a timeout, which keeps its own kind.
fn upstream(e: AnalysisError) -> AnalysisError {
    match e {
        AnalysisError::UpstreamFailure { .. } | AnalysisError::Timeout { .. } => e,
        other => AnalysisError::UpstreamFailure {
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::TokenStream;
    use crate::config::AnalysisConfig;
    use crate::pipeline::request::{build_request, Document};
    use crate::risk::Severity;
    use futures::stream;
    use tokio::sync::mpsc;

    const FULL: &str = r#"{
        "hasSignature": false,
        "expectedFields": [
            { "fieldName": "Signature Date", "present": false, "riskLevel": 85 },
            { "fieldName": "Party Name", "present": true, "riskLevel": 5 }
        ],
        "pageIntegrity": { "isComplete": true, "totalPages": 2, "missingPages": [] }
    }"#;

    struct Scripted(Vec<Result<String, AnalysisError>>);

    impl ExtractionCapability for Scripted {
        fn extract(&self, _request: ExtractionRequest) -> TokenStream {
            stream::iter(self.0.clone()).boxed()
        }
    }

    struct Silent;

    impl ExtractionCapability for Silent {
        fn extract(&self, _request: ExtractionRequest) -> TokenStream {
            stream::pending::<Result<String, AnalysisError>>().boxed()
        }
    }

    fn request() -> ExtractionRequest {
        build_request(&Document::new(b"%PDF-1.4".to_vec()), &AnalysisConfig::default())
    }

    fn chunks(text: &str, size: usize) -> Vec<Result<String, AnalysisError>> {
        text.as_bytes()
            .chunks(size)
            .map(|c| Ok(String::from_utf8_lossy(c).into_owned()))
            .collect()
    }

    #[test]
    fn state_moves_through_streaming_to_finalized() {
        let mut d = Dispatch::new();
        assert_eq!(d.state(), DispatchState::Idle);
        d.begin();
        assert_eq!(d.state(), DispatchState::Requesting);
        d.on_chunk(FULL);
        assert_eq!(d.state(), DispatchState::Streaming);
        let analysis = d.finish().unwrap();
        assert_eq!(d.state(), DispatchState::Finalized);
        assert_eq!(analysis.expected_fields.len(), 2);
    }

    #[test]
    fn unchanged_snapshots_are_not_repeated() {
        let mut d = Dispatch::new();
        d.begin();
        assert!(d.on_chunk("```json\n").is_none(), "nothing parseable yet");
        assert!(d.on_chunk("{").is_some());
        assert!(d.on_chunk(r#""hasSig"#).is_none());
        let snap = d.on_chunk(r#"nature": true,"#).unwrap();
        assert_eq!(snap.has_signature, Some(true));
    }

    #[test]
    fn invalid_increment_is_skipped_not_fatal() {
        let mut d = Dispatch::new();
        d.begin();
        assert!(d.on_chunk(r#"{"hasSignature": "yes","#).is_none());
        assert_eq!(d.skipped(), 1);
        assert_eq!(d.state(), DispatchState::Streaming);
    }

    #[test]
    fn prose_with_braces_around_the_object_still_finalizes() {
        let mut d = Dispatch::new();
        d.begin();
        d.on_chunk("Here is the JSON {as requested}:\n");
        let snap = d.on_chunk(FULL).unwrap();
        assert_eq!(snap.field_count(), 2);
        assert!(d.on_chunk("\nNote: fields follow the {fieldName} convention.").is_none());
        let analysis = d.finish().unwrap();
        assert_eq!(d.state(), DispatchState::Finalized);
        assert_eq!(analysis.expected_fields[0].field_name, "Signature Date");
    }

    #[test]
    fn chunks_inside_a_string_do_not_revalidate() {
        let mut d = Dispatch::new();
        d.begin();
        assert!(d.on_chunk(r#"{"hasSignature": "yes", "notes": "a"#).is_none());
        assert_eq!(d.skipped(), 1);
        for _ in 0..5 {
            assert!(d.on_chunk(" long note").is_none());
        }
        assert_eq!(d.skipped(), 1, "no completed value, nothing re-checked");
    }

    #[test]
    fn truncated_stream_fails_validation() {
        let mut d = Dispatch::new();
        d.begin();
        d.on_chunk(&FULL[..FULL.len() / 2]);
        let err = d.finish().unwrap_err();
        assert!(matches!(err, AnalysisError::ValidationFailure { .. }));
        assert_eq!(d.state(), DispatchState::Failed);
    }

    #[test]
    fn empty_stream_fails_validation() {
        let mut d = Dispatch::new();
        d.begin();
        assert!(matches!(d.finish(), Err(AnalysisError::ValidationFailure { .. })));
    }

    #[tokio::test]
    async fn drive_emits_partials_then_scores() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scored = drive(
            Arc::new(Scripted(chunks(FULL, 16))),
            request(),
            Duration::from_secs(5),
            Some(tx),
        )
        .await
        .unwrap();

        assert_eq!(scored.fields[0].severity, Severity::High);
        assert_eq!(scored.fields[1].severity, Severity::Low);

        let mut partials = 0;
        let mut last_count = 0;
        while let Ok(event) = rx.try_recv() {
            match event {
                AnalysisEvent::Partial(p) => {
                    assert!(p.field_count() >= last_count, "snapshots only grow");
                    last_count = p.field_count();
                    partials += 1;
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert!(partials > 1);
        assert_eq!(last_count, 2);
    }

    #[tokio::test]
    async fn capability_error_is_upstream_failure() {
        let script = vec![
            Ok("{\"hasSignature\": true,".to_string()),
            Err(AnalysisError::Internal("socket closed".into())),
        ];
        let err = drive(Arc::new(Scripted(script)), request(), Duration::from_secs(5), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::UpstreamFailure { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test(start_paused = true)]
    async fn silent_capability_times_out() {
        let err = drive(Arc::new(Silent), request(), Duration::from_secs(60), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Timeout { secs: 60 }));
    }
}
