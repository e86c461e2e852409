//! End-to-end verification flow: captured event -> trace ID -> observed
//! forest -> embedding decision.

use std::time::Duration;

use tracing::{debug, error};

use crate::backend::{CapturedEvent, EventSink, TraceBackend};
use crate::correlate::{correlate_trace_id, TraceId};
use crate::error::{ConformanceError, Result};
use crate::poll::{poll_events, poll_trace, PollConfig};
use crate::tree::{
    build_forest, matches_subtree, render_expected, render_forest, MatchResult, ObservedSpan,
    SpanExpectation,
};

/// Evidence of a successful verification.
#[derive(Debug)]
pub struct VerificationReport {
    pub trace_id: TraceId,
    /// The embedding that satisfied the expectation
    pub result: MatchResult,
    /// The span list the match was found in
    pub spans: Vec<ObservedSpan>,
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Ties one recording sink and one tracing backend into a verification
/// flow. One verifier instance serves one test; each `verify` call owns its
/// correlation attempt end to end and retains nothing across calls.
pub struct Verifier<S, B> {
    sink: S,
    backend: B,
    event_poll: PollConfig,
    trace_poll: PollConfig,
    verbose: bool,
}

impl<S: EventSink, B: TraceBackend> Verifier<S, B> {
    pub fn new(sink: S, backend: B) -> Self {
        Self {
            sink,
            backend,
            event_poll: PollConfig::default(),
            trace_poll: PollConfig::default(),
            verbose: true,
        }
    }

    /// Retry discipline for the event poller.
    pub fn event_poll(mut self, config: PollConfig) -> Self {
        self.event_poll = config;
        self
    }

    /// Retry discipline for the trace poller.
    pub fn trace_poll(mut self, config: PollConfig) -> Self {
        self.trace_poll = config;
        self
    }

    /// Whether a terminal failure logs the expected-vs-observed rendering
    /// at error level. The rendering is carried in the returned error
    /// either way; this only controls log output.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Verify that the pipeline produced the expected causal span tree.
    ///
    /// Polls the sink until an event satisfies `event_predicate`, extracts
    /// the originating trace ID from the captured headers, then polls the
    /// backend until the expected tree embeds in the observed forest.
    /// Per-attempt match failures are expected while ingestion catches up
    /// and are logged at debug level only; the final failure carries the
    /// full diagnostic.
    pub async fn verify<P>(
        &self,
        expected: &SpanExpectation,
        event_predicate: P,
    ) -> Result<VerificationReport>
    where
        P: Fn(&CapturedEvent) -> bool,
    {
        let events = poll_events(&self.sink, 1, &self.event_poll, event_predicate).await?;
        let trace_id = correlate_trace_id(&events)?;

        let outcome = poll_trace(&self.backend, &trace_id, &self.trace_poll, |forest| {
            matches_subtree(expected, forest).is_match()
        })
        .await?;

        // Spans in the outcome already passed the builder inside the poll
        // loop, so this rebuild cannot newly fail; it re-derives the forest
        // for the report and the diagnostic.
        let forest = build_forest(&outcome.spans)?;

        if outcome.matched() {
            let result = matches_subtree(expected, &forest);
            debug!(
                %trace_id,
                attempts = outcome.attempts,
                spans = outcome.spans.len(),
                "expected span tree found"
            );
            return Ok(VerificationReport {
                trace_id,
                result,
                spans: outcome.spans,
                attempts: outcome.attempts,
                elapsed: outcome.elapsed,
            });
        }

        let diagnostic = format!(
            "expected span tree:\n{}last observed forest ({} span(s)):\n{}",
            render_expected(expected),
            outcome.spans.len(),
            render_forest(&forest),
        );
        if self.verbose {
            error!(
                %trace_id,
                attempts = outcome.attempts,
                elapsed = ?outcome.elapsed,
                "trace never matched expected span tree\n{diagnostic}"
            );
        }
        Err(ConformanceError::TraceWaitTimeout {
            trace_id,
            attempts: outcome.attempts,
            elapsed: outcome.elapsed,
            last_error: outcome.last_error,
            diagnostic,
        })
    }
}
