//! Error taxonomy for conformance verification.
//!
//! Only non-retryable conditions are represented here. Transient conditions
//! (backend unreachable, trace not yet ingested, too few matching events) are
//! swallowed inside the poll loops and surface only through the timeout
//! variants, which carry the last observed state for diagnosis.

use std::time::Duration;
use thiserror::Error;

use crate::correlate::TraceId;

#[derive(Error, Debug)]
pub enum ConformanceError {
    /// Structurally impossible span data. Never retried: a backend that
    /// returns two conflicting records for one span ID will keep doing so.
    #[error("malformed trace data: {detail}")]
    MalformedTrace { detail: String },

    /// No captured event carried a parseable trace context. This is a
    /// propagation bug in the system under test, not a transient condition.
    #[error(
        "no trace context found in {events} captured event(s)\n\n\
         The system under test did not propagate a traceparent header to the \
         recording sink. This is a test-setup failure and will not resolve by \
         waiting."
    )]
    NoTraceContext { events: usize },

    /// Captured events carried more than one distinct trace ID. A test
    /// verifies exactly one originating trace.
    #[error(
        "captured events carry {} distinct trace IDs: {ids:?}\n\n\
         Each verification correlates exactly one originating trace. Multiple \
         IDs mean the test sent more than one traced request, or unrelated \
         traffic reached the recording sink.",
        .ids.len()
    )]
    MultipleTraceIds { ids: Vec<String> },

    /// The event poller exhausted its deadline before enough events matched.
    #[error(
        "timed out after {elapsed:?} waiting for {wanted} matching event(s); \
         saw {matched} (last sink error: {})",
        .last_error.as_deref().unwrap_or("none")
    )]
    EventWaitTimeout {
        wanted: usize,
        matched: usize,
        elapsed: Duration,
        last_error: Option<String>,
    },

    /// The trace poller exhausted its deadline before the expected shape
    /// appeared. Carries everything needed to diagnose without re-running.
    #[error(
        "trace {trace_id} did not match the expected span tree after \
         {attempts} attempt(s) over {elapsed:?} (last backend error: {})\n{diagnostic}",
        .last_error.as_deref().unwrap_or("none")
    )]
    TraceWaitTimeout {
        trace_id: TraceId,
        attempts: u32,
        elapsed: Duration,
        last_error: Option<String>,
        diagnostic: String,
    },
}

pub type Result<T> = std::result::Result<T, ConformanceError>;
