//! After-the-fact trace-conformance verification for asynchronous
//! event-driven pipelines.
//!
//! A test sends one traced request through a pipeline, a recording sink
//! captures the terminal event with its propagation headers, and a tracing
//! backend ingests the spans each hop emitted. This crate checks, under an
//! eventual-consistency retry loop, that the observed trace contains the
//! causal call shape the test expected:
//!
//! ```text
//! recording sink ──(captured event + headers)──▶ correlate::TraceId
//!                                                      │
//! tracing backend ──(flat span list, polled)──▶ tree::build_forest
//!                                                      │
//! test expectation ──(SpanExpectation)──▶ tree::matches_subtree ──▶ verdict
//! ```
//!
//! Exact equality is impossible here: ingestion is asynchronous and
//! infrastructure inserts spans of its own (proxies, retries, health
//! checks). The matcher therefore searches for a tolerant ordered embedding
//! of the expected tree anywhere in the observed forest, and the
//! [`verify::Verifier`] retries the whole observation until it appears or a
//! deadline expires.

pub mod backend;
pub mod correlate;
pub mod error;
pub mod poll;
pub mod tree;
pub mod verify;

pub use backend::{CapturedEvent, EventSink, TraceBackend};
pub use correlate::{correlate_trace_id, extract_trace_id, TraceId};
pub use error::{ConformanceError, Result};
pub use poll::{poll_events, poll_trace, PollConfig, PollStatus, TracePollOutcome};
pub use tree::{
    build_forest, matches_subtree, MatchBinding, MatchResult, NamePredicate, ObservedSpan,
    ObservedTree, SpanExpectation, SpanKind,
};
pub use verify::{VerificationReport, Verifier};
