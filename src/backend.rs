//! Capability interfaces for the two external stores.
//!
//! Both are polled, never pushed: the recording sink that captured the
//! terminal event with its HTTP headers, and the tracing backend that
//! ingested the spans. Each trait has exactly the one operation the
//! verification flow needs; test suites implement them over whatever
//! transport their infrastructure exposes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::correlate::TraceId;
use crate::tree::ObservedSpan;

/// One event captured by the recording sink, together with the propagation
/// headers it arrived with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedEvent {
    /// The event payload as the sink recorded it
    pub event: Value,

    /// HTTP headers recorded alongside the event. Header name casing is
    /// whatever the sink stored; lookups must not assume canonical casing.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// Read access to the recording sink. The sink is a dumb store; predicate
/// filtering happens on the caller's side.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// List every event captured so far. Re-read in full on every poll;
    /// capture order is not guaranteed stable across reads.
    async fn captured_events(&self) -> anyhow::Result<Vec<CapturedEvent>>;
}

/// Read access to the tracing backend.
#[async_trait]
pub trait TraceBackend: Send + Sync {
    /// Fetch the complete span list for one trace. An empty list means the
    /// trace has not been ingested yet, which is normal and retryable.
    async fn trace_by_id(&self, trace_id: &TraceId) -> anyhow::Result<Vec<ObservedSpan>>;
}

// Shared handles work wherever the stores themselves do, so a test can keep
// a handle to its fake while the verifier owns another.

#[async_trait]
impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    async fn captured_events(&self) -> anyhow::Result<Vec<CapturedEvent>> {
        (**self).captured_events().await
    }
}

#[async_trait]
impl<T: TraceBackend + ?Sized> TraceBackend for Arc<T> {
    async fn trace_by_id(&self, trace_id: &TraceId) -> anyhow::Result<Vec<ObservedSpan>> {
        (**self).trace_by_id(trace_id).await
    }
}
