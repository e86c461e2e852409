//! Observed span types as returned by a tracing backend.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The role a span played in its network hop.
///
/// Matches the kind vocabulary of mainstream tracing backends; serialized
/// uppercase the way wire formats spell it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpanKind {
    Client,
    Server,
    Producer,
    Consumer,
    Internal,
}

impl std::fmt::Display for SpanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SpanKind::Client => "CLIENT",
            SpanKind::Server => "SERVER",
            SpanKind::Producer => "PRODUCER",
            SpanKind::Consumer => "CONSUMER",
            SpanKind::Internal => "INTERNAL",
        };
        f.write_str(s)
    }
}

/// One span record fetched from the tracing backend.
///
/// Immutable once received. The full set for one correlation attempt is
/// replaced on every poll iteration; nothing merges fetches incrementally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedSpan {
    /// Unique span identifier (16-char hex in practice)
    pub span_id: String,

    /// Parent span ID; absent for roots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,

    /// Trace identifier linking this span to its trace
    pub trace_id: String,

    /// Declared service/span name, the subject of name predicates
    pub service_name: String,

    /// Role of the span, if the backend recorded one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SpanKind>,

    /// Start time in nanoseconds since Unix epoch
    pub start_time_unix_nano: u64,

    /// Key/value annotations attached to the span
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

/// A node of the reconstructed trace forest: one span plus its children,
/// ordered by start time ascending with ties broken by span ID.
///
/// Derived, never stored: built fresh from the flat span list on every poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedTree {
    pub span: ObservedSpan,
    pub children: Vec<ObservedTree>,
}

impl ObservedTree {
    /// Total number of spans in this tree.
    pub fn span_count(&self) -> usize {
        1 + self.children.iter().map(ObservedTree::span_count).sum::<usize>()
    }
}
