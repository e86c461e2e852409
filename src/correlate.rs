//! Cross-system correlation: captured event headers -> trace identifier.
//!
//! The recording sink stores the HTTP headers each event arrived with; the
//! W3C trace-context `traceparent` header among them names the trace the
//! tracing backend filed the pipeline's spans under.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::CapturedEvent;
use crate::error::{ConformanceError, Result};

/// A validated trace identifier: 32 lowercase hex characters, not all zero.
///
/// Extracted once per verified event and never reused across captured
/// events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(String);

impl TraceId {
    /// Validate a raw trace-ID field. Mixed-case hex is accepted and
    /// normalized to lowercase; the all-zero ID is the spec's "no trace"
    /// sentinel and is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() != 32 || !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let normalized = raw.to_ascii_lowercase();
        if normalized.bytes().all(|b| b == b'0') {
            return None;
        }
        Some(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract a trace ID from one event's recorded headers.
///
/// Finds the `traceparent` header case-insensitively and parses the
/// `version-traceid-parentid-flags` format. Absent or malformed headers are
/// "not found", never an error; whether that is fatal depends on the whole
/// captured set (see [`correlate_trace_id`]).
pub fn extract_trace_id(headers: &HashMap<String, String>) -> Option<TraceId> {
    let value = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("traceparent"))
        .map(|(_, value)| value.trim())?;
    parse_traceparent(value)
}

/// Parse a W3C `traceparent` value: `00-<32 hex>-<16 hex>-<2 hex>`.
fn parse_traceparent(value: &str) -> Option<TraceId> {
    let mut fields = value.split('-');
    let version = fields.next()?;
    let trace_id = fields.next()?;
    let parent_id = fields.next()?;
    let flags = fields.next()?;

    // Version ff is forbidden; future versions may append fields, which is
    // why trailing fields are not rejected.
    if version.len() != 2 || !is_hex(version) || version.eq_ignore_ascii_case("ff") {
        return None;
    }
    if parent_id.len() != 16 || !is_hex(parent_id) || parent_id.bytes().all(|b| b == b'0') {
        return None;
    }
    if flags.len() != 2 || !is_hex(flags) {
        return None;
    }
    TraceId::parse(trace_id)
}

fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Determine the single originating trace ID for a captured event set.
///
/// The first event carrying a well-formed trace context wins, and every
/// other carrier must agree with it. Both failure modes are test-setup
/// bugs, not transient conditions, so neither is ever retried:
/// - no carrier at all means the system under test dropped the propagation
///   context somewhere;
/// - more than one distinct ID means the test observed more than one
///   originating trace.
pub fn correlate_trace_id(events: &[CapturedEvent]) -> Result<TraceId> {
    let mut distinct: Vec<TraceId> = Vec::new();
    for event in events {
        if let Some(trace_id) = extract_trace_id(&event.headers) {
            if !distinct.contains(&trace_id) {
                distinct.push(trace_id);
            }
        }
    }
    match distinct.len() {
        0 => Err(ConformanceError::NoTraceContext {
            events: events.len(),
        }),
        1 => {
            let trace_id = distinct.remove(0);
            debug!(%trace_id, events = events.len(), "correlated trace ID");
            Ok(trace_id)
        }
        _ => Err(ConformanceError::MultipleTraceIds {
            ids: distinct.into_iter().map(|id| id.0).collect(),
        }),
    }
}
