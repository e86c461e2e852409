//! Forest reconstruction from a flat span list.
//!
//! The backend returns spans in no particular order, possibly mid-ingestion.
//! Too few spans is a normal, retryable state and never an error here; only
//! structurally impossible input (conflicting span-ID reuse, parent cycles)
//! is rejected.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{ConformanceError, Result};

use super::span::{ObservedSpan, ObservedTree};

/// Reconstruct the observed forest for one trace fetch.
///
/// Spans whose declared parent is absent from the fetch become forest roots;
/// this covers both true roots and apparent orphans from partial ingestion.
/// Roots and children are ordered by start time ascending, ties broken by
/// span ID, so identical input always yields an identical forest.
pub fn build_forest(spans: &[ObservedSpan]) -> Result<Vec<ObservedTree>> {
    if spans.is_empty() {
        return Ok(Vec::new());
    }

    // Index by span ID. Byte-identical re-delivery of a span is normal
    // during ingestion; the same ID on two conflicting records is not.
    let mut by_id: BTreeMap<&str, &ObservedSpan> = BTreeMap::new();
    for span in spans {
        match by_id.get(span.span_id.as_str()) {
            None => {
                by_id.insert(&span.span_id, span);
            }
            Some(existing) if *existing == span => {}
            Some(existing) => {
                return Err(ConformanceError::MalformedTrace {
                    detail: format!(
                        "span ID {} reused by conflicting records ({} vs {})",
                        span.span_id, existing.service_name, span.service_name
                    ),
                });
            }
        }
    }

    let mut roots: Vec<&ObservedSpan> = Vec::new();
    let mut children_of: BTreeMap<&str, Vec<&ObservedSpan>> = BTreeMap::new();
    for &span in by_id.values() {
        match span.parent_span_id.as_deref() {
            Some(parent_id) if by_id.contains_key(parent_id) => {
                children_of.entry(parent_id).or_default().push(span);
            }
            _ => roots.push(span),
        }
    }

    sort_siblings(&mut roots);
    for siblings in children_of.values_mut() {
        sort_siblings(siblings);
    }

    let mut consumed = 0usize;
    let forest: Vec<ObservedTree> = roots
        .into_iter()
        .map(|root| assemble(root, &children_of, &mut consumed))
        .collect();

    // Spans unreachable from any root have a looping parent chain.
    if consumed != by_id.len() {
        return Err(ConformanceError::MalformedTrace {
            detail: format!(
                "{} span(s) unreachable from any root (parent cycle)",
                by_id.len() - consumed
            ),
        });
    }

    debug!(
        spans = by_id.len(),
        roots = forest.len(),
        "reconstructed observed forest"
    );
    Ok(forest)
}

fn sort_siblings(siblings: &mut [&ObservedSpan]) {
    siblings.sort_by(|a, b| {
        a.start_time_unix_nano
            .cmp(&b.start_time_unix_nano)
            .then_with(|| a.span_id.cmp(&b.span_id))
    });
}

fn assemble(
    span: &ObservedSpan,
    children_of: &BTreeMap<&str, Vec<&ObservedSpan>>,
    consumed: &mut usize,
) -> ObservedTree {
    *consumed += 1;
    let children = children_of
        .get(span.span_id.as_str())
        .map(|kids| {
            kids.iter()
                .map(|kid| assemble(kid, children_of, consumed))
                .collect()
        })
        .unwrap_or_default();
    ObservedTree {
        span: span.clone(),
        children,
    }
}
