//! Human-readable renderings for failure diagnostics.
//!
//! These exist so a terminal failure can be diffed by eye: the expected
//! shape, the best-effort observed forest, and the raw span list as fetched.

use chrono::DateTime;

use super::expect::SpanExpectation;
use super::span::{ObservedSpan, ObservedTree};

/// Render the expected tree, one node per line, two spaces per depth level.
pub fn render_expected(expected: &SpanExpectation) -> String {
    let mut out = String::new();
    render_expected_node(expected, 0, &mut out);
    out
}

fn render_expected_node(node: &SpanExpectation, depth: usize, out: &mut String) {
    out.push_str(&"  ".repeat(depth));
    match node.kind {
        Some(kind) => out.push_str(&format!("{} [{kind}]\n", node.name)),
        None => out.push_str(&format!("{}\n", node.name)),
    }
    for child in &node.children {
        render_expected_node(child, depth + 1, out);
    }
}

/// Render the observed forest in the same indented shape as the expected
/// tree, so the two renderings line up for an eyeball diff.
pub fn render_forest(forest: &[ObservedTree]) -> String {
    if forest.is_empty() {
        return "  (no spans observed)\n".to_string();
    }
    let mut out = String::new();
    for tree in forest {
        render_observed_node(tree, 0, &mut out);
    }
    out
}

fn render_observed_node(node: &ObservedTree, depth: usize, out: &mut String) {
    out.push_str(&"  ".repeat(depth));
    let kind = node
        .span
        .kind
        .map(|k| format!(" [{k}]"))
        .unwrap_or_default();
    out.push_str(&format!(
        "{}{kind} (span {}, start {})\n",
        node.span.service_name,
        node.span.span_id,
        humanize_nanos(node.span.start_time_unix_nano),
    ));
    for child in &node.children {
        render_observed_node(child, depth + 1, out);
    }
}

/// Dump a raw span list as fetched, before any tree reconstruction. Useful
/// when the fetch itself is the thing in question (mid-ingestion traces).
pub fn pretty_print_trace(spans: &[ObservedSpan]) -> String {
    if spans.is_empty() {
        return "(empty trace)".to_string();
    }
    let mut lines: Vec<String> = spans
        .iter()
        .map(|s| {
            format!(
                "span={} parent={} service={} start={}",
                s.span_id,
                s.parent_span_id.as_deref().unwrap_or("-"),
                s.service_name,
                humanize_nanos(s.start_time_unix_nano),
            )
        })
        .collect();
    lines.sort();
    lines.join("\n")
}

fn humanize_nanos(nanos: u64) -> String {
    DateTime::from_timestamp_nanos(nanos as i64).to_rfc3339()
}
