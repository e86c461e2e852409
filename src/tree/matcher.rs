//! Tolerant ordered subtree embedding.
//!
//! Not exact isomorphism: extra observed spans are tolerated everywhere
//! (wrapper spans above the interesting root, unexpected siblings beside
//! matched nodes), but expected children must embed into observed children
//! in sequence. The search is first-fit under the deterministic forest
//! ordering, so a given input always produces the same embedding.

use super::expect::SpanExpectation;
use super::span::{ObservedSpan, ObservedTree};

/// One (expected node, observed span) pair of a successful embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchBinding {
    /// Rendered form of the expectation's predicate
    pub expectation: String,
    pub span_id: String,
    pub service_name: String,
}

impl MatchBinding {
    fn new(expected: &SpanExpectation, span: &ObservedSpan) -> Self {
        let expectation = match expected.kind {
            Some(kind) => format!("{} [{kind}]", expected.name),
            None => expected.name.to_string(),
        };
        Self {
            expectation,
            span_id: span.span_id.clone(),
            service_name: span.service_name.clone(),
        }
    }
}

/// The outcome of one embedding search. Empty bindings means no match; a
/// non-empty result binds every node of the expected tree, in pre-order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    bindings: Vec<MatchBinding>,
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        !self.bindings.is_empty()
    }

    pub fn bindings(&self) -> &[MatchBinding] {
        &self.bindings
    }
}

impl std::fmt::Display for MatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.bindings.is_empty() {
            return f.write_str("no matching embedding");
        }
        for binding in &self.bindings {
            writeln!(
                f,
                "  {} -> {} (span {})",
                binding.expectation, binding.service_name, binding.span_id
            )?;
        }
        Ok(())
    }
}

/// Search the forest for an embedding of the expected tree.
///
/// For each observed tree in order: try a rooted match at its root; if that
/// fails, retry the whole expected tree against the root's children. Rooting
/// deeper models infrastructure that inserts wrapper spans (a proxy, a
/// sidecar) above the span the test actually cares about.
pub fn matches_subtree(expected: &SpanExpectation, forest: &[ObservedTree]) -> MatchResult {
    for tree in forest {
        if let Some(bindings) = rooted_match(expected, tree) {
            return MatchResult { bindings };
        }
        let deeper = matches_subtree(expected, &tree.children);
        if deeper.is_match() {
            return deeper;
        }
    }
    MatchResult::default()
}

/// Match the expected tree with its root pinned to this exact observed node.
fn rooted_match(expected: &SpanExpectation, node: &ObservedTree) -> Option<Vec<MatchBinding>> {
    if !expected.matches(&node.span) {
        return None;
    }
    let child_bindings = embed_children(&expected.children, &node.children)?;
    let mut bindings = Vec::with_capacity(1 + child_bindings.len());
    bindings.push(MatchBinding::new(expected, &node.span));
    bindings.extend(child_bindings);
    Some(bindings)
}

/// Embed every expected child, in order, into the observed children, in
/// order. Observed children that match nothing are skipped; an expected
/// child that only matches an already-passed position fails the embedding.
///
/// Backtracks explicitly: when binding the first expected child at one
/// position leaves the rest unmatchable, the binding is retried further
/// right before giving up.
fn embed_children(
    expected: &[SpanExpectation],
    observed: &[ObservedTree],
) -> Option<Vec<MatchBinding>> {
    let Some((first, rest)) = expected.split_first() else {
        // An expected leaf says nothing about what happens below the match.
        return Some(Vec::new());
    };
    for (i, candidate) in observed.iter().enumerate() {
        if let Some(head) = rooted_match(first, candidate) {
            if let Some(tail) = embed_children(rest, &observed[i + 1..]) {
                let mut bindings = head;
                bindings.extend(tail);
                return Some(bindings);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::builder::build_forest;
    use crate::tree::span::SpanKind;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn span(id: &str, parent: Option<&str>, name: &str, start: u64) -> ObservedSpan {
        ObservedSpan {
            span_id: id.into(),
            parent_span_id: parent.map(Into::into),
            trace_id: "trace-1".into(),
            service_name: name.into(),
            kind: Some(SpanKind::Server),
            start_time_unix_nano: start,
            tags: BTreeMap::new(),
        }
    }

    fn forest(spans: &[ObservedSpan]) -> Vec<ObservedTree> {
        build_forest(spans).expect("well-formed test spans")
    }

    fn matched_services(result: &MatchResult) -> Vec<&str> {
        result
            .bindings()
            .iter()
            .map(|b| b.service_name.as_str())
            .collect()
    }

    #[test]
    fn test_single_node_match() {
        let observed = forest(&[span("a", None, "ingress", 1)]);
        let result = matches_subtree(&SpanExpectation::named("ingress"), &observed);
        assert!(result.is_match());
        assert_eq!(matched_services(&result), vec!["ingress"]);
    }

    #[test]
    fn test_empty_forest_never_matches() {
        let result = matches_subtree(&SpanExpectation::named("ingress"), &[]);
        assert!(!result.is_match());
    }

    #[test]
    fn test_extra_sibling_tolerated() {
        // Expected A -> B; observed A -> {X, B}. X is skipped.
        let observed = forest(&[
            span("a", None, "A", 1),
            span("x", Some("a"), "X", 2),
            span("b", Some("a"), "B", 3),
        ]);
        let expected = SpanExpectation::named("A").child(SpanExpectation::named("B"));
        let result = matches_subtree(&expected, &observed);
        assert!(result.is_match());
        assert_eq!(matched_services(&result), vec!["A", "B"]);
    }

    #[test]
    fn test_expected_children_out_of_order_fail() {
        // Expected A -> [B, C]; observed has C starting before B.
        let observed = forest(&[
            span("a", None, "A", 1),
            span("c", Some("a"), "C", 2),
            span("b", Some("a"), "B", 3),
        ]);
        let expected = SpanExpectation::named("A")
            .child(SpanExpectation::named("B"))
            .child(SpanExpectation::named("C"));
        assert!(!matches_subtree(&expected, &observed).is_match());

        // The reverse expectation agrees with the observed order.
        let expected = SpanExpectation::named("A")
            .child(SpanExpectation::named("C"))
            .child(SpanExpectation::named("B"));
        assert!(matches_subtree(&expected, &observed).is_match());
    }

    #[test]
    fn test_wrapper_span_above_root_skipped() {
        // Expected B alone; observed Proxy -> B.
        let observed = forest(&[
            span("p", None, "Proxy", 1),
            span("b", Some("p"), "B", 2),
        ]);
        let result = matches_subtree(&SpanExpectation::named("B"), &observed);
        assert!(result.is_match());
        assert_eq!(result.bindings()[0].span_id, "b");
    }

    #[test]
    fn test_expected_leaf_ignores_observed_children() {
        let observed = forest(&[
            span("a", None, "A", 1),
            span("b", Some("a"), "B", 2),
            span("c", Some("b"), "C", 3),
        ]);
        // Expecting just A -> B says nothing about C below B.
        let expected = SpanExpectation::named("A").child(SpanExpectation::named("B"));
        assert!(matches_subtree(&expected, &observed).is_match());
    }

    #[test]
    fn test_sibling_with_wrong_shape_skipped() {
        // Two children named "worker"; only the second has the grandchild the
        // expectation demands. The first must be skipped, not fail the match.
        let observed = forest(&[
            span("a", None, "A", 1),
            span("w1", Some("a"), "worker", 2),
            span("w2", Some("a"), "worker", 3),
            span("g", Some("w2"), "flush", 4),
            span("d", Some("a"), "done", 5),
        ]);
        let expected = SpanExpectation::named("A")
            .child(SpanExpectation::named("worker").child(SpanExpectation::named("flush")))
            .child(SpanExpectation::named("done"));
        let result = matches_subtree(&expected, &observed);
        assert!(result.is_match());
        let ids: Vec<&str> = result.bindings().iter().map(|b| b.span_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "w2", "g", "d"]);
    }

    #[test]
    fn test_kind_constraint_enforced_in_tree() {
        let mut client = span("b", Some("a"), "B", 2);
        client.kind = Some(SpanKind::Client);
        let observed = forest(&[span("a", None, "A", 1), client]);
        let expected = SpanExpectation::named("A")
            .child(SpanExpectation::named("B").kind(SpanKind::Server));
        assert!(!matches_subtree(&expected, &observed).is_match());
        let expected = SpanExpectation::named("A")
            .child(SpanExpectation::named("B").kind(SpanKind::Client));
        assert!(matches_subtree(&expected, &observed).is_match());
    }

    #[test]
    fn test_first_fit_is_deterministic() {
        let spans = vec![
            span("a", None, "A", 1),
            span("b1", Some("a"), "B", 2),
            span("b2", Some("a"), "B", 3),
        ];
        let observed = forest(&spans);
        let expected = SpanExpectation::named("A").child(SpanExpectation::named("B"));
        let first = matches_subtree(&expected, &observed);
        let second = matches_subtree(&expected, &observed);
        assert_eq!(first, second);
        // First-fit picks the earlier-starting B.
        assert_eq!(first.bindings()[1].span_id, "b1");
    }

    #[test]
    fn test_bindings_are_preorder() {
        let observed = forest(&[
            span("a", None, "A", 1),
            span("b", Some("a"), "B", 2),
            span("c", Some("b"), "C", 3),
            span("d", Some("a"), "D", 4),
        ]);
        let expected = SpanExpectation::named("A")
            .child(SpanExpectation::named("B").child(SpanExpectation::named("C")))
            .child(SpanExpectation::named("D"));
        let result = matches_subtree(&expected, &observed);
        assert_eq!(matched_services(&result), vec!["A", "B", "C", "D"]);
    }
}
