//! The expected side of the data model: a declarative, immutable tree of
//! span expectations built once per test case.

use regex::Regex;

use super::span::{ObservedSpan, SpanKind};

/// Predicate over a span's declared service/span name.
///
/// An explicit tagged type rather than magic wildcard strings: `Any` is
/// visibly "don't care", `Pattern` carries a compiled regex.
#[derive(Debug, Clone)]
pub enum NamePredicate {
    /// Matches every name
    Any,
    /// Matches exactly this name
    Exact(String),
    /// Matches names the regex matches
    Pattern(Regex),
}

impl NamePredicate {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            NamePredicate::Any => true,
            NamePredicate::Exact(want) => want == name,
            NamePredicate::Pattern(re) => re.is_match(name),
        }
    }
}

impl std::fmt::Display for NamePredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NamePredicate::Any => f.write_str("<any>"),
            NamePredicate::Exact(name) => f.write_str(name),
            NamePredicate::Pattern(re) => write!(f, "~/{}/", re.as_str()),
        }
    }
}

/// One node of the expected causal shape.
///
/// `children` is ordered: expected sub-calls must embed into the observed
/// children in this sequence. Empty children means "don't care what happens
/// below the matched span", not "nothing may happen below it".
#[derive(Debug, Clone)]
pub struct SpanExpectation {
    pub name: NamePredicate,
    pub kind: Option<SpanKind>,
    pub children: Vec<SpanExpectation>,
}

impl SpanExpectation {
    /// Expect a span with exactly this name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: NamePredicate::Exact(name.into()),
            kind: None,
            children: Vec::new(),
        }
    }

    /// Expect a span with any name (shape-only constraint).
    pub fn any_name() -> Self {
        Self {
            name: NamePredicate::Any,
            kind: None,
            children: Vec::new(),
        }
    }

    /// Expect a span whose name matches the regex.
    pub fn name_matching(pattern: Regex) -> Self {
        Self {
            name: NamePredicate::Pattern(pattern),
            kind: None,
            children: Vec::new(),
        }
    }

    /// Constrain the span's kind. Unset means "don't care".
    pub fn kind(mut self, kind: SpanKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Append an expected sub-call. Order of calls is the order the matcher
    /// enforces.
    pub fn child(mut self, child: SpanExpectation) -> Self {
        self.children.push(child);
        self
    }

    /// Whether this node's predicate is satisfied by the observed span.
    /// Children are the matcher's concern, not this predicate's.
    pub fn matches(&self, span: &ObservedSpan) -> bool {
        if !self.name.matches(&span.service_name) {
            return false;
        }
        match self.kind {
            None => true,
            Some(want) => span.kind == Some(want),
        }
    }

    /// Total number of expectation nodes in this tree.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SpanExpectation::node_count).sum::<usize>()
    }
}
