//! Expected and observed span trees, and the embedding search between them.
//!
//! The two sides of the data model:
//!
//! ```text
//! SpanExpectation (what the test declares)     ObservedTree (what the backend returned)
//!   ├── name: Any | Exact | Pattern              ├── span: ObservedSpan
//!   ├── kind: Option<SpanKind>                   │     ├── span_id / parent_span_id / trace_id
//!   └── children: Vec<SpanExpectation>           │     ├── service_name, kind, start time, tags
//!       (ordered)                                └── children: Vec<ObservedTree>
//!                                                    (start time asc, ties by span ID)
//! ```
//!
//! `builder::build_forest` turns a flat span fetch into an observed forest;
//! `matcher::matches_subtree` searches that forest for a tolerant ordered
//! embedding of the expectation; `render` draws both for failure output.

pub mod builder;
pub mod expect;
pub mod matcher;
pub mod render;
pub mod span;

pub use builder::build_forest;
pub use expect::{NamePredicate, SpanExpectation};
pub use matcher::{matches_subtree, MatchBinding, MatchResult};
pub use render::{pretty_print_trace, render_expected, render_forest};
pub use span::{ObservedSpan, ObservedTree, SpanKind};
