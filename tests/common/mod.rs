//! In-memory fakes and fixtures shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use tracecheck::{CapturedEvent, EventSink, ObservedSpan, SpanKind, TraceBackend, TraceId};

pub const TRACE_ID: &str = "0af7651916cd43dd8448eb211c80319c";
pub const OTHER_TRACE_ID: &str = "4bf92f3577b34da6a3ce929d0e0e4736";

/// One scripted response from a fake store.
#[derive(Debug, Clone)]
pub enum Step<T> {
    Ok(T),
    Err(String),
}

fn next_step<T: Clone>(script: &Mutex<VecDeque<Step<T>>>) -> Step<T> {
    let mut script = script.lock().unwrap();
    if script.len() > 1 {
        script.pop_front().unwrap()
    } else {
        // Keep repeating the final step; polling re-reads full state forever.
        script.front().cloned().expect("script must not be empty")
    }
}

/// Tracing backend that replays a scripted sequence of fetch results, then
/// repeats the last one. Models a trace materializing over several polls.
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Step<Vec<ObservedSpan>>>>,
    fetches: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(steps: impl IntoIterator<Item = Step<Vec<ObservedSpan>>>) -> Self {
        Self {
            script: Mutex::new(steps.into_iter().collect()),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Backend that always returns the same span list.
    pub fn always(spans: Vec<ObservedSpan>) -> Self {
        Self::new([Step::Ok(spans)])
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TraceBackend for ScriptedBackend {
    async fn trace_by_id(&self, _trace_id: &TraceId) -> anyhow::Result<Vec<ObservedSpan>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match next_step(&self.script) {
            Step::Ok(spans) => Ok(spans),
            Step::Err(msg) => Err(anyhow::anyhow!(msg)),
        }
    }
}

/// Recording sink that replays scripted event listings.
pub struct ScriptedSink {
    script: Mutex<VecDeque<Step<Vec<CapturedEvent>>>>,
}

impl ScriptedSink {
    pub fn new(steps: impl IntoIterator<Item = Step<Vec<CapturedEvent>>>) -> Self {
        Self {
            script: Mutex::new(steps.into_iter().collect()),
        }
    }

    pub fn always(events: Vec<CapturedEvent>) -> Self {
        Self::new([Step::Ok(events)])
    }
}

#[async_trait]
impl EventSink for ScriptedSink {
    async fn captured_events(&self) -> anyhow::Result<Vec<CapturedEvent>> {
        match next_step(&self.script) {
            Step::Ok(events) => Ok(events),
            Step::Err(msg) => Err(anyhow::anyhow!(msg)),
        }
    }
}

pub fn span(id: &str, parent: Option<&str>, name: &str, start: u64) -> ObservedSpan {
    ObservedSpan {
        span_id: id.into(),
        parent_span_id: parent.map(Into::into),
        trace_id: TRACE_ID.into(),
        service_name: name.into(),
        kind: Some(SpanKind::Server),
        start_time_unix_nano: start,
        tags: BTreeMap::new(),
    }
}

pub fn traced_event(event_type: &str, trace_id: &str) -> CapturedEvent {
    CapturedEvent {
        event: json!({"type": event_type}),
        headers: HashMap::from([(
            "Traceparent".to_string(),
            format!("00-{trace_id}-00f067aa0ba902b7-01"),
        )]),
    }
}

pub fn untraced_event(event_type: &str) -> CapturedEvent {
    CapturedEvent {
        event: json!({"type": event_type}),
        headers: HashMap::new(),
    }
}

/// Predicate selecting events by their `type` field.
pub fn event_type_is(event_type: &'static str) -> impl Fn(&CapturedEvent) -> bool {
    move |e: &CapturedEvent| e.event.get("type").and_then(|t| t.as_str()) == Some(event_type)
}

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .with_test_writer()
        .try_init();
}
