//! The two polling state machines behind conformance verification.
//!
//! Span ingestion into the tracing backend is asynchronous and eventually
//! consistent, so both pollers share one retry discipline: fixed interval,
//! hard deadline, no backoff growth (ingestion latency is roughly uniform,
//! not exponential). Transient failures never abort a loop early; they only
//! consume time against the deadline.
//!
//! Trace poller state machine: Idle -> Polling -> {Matched | TimedOut},
//! with Polling re-entered on every interval tick.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::backend::{CapturedEvent, EventSink, TraceBackend};
use crate::correlate::TraceId;
use crate::error::{ConformanceError, Result};
use crate::tree::{build_forest, ObservedSpan, ObservedTree};

/// Retry discipline for one poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Sleep between fetch attempts
    pub interval: Duration,
    /// Hard deadline for the whole loop
    pub timeout: Duration,
}

impl PollConfig {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

impl Default for PollConfig {
    /// One fetch per second under a five-minute deadline, which covers the
    /// ingestion latency of the backends this was written against.
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(300),
        }
    }
}

/// Terminal state of a trace poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    Matched,
    TimedOut,
}

/// Everything one trace-poll run learned, success or not.
///
/// An explicit value rather than a "last error" captured by a retry
/// closure: the caller gets the final raw span list either way, so a
/// timeout can still be rendered into a useful diagnostic.
#[derive(Debug)]
pub struct TracePollOutcome {
    pub status: PollStatus,
    /// The span list from the final fetch (possibly empty)
    pub spans: Vec<ObservedSpan>,
    /// The most recent backend query error, if any attempt failed
    pub last_error: Option<String>,
    pub attempts: u32,
    pub elapsed: Duration,
}

impl TracePollOutcome {
    pub fn matched(&self) -> bool {
        self.status == PollStatus::Matched
    }
}

/// Repeatedly fetch the trace, rebuild its forest, and evaluate the
/// predicate until it holds or the deadline expires.
///
/// Backend query errors are transient: recorded as `last_error`, retried
/// until the deadline, never confused with "trace absent". Malformed span
/// data from the builder is not transient and propagates immediately.
/// Timeout is reported in the outcome, not as an error; only the caller
/// knows whether this attempt was the terminal one.
pub async fn poll_trace<B, P>(
    backend: &B,
    trace_id: &TraceId,
    config: &PollConfig,
    mut predicate: P,
) -> Result<TracePollOutcome>
where
    B: TraceBackend + ?Sized,
    P: FnMut(&[ObservedTree]) -> bool,
{
    let started = Instant::now();
    let mut attempts: u32 = 0;
    let mut last_error: Option<String> = None;
    let mut last_spans: Vec<ObservedSpan> = Vec::new();

    loop {
        attempts += 1;
        match backend.trace_by_id(trace_id).await {
            Ok(spans) => {
                last_spans = spans;
                let forest = build_forest(&last_spans)?;
                if predicate(&forest) {
                    debug!(%trace_id, attempts, spans = last_spans.len(), "trace matched");
                    return Ok(TracePollOutcome {
                        status: PollStatus::Matched,
                        spans: last_spans,
                        last_error,
                        attempts,
                        elapsed: started.elapsed(),
                    });
                }
                debug!(
                    %trace_id,
                    attempts,
                    spans = last_spans.len(),
                    "trace fetched but predicate not yet satisfied"
                );
            }
            Err(err) => {
                warn!(%trace_id, attempts, error = %err, "trace fetch failed, will retry");
                last_error = Some(err.to_string());
            }
        }

        if started.elapsed() + config.interval > config.timeout {
            break;
        }
        tokio::time::sleep(config.interval).await;
    }

    Ok(TracePollOutcome {
        status: PollStatus::TimedOut,
        spans: last_spans,
        last_error,
        attempts,
        elapsed: started.elapsed(),
    })
}

/// Repeatedly list the sink's captured events until at least `min_count`
/// satisfy the predicate, or fail fatally on deadline exhaustion.
///
/// The full event set is re-read on every tick; capture order across reads
/// is not assumed stable.
pub async fn poll_events<S, P>(
    sink: &S,
    min_count: usize,
    config: &PollConfig,
    predicate: P,
) -> Result<Vec<CapturedEvent>>
where
    S: EventSink + ?Sized,
    P: Fn(&CapturedEvent) -> bool,
{
    let started = Instant::now();
    let mut attempts: u32 = 0;
    let mut last_error: Option<String> = None;
    let mut last_matched = 0usize;

    loop {
        attempts += 1;
        match sink.captured_events().await {
            Ok(events) => {
                let matched: Vec<CapturedEvent> =
                    events.into_iter().filter(|e| predicate(e)).collect();
                last_matched = matched.len();
                if matched.len() >= min_count {
                    debug!(attempts, matched = matched.len(), "enough events captured");
                    return Ok(matched);
                }
                debug!(
                    attempts,
                    matched = matched.len(),
                    wanted = min_count,
                    "not enough matching events yet"
                );
            }
            Err(err) => {
                warn!(attempts, error = %err, "sink read failed, will retry");
                last_error = Some(err.to_string());
            }
        }

        if started.elapsed() + config.interval > config.timeout {
            break;
        }
        tokio::time::sleep(config.interval).await;
    }

    Err(ConformanceError::EventWaitTimeout {
        wanted: min_count,
        matched: last_matched,
        elapsed: started.elapsed(),
        last_error,
    })
}
