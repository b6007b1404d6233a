//! Progress events emitted while a run is in flight
//!
//! The pipeline never draws anything itself. It reports what it is doing on
//! an optional channel and the presentation layer decides how to render it
//! (the CLI shows a spinner only when months run one at a time).

use super::month::MonthStatus;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Which kind of backend call an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// Whole month in one call
    Direct,
    /// One part of a chunked month, 1-based
    Chunk { part: usize, total: usize },
    /// Merge of part summaries
    Reduce,
    /// Year review
    Synthesis,
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallKind::Direct => f.write_str("summary"),
            CallKind::Chunk { part, total } => write!(f, "part {}/{}", part, total),
            CallKind::Reduce => f.write_str("merge"),
            CallKind::Synthesis => f.write_str("year review"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    BatchStarted {
        index: usize,
        total: usize,
        months: Vec<String>,
    },
    MonthStarted {
        month: String,
        label: String,
    },
    CallStarted {
        month: String,
        kind: CallKind,
        prompt_chars: usize,
    },
    CallFinished {
        month: String,
        kind: CallKind,
        elapsed: Duration,
        ok: bool,
    },
    MonthFinished {
        month: String,
        label: String,
        status: MonthStatus,
    },
    AggregateStarted {
        months: usize,
    },
    AggregateFinished {
        elapsed: Duration,
        ok: bool,
    },
}

/// Sending half of the progress channel. Silent when no receiver is attached.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    tx: Option<UnboundedSender<ProgressEvent>>,
}

impl ProgressReporter {
    pub fn new(tx: UnboundedSender<ProgressEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn silent() -> Self {
        Self { tx: None }
    }

    /// Send an event; a dropped receiver is ignored.
    pub fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}
