//! Summarization pipeline core
//!
//! - [`MonthProcessor`]: one month group → one [`MonthResult`]
//! - [`BatchScheduler`]: many months, `concurrency` at a time, input order kept
//! - [`Aggregator`]: successful months → one year review (or a fallback)
//! - [`ProgressEvent`]: what the pipeline is doing, for a presentation layer

mod aggregate;
mod events;
mod month;
mod scheduler;

pub use aggregate::{AggregateKind, AggregateResult, Aggregator, AGGREGATE_PROMPT_FILE};
pub use events::{CallKind, ProgressEvent, ProgressReporter};
pub use month::{
    combine_notes, MonthError, MonthOutcome, MonthPlan, MonthProcessor, MonthResult, MonthStatus,
    Sizing, NOTE_SEPARATOR,
};
pub use scheduler::BatchScheduler;
