//! Batch scheduling of month processing
//!
//! Months are taken in order, `concurrency` at a time. Every month of a
//! batch runs as its own task; the next batch starts only after the whole
//! batch is done and a fixed pause has passed. Results come back in input
//! order no matter which task finished first.

use super::events::{ProgressEvent, ProgressReporter};
use super::month::{MonthError, MonthOutcome, MonthPlan, MonthProcessor, MonthResult};
use crate::notes::MonthGroup;
use std::sync::Arc;
use std::time::Duration;

/// Runs a [`MonthProcessor`] over many months with bounded concurrency.
pub struct BatchScheduler {
    processor: Arc<MonthProcessor>,
    concurrency: usize,
    batch_delay: Duration,
    progress: ProgressReporter,
}

impl BatchScheduler {
    /// `concurrency` below one is raised to one.
    pub fn new(processor: Arc<MonthProcessor>, concurrency: usize) -> Self {
        let batch_delay = processor.config().batch_delay();
        Self {
            processor,
            concurrency: concurrency.max(1),
            batch_delay,
            progress: ProgressReporter::silent(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn batch_count(&self, months: usize) -> usize {
        months.div_ceil(self.concurrency)
    }

    /// Process every group; one result per group, in input order.
    ///
    /// A failing or panicking month never cancels its siblings.
    pub async fn run(&self, groups: Vec<MonthGroup>) -> Vec<MonthResult> {
        let total_batches = self.batch_count(groups.len());
        let mut results = Vec::with_capacity(groups.len());
        let mut remaining = groups.into_iter().peekable();
        let mut batch_index = 0;

        while remaining.peek().is_some() {
            let batch: Vec<MonthGroup> = remaining.by_ref().take(self.concurrency).collect();
            batch_index += 1;

            let months: Vec<String> = batch.iter().map(|g| g.key_string()).collect();
            tracing::info!(batch = batch_index, of = total_batches, months = ?months, "starting batch");
            self.progress.emit(ProgressEvent::BatchStarted {
                index: batch_index,
                total: total_batches,
                months,
            });

            let handles: Vec<_> = batch
                .into_iter()
                .map(|group| {
                    let processor = Arc::clone(&self.processor);
                    let key = group.key;
                    let label = group.display_name();
                    let note_count = group.notes.len();
                    let handle = tokio::spawn(async move { processor.process(&group).await });
                    (handle, key, label, note_count)
                })
                .collect();

            // Awaiting in spawn order restores input order; all tasks already run.
            for (handle, key, label, note_count) in handles {
                let result = match handle.await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::error!(month = %key, error = %e, "month task aborted");
                        MonthResult {
                            key,
                            label,
                            note_count,
                            outcome: MonthOutcome::Failure(MonthError::Internal(format!(
                                "month task aborted: {}",
                                e
                            ))),
                        }
                    }
                };
                results.push(result);
            }

            if remaining.peek().is_some() && !self.batch_delay.is_zero() {
                tracing::info!(
                    delay_ms = self.batch_delay.as_millis() as u64,
                    "pausing before next batch"
                );
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        results
    }

    /// Plan every group without calling the backend or sleeping.
    pub fn plan(&self, groups: &[MonthGroup]) -> Vec<MonthPlan> {
        groups.iter().map(|g| self.processor.plan(g)).collect()
    }

    /// Projected wall time of a run: months of a batch overlap, batches
    /// and the pauses between them add up.
    pub fn projected_duration(&self, plans: &[MonthPlan]) -> Duration {
        let batches: Vec<&[MonthPlan]> = plans.chunks(self.concurrency).collect();
        let work: Duration = batches
            .iter()
            .map(|batch| batch.iter().map(|p| p.estimated).max().unwrap_or_default())
            .sum();
        let pauses = self.batch_delay * batches.len().saturating_sub(1) as u32;
        work + pauses
    }
}
