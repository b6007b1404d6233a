//! End-to-end pipeline
//!
//! `scan → clean/date → group → schedule months → aggregate`, plus the two
//! side modes that share the front half: dry run (plan only) and
//! concatenate-only (merge without any backend).

use crate::artifacts::ArtifactStore;
use crate::concat::{concatenate, ConcatStats};
use crate::config::DigestConfig;
use crate::digest::{
    AggregateResult, Aggregator, BatchScheduler, MonthPlan, MonthProcessor, MonthResult,
    MonthStatus, ProgressReporter,
};
use crate::error::DigestResult;
use crate::llm::Summarizer;
use crate::notes::{group_by_month, scan_notes, MonthGroup};
use crate::prompts::Prompts;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a full run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Notes found in the input directory
    pub notes: usize,
    /// One result per month group, in month order
    pub months: Vec<MonthResult>,
    /// `None` when no month succeeded
    pub aggregate: Option<AggregateResult>,
    pub output_dir: Option<PathBuf>,
}

impl RunReport {
    fn count(&self, status: MonthStatus) -> usize {
        self.months.iter().filter(|m| m.status() == status).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(MonthStatus::Success)
    }

    pub fn failed(&self) -> usize {
        self.count(MonthStatus::Failure)
    }

    pub fn skipped(&self) -> usize {
        self.count(MonthStatus::SkippedEmpty)
    }

    /// Month summary files actually written
    pub fn month_artifacts(&self) -> Vec<&PathBuf> {
        self.months.iter().filter_map(|m| m.artifact()).collect()
    }

    pub fn aggregate_artifacts(&self) -> usize {
        self.aggregate
            .as_ref()
            .and_then(|a| a.artifact.as_ref())
            .map_or(0, |_| 1)
    }

    /// `"11 monthly summaries, 1 aggregate"`
    pub fn summary_line(&self) -> String {
        format!(
            "{} monthly summaries, {} aggregate",
            self.month_artifacts().len(),
            self.aggregate_artifacts()
        )
    }
}

/// Outcome of a dry run.
#[derive(Debug, Clone)]
pub struct DryRunReport {
    pub notes: usize,
    pub plans: Vec<MonthPlan>,
    pub concurrency: usize,
    /// Projected wall time including pauses and the year review
    pub estimated: Duration,
}

impl DryRunReport {
    /// Month calls plus one year-review call when any month would be summarized
    pub fn total_calls(&self) -> usize {
        let month_calls: usize = self.plans.iter().map(|p| p.calls).sum();
        if month_calls > 0 {
            month_calls + 1
        } else {
            0
        }
    }

    pub fn total_chars(&self) -> usize {
        self.plans.iter().map(|p| p.combined_chars).sum()
    }
}

/// Outcome of concatenate-only mode.
#[derive(Debug, Clone)]
pub struct ConcatReport {
    pub stats: ConcatStats,
    /// `None` when there was nothing to write
    pub artifact: Option<PathBuf>,
}

/// Wires configuration, prompts and a backend client into a run.
pub struct DigestPipeline {
    config: Arc<DigestConfig>,
    prompts: Arc<Prompts>,
    client: Arc<dyn Summarizer>,
    progress: ProgressReporter,
}

impl DigestPipeline {
    pub fn new(config: Arc<DigestConfig>, prompts: Arc<Prompts>, client: Arc<dyn Summarizer>) -> Self {
        Self {
            config,
            prompts,
            client,
            progress: ProgressReporter::silent(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &DigestConfig {
        &self.config
    }

    /// Scan and group the input directory. Returns the note count too.
    pub fn load_groups(&self, input_dir: &Path) -> DigestResult<(usize, Vec<MonthGroup>)> {
        let notes = scan_notes(input_dir, &self.config)?;
        let count = notes.len();
        let corrected = notes
            .iter()
            .filter(|n| n.date.map(|d| d.was_corrected).unwrap_or(false))
            .count();
        if corrected > 0 {
            tracing::info!(corrected, year = self.config.expected_year, "corrected years in date headings");
        }

        let groups = group_by_month(notes);
        for group in &groups {
            tracing::debug!(month = %group.key, notes = group.notes.len(), "month group");
        }
        Ok((count, groups))
    }

    /// Summarize every month of `input_dir` into `output_dir`, then write the
    /// year review.
    ///
    /// Fails only for an invalid input directory or an output directory that
    /// cannot be created. An empty input directory produces an empty report
    /// and no output directory.
    pub async fn run(&self, input_dir: &Path, output_dir: &Path, concurrency: usize) -> DigestResult<RunReport> {
        let (notes, groups) = self.load_groups(input_dir)?;
        if notes == 0 {
            tracing::info!(dir = %input_dir.display(), "no note files found");
            return Ok(RunReport {
                notes,
                months: Vec::new(),
                aggregate: None,
                output_dir: None,
            });
        }

        let store = ArtifactStore::create(output_dir, self.config.save_debug_prompts)?;
        tracing::info!(
            notes,
            months = groups.len(),
            concurrency,
            output = %output_dir.display(),
            "starting run"
        );

        let processor = MonthProcessor::new(
            Arc::clone(&self.client),
            Arc::clone(&self.config),
            Arc::clone(&self.prompts),
        )
        .with_store(store.clone())
        .with_progress(self.progress.clone());

        let scheduler = BatchScheduler::new(Arc::new(processor), concurrency)
            .with_progress(self.progress.clone());
        let months = scheduler.run(groups).await;

        let aggregator = Aggregator::new(
            Arc::clone(&self.client),
            Arc::clone(&self.prompts),
            self.config.expected_year,
        )
        .with_store(store)
        .with_progress(self.progress.clone());
        let aggregate = aggregator.aggregate(&months).await;

        let report = RunReport {
            notes,
            months,
            aggregate,
            output_dir: Some(output_dir.to_path_buf()),
        };
        tracing::info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            skipped = report.skipped(),
            "run finished"
        );
        Ok(report)
    }

    /// Plan a run: sizing, chunking and projected time, with no backend
    /// calls and no files written.
    pub fn dry_run(&self, input_dir: &Path, concurrency: usize) -> DigestResult<DryRunReport> {
        let (notes, groups) = self.load_groups(input_dir)?;

        let processor = MonthProcessor::new(
            Arc::clone(&self.client),
            Arc::clone(&self.config),
            Arc::clone(&self.prompts),
        );
        let scheduler = BatchScheduler::new(Arc::new(processor), concurrency);
        let plans = scheduler.plan(&groups);

        let mut estimated = scheduler.projected_duration(&plans);
        if plans.iter().any(|p| p.calls > 0) {
            estimated += crate::estimate::TimingModel::from_config(&self.config).per_call();
        }

        Ok(DryRunReport {
            notes,
            plans,
            concurrency: scheduler.concurrency(),
            estimated,
        })
    }

    /// Merge all cleaned notes into one file in `output_dir`.
    pub fn concatenate(&self, input_dir: &Path, output_dir: &Path) -> DigestResult<ConcatReport> {
        let (notes, groups) = self.load_groups(input_dir)?;
        let (text, stats) = concatenate(&groups);
        if notes == 0 || text.is_empty() {
            tracing::info!("nothing to concatenate");
            return Ok(ConcatReport {
                stats,
                artifact: None,
            });
        }

        let store = ArtifactStore::create(output_dir, false)?;
        let path = store.write_concatenation(&text)?;
        tracing::info!(path = %path.display(), chars = stats.cleaned_chars, "wrote merged notes");
        Ok(ConcatReport {
            stats,
            artifact: Some(path),
        })
    }
}
