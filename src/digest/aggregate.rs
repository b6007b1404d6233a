//! Year review
//!
//! Synthesizes one narrative from every successful month summary. When the
//! synthesis call fails the month summaries are saved verbatim under a
//! different name, so nothing generated earlier is lost.

use super::events::{ProgressEvent, ProgressReporter};
use super::month::MonthResult;
use crate::artifacts::ArtifactStore;
use crate::llm::{BackendError, Summarizer};
use crate::prompts::{concatenate_summaries, Prompts};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Name of the debug file holding the synthesis prompt
pub const AGGREGATE_PROMPT_FILE: &str = "aggregate_prompt.txt";

#[derive(Debug, Clone)]
pub enum AggregateKind {
    /// The backend wrote the year review
    Synthesized,
    /// The synthesis call failed; `text` is the plain concatenation
    Degraded { error: BackendError },
}

#[derive(Debug, Clone)]
pub struct AggregateResult {
    pub kind: AggregateKind,
    pub text: String,
    /// Number of month summaries that went in
    pub months: usize,
    pub artifact: Option<PathBuf>,
}

impl AggregateResult {
    pub fn is_degraded(&self) -> bool {
        matches!(self.kind, AggregateKind::Degraded { .. })
    }
}

pub struct Aggregator {
    client: Arc<dyn Summarizer>,
    prompts: Arc<Prompts>,
    year: i32,
    store: Option<ArtifactStore>,
    progress: ProgressReporter,
}

impl Aggregator {
    pub fn new(client: Arc<dyn Summarizer>, prompts: Arc<Prompts>, year: i32) -> Self {
        Self {
            client,
            prompts,
            year,
            store: None,
            progress: ProgressReporter::silent(),
        }
    }

    pub fn with_store(mut self, store: ArtifactStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Build the year review from the successful months of `results`.
    ///
    /// Failed and skipped months are ignored. Returns `None`, without any
    /// backend call, when no month succeeded.
    pub async fn aggregate(&self, results: &[MonthResult]) -> Option<AggregateResult> {
        let months: Vec<(String, String)> = results
            .iter()
            .filter_map(|r| r.summary().map(|s| (r.label.clone(), s.to_string())))
            .collect();

        if months.is_empty() {
            tracing::info!("no successful months; skipping year review");
            return None;
        }

        let prompt = self.prompts.synthesis_prompt(self.year, &months);
        if let Some(store) = &self.store {
            store.write_debug_prompt(AGGREGATE_PROMPT_FILE, &prompt);
        }

        tracing::info!(months = months.len(), prompt_chars = prompt.chars().count(), "synthesizing year review");
        self.progress.emit(ProgressEvent::AggregateStarted {
            months: months.len(),
        });
        let start = Instant::now();
        let generated = self.client.generate(&prompt).await;
        self.progress.emit(ProgressEvent::AggregateFinished {
            elapsed: start.elapsed(),
            ok: generated.is_ok(),
        });

        let (kind, text) = match generated {
            Ok(generation) => (AggregateKind::Synthesized, generation.text),
            Err(error) => {
                tracing::warn!(error = %error, "year review failed; saving month summaries instead");
                (AggregateKind::Degraded { error }, concatenate_summaries(&months))
            }
        };

        let artifact = self.store.as_ref().and_then(|store| {
            let written = match &kind {
                AggregateKind::Synthesized => store.write_aggregate(self.year, &text),
                AggregateKind::Degraded { .. } => store.write_aggregate_fallback(self.year, &text),
            };
            match written {
                Ok(path) => {
                    tracing::info!(path = %path.display(), "saved year review");
                    Some(path)
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to save year review");
                    None
                }
            }
        });

        Some(AggregateResult {
            kind,
            text,
            months: months.len(),
            artifact,
        })
    }
}
