//! Month processing
//!
//! Turns one [`MonthGroup`] into one [`MonthResult`]:
//!
//! ```text
//! Pending ──► Empty    ──────────────────────────────► SkippedEmpty
//!        ├──► Direct   ── 1 call ─────────────────────► Success | Failure
//!        └──► Chunked  ── N part calls ── 1 merge ───► Success | Failure
//! ```
//!
//! Part calls run one after another with a fixed pause between them. A
//! failed part is logged and skipped; the month fails only if every part
//! fails or the merge call fails.

use super::events::{CallKind, ProgressEvent, ProgressReporter};
use crate::artifacts::ArtifactStore;
use crate::chunk::chunk_text;
use crate::config::DigestConfig;
use crate::estimate::{estimate_tokens, TimingModel};
use crate::llm::{BackendError, Generation, Summarizer};
use crate::notes::{GroupKey, MonthGroup};
use crate::prompts::Prompts;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Separator between notes in a month's combined text
pub const NOTE_SEPARATOR: &str = "\n\n---\n\n";

/// Why a month produced no summary.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MonthError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("all {chunks} chunks failed (last error: {last_error})")]
    AllChunksFailed { chunks: usize, last_error: String },
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthStatus {
    Success,
    Failure,
    SkippedEmpty,
}

impl fmt::Display for MonthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MonthStatus::Success => "success",
            MonthStatus::Failure => "failure",
            MonthStatus::SkippedEmpty => "skipped (empty)",
        })
    }
}

#[derive(Debug, Clone)]
pub enum MonthOutcome {
    Success {
        summary: String,
        /// Written file; `None` in memory-only runs or when the write failed
        artifact: Option<PathBuf>,
        /// Backend calls made, including failed part calls
        calls: usize,
    },
    Failure(MonthError),
    SkippedEmpty,
}

/// Result of processing one month group. Created once, never mutated.
#[derive(Debug, Clone)]
pub struct MonthResult {
    pub key: GroupKey,
    pub label: String,
    pub note_count: usize,
    pub outcome: MonthOutcome,
}

impl MonthResult {
    pub fn status(&self) -> MonthStatus {
        match self.outcome {
            MonthOutcome::Success { .. } => MonthStatus::Success,
            MonthOutcome::Failure(_) => MonthStatus::Failure,
            MonthOutcome::SkippedEmpty => MonthStatus::SkippedEmpty,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == MonthStatus::Success
    }

    pub fn summary(&self) -> Option<&str> {
        match &self.outcome {
            MonthOutcome::Success { summary, .. } => Some(summary),
            _ => None,
        }
    }

    pub fn artifact(&self) -> Option<&PathBuf> {
        match &self.outcome {
            MonthOutcome::Success { artifact, .. } => artifact.as_ref(),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&MonthError> {
        match &self.outcome {
            MonthOutcome::Failure(e) => Some(e),
            _ => None,
        }
    }
}

/// How a month will be sent to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Sizing {
    Empty,
    Direct { chars: usize },
    /// Character count of each part
    Chunked { chunk_sizes: Vec<usize> },
}

/// Sizing decision and projected cost of a month, computed without calling
/// the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthPlan {
    pub key: GroupKey,
    pub label: String,
    pub note_count: usize,
    pub combined_chars: usize,
    pub sizing: Sizing,
    /// Backend calls a run would make if every call succeeds
    pub calls: usize,
    pub estimated: Duration,
}

impl MonthPlan {
    pub fn estimated_tokens(&self) -> usize {
        estimate_tokens(self.combined_chars)
    }
}

/// Combined cleaned text of a group: each note with content under a
/// `### <filename>` heading, joined by [`NOTE_SEPARATOR`].
pub fn combine_notes(group: &MonthGroup) -> String {
    group
        .notes_with_content()
        .map(|n| format!("### {}\n\n{}", n.filename, n.cleaned_content))
        .collect::<Vec<_>>()
        .join(NOTE_SEPARATOR)
}

enum Route {
    Empty,
    Direct(String),
    Chunked(Vec<String>),
}

fn route(combined: String, max_chunk_size: usize) -> Route {
    if combined.trim().is_empty() {
        Route::Empty
    } else if combined.chars().count() <= max_chunk_size {
        Route::Direct(combined)
    } else {
        Route::Chunked(chunk_text(&combined, max_chunk_size))
    }
}

/// Processes month groups against a backend.
pub struct MonthProcessor {
    client: Arc<dyn Summarizer>,
    config: Arc<DigestConfig>,
    prompts: Arc<Prompts>,
    store: Option<ArtifactStore>,
    progress: ProgressReporter,
}

impl MonthProcessor {
    /// Create a processor that keeps summaries in memory only.
    pub fn new(client: Arc<dyn Summarizer>, config: Arc<DigestConfig>, prompts: Arc<Prompts>) -> Self {
        Self {
            client,
            config,
            prompts,
            store: None,
            progress: ProgressReporter::silent(),
        }
    }

    /// Persist month summaries (and debug prompts) to `store`.
    pub fn with_store(mut self, store: ArtifactStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &DigestConfig {
        &self.config
    }

    /// Make every sizing decision `process` would make, without any call.
    pub fn plan(&self, group: &MonthGroup) -> MonthPlan {
        let combined = combine_notes(group);
        let combined_chars = combined.chars().count();
        let timing = TimingModel::from_config(&self.config);

        let (sizing, calls, estimated) = match route(combined, self.config.max_chunk_size) {
            Route::Empty => (Sizing::Empty, 0, Duration::ZERO),
            Route::Direct(_) => (
                Sizing::Direct {
                    chars: combined_chars,
                },
                1,
                timing.sequential(1, 0),
            ),
            Route::Chunked(chunks) => {
                let parts = chunks.len();
                let chunk_sizes = chunks.iter().map(|c| c.chars().count()).collect();
                (
                    Sizing::Chunked { chunk_sizes },
                    parts + 1,
                    timing.sequential(parts + 1, parts.saturating_sub(1)),
                )
            }
        };

        MonthPlan {
            key: group.key,
            label: group.display_name(),
            note_count: group.notes.len(),
            combined_chars,
            sizing,
            calls,
            estimated,
        }
    }

    /// Summarize one month group.
    ///
    /// Never fails: backend errors end up in the returned result.
    pub async fn process(&self, group: &MonthGroup) -> MonthResult {
        let key = group.key;
        let label = group.display_name();
        let month = key.to_string();

        self.progress.emit(ProgressEvent::MonthStarted {
            month: month.clone(),
            label: label.clone(),
        });

        let outcome = match route(combine_notes(group), self.config.max_chunk_size) {
            Route::Empty => {
                tracing::info!(month = %month, "no content after cleaning; skipping");
                MonthOutcome::SkippedEmpty
            }
            Route::Direct(text) => {
                tracing::info!(month = %month, chars = text.chars().count(), "summarizing in one call");
                self.summarize_direct(&month, &label, &text).await
            }
            Route::Chunked(chunks) => {
                tracing::info!(month = %month, chunks = chunks.len(), "summarizing in parts");
                self.summarize_chunked(&month, &label, &chunks).await
            }
        };

        let outcome = match outcome {
            MonthOutcome::Success { summary, calls, .. } => {
                let artifact = self.persist(&key, &summary);
                MonthOutcome::Success {
                    summary,
                    artifact,
                    calls,
                }
            }
            other => other,
        };

        let result = MonthResult {
            key,
            label,
            note_count: group.notes.len(),
            outcome,
        };

        match result.error() {
            Some(e) => tracing::warn!(month = %month, error = %e, "month failed"),
            None => tracing::info!(month = %month, status = %result.status(), "month finished"),
        }
        self.progress.emit(ProgressEvent::MonthFinished {
            month,
            label: result.label.clone(),
            status: result.status(),
        });
        result
    }

    async fn summarize_direct(&self, month: &str, label: &str, text: &str) -> MonthOutcome {
        let prompt = self.prompts.month_prompt(label, text);
        self.save_prompt(&format!("{}_final.txt", month), &prompt);

        match self.call(month, CallKind::Direct, &prompt).await {
            Ok(generation) => MonthOutcome::Success {
                summary: generation.text,
                artifact: None,
                calls: 1,
            },
            Err(e) => MonthOutcome::Failure(MonthError::Backend(e)),
        }
    }

    async fn summarize_chunked(&self, month: &str, label: &str, chunks: &[String]) -> MonthOutcome {
        let total = chunks.len();
        let delay = self.config.chunk_delay();
        let mut parts: Vec<(usize, String)> = Vec::with_capacity(total);
        let mut last_error: Option<BackendError> = None;

        for (i, chunk) in chunks.iter().enumerate() {
            let part = i + 1;
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let prompt = self.prompts.chunk_prompt(label, part, total, chunk);
            self.save_prompt(&format!("{}_chunk_{}.txt", month, part), &prompt);

            match self.call(month, CallKind::Chunk { part, total }, &prompt).await {
                Ok(generation) => parts.push((part, generation.text)),
                Err(e) => {
                    tracing::warn!(month = %month, part, total, error = %e, "part failed; continuing");
                    last_error = Some(e);
                }
            }
        }

        if parts.is_empty() {
            return MonthOutcome::Failure(MonthError::AllChunksFailed {
                chunks: total,
                last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
            });
        }
        if parts.len() < total {
            tracing::warn!(
                month = %month,
                succeeded = parts.len(),
                total,
                "merging a partial set of parts"
            );
        }

        let prompt = self.prompts.reduce_prompt(label, &parts);
        self.save_prompt(&format!("{}_final.txt", month), &prompt);

        match self.call(month, CallKind::Reduce, &prompt).await {
            Ok(generation) => MonthOutcome::Success {
                summary: generation.text,
                artifact: None,
                calls: total + 1,
            },
            Err(e) => MonthOutcome::Failure(MonthError::Backend(e)),
        }
    }

    async fn call(&self, month: &str, kind: CallKind, prompt: &str) -> Result<Generation, BackendError> {
        self.progress.emit(ProgressEvent::CallStarted {
            month: month.to_string(),
            kind,
            prompt_chars: prompt.chars().count(),
        });

        let start = Instant::now();
        let result = self.client.generate(prompt).await;
        let elapsed = start.elapsed();

        if let Ok(generation) = &result {
            tracing::debug!(
                month = %month,
                call = %kind,
                elapsed_ms = generation.elapsed.as_millis() as u64,
                "call succeeded"
            );
        }
        self.progress.emit(ProgressEvent::CallFinished {
            month: month.to_string(),
            kind,
            elapsed,
            ok: result.is_ok(),
        });
        result
    }

    fn save_prompt(&self, name: &str, prompt: &str) {
        if let Some(store) = &self.store {
            store.write_debug_prompt(name, prompt);
        }
    }

    fn persist(&self, key: &GroupKey, summary: &str) -> Option<PathBuf> {
        let store = self.store.as_ref()?;
        match store.write_month(key, summary) {
            Ok(path) => {
                tracing::info!(path = %path.display(), "saved month summary");
                Some(path)
            }
            Err(e) => {
                tracing::error!(month = %key, error = %e, "failed to save month summary; keeping it for the year review");
                None
            }
        }
    }
}
