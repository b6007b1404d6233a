//! Common test utilities for pipeline integration tests
//!
//! A throwaway journal directory with helpers to fill it, and a pipeline
//! wired to a mock backend with all pauses disabled.

#![allow(dead_code)]

use journal_digest::{DigestConfig, DigestPipeline, MockSummarizer, Prompts};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const PARAGRAPH_CHARS: usize = 1_000;

/// Input directory plus a separate, not yet created, output directory.
pub struct JournalDir {
    input: TempDir,
    output_root: TempDir,
}

impl JournalDir {
    pub fn new() -> Self {
        Self {
            input: tempfile::tempdir().expect("create input dir"),
            output_root: tempfile::tempdir().expect("create output root"),
        }
    }

    pub fn path(&self) -> &Path {
        self.input.path()
    }

    pub fn output(&self) -> PathBuf {
        self.output_root.path().join("digest")
    }

    pub fn note(&self, name: &str, content: &str) -> &Self {
        fs::write(self.input.path().join(name), content).expect("write note");
        self
    }

    /// Write a note dated `date` (`M/D/YY`) with roughly `chars` of body text.
    pub fn dated_note(&self, name: &str, date: &str, chars: usize, marker: &str) -> &Self {
        self.note(name, &format!("## {}\n\n{}", date, paragraphs(chars, marker)))
    }

    /// Files currently in the output directory, sorted.
    pub fn output_files(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.output()) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}

/// ASCII body text of at least `chars` characters in ~1,000-char paragraphs.
/// Every paragraph starts with `marker`.
pub fn paragraphs(chars: usize, marker: &str) -> String {
    let mut out = String::new();
    let mut n = 0;
    while out.len() < chars {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        let mut para = format!("{} entry {}.", marker, n);
        while para.len() < PARAGRAPH_CHARS {
            para.push_str(" Went for a long walk by the river and thought about the week.");
        }
        out.push_str(&para);
        n += 1;
    }
    out
}

pub fn test_config() -> DigestConfig {
    DigestConfig {
        chunk_delay_ms: 0,
        batch_delay_ms: 0,
        ..DigestConfig::default()
    }
}

pub fn pipeline_with(config: DigestConfig, client: Arc<MockSummarizer>) -> DigestPipeline {
    DigestPipeline::new(Arc::new(config), Arc::new(Prompts::default()), client)
}

pub fn pipeline(client: Arc<MockSummarizer>) -> DigestPipeline {
    pipeline_with(test_config(), client)
}

/// Prompts of chunk-level calls (`(part i of n)` in the month line).
pub fn chunk_prompts(client: &MockSummarizer) -> Vec<String> {
    client
        .prompts()
        .into_iter()
        .filter(|p| p.contains("(part "))
        .collect()
}

/// Prompts of merge calls.
pub fn reduce_prompts(client: &MockSummarizer) -> Vec<String> {
    client
        .prompts()
        .into_iter()
        .filter(|p| p.contains("## Part 1"))
        .collect()
}
