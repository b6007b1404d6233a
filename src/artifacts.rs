//! Output artifacts
//!
//! All files a run produces go through [`ArtifactStore`]: one Markdown file
//! per summarized month, the year review (or its fallback), the merged text
//! of concatenate-only mode, and optional raw-prompt debug files.

use crate::error::{DigestError, DigestResult};
use crate::notes::GroupKey;
use std::fs;
use std::path::{Path, PathBuf};

/// Subdirectory holding raw prompts when debug prompts are enabled
pub const DEBUG_PROMPT_DIR: &str = "debug_prompts";
/// Merged output of concatenate-only mode
pub const CONCATENATION_FILE: &str = "all_notes_cleaned.md";

/// Replace anything but ASCII letters and digits with single underscores.
pub fn sanitize_label(label: &str) -> String {
    label
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// `2025-02_February_2025.md`
pub fn month_filename(key: &GroupKey) -> String {
    format!("{}_{}.md", key, sanitize_label(&key.label()))
}

pub fn aggregate_filename(year: i32) -> String {
    format!("{}_annual_summary.md", year)
}

pub fn aggregate_fallback_filename(year: i32) -> String {
    format!("{}_monthly_summaries_combined.md", year)
}

/// Writes run outputs under one directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    save_debug_prompts: bool,
}

impl ArtifactStore {
    /// Open (creating if needed) the output directory.
    pub fn create(root: impl Into<PathBuf>, save_debug_prompts: bool) -> DigestResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| DigestError::io(&root, e))?;
        if save_debug_prompts {
            let debug_dir = root.join(DEBUG_PROMPT_DIR);
            fs::create_dir_all(&debug_dir).map_err(|e| DigestError::io(&debug_dir, e))?;
        }
        Ok(Self {
            root,
            save_debug_prompts,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn saves_debug_prompts(&self) -> bool {
        self.save_debug_prompts
    }

    fn write(&self, name: &str, contents: &str) -> DigestResult<PathBuf> {
        let path = self.root.join(name);
        fs::write(&path, contents).map_err(|e| DigestError::io(&path, e))?;
        tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote artifact");
        Ok(path)
    }

    /// Persist a month summary under its deterministic name.
    pub fn write_month(&self, key: &GroupKey, summary: &str) -> DigestResult<PathBuf> {
        let contents = format!("# {}\n\n{}\n", key.label(), summary.trim());
        self.write(&month_filename(key), &contents)
    }

    pub fn write_aggregate(&self, year: i32, text: &str) -> DigestResult<PathBuf> {
        let contents = format!("# {} in Review\n\n{}\n", year, text.trim());
        self.write(&aggregate_filename(year), &contents)
    }

    /// Raw month summaries, kept when the year review could not be generated.
    pub fn write_aggregate_fallback(&self, year: i32, text: &str) -> DigestResult<PathBuf> {
        let contents = format!(
            "# {} Monthly Summaries\n\n_The year review could not be generated; monthly summaries are reproduced below._\n\n{}\n",
            year,
            text.trim()
        );
        self.write(&aggregate_fallback_filename(year), &contents)
    }

    pub fn write_concatenation(&self, text: &str) -> DigestResult<PathBuf> {
        self.write(CONCATENATION_FILE, text)
    }

    /// Save a raw prompt when debug prompts are enabled.
    ///
    /// Failures are logged and swallowed: debug output never fails a month.
    pub fn write_debug_prompt(&self, name: &str, prompt: &str) -> Option<PathBuf> {
        if !self.save_debug_prompts {
            return None;
        }
        let path = self.root.join(DEBUG_PROMPT_DIR).join(name);
        match fs::write(&path, prompt) {
            Ok(()) => Some(path),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to save debug prompt");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_sanitized() {
        assert_eq!(sanitize_label("February 2025"), "February_2025");
        assert_eq!(sanitize_label("  a//b -- c "), "a_b_c");
        assert_eq!(sanitize_label("Unknown Date"), "Unknown_Date");
    }

    #[test]
    fn month_filenames_are_deterministic() {
        let key = GroupKey::Month { year: 2025, month: 2 };
        assert_eq!(month_filename(&key), "2025-02_February_2025.md");
        assert_eq!(month_filename(&GroupKey::Unknown), "unknown_Unknown_Date.md");
    }

    #[test]
    fn write_month_creates_headed_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::create(dir.path().join("out"), false).unwrap();
        let key = GroupKey::Month { year: 2025, month: 3 };

        let path = store.write_month(&key, "  busy month \n").unwrap();
        assert_eq!(path.file_name().unwrap(), "2025-03_March_2025.md");
        assert_eq!(fs::read_to_string(path).unwrap(), "# March 2025\n\nbusy month\n");
    }

    #[test]
    fn debug_prompts_only_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let off = ArtifactStore::create(dir.path().join("off"), false).unwrap();
        assert!(off.write_debug_prompt("x.txt", "prompt").is_none());
        assert!(!dir.path().join("off").join(DEBUG_PROMPT_DIR).exists());

        let on = ArtifactStore::create(dir.path().join("on"), true).unwrap();
        let path = on.write_debug_prompt("x.txt", "prompt").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "prompt");
    }

    #[test]
    fn aggregate_and_fallback_use_distinct_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::create(dir.path(), false).unwrap();
        let a = store.write_aggregate(2025, "year").unwrap();
        let b = store.write_aggregate_fallback(2025, "months").unwrap();
        assert_ne!(a, b);
        assert!(fs::read_to_string(b).unwrap().contains("months"));
    }

    #[test]
    fn create_fails_under_a_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = ArtifactStore::create(file.path().join("out"), false).unwrap_err();
        assert!(matches!(err, DigestError::Io { .. }));
    }
}
