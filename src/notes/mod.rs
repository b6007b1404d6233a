//! Notes: the input side of the pipeline
//!
//! - [`scan_notes`] reads note files from a directory
//! - [`extract_date`] reads the `## M/D/YY` heading of a note
//! - [`clean`] strips template scaffolding
//! - [`group_by_month`] buckets notes into [`MonthGroup`]s

mod clean;
mod date;
mod group;
mod scan;

pub use clean::{clean, is_boilerplate_line};
pub use date::{extract_date, month_name, ExtractedDate};
pub use group::{group_by_month, GroupKey, MonthGroup};
pub use scan::scan_notes;

/// One input document. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// File name, unique within a run
    pub filename: String,
    pub raw_content: String,
    /// `clean(raw_content)`
    pub cleaned_content: String,
    pub date: Option<ExtractedDate>,
}

impl Note {
    /// Build a note, deriving its date and cleaned content.
    pub fn new(filename: impl Into<String>, raw_content: impl Into<String>, expected_year: i32) -> Self {
        let raw_content = raw_content.into();
        let filename = filename.into();
        let date = extract_date(&raw_content, expected_year);
        if date.is_none() {
            tracing::debug!(file = %filename, "no usable date heading");
        }
        Self {
            cleaned_content: clean(&raw_content),
            date,
            raw_content,
            filename,
        }
    }

    /// A note whose file could not be read: no content, no date.
    pub fn unreadable(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            raw_content: String::new(),
            cleaned_content: String::new(),
            date: None,
        }
    }

    /// Whether cleaning left any non-whitespace text.
    pub fn has_content(&self) -> bool {
        !self.cleaned_content.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_derives_date_and_cleaned_text() {
        let note = Note::new("a.md", "## 1/2/24\nMood:\n- tea\n", 2025);
        assert_eq!(note.cleaned_content, "## 1/2/24\n- tea");
        let date = note.date.unwrap();
        assert_eq!(date.month_key(), "2025-01");
        assert!(date.was_corrected);
    }

    #[test]
    fn template_only_note_has_no_content() {
        let note = Note::new("b.md", "Mood:\n- \n\n", 2025);
        assert!(!note.has_content());
        assert!(note.date.is_none());
    }

    #[test]
    fn unreadable_note_is_empty_and_undated() {
        let note = Note::unreadable("broken.md");
        assert!(!note.has_content());
        assert!(note.date.is_none());
    }
}
