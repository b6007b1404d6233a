//! Concatenate-only mode
//!
//! Merges every cleaned note into one document, month by month, without
//! calling the backend. Useful for pasting a year into a chat window or for
//! checking how much cleaning saves.

use crate::estimate::estimate_tokens;
use crate::notes::MonthGroup;

/// Size figures for a merged document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConcatStats {
    pub files: usize,
    pub months: usize,
    pub raw_chars: usize,
    pub cleaned_chars: usize,
    /// Tokens of the merged document, headings included
    pub estimated_tokens: usize,
}

impl ConcatStats {
    /// Share of raw characters removed by cleaning, 0–100.
    pub fn reduction_percent(&self) -> f64 {
        if self.raw_chars == 0 {
            return 0.0;
        }
        let removed = self.raw_chars.saturating_sub(self.cleaned_chars);
        removed as f64 * 100.0 / self.raw_chars as f64
    }
}

/// Merge all notes with content: `# <month>` per group, `## <file>` per note.
pub fn concatenate(groups: &[MonthGroup]) -> (String, ConcatStats) {
    let mut sections = Vec::new();
    let mut stats = ConcatStats {
        files: 0,
        months: 0,
        raw_chars: 0,
        cleaned_chars: 0,
        estimated_tokens: 0,
    };

    for group in groups {
        stats.files += group.notes.len();
        stats.raw_chars += group.notes.iter().map(|n| n.raw_content.chars().count()).sum::<usize>();

        let notes: Vec<String> = group
            .notes_with_content()
            .map(|n| {
                stats.cleaned_chars += n.cleaned_content.chars().count();
                format!("## {}\n\n{}", n.filename, n.cleaned_content)
            })
            .collect();
        if notes.is_empty() {
            continue;
        }
        stats.months += 1;
        sections.push(format!("# {}\n\n{}", group.display_name(), notes.join("\n\n---\n\n")));
    }

    let text = sections.join("\n\n");
    stats.estimated_tokens = estimate_tokens(text.chars().count());
    (text, stats)
}
