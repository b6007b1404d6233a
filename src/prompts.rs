//! Prompt templates
//!
//! Four instruction sets, one per kind of call: summarizing a whole month,
//! summarizing one part of a month, merging part summaries, and writing the
//! year review. Only the month instructions can be replaced from a file;
//! the part instructions are derived from them.

use std::path::Path;

const MONTH_INSTRUCTIONS: &str = "\
You are summarizing one month of personal journal entries.
Write a concise, warm summary in Markdown with these sections:
- **Highlights**: the most significant events and experiences
- **Themes**: recurring thoughts, moods, and concerns
- **People**: who featured and in what way
- **Progress**: goals, habits, and projects that moved forward or stalled
Stay faithful to the entries. Do not invent events. Skip sections with nothing to say.";

const PART_NOTE: &str = "\
The entries below are one part of a longer month. Summarize only this part; \
another pass will merge the parts.";

const REDUCE_INSTRUCTIONS: &str = "\
Below are summaries of consecutive parts of the same month of journal entries.
Merge them into a single month summary with the sections Highlights, Themes, People and Progress.
Remove repetition, keep chronology where it matters, and do not add anything that is not in the parts.";

const SYNTHESIS_INSTRUCTIONS: &str = "\
Below are monthly summaries of a year of personal journal entries, in order.
Write a year in review in Markdown:
- **Overview**: a short narrative of the year
- **Major Events**: the defining moments, with their months
- **Evolving Themes**: how moods, priorities and concerns shifted over the year
- **Relationships**: the people who mattered and how
- **Growth**: lessons, achievements, and unfinished business
Base everything on the summaries provided.";

/// Instruction text for every kind of backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompts {
    pub month: String,
    pub chunk: String,
    pub reduce: String,
    pub synthesis: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self::with_month_instructions(MONTH_INSTRUCTIONS)
    }
}

impl Prompts {
    /// Built-in prompts with custom month instructions.
    pub fn with_month_instructions(month: impl Into<String>) -> Self {
        let month = month.into();
        Self {
            chunk: format!("{}\n\n{}", month, PART_NOTE),
            month,
            reduce: REDUCE_INSTRUCTIONS.to_string(),
            synthesis: SYNTHESIS_INSTRUCTIONS.to_string(),
        }
    }

    /// Load month instructions from `path`, keeping the built-ins when the
    /// file is absent, unreadable, or empty.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match std::fs::read_to_string(path) {
            Ok(text) if !text.trim().is_empty() => {
                tracing::info!(path = %path.display(), "loaded month instructions");
                Self::with_month_instructions(text.trim())
            }
            Ok(_) => {
                tracing::warn!(path = %path.display(), "prompt file is empty; using built-in instructions");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read prompt file; using built-in instructions");
                Self::default()
            }
        }
    }

    /// Prompt for summarizing a whole month in one call.
    pub fn month_prompt(&self, label: &str, text: &str) -> String {
        format!("{}\n\nMonth: {}\n\n{}", self.month, label, text)
    }

    /// Prompt for one part of a chunked month. `part` counts from 1.
    pub fn chunk_prompt(&self, label: &str, part: usize, total: usize, text: &str) -> String {
        format!(
            "{}\n\nMonth: {} (part {} of {})\n\n{}",
            self.chunk, label, part, total, text
        )
    }

    /// Prompt for merging part summaries; `parts` carry their 1-based part number.
    pub fn reduce_prompt(&self, label: &str, parts: &[(usize, String)]) -> String {
        let body = parts
            .iter()
            .map(|(n, summary)| format!("## Part {}\n\n{}", n, summary))
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");
        format!("{}\n\nMonth: {}\n\n{}", self.reduce, label, body)
    }

    /// Prompt for the year review from `(month label, summary)` pairs in order.
    pub fn synthesis_prompt(&self, year: i32, months: &[(String, String)]) -> String {
        format!(
            "{}\n\nYear: {}\n\n{}",
            self.synthesis,
            year,
            concatenate_summaries(months)
        )
    }
}

/// Month summaries under `## <label>` headings, in the given order.
pub fn concatenate_summaries(months: &[(String, String)]) -> String {
    months
        .iter()
        .map(|(label, summary)| format!("## {}\n\n{}", label, summary))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn chunk_instructions_follow_month_instructions() {
        let prompts = Prompts::with_month_instructions("Be brief.");
        assert!(prompts.chunk.starts_with("Be brief."));
        assert!(prompts.chunk.contains("one part of a longer month"));
        assert_ne!(prompts.reduce, prompts.month);
    }

    #[test]
    fn missing_file_keeps_builtins() {
        let prompts = Prompts::load(Some(Path::new("/nope/prompt.md")));
        assert_eq!(prompts, Prompts::default());
    }

    #[test]
    fn file_replaces_month_instructions() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  Summarize like a haiku.  ").unwrap();
        let prompts = Prompts::load(Some(file.path()));
        assert_eq!(prompts.month, "Summarize like a haiku.");
        assert_eq!(prompts.synthesis, Prompts::default().synthesis);
    }

    #[test]
    fn reduce_prompt_numbers_surviving_parts() {
        let prompts = Prompts::default();
        let prompt = prompts.reduce_prompt(
            "May 2025",
            &[(1, "first".to_string()), (3, "third".to_string())],
        );
        assert!(prompt.contains("Month: May 2025"));
        assert!(prompt.contains("## Part 1\n\nfirst\n\n---\n\n## Part 3\n\nthird"));
    }

    #[test]
    fn synthesis_prompt_keeps_month_order() {
        let prompts = Prompts::default();
        let months = vec![
            ("January 2025".to_string(), "cold".to_string()),
            ("February 2025".to_string(), "colder".to_string()),
        ];
        let prompt = prompts.synthesis_prompt(2025, &months);
        let jan = prompt.find("## January 2025").unwrap();
        let feb = prompt.find("## February 2025").unwrap();
        assert!(jan < feb);
        assert!(prompt.contains("Year: 2025"));
    }
}
