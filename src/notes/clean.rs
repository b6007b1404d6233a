//! Content normalization
//!
//! Journal templates leave a lot of scaffolding behind: empty bullets,
//! `Label:` fields nobody filled in, runs of blank lines. Stripping them
//! before summarization cuts token cost without touching anything written.

use once_cell::sync::Lazy;
use regex::Regex;

/// A list marker with nothing after it (`-`, `*`, `+`, `1.`, `- [ ]`).
static BARE_BULLET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[-*+]|\d+[.)])(?:\s*\[[ xX]?\])?\s*$")
        .expect("bare bullet pattern should compile")
});

/// A template field with no value (`Mood:`, `- **Gratitude:**`).
static EMPTY_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[-*+]\s+)?(?:\*\*|__)?[A-Za-z][A-Za-z0-9 '&/()-]{0,60}(?:\*\*|__)?:(?:\*\*|__)?\s*$")
        .expect("empty label pattern should compile")
});

/// Most consecutive blank lines kept.
const MAX_BLANK_RUN: usize = 2;

/// Whether a line carries no information at all.
pub fn is_boilerplate_line(line: &str) -> bool {
    BARE_BULLET.is_match(line) || EMPTY_LABEL.is_match(line)
}

/// Normalize note text.
///
/// Drops bare list markers and empty `Label:` lines, trims trailing
/// whitespace, keeps at most two consecutive blank lines and trims the
/// document. Every other line survives with its content unchanged.
/// `clean(&clean(t)) == clean(t)` for all `t`.
pub fn clean(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut blank_run = 0;

    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run <= MAX_BLANK_RUN {
                out.push(line);
            }
            continue;
        }
        if is_boilerplate_line(line) {
            continue;
        }
        blank_run = 0;
        out.push(line);
    }

    out.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "## 3/4/25\n\
        Mood:\n\
        - **Gratitude:**\n\
        - \n\
        * [ ]\n\
        1.\n\
        - walked to the river   \n\
        Weather: rainy\n\
        \n\
        \n\
        \n\
        \n\
        Notes:\n\
        - finished the book\n";

    #[test]
    fn removes_empty_scaffolding() {
        let cleaned = clean(TEMPLATE);
        assert_eq!(
            cleaned,
            "## 3/4/25\n- walked to the river\nWeather: rainy\n\n\n- finished the book"
        );
    }

    #[test]
    fn is_idempotent() {
        let samples = [
            TEMPLATE,
            "",
            "   \n\n  leading\n",
            "\n\n\n\n- \n\nText\n\n\n\n\nMore\t \n",
            "Label:\n\nLabel: value\n- [x]\n- [x] done\n",
            "a\r\nb  \r\n\r\n\r\n\r\n\r\nc",
        ];
        for sample in samples {
            let once = clean(sample);
            assert_eq!(clean(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn never_shrinks_meaningful_lines() {
        let text = "- [x] done the dishes\n3. third point\nQuestion: why?\n  indented thought";
        assert_eq!(clean(text), text);
    }

    #[test]
    fn sentence_ending_in_colon_with_punctuation_survives() {
        let text = "Today, after lunch, I realized:";
        assert_eq!(clean(text), text);
    }

    #[test]
    fn output_is_never_longer() {
        for sample in [TEMPLATE, "x\n\n\n\n\ny", "  a  \n"] {
            assert!(clean(sample).len() <= sample.len());
        }
    }

    #[test]
    fn boilerplate_detection() {
        assert!(is_boilerplate_line("-"));
        assert!(is_boilerplate_line("  * [ ]  "));
        assert!(is_boilerplate_line("Energy level:"));
        assert!(is_boilerplate_line("- __Wins__:"));
        assert!(!is_boilerplate_line("- win"));
        assert!(!is_boilerplate_line("## 2/5/25"));
        assert!(!is_boilerplate_line("Energy level: high"));
    }
}
