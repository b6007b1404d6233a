//! Paragraph-aware chunking
//!
//! Splits text that is too large for one model call. Sizes are counted in
//! characters, not bytes, so a split never lands inside a UTF-8 sequence.

use once_cell::sync::Lazy;
use regex::Regex;

/// Blank-line paragraph boundary (tolerates whitespace-only lines)
static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*\n").expect("paragraph break pattern should compile"));

/// Re-inserted between paragraphs that share a chunk
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split `text` into ordered chunks of at most `max_size` characters.
///
/// Text that fits is returned as one chunk. Otherwise paragraphs are packed
/// greedily; a paragraph longer than `max_size` on its own is cut into
/// `max_size`-character windows, ignoring word boundaries. No chunk is
/// empty, so whitespace-only input yields no chunks. `max_size` of zero is
/// treated as one.
pub fn chunk_text(text: &str, max_size: usize) -> Vec<String> {
    let max_size = max_size.max(1);

    if text.trim().is_empty() {
        return Vec::new();
    }
    if char_len(text) <= max_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    let separator_len = char_len(PARAGRAPH_SEPARATOR);

    for paragraph in PARAGRAPH_BREAK.split(text) {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }
        let paragraph_len = char_len(paragraph);

        if paragraph_len > max_size {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            chunks.extend(force_split(paragraph, max_size));
            continue;
        }

        let joined_len = if current.is_empty() {
            paragraph_len
        } else {
            current_len + separator_len + paragraph_len
        };

        if joined_len <= max_size {
            if !current.is_empty() {
                current.push_str(PARAGRAPH_SEPARATOR);
            }
            current.push_str(paragraph);
            current_len = joined_len;
        } else {
            chunks.push(std::mem::replace(&mut current, paragraph.to_string()));
            current_len = paragraph_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Fixed windows of `size` characters; only the last may be shorter.
fn force_split(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size)
        .map(|window| window.iter().collect())
        .collect()
}
