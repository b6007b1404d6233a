//! Journal Digest: month-by-month summaries of a year of journal notes
//!
//! Reads a directory of dated note files, cleans them, groups them by
//! calendar month and asks a local language model for one summary per
//! month, then for a single year review built from those summaries.
//!
//! # Core Concepts
//!
//! - **Notes**: one file each, dated by its first `#`-heading in `M/D/YY` form
//! - **Month groups**: notes of the same month, plus one group for undated notes
//! - **Chunking**: months too large for one call are split on paragraph
//!   boundaries, summarized part by part and merged
//! - **Batches**: months are processed `concurrency` at a time
//!
//! # Example
//!
//! ```
//! use journal_digest::notes::{group_by_month, Note};
//!
//! let notes = vec![
//!     Note::new("a.md", "## 2/14/24\nWalked the dog", 2025),
//!     Note::new("b.md", "no heading here", 2025),
//! ];
//! let groups = group_by_month(notes);
//! assert_eq!(groups[0].key_string(), "2025-02");
//! assert_eq!(groups[1].key_string(), "unknown");
//! ```

pub mod artifacts;
pub mod chunk;
pub mod concat;
pub mod config;
pub mod digest;
mod error;
pub mod estimate;
pub mod llm;
pub mod notes;
mod pipeline;
pub mod prompts;

pub use artifacts::ArtifactStore;
pub use config::{ConfigError, DigestConfig};
pub use digest::{AggregateResult, MonthResult, MonthStatus};
pub use error::{DigestError, DigestResult};
pub use llm::{BackendError, Generation, MockSummarizer, OllamaClient, Summarizer};
pub use pipeline::{ConcatReport, DigestPipeline, DryRunReport, RunReport};
pub use prompts::Prompts;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
