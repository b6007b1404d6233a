//! Run-level errors
//!
//! Only conditions that stop a run before any processing live here.
//! Per-month and per-call failures are recorded in results instead
//! (see [`crate::digest::MonthError`] and [`crate::llm::BackendError`]).

use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("input directory not found or not a directory: {0}")]
    InvalidInputDirectory(PathBuf),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DigestError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type DigestResult<T> = Result<T, DigestError>;
