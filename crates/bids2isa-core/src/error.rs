//! Error taxonomy for a conversion run.
//!
//! Only structural failures live here. Per-file and per-value problems
//! (unreadable image headers, unknown vocabulary values) are recovered and
//! reported through [`crate::diagnostics::Diagnostics`] instead.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::table::TableError;

pub type Result<T, E = ConversionError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("study root '{}' does not exist or is not a directory", path.display())]
    MissingStudyRoot { path: PathBuf },

    #[error("malformed sidecar '{}': {message}", path.display())]
    MalformedSidecar { path: PathBuf, message: String },

    #[error("malformed vocabulary '{}': {message}", path.display())]
    MalformedVocabulary { path: PathBuf, message: String },

    #[error("malformed participants table '{}' (line {line}): {message}", path.display())]
    MalformedParticipants {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("no participants row for subject(s): {}", subjects.join(", "))]
    UnmatchedJoinKey { subjects: Vec<String> },

    #[error("i/o error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Table(#[from] TableError),
}

impl ConversionError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn malformed_sidecar(path: &Path, message: impl Into<String>) -> Self {
        Self::MalformedSidecar {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}
