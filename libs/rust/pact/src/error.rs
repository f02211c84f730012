//! Contract discovery and loading errors.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while listing or reading contract files.
#[derive(Error, Debug)]
pub enum ContractError {
    /// The contract directory or a contract file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Path that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON or lacks a required top-level field
    #[error("{}: {reason}", file_label(path))]
    MalformedContract {
        /// Offending file
        path: PathBuf,
        /// What is wrong with it
        reason: String,
    },

    /// The file declares an empty interaction list
    #[error("{}: No interactions defined", file_label(path))]
    EmptyContract {
        /// Offending file
        path: PathBuf,
    },
}

impl ContractError {
    /// Create an I/O error for the given path.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a malformed contract error.
    #[must_use]
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedContract {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. }
            | Self::MalformedContract { path, .. }
            | Self::EmptyContract { path } => path,
        }
    }

    /// Check whether this is a structural problem with the file contents,
    /// as opposed to a failure to read it.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::MalformedContract { .. } | Self::EmptyContract { .. }
        )
    }
}

pub(crate) fn file_label(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}
