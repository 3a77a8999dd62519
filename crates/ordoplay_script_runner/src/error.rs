// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runner errors.

use ordoplay_script_graph::GraphError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop the runner
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Reading or writing a file failed
    #[error("{}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Settings file is not valid RON
    #[error("Invalid settings: {0}")]
    SettingsParse(#[from] ron::error::SpannedError),

    /// Settings could not be written as RON
    #[error("Cannot write settings: {0}")]
    SettingsWrite(#[from] ron::Error),

    /// Settings written by a newer runner
    #[error("Settings format version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest version this runner reads
        supported: u32,
    },

    /// Tick rate of zero
    #[error("Tick rate must be at least 1 Hz")]
    InvalidTickRate,

    /// Loading or running the graph failed
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Result type for runner operations
pub type Result<T> = std::result::Result<T, RunnerError>;

impl RunnerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
