//! Error type shared by the snapkeep library crates

use std::path::PathBuf;

/// Result type for snapkeep operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A listed path is not a `root/YYYY/MM/DD/serial` snapshot
    #[error("malformed snapshot path {}: {reason}", path.display())]
    MalformedSnapshotPath { path: PathBuf, reason: String },

    /// No settings file could be found
    #[error("no configuration found (searched: {})", format_searched(.searched))]
    ConfigurationMissing { searched: Vec<PathBuf> },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A store or synchronizer call failed
    #[error("{op} failed for {}: {detail}", path.display())]
    CollaboratorFailure {
        op: &'static str,
        path: PathBuf,
        detail: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedSnapshotPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn collaborator(op: &'static str, path: impl Into<PathBuf>, detail: impl ToString) -> Self {
        Self::CollaboratorFailure {
            op,
            path: path.into(),
            detail: detail.to_string(),
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::InvalidConfiguration(err.to_string())
    }
}

fn format_searched(searched: &[PathBuf]) -> String {
    searched
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
