use std::path::PathBuf;
use thiserror::Error;

/// Failures that stop a scan before any line is examined
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Input not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Failed to read '{}': {source}", path.display())]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ScanError>;
