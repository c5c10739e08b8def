use std::path::PathBuf;
use thiserror::Error;

/// Fatal analysis failures. Everything below the root degrades per file instead.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("repository root not found: {0}")]
    RootNotFound(PathBuf),

    #[error("repository root is not a directory: {0}")]
    RootNotDirectory(PathBuf),

    #[error("repository root is unreadable: {path}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
