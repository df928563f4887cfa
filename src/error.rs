use azblob::StorageError;
use std::path::PathBuf;

use crate::settings::ConfigError;

pub type RunResult<T> = Result<T, RunError>;

/// Everything that can end a run. Every variant is fatal; the first one
/// raised stops the pass.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("connection error: {0}")]
    Connection(#[source] StorageError),

    #[error("failed to list blobs: {0}")]
    Listing(#[source] StorageError),

    #[error("failed to download '{name}': {source}")]
    Download {
        name: String,
        #[source]
        source: StorageError,
    },

    #[error("filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("blob name '{name}' does not map to a path under the destination root")]
    InvalidBlobName { name: String },
}
