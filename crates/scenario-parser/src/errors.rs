use std::path::PathBuf;

use thiserror::Error;

/// The grammar is permissive, so only I/O can fail.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read scenario {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to prepare workflow cache {path}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
