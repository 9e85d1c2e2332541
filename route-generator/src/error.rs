//! Top-level error type for the route generator.

use std::path::PathBuf;

use reqwest::StatusCode;
use url::Url;

/// Errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configuration could not be loaded or failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] config::ConfigError),

    /// The HTTP client could not be built or the request failed.
    #[error("could not fetch the delegation feed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The feed server answered with a non-success status.
    #[error("the feed server at {0} answered with status {1}")]
    HttpStatus(Url, StatusCode),

    /// A local copy of the feed could not be read.
    #[error("could not read the delegation feed at {}: {source}", path.display())]
    ReadFeed {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// A generated script could not be written.
    #[error("could not write {}: {source}", path.display())]
    WriteScript {
        /// The file or directory being written.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The feed could not be aggregated.
    #[error(transparent)]
    Routes(#[from] routes::Error),
}
