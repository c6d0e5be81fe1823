//! Error type shared by loaders, configuration and output writers
//!
//! Only file-level failures surface here. Resolution misses and out-of-range
//! indicator values are absorbed by the pipeline and reported as counters.

use std::path::{Path, PathBuf};

/// Fatal errors that abort a batch run
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to parse JSON {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid boundary data in {path}: {message}")]
    Boundary { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl IndexError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        IndexError::Io { path: path.to_path_buf(), source }
    }

    pub fn csv(path: &Path, source: csv::Error) -> Self {
        IndexError::Csv { path: path.to_path_buf(), source }
    }

    pub fn json(path: &Path, source: serde_json::Error) -> Self {
        IndexError::Json { path: path.to_path_buf(), source }
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
