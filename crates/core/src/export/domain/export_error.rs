use std::path::PathBuf;

use thiserror::Error;

/// Failure writing or reading back a trajectory export.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not move export into place at {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path}, line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("{path}: coordinate {position} has frame {frame} after frame {previous}")]
    Unordered {
        path: PathBuf,
        position: usize,
        frame: usize,
        previous: usize,
    },
    #[error("unsupported export format: {0} (expected .csv or .json)")]
    UnsupportedFormat(PathBuf),
}

impl ExportError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            ExportError::Io { path, .. }
            | ExportError::Json { path, .. }
            | ExportError::Persist { path, .. }
            | ExportError::Parse { path, .. }
            | ExportError::Unordered { path, .. }
            | ExportError::UnsupportedFormat(path) => path,
        }
    }
}
