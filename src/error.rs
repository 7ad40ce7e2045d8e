use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GrabError {
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed notebook {}: {source}", path.display())]
    Notebook {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported notebook format version {version} in {}", path.display())]
    UnsupportedNotebook { path: PathBuf, version: u32 },

    #[error("not a text file: {}", .0.display())]
    Binary(PathBuf),

    #[error("invalid exclude pattern: {0}")]
    Pattern(#[from] globset::Error),
}

impl GrabError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GrabError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, GrabError>;
