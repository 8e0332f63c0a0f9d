use std::path::PathBuf;

use thiserror::Error;

/// Failures saving or loading a drawing. None of them are fatal to the
/// session; the caller reports them and carries on.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not write drawing to {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read drawing from {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a valid drawing", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not export image to {}", .path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl StoreError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            StoreError::Write { path, .. }
            | StoreError::Read { path, .. }
            | StoreError::Parse { path, .. }
            | StoreError::Export { path, .. } => path,
        }
    }
}
