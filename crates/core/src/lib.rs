//! Core shared types and errors (renderer-agnostic).

use std::{
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

pub use glam::{Vec2, Vec3, vec2, vec3};

/// Every way a single asset load can fail. All variants are terminal for the
/// load: no partial mesh or texture is ever returned alongside one.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Failed to open {}: {source}", path.display())]
    FileUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Malformed mesh: {0}")]
    MalformedMesh(String),
    #[error("Malformed texture: {0}")]
    MalformedTexture(String),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl AssetError {
    pub fn file_unavailable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileUnavailable {
            path: path.into(),
            source,
        }
    }
}

pub type AssetResult<T> = Result<T, AssetError>;

/// Read a whole file, mapping any open/read failure to [`AssetError::FileUnavailable`].
pub fn read_file(path: impl AsRef<Path>) -> AssetResult<Vec<u8>> {
    let path = path.as_ref();
    std::fs::read(path).map_err(|e| AssetError::file_unavailable(path, e))
}
