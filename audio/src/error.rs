use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by audio operations.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio: file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("audio: unreadable {}: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("audio: write {}: {reason}", .path.display())]
    Write { path: PathBuf, reason: String },

    #[error("audio: resample: {0}")]
    Resample(String),

    #[error("audio: invalid buffer: {0}")]
    InvalidBuffer(String),
}

impl From<rubato::ResamplerConstructionError> for AudioError {
    fn from(e: rubato::ResamplerConstructionError) -> Self {
        AudioError::Resample(e.to_string())
    }
}

impl From<rubato::ResampleError> for AudioError {
    fn from(e: rubato::ResampleError) -> Self {
        AudioError::Resample(e.to_string())
    }
}
