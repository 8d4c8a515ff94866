use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::Stage;

/// Errors returned while loading or running a synthesis model.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("synth: checkpoint not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("synth: invalid checkpoint: {0}")]
    InvalidCheckpoint(String),

    #[error("synth: architecture unavailable: {0}")]
    ArchitectureUnavailable(String),

    #[error("synth: inference: {0}")]
    Inference(String),

    #[error("synth: read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SynthError {
    /// The last stage the model had reached when this error occurred.
    pub fn stage(&self) -> Stage {
        match self {
            SynthError::MissingFile(_)
            | SynthError::Io { .. }
            | SynthError::InvalidCheckpoint(_) => Stage::Unloaded,
            SynthError::ArchitectureUnavailable(_) => Stage::ConfigParsed,
            SynthError::Inference(_) => Stage::Ready,
        }
    }
}
