use std::path::PathBuf;

use rvc_audio::AudioError;
use rvc_content::ContentError;
use rvc_synth::SynthError;
use thiserror::Error;

/// Errors returned by a conversion.
///
/// Failures from the audio, content and synthesis stages are carried
/// unchanged; [`kind`](ConvertError::kind) classifies them.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("convert: unknown model {0:?}")]
    UnknownModel(String),

    #[error("convert: file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("convert: {} is too short to yield a content frame", .0.display())]
    TooShort(PathBuf),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Synth(SynthError),
}

/// Failure classes a caller can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnknownModel,
    MissingFile,
    UnreadableAudio,
    InvalidCheckpoint,
    ArchitectureUnavailable,
    Inference,
    Io,
}

impl From<SynthError> for ConvertError {
    fn from(e: SynthError) -> Self {
        match e {
            SynthError::MissingFile(path) => ConvertError::MissingFile(path),
            other => ConvertError::Synth(other),
        }
    }
}

impl ConvertError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::UnknownModel(_) => ErrorKind::UnknownModel,
            ConvertError::MissingFile(_) => ErrorKind::MissingFile,
            ConvertError::TooShort(_) => ErrorKind::UnreadableAudio,
            ConvertError::Audio(AudioError::NotFound(_) | AudioError::Unreadable { .. }) => {
                ErrorKind::UnreadableAudio
            }
            ConvertError::Audio(_) => ErrorKind::Io,
            ConvertError::Content(ContentError::Audio(_) | ContentError::EmptyAudio) => {
                ErrorKind::UnreadableAudio
            }
            ConvertError::Content(_) => ErrorKind::Inference,
            ConvertError::Synth(e) => match e {
                SynthError::MissingFile(_) => ErrorKind::MissingFile,
                SynthError::InvalidCheckpoint(_) => ErrorKind::InvalidCheckpoint,
                SynthError::ArchitectureUnavailable(_) => ErrorKind::ArchitectureUnavailable,
                SynthError::Inference(_) => ErrorKind::Inference,
                SynthError::Io { .. } => ErrorKind::Io,
            },
        }
    }
}
