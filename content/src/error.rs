use thiserror::Error;

/// Errors returned by content feature extraction.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content: encoder: {0}")]
    Encoder(String),

    #[error("content: empty audio")]
    EmptyAudio,

    #[error("content: matrix shape {frames}x{dim} does not match {len} value(s)")]
    Shape { frames: usize, dim: usize, len: usize },

    #[error("content: audio: {0}")]
    Audio(#[from] rvc_audio::AudioError),
}
