use thiserror::Error;

/// Errors returned by pitch estimation.
///
/// [`extract_f0`](crate::extract_f0) never surfaces these; it logs them and
/// returns an all-unvoiced contour instead.
#[derive(Debug, Error)]
pub enum PitchError {
    #[error("pitch: invalid config: {0}")]
    InvalidConfig(String),

    #[error("pitch: empty audio")]
    EmptyAudio,
}
