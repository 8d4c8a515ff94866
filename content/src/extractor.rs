use std::fmt;
use std::path::PathBuf;

use rvc_audio::AudioBuffer;
use tracing::{info, warn};

use crate::error::ContentError;
use crate::fallback::FallbackExtractor;
use crate::features::FeatureMatrix;

/// Hop between content frames, in milliseconds.
pub const HOP_MS: u32 = 10;

/// Which extractor produced a feature matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorKind {
    /// Pretrained self-supervised speech encoder.
    Neural,
    /// Spectral features standing in for the encoder (degraded mode).
    Fallback,
}

impl ExtractorKind {
    /// True when features come from the spectral stand-in.
    pub fn is_degraded(self) -> bool {
        matches!(self, ExtractorKind::Fallback)
    }
}

impl fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractorKind::Neural => f.write_str("neural"),
            ExtractorKind::Fallback => f.write_str("fallback"),
        }
    }
}

/// Produces frame-level content features from 16 kHz mono audio.
///
/// # Thread Safety
///
/// Implementations must be safe for concurrent use.
pub trait ContentFeatureExtractor: Send + Sync {
    /// Computes a `T x dim()` feature matrix with a [`hop_ms`](Self::hop_ms) hop.
    fn extract(&self, audio: &AudioBuffer) -> Result<FeatureMatrix, ContentError>;

    /// Hop between frames in milliseconds.
    fn hop_ms(&self) -> u32 {
        HOP_MS
    }

    /// Channels per frame.
    fn dim(&self) -> usize;

    /// Which extractor this is.
    fn kind(&self) -> ExtractorKind;
}

/// Configuration for [`select_extractor`].
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Path to the ONNX speech encoder.
    pub encoder_path: PathBuf,
    /// Channels the synthesis model expects (256 or 768).
    pub content_dim: usize,
    /// Operator threads for the encoder session; 0 lets the runtime decide.
    pub intra_threads: usize,
}

impl ExtractorConfig {
    /// Creates a config with default threading.
    pub fn new(encoder_path: impl Into<PathBuf>, content_dim: usize) -> Self {
        Self {
            encoder_path: encoder_path.into(),
            content_dim,
            intra_threads: 0,
        }
    }
}

/// Picks the neural encoder when it can be initialized, otherwise the
/// MFCC stand-in.
///
/// Never fails: any initialization problem (support not compiled in,
/// missing file, session error, output width not matching `content_dim`)
/// is logged at WARN and the fallback is returned. Check
/// [`ContentFeatureExtractor::kind`] to learn which one was chosen.
pub fn select_extractor(cfg: &ExtractorConfig) -> Box<dyn ContentFeatureExtractor> {
    match try_neural(cfg) {
        Ok(extractor) => {
            info!(
                "using neural content encoder {} ({} channels)",
                cfg.encoder_path.display(),
                extractor.dim()
            );
            extractor
        }
        Err(reason) => {
            warn!(
                "content encoder unavailable ({reason}); using MFCC features, conversion quality will be degraded"
            );
            Box::new(FallbackExtractor::new(cfg.content_dim))
        }
    }
}

#[cfg(feature = "onnx")]
fn try_neural(cfg: &ExtractorConfig) -> Result<Box<dyn ContentFeatureExtractor>, String> {
    if !cfg.encoder_path.is_file() {
        return Err(format!("{} not found", cfg.encoder_path.display()));
    }
    crate::neural::NeuralExtractor::open(&cfg.encoder_path, cfg.content_dim, cfg.intra_threads)
        .map(|e| Box::new(e) as Box<dyn ContentFeatureExtractor>)
        .map_err(|e| e.to_string())
}

#[cfg(not(feature = "onnx"))]
fn try_neural(_cfg: &ExtractorConfig) -> Result<Box<dyn ContentFeatureExtractor>, String> {
    Err("built without onnx support".to_string())
}
