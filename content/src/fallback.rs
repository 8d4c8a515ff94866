//! MFCC stand-in for the neural encoder.

use rvc_audio::dsp::{Mfcc, MfccConfig};
use rvc_audio::{AudioBuffer, WORKING_RATE, resample};
use tracing::debug;

use crate::error::ContentError;
use crate::extractor::{ContentFeatureExtractor, ExtractorKind};
use crate::features::FeatureMatrix;

/// Spectral features zero padded to the model's content width.
///
/// Uses 40 MFCCs (1024-point FFT, 160-sample hop at 16 kHz) in the first
/// columns; remaining columns are zero. Frame count is `1 + n / 160`.
pub struct FallbackExtractor {
    mfcc: Mfcc,
    dim: usize,
}

impl FallbackExtractor {
    /// Creates an extractor producing `dim` channels per frame.
    pub fn new(dim: usize) -> Self {
        Self {
            mfcc: Mfcc::new(MfccConfig::default()),
            dim,
        }
    }
}

impl ContentFeatureExtractor for FallbackExtractor {
    fn extract(&self, audio: &AudioBuffer) -> Result<FeatureMatrix, ContentError> {
        if audio.is_empty() {
            return Err(ContentError::EmptyAudio);
        }
        let pcm = if audio.sample_rate() == WORKING_RATE {
            audio.samples().to_vec()
        } else {
            resample(audio.samples(), audio.sample_rate(), WORKING_RATE)?
        };

        let coeffs = self.mfcc.extract(&pcm);
        let features = FeatureMatrix::from_rows(&coeffs, self.dim);
        debug!(
            "mfcc features: {} frame(s) x {} channel(s)",
            features.frames(),
            features.dim()
        );
        Ok(features)
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Fallback
    }
}
