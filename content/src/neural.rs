//! [`ContentFeatureExtractor`] backed by an ONNX speech encoder.

use std::path::Path;

use rvc_audio::{AudioBuffer, WORKING_RATE, resample};
use rvc_onnx::{ElementType, Session, SessionOptions, Tensor};
use tracing::debug;

use crate::error::ContentError;
use crate::extractor::{ContentFeatureExtractor, ExtractorKind};
use crate::features::FeatureMatrix;

/// The encoder emits one frame per 20 ms; frames are repeated to reach 10 ms.
const UPSAMPLE: usize = 2;

/// Self-supervised speech encoder (HuBERT-base family) exported to ONNX.
///
/// Expects a single float input shaped `[1, N]` of 16 kHz samples and
/// produces `[1, T', C]` hidden states from its last layer.
pub struct NeuralExtractor {
    session: Session,
    input_name: String,
    output_name: String,
    dim: usize,
}

fn encoder_err(e: impl std::fmt::Display) -> ContentError {
    ContentError::Encoder(e.to_string())
}

impl NeuralExtractor {
    /// Opens an encoder graph.
    ///
    /// Fails when the graph's inputs are not a single float tensor, or when
    /// its declared output width is known and differs from `expected_dim`.
    pub fn open(
        path: impl AsRef<Path>,
        expected_dim: usize,
        intra_threads: usize,
    ) -> Result<Self, ContentError> {
        let opts = SessionOptions { intra_threads };
        let session = Session::from_file(path, &opts).map_err(encoder_err)?;

        let input = match session.inputs() {
            [only] if only.element_type == ElementType::Float32 => only.name.clone(),
            other => {
                return Err(ContentError::Encoder(format!(
                    "expected one float input, graph declares {}",
                    other.len()
                )));
            }
        };
        let output = session
            .outputs()
            .first()
            .ok_or_else(|| ContentError::Encoder("graph declares no outputs".into()))?;

        if let Some(&width) = output.dims.last() {
            if width > 0 && width as usize != expected_dim {
                return Err(ContentError::Encoder(format!(
                    "encoder emits {width} channel(s), model expects {expected_dim}"
                )));
            }
        }

        Ok(Self {
            input_name: input,
            output_name: output.name.clone(),
            session,
            dim: expected_dim,
        })
    }
}

impl ContentFeatureExtractor for NeuralExtractor {
    fn extract(&self, audio: &AudioBuffer) -> Result<FeatureMatrix, ContentError> {
        if audio.is_empty() {
            return Err(ContentError::EmptyAudio);
        }
        let pcm = if audio.sample_rate() == WORKING_RATE {
            audio.samples().to_vec()
        } else {
            resample(audio.samples(), audio.sample_rate(), WORKING_RATE)?
        };

        let n = pcm.len() as i64;
        let input = Tensor::from_f32(&[1, n], pcm).map_err(encoder_err)?;
        let mut outputs = self
            .session
            .run(&[(self.input_name.as_str(), &input)], &[self.output_name.as_str()])
            .map_err(encoder_err)?;
        let hidden = outputs
            .pop()
            .ok_or_else(|| ContentError::Encoder("encoder returned no output".into()))?;

        let (frames, width) = match hidden.shape() {
            [1, t, c] => (*t as usize, *c as usize),
            [t, c] => (*t as usize, *c as usize),
            shape => {
                return Err(ContentError::Encoder(format!(
                    "unexpected output shape {shape:?}"
                )));
            }
        };
        if width != self.dim {
            return Err(ContentError::Encoder(format!(
                "encoder emitted {width} channel(s), expected {}",
                self.dim
            )));
        }

        let data = hidden.into_float_data().map_err(encoder_err)?;
        let features = FeatureMatrix::new(frames, width, data)?.repeat_frames(UPSAMPLE);
        debug!(
            "encoder features: {frames} frame(s) -> {} at 10 ms x {width} channel(s)",
            features.frames()
        );
        Ok(features)
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Neural
    }
}
