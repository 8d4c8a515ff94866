//! Frame-level content features for voice conversion.
//!
//! Content features describe *what* is said, independent of who says it.
//! Two extractors implement [`ContentFeatureExtractor`]:
//!
//! - `NeuralExtractor` (feature `onnx`): a self-supervised speech encoder
//!   run through ONNX Runtime, upsampled from 20 ms to 10 ms frames
//! - [`FallbackExtractor`]: MFCCs zero padded to the model's width, used
//!   when the encoder cannot be loaded
//!
//! [`select_extractor`] chooses between them and never fails; the returned
//! extractor's [`kind`](ContentFeatureExtractor::kind) tells the caller
//! whether conversion runs in degraded mode.

mod error;
mod extractor;
mod fallback;
mod features;
#[cfg(feature = "onnx")]
mod neural;

pub use error::ContentError;
pub use extractor::{
    ContentFeatureExtractor, ExtractorConfig, ExtractorKind, HOP_MS, select_extractor,
};
pub use fallback::FallbackExtractor;
pub use features::FeatureMatrix;
#[cfg(feature = "onnx")]
pub use neural::NeuralExtractor;
