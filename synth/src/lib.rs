//! Synthesis models for voice conversion.
//!
//! A model is loaded in stages, each a typed value:
//!
//! 1. [`Checkpoint::open`] reads the weight record
//! 2. [`ModelConfig::from_checkpoint`] parses its hyperparameters
//! 3. [`Variant::select`] and a [`VariantFactory`] build the network
//! 4. [`reconcile_weights`] matches checkpoint weights to network parameters
//! 5. [`SynthesisModel`] is ready for [`infer`](SynthesisModel::infer)
//!
//! The network is opaque. With feature `onnx`, `OnnxVariantFactory` runs
//! exported graphs through ONNX Runtime.

mod checkpoint;
mod config;
mod error;
mod model;
mod network;
#[cfg(feature = "onnx")]
mod network_onnx;
mod variant;
mod weights;

pub use checkpoint::{Checkpoint, DType, Weight, save_checkpoint};
pub use config::{ContentDim, DEFAULT_SAMPLE_RATE, DEFAULT_VERSION, ModelConfig, PitchMode};
pub use error::SynthError;
pub use model::{Stage, SynthesisModel};
pub use network::{NetworkInputs, SynthesisNetwork, VariantFactory};
#[cfg(feature = "onnx")]
pub use network_onnx::{OnnxNetwork, OnnxVariantFactory};
pub use variant::Variant;
pub use weights::{WeightReport, reconcile_weights};
