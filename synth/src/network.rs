use std::collections::BTreeMap;

use crate::checkpoint::Weight;
use crate::config::ModelConfig;
use crate::error::SynthError;
use crate::variant::Variant;

/// One utterance prepared for the network. All sequences are `frames` long.
#[derive(Debug, Clone, Copy)]
pub struct NetworkInputs<'a> {
    /// Row-major `[frames, dim]` content features.
    pub features: &'a [f32],
    pub frames: usize,
    pub dim: usize,
    /// Coarse pitch bins, present for pitch-conditioned variants.
    pub pitch_bins: Option<&'a [i64]>,
    /// Continuous F0 in Hz, present for pitch-conditioned variants.
    pub pitch_hz: Option<&'a [f32]>,
    pub speaker_id: i64,
}

/// An instantiated synthesis network.
///
/// The network itself is opaque; callers see only its parameter names and
/// its numeric contract: `frames` content frames in, `frames * sr / 100`
/// waveform samples out.
pub trait SynthesisNetwork: Send {
    /// Names of the parameters the network can take from a checkpoint.
    fn parameter_names(&self) -> Vec<String>;

    /// Installs matched parameters. Names not declared by the network are
    /// never passed in.
    fn load_weights(&mut self, weights: BTreeMap<String, Weight>) -> Result<(), SynthError>;

    fn run(&mut self, inputs: &NetworkInputs<'_>) -> Result<Vec<f32>, SynthError>;
}

/// Builds the network for a variant.
pub trait VariantFactory: Send + Sync {
    fn create(
        &self,
        variant: Variant,
        cfg: &ModelConfig,
    ) -> Result<Box<dyn SynthesisNetwork>, SynthError>;
}
