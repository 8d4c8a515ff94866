//! Synthesis networks exported as ONNX graphs, one graph per variant.
//!
//! Data inputs follow the usual voice conversion export:
//!
//! | name | shape | type |
//! |---|---|---|
//! | `phone` | `[1, T, C]` | f32 |
//! | `phone_lengths` | `[1]` | i64 |
//! | `pitch` | `[1, T]` | i64 |
//! | `pitchf` | `[1, T]` | f32 |
//! | `ds` | `[1]` | i64 |
//! | `rnd` | `[1, inter, T]` | f32 |
//!
//! Every other graph input is a parameter that checkpoint weights override.
//! Graphs must therefore be exported with their initializers as inputs; a
//! graph with baked-in weights exposes no parameters and is refused when a
//! model loads, since its output would ignore the checkpoint.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rvc_onnx::{IoSpec, Session, SessionOptions, Tensor};
use tracing::debug;

use crate::checkpoint::Weight;
use crate::config::ModelConfig;
use crate::error::SynthError;
use crate::network::{NetworkInputs, SynthesisNetwork, VariantFactory};
use crate::variant::Variant;

const PHONE: &str = "phone";
const PHONE_LENGTHS: &str = "phone_lengths";
const PITCH: &str = "pitch";
const PITCHF: &str = "pitchf";
const SPEAKER: &str = "ds";
const NOISE: &str = "rnd";

const DATA_INPUTS: [&str; 6] = [PHONE, PHONE_LENGTHS, PITCH, PITCHF, SPEAKER, NOISE];

/// Scale of the prior noise fed to the flow.
const NOISE_SCALE: f32 = 0.66666;
const DEFAULT_INTER_CHANNELS: usize = 192;
const NOISE_SEED: u64 = 1986;

/// Loads `<graphs_dir>/<graph name>.onnx` for each variant.
#[derive(Debug, Clone)]
pub struct OnnxVariantFactory {
    graphs_dir: PathBuf,
    options: SessionOptions,
}

impl OnnxVariantFactory {
    pub fn new(graphs_dir: impl Into<PathBuf>) -> Self {
        Self {
            graphs_dir: graphs_dir.into(),
            options: SessionOptions::default(),
        }
    }

    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.options.intra_threads = threads;
        self
    }

    /// Graph file for `variant`.
    pub fn graph_path(&self, variant: Variant) -> PathBuf {
        self.graphs_dir.join(format!("{}.onnx", variant.graph_name()))
    }
}

impl VariantFactory for OnnxVariantFactory {
    fn create(
        &self,
        variant: Variant,
        cfg: &ModelConfig,
    ) -> Result<Box<dyn SynthesisNetwork>, SynthError> {
        let path = self.graph_path(variant);
        let network = OnnxNetwork::open(&path, variant, cfg, &self.options)?;
        Ok(Box::new(network))
    }
}

/// A synthesis graph plus the checkpoint weights bound to its parameters.
pub struct OnnxNetwork {
    session: Session,
    variant: Variant,
    inter_channels: usize,
    output: String,
    parameters: Vec<IoSpec>,
    bound: BTreeMap<String, Tensor>,
}

impl OnnxNetwork {
    pub fn open(
        path: &Path,
        variant: Variant,
        cfg: &ModelConfig,
        options: &SessionOptions,
    ) -> Result<Self, SynthError> {
        if !path.is_file() {
            return Err(SynthError::ArchitectureUnavailable(format!(
                "{variant}: graph {} not found",
                path.display()
            )));
        }
        let session = Session::from_file(path, options)
            .map_err(|e| SynthError::ArchitectureUnavailable(format!("{variant}: {e}")))?;

        let mut required = vec![PHONE];
        if variant.pitch_conditioned() {
            required.extend([PITCH, PITCHF]);
        }
        for name in required {
            if session.input(name).is_none() {
                return Err(SynthError::ArchitectureUnavailable(format!(
                    "{variant}: graph {} has no {name:?} input",
                    path.display()
                )));
            }
        }
        if let Some(phone) = session.input(PHONE) {
            let width = phone.dims.last().copied().unwrap_or(-1);
            if width > 0 && width as usize != variant.content_dim().width() {
                return Err(SynthError::ArchitectureUnavailable(format!(
                    "{variant}: graph expects content width {width}"
                )));
            }
        }

        let output = session
            .outputs()
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| {
                SynthError::ArchitectureUnavailable(format!("{variant}: graph has no outputs"))
            })?;

        let inter_channels = session
            .input(NOISE)
            .and_then(|spec| spec.dims.get(1).copied())
            .filter(|&d| d > 0)
            .map(|d| d as usize)
            .or(cfg.inter_channels)
            .unwrap_or(DEFAULT_INTER_CHANNELS);

        let parameters: Vec<IoSpec> = session
            .inputs()
            .iter()
            .filter(|spec| !DATA_INPUTS.contains(&spec.name.as_str()))
            .cloned()
            .collect();
        debug!(
            "{variant}: graph {} with {} parameter input(s)",
            path.display(),
            parameters.len()
        );

        Ok(Self {
            session,
            variant,
            inter_channels,
            output,
            parameters,
            bound: BTreeMap::new(),
        })
    }

    /// Re-seeded on every call, so identical inputs give identical output.
    fn noise(&self, frames: usize) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(NOISE_SEED);
        (0..self.inter_channels * frames)
            .map(|_| gaussian(&mut rng) * NOISE_SCALE)
            .collect()
    }
}

/// Standard normal sample (Box-Muller).
fn gaussian(rng: &mut impl Rng) -> f32 {
    let u1: f32 = rng.r#gen::<f32>().max(f32::MIN_POSITIVE);
    let u2: f32 = rng.r#gen::<f32>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
}

fn onnx_err(variant: Variant, e: rvc_onnx::OnnxError) -> SynthError {
    SynthError::Inference(format!("{variant}: {e}"))
}

impl SynthesisNetwork for OnnxNetwork {
    fn parameter_names(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name.clone()).collect()
    }

    fn load_weights(&mut self, weights: BTreeMap<String, Weight>) -> Result<(), SynthError> {
        for (name, weight) in weights {
            let shape: Vec<i64> = weight.shape.iter().map(|&d| d as i64).collect();
            if let Some(spec) = self.parameters.iter().find(|p| p.name == name) {
                let fits = spec.dims.len() == shape.len()
                    && spec.dims.iter().zip(&shape).all(|(&d, &s)| d < 0 || d == s);
                if !fits {
                    return Err(SynthError::InvalidCheckpoint(format!(
                        "weight {name:?} shape {shape:?} does not fit {:?}",
                        spec.dims
                    )));
                }
            }
            let tensor = Tensor::from_f32(&shape, weight.data).map_err(|e| {
                SynthError::InvalidCheckpoint(format!("weight {name:?}: {e}"))
            })?;
            self.bound.insert(name, tensor);
        }
        Ok(())
    }

    fn run(&mut self, inputs: &NetworkInputs<'_>) -> Result<Vec<f32>, SynthError> {
        let v = self.variant;
        let t = inputs.frames as i64;

        let mut owned: Vec<(&str, Tensor)> = vec![
            (
                PHONE,
                Tensor::new(&[1, t, inputs.dim as i64], inputs.features).map_err(|e| onnx_err(v, e))?,
            ),
            (
                PHONE_LENGTHS,
                Tensor::from_i64(&[1], vec![t]).map_err(|e| onnx_err(v, e))?,
            ),
        ];
        if let (Some(bins), Some(hz)) = (inputs.pitch_bins, inputs.pitch_hz) {
            owned.push((
                PITCH,
                Tensor::from_i64(&[1, t], bins.to_vec()).map_err(|e| onnx_err(v, e))?,
            ));
            owned.push((PITCHF, Tensor::new(&[1, t], hz).map_err(|e| onnx_err(v, e))?));
        }
        if self.session.input(SPEAKER).is_some() {
            owned.push((
                SPEAKER,
                Tensor::from_i64(&[1], vec![inputs.speaker_id]).map_err(|e| onnx_err(v, e))?,
            ));
        }
        if self.session.input(NOISE).is_some() {
            owned.push((
                NOISE,
                Tensor::from_f32(&[1, self.inter_channels as i64, t], self.noise(inputs.frames))
                    .map_err(|e| onnx_err(v, e))?,
            ));
        }

        let mut feeds: Vec<(&str, &Tensor)> = owned.iter().map(|(n, t)| (*n, t)).collect();
        feeds.extend(self.bound.iter().map(|(n, t)| (n.as_str(), t)));

        let mut outputs = self
            .session
            .run(&feeds, &[self.output.as_str()])
            .map_err(|e| onnx_err(v, e))?;
        let wave = outputs
            .pop()
            .ok_or_else(|| SynthError::Inference(format!("{v}: graph returned no output")))?;
        wave.into_float_data().map_err(|e| onnx_err(v, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ContentDim, PitchMode};

    fn cfg() -> ModelConfig {
        ModelConfig {
            sample_rate: 40000,
            content_dim: ContentDim::D256,
            pitch: PitchMode::Conditioned,
            version: "v1".into(),
            inter_channels: Some(192),
            upsample_rates: None,
            speaker_count: None,
            raw: Vec::new(),
        }
    }

    #[test]
    fn graph_path_per_variant() {
        let f = OnnxVariantFactory::new("/models/graphs");
        assert_eq!(
            f.graph_path(Variant::Ms768),
            PathBuf::from("/models/graphs/SynthesizerTrnMs768NSFsid_nono.onnx")
        );
    }

    #[test]
    fn missing_graph_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let f = OnnxVariantFactory::new(dir.path());
        let err = f.create(Variant::Ms256Nsf, &cfg()).err().unwrap();
        assert!(matches!(err, SynthError::ArchitectureUnavailable(_)));
    }

    #[test]
    fn corrupt_graph_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("SynthesizerTrnMs256NSFsid.onnx"), b"not a graph").unwrap();
        let f = OnnxVariantFactory::new(dir.path());
        let err = f.create(Variant::Ms256Nsf, &cfg()).err().unwrap();
        assert!(matches!(err, SynthError::ArchitectureUnavailable(_)));
    }

    #[test]
    fn noise_is_seeded() {
        let mut rng = StdRng::seed_from_u64(7);
        let a: Vec<f32> = (0..64).map(|_| gaussian(&mut rng)).collect();
        let mut rng = StdRng::seed_from_u64(7);
        let b: Vec<f32> = (0..64).map(|_| gaussian(&mut rng)).collect();
        assert_eq!(a, b);
        assert!(a.iter().all(|v| v.is_finite()));
    }
}
