#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rvc_convert::{ModelId, Settings};
use rvc_synth::{
    ModelConfig, NetworkInputs, SynthError, SynthesisNetwork, Variant, VariantFactory, Weight,
    save_checkpoint,
};

/// What the last network run was given.
#[derive(Debug, Default)]
pub struct Observed {
    pub pitch_bins: Option<Vec<i64>>,
    pub frames: usize,
    pub dim: usize,
}

/// Builds networks that honor the synthesis contract without a graph:
/// `frames * sr / 100` samples of a 220 Hz tone.
#[derive(Default)]
pub struct ToneFactory {
    pub created: AtomicUsize,
    pub observed: Arc<Mutex<Observed>>,
}

impl ToneFactory {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

struct ToneNetwork {
    sample_rate: usize,
    observed: Arc<Mutex<Observed>>,
}

impl SynthesisNetwork for ToneNetwork {
    fn parameter_names(&self) -> Vec<String> {
        vec!["dec.conv_pre.weight".into(), "emb_g.weight".into()]
    }

    fn load_weights(&mut self, _weights: BTreeMap<String, Weight>) -> Result<(), SynthError> {
        Ok(())
    }

    fn run(&mut self, inputs: &NetworkInputs<'_>) -> Result<Vec<f32>, SynthError> {
        {
            let mut seen = self.observed.lock();
            seen.pitch_bins = inputs.pitch_bins.map(|b| b.to_vec());
            seen.frames = inputs.frames;
            seen.dim = inputs.dim;
        }
        let n = inputs.frames * self.sample_rate / 100;
        let step = 2.0 * std::f32::consts::PI * 220.0 / self.sample_rate as f32;
        Ok((0..n).map(|i| 0.3 * (i as f32 * step).sin()).collect())
    }
}

impl VariantFactory for ToneFactory {
    fn create(
        &self,
        _variant: Variant,
        cfg: &ModelConfig,
    ) -> Result<Box<dyn SynthesisNetwork>, SynthError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ToneNetwork {
            sample_rate: cfg.sample_rate as usize,
            observed: self.observed.clone(),
        }))
    }
}

/// Writes a checkpoint for `id` under `dir`.
pub fn write_checkpoint(dir: &Path, id: ModelId, dim: usize, f0: u8) -> PathBuf {
    let path = dir.join(id.checkpoint_file());
    let config = format!(
        "[1025,32,192,192,{dim},2,6,3,0,\"1\",[3,7,11],[[1,3,5],[1,3,5],[1,3,5]],[10,10,2,2],512,[16,16,4,4],109,256,40000]"
    );
    let meta = BTreeMap::from([
        ("sr".to_string(), "40k".to_string()),
        ("f0".to_string(), f0.to_string()),
        ("version".to_string(), "v2".to_string()),
        ("config".to_string(), config),
    ]);
    let weights = BTreeMap::from([
        (
            "dec.conv_pre.weight".to_string(),
            Weight::new(vec![2, 2], vec![0.1, 0.2, 0.3, 0.4]).unwrap(),
        ),
        (
            "emb_g.weight".to_string(),
            Weight::new(vec![2], vec![1.0, -1.0]).unwrap(),
        ),
    ]);
    save_checkpoint(&path, &meta, &weights).unwrap();
    path
}

/// Writes `secs` of a mono sine at `freq` (or silence when 0) at 16 kHz.
pub fn write_input(dir: &Path, name: &str, freq: f32, secs: f32) -> PathBuf {
    let path = dir.join(name);
    let n = (16000.0 * secs) as usize;
    let samples: Vec<f32> = (0..n)
        .map(|i| 0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / 16000.0).sin())
        .collect();
    rvc_audio::save(&samples, &path, 16000).unwrap();
    path
}

/// Settings pointing at `dir`. The encoder file exists but is not a
/// graph, so conversions run on fallback features.
pub fn settings(dir: &Path) -> Settings {
    let settings = Settings::with_model_dir(dir);
    std::fs::write(&settings.encoder_path, b"not an onnx graph").unwrap();
    settings
}
