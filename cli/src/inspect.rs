//! Checkpoint inspection for `rvc inspect`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use rvc_synth::{Checkpoint, DType, ModelConfig, PitchMode, Variant};

/// Weights listed by default.
pub const DEFAULT_WEIGHT_LIMIT: usize = 20;

/// A stored weight without its data.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightSummary {
    pub name: String,
    pub dtype: DType,
    pub shape: Vec<usize>,
}

/// What a checkpoint holds and what the loader derives from it.
#[derive(Debug, Clone)]
pub struct ModelReport {
    pub path: PathBuf,
    pub metadata: BTreeMap<String, String>,
    pub weight_count: usize,
    /// The first weights by name, at most the requested limit.
    pub weights: Vec<WeightSummary>,
    /// Parsed configuration and selected variant, or why parsing failed.
    pub derived: Result<(ModelConfig, Variant), String>,
}

/// Reads `path` and summarizes it, listing at most `limit` weights.
///
/// A checkpoint whose configuration does not parse is still reported;
/// only an unreadable container is an error.
pub fn inspect(path: &Path, limit: usize) -> anyhow::Result<ModelReport> {
    let ckpt = Checkpoint::open(path).with_context(|| format!("inspect {}", path.display()))?;

    let weights = ckpt
        .weight_names()
        .take(limit)
        .filter_map(|name| {
            ckpt.weight_info(name).map(|(dtype, shape)| WeightSummary {
                name: name.to_string(),
                dtype,
                shape: shape.to_vec(),
            })
        })
        .collect();
    let derived = ModelConfig::from_checkpoint(&ckpt)
        .map(|cfg| {
            let variant = Variant::select(&cfg);
            (cfg, variant)
        })
        .map_err(|e| e.to_string());

    Ok(ModelReport {
        path: path.to_path_buf(),
        metadata: ckpt.metadata().clone(),
        weight_count: ckpt.weight_count(),
        weights,
        derived,
    })
}

impl fmt::Display for ModelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "checkpoint: {}", self.path.display())?;

        writeln!(f, "metadata:")?;
        if self.metadata.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for (key, value) in &self.metadata {
            writeln!(f, "  {key}: {value}")?;
        }

        writeln!(
            f,
            "weights: {} (showing {})",
            self.weight_count,
            self.weights.len()
        )?;
        for w in &self.weights {
            writeln!(f, "  {} {} {:?}", w.name, w.dtype, w.shape)?;
        }

        match &self.derived {
            Ok((cfg, variant)) => {
                writeln!(f, "config:")?;
                writeln!(f, "  sample rate: {} Hz", cfg.sample_rate)?;
                writeln!(f, "  content dim: {}", cfg.content_dim)?;
                let pitch = match cfg.pitch {
                    PitchMode::Conditioned => "conditioned",
                    PitchMode::Plain => "none",
                };
                writeln!(f, "  pitch: {pitch}")?;
                writeln!(f, "  version: {}", cfg.version)?;
                writeln!(f, "  variant: {variant}")?;
                if let Some(c) = cfg.inter_channels {
                    writeln!(f, "  inter channels: {c}")?;
                }
                if let Some(rates) = &cfg.upsample_rates {
                    writeln!(f, "  upsample rates: {rates:?} (hop {})", cfg.hop_samples())?;
                }
                if let Some(n) = cfg.speaker_count {
                    writeln!(f, "  speakers: {n}")?;
                }
            }
            Err(reason) => writeln!(f, "config: unusable ({reason})")?,
        }
        Ok(())
    }
}
