//! Typed view of the hyperparameters stored with a checkpoint.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use tracing::{debug, info};

use crate::checkpoint::Checkpoint;
use crate::error::SynthError;

pub const DEFAULT_SAMPLE_RATE: u32 = 40000;
pub const DEFAULT_VERSION: &str = "v1";

const CONTENT_DIM_INDEX: usize = 4;
const INTER_CHANNELS_INDEX: usize = 2;
const UPSAMPLE_RATES_INDEX: usize = 12;
const SPEAKER_COUNT_INDEX: usize = 15;

/// Width of the content features a model consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentDim {
    D256,
    D768,
}

impl ContentDim {
    pub fn from_width(width: u64) -> Option<Self> {
        match width {
            256 => Some(ContentDim::D256),
            768 => Some(ContentDim::D768),
            _ => None,
        }
    }

    pub fn width(self) -> usize {
        match self {
            ContentDim::D256 => 256,
            ContentDim::D768 => 768,
        }
    }
}

impl fmt::Display for ContentDim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.width())
    }
}

/// Whether the model is conditioned on pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PitchMode {
    Conditioned,
    Plain,
}

/// Immutable model configuration parsed from checkpoint metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub sample_rate: u32,
    pub content_dim: ContentDim,
    pub pitch: PitchMode,
    pub version: String,
    /// Latent channel count (list index 2), when present.
    pub inter_channels: Option<usize>,
    /// Decoder upsampling factors (list index 12), when present.
    pub upsample_rates: Option<Vec<usize>>,
    /// Speaker embedding count (list index 15), when present.
    pub speaker_count: Option<usize>,
    /// The hyperparameter list as stored.
    pub raw: Vec<Value>,
}

impl ModelConfig {
    /// Parses the `sr`, `f0`, `config` and `version` metadata of `ckpt`.
    pub fn from_checkpoint(ckpt: &Checkpoint) -> Result<Self, SynthError> {
        Self::from_metadata(ckpt.metadata())
    }

    pub fn from_metadata(meta: &BTreeMap<String, String>) -> Result<Self, SynthError> {
        let sample_rate = match meta.get("sr") {
            Some(s) => parse_sample_rate(s)?,
            None => DEFAULT_SAMPLE_RATE,
        };

        let pitch = match meta.get("f0").map(|s| s.trim()) {
            None | Some("1") => PitchMode::Conditioned,
            Some("0") => PitchMode::Plain,
            Some(other) => {
                return Err(SynthError::InvalidCheckpoint(format!(
                    "f0 flag must be 0 or 1, got {other:?}"
                )));
            }
        };

        let raw: Vec<Value> = match meta.get("config") {
            Some(s) => serde_json::from_str(s).map_err(|e| {
                SynthError::InvalidCheckpoint(format!("config is not a list: {e}"))
            })?,
            None => Vec::new(),
        };

        let content_dim = match raw.get(CONTENT_DIM_INDEX) {
            Some(v) => {
                let width = v.as_u64().ok_or_else(|| {
                    SynthError::ArchitectureUnavailable(format!("content dimension {v} is not an integer"))
                })?;
                ContentDim::from_width(width).ok_or_else(|| {
                    SynthError::ArchitectureUnavailable(format!(
                        "no synthesis variant for content dimension {width}"
                    ))
                })?
            }
            None => {
                info!(
                    "config has {} entries, assuming content dimension 256",
                    raw.len()
                );
                ContentDim::D256
            }
        };

        let version = meta
            .get("version")
            .cloned()
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());

        let cfg = Self {
            sample_rate,
            content_dim,
            pitch,
            version,
            inter_channels: raw.get(INTER_CHANNELS_INDEX).and_then(as_usize),
            upsample_rates: raw.get(UPSAMPLE_RATES_INDEX).and_then(|v| {
                v.as_array()
                    .map(|items| items.iter().filter_map(as_usize).collect())
            }),
            speaker_count: raw.get(SPEAKER_COUNT_INDEX).and_then(as_usize),
            raw,
        };
        debug!(
            "model config: sr {}, content {}, pitch {:?}, version {}",
            cfg.sample_rate, cfg.content_dim, cfg.pitch, cfg.version
        );
        Ok(cfg)
    }

    pub fn is_pitch_conditioned(&self) -> bool {
        self.pitch == PitchMode::Conditioned
    }

    /// Output samples per 10 ms content frame.
    pub fn hop_samples(&self) -> usize {
        self.sample_rate as usize / 100
    }
}

fn as_usize(v: &Value) -> Option<usize> {
    v.as_u64().map(|n| n as usize)
}

/// Accepts `40000`, `"40000"` or `"40k"`.
fn parse_sample_rate(s: &str) -> Result<u32, SynthError> {
    let s = s.trim();
    let invalid = || SynthError::InvalidCheckpoint(format!("sample rate {s:?}"));
    let rate = match s.strip_suffix('k') {
        Some(k) => k.parse::<f64>().map_err(|_| invalid())? * 1000.0,
        None => s.parse::<f64>().map_err(|_| invalid())?,
    };
    if !(rate.is_finite() && rate >= 1.0 && rate <= u32::MAX as f64) {
        return Err(invalid());
    }
    Ok(rate.round() as u32)
}
