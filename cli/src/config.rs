//! Configuration management for the rvc command.
//!
//! Configuration is stored in ~/.rvc/{app_name}/config.yaml. Every key is
//! optional; a missing default file means all defaults.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use rvc_convert::{DEFAULT_ENCODER_FILE, DEFAULT_GRAPHS_DIR, DEFAULT_MODEL_DIR, Settings};
use rvc_pitch::{F0Config, PitchNormalization};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::paths::Paths;

/// How voiced pitch is spread over the model's pitch bins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    /// Each utterance's own range fills all bins.
    #[default]
    PerUtterance,
    /// The F0 floor to ceiling range fills all bins.
    Fixed,
}

/// rvc configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the model checkpoints.
    pub model_dir: PathBuf,

    /// Content encoder graph (default: <model_dir>/hubert_base.onnx).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoder_path: Option<PathBuf>,

    /// Synthesis graph directory (default: <model_dir>/graphs).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graphs_dir: Option<PathBuf>,

    /// Speaker embedding index.
    pub speaker_id: i64,

    /// Lowest F0 considered voiced.
    pub f0_floor_hz: f64,

    /// Highest F0 considered voiced.
    pub f0_ceil_hz: f64,

    pub pitch_normalization: NormalizationMode,

    /// ONNX Runtime intra-op threads (0 = runtime default).
    pub intra_threads: usize,

    /// Path to the config file (not serialized).
    #[serde(skip)]
    config_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let f0 = F0Config::default();
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            encoder_path: None,
            graphs_dir: None,
            speaker_id: 0,
            f0_floor_hz: f0.floor_hz,
            f0_ceil_hz: f0.ceil_hz,
            pitch_normalization: NormalizationMode::default(),
            intra_threads: 0,
            config_path: PathBuf::new(),
        }
    }
}

impl Config {
    /// Gets the default config file path.
    pub fn default_config_path(app_name: &str) -> Option<PathBuf> {
        Paths::new(app_name).ok().map(|p| p.config_file())
    }

    /// Returns the config file path; empty when built from defaults only.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn encoder_path(&self) -> PathBuf {
        self.encoder_path
            .clone()
            .unwrap_or_else(|| self.model_dir.join(DEFAULT_ENCODER_FILE))
    }

    pub fn graphs_dir(&self) -> PathBuf {
        self.graphs_dir
            .clone()
            .unwrap_or_else(|| self.model_dir.join(DEFAULT_GRAPHS_DIR))
    }

    /// Builds conversion settings.
    pub fn to_settings(&self) -> Settings {
        let f0 = F0Config {
            floor_hz: self.f0_floor_hz,
            ceil_hz: self.f0_ceil_hz,
            ..Default::default()
        };
        let normalization = match self.pitch_normalization {
            NormalizationMode::PerUtterance => PitchNormalization::PerUtterance,
            NormalizationMode::Fixed => PitchNormalization::Fixed {
                floor_hz: self.f0_floor_hz as f32,
                ceil_hz: self.f0_ceil_hz as f32,
            },
        };
        Settings {
            model_dir: self.model_dir.clone(),
            encoder_path: self.encoder_path(),
            graphs_dir: self.graphs_dir(),
            speaker_id: self.speaker_id,
            f0,
            normalization,
            intra_threads: self.intra_threads,
        }
    }
}

/// Loads configuration for the specified app.
///
/// An explicit `custom_path` must exist. The default file may be absent,
/// in which case defaults are returned.
pub fn load_config(app_name: &str, custom_path: Option<&Path>) -> anyhow::Result<Config> {
    let (config_path, required) = match custom_path {
        Some(p) => (p.to_path_buf(), true),
        None => match Config::default_config_path(app_name) {
            Some(p) => (p, false),
            None => return Ok(Config::default()),
        },
    };

    let mut cfg = if config_path.is_file() {
        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("read {}", config_path.display()))?;
        debug!("loaded config {}", config_path.display());
        if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("parse {}", config_path.display()))?
        }
    } else if required {
        anyhow::bail!("config file {} not found", config_path.display());
    } else {
        Config::default()
    };

    cfg.config_path = config_path;
    Ok(cfg)
}
