use std::path::{Path, PathBuf};

use rvc_pitch::{F0Config, PitchNormalization};

use crate::model_id::ModelId;

pub const DEFAULT_MODEL_DIR: &str = "models";
pub const DEFAULT_ENCODER_FILE: &str = "hubert_base.onnx";
pub const DEFAULT_GRAPHS_DIR: &str = "graphs";

/// Everything a conversion needs besides its per-call arguments.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding the model checkpoints.
    pub model_dir: PathBuf,
    /// Content encoder graph; when absent conversion runs in degraded mode.
    pub encoder_path: PathBuf,
    /// Directory holding one synthesis graph per variant.
    pub graphs_dir: PathBuf,
    pub speaker_id: i64,
    pub f0: F0Config,
    pub normalization: PitchNormalization,
    /// ONNX Runtime intra-op threads; 0 lets the runtime decide.
    pub intra_threads: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let model_dir = PathBuf::from(DEFAULT_MODEL_DIR);
        Self {
            encoder_path: model_dir.join(DEFAULT_ENCODER_FILE),
            graphs_dir: model_dir.join(DEFAULT_GRAPHS_DIR),
            model_dir,
            speaker_id: 0,
            f0: F0Config::default(),
            normalization: PitchNormalization::default(),
            intra_threads: 0,
        }
    }
}

impl Settings {
    /// Settings with every model file under `model_dir`.
    pub fn with_model_dir(model_dir: impl AsRef<Path>) -> Self {
        let model_dir = model_dir.as_ref();
        Self {
            model_dir: model_dir.to_path_buf(),
            encoder_path: model_dir.join(DEFAULT_ENCODER_FILE),
            graphs_dir: model_dir.join(DEFAULT_GRAPHS_DIR),
            ..Default::default()
        }
    }

    pub fn checkpoint_path(&self, id: ModelId) -> PathBuf {
        self.model_dir.join(id.checkpoint_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.model_dir, PathBuf::from("models"));
        assert_eq!(s.encoder_path, PathBuf::from("models/hubert_base.onnx"));
        assert_eq!(s.graphs_dir, PathBuf::from("models/graphs"));
        assert_eq!(s.normalization, PitchNormalization::PerUtterance);
    }

    #[test]
    fn checkpoint_under_model_dir() {
        let s = Settings::with_model_dir("/srv/rvc");
        assert_eq!(
            s.checkpoint_path(ModelId::Amitaro),
            PathBuf::from("/srv/rvc/AMITARO-natural.pth")
        );
        assert_eq!(s.encoder_path, PathBuf::from("/srv/rvc/hubert_base.onnx"));
    }
}
