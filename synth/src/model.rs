use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use rvc_content::FeatureMatrix;
use tracing::{debug, info, warn};

use crate::checkpoint::Checkpoint;
use crate::config::ModelConfig;
use crate::error::SynthError;
use crate::network::{NetworkInputs, SynthesisNetwork, VariantFactory};
use crate::variant::Variant;
use crate::weights::{WeightReport, reconcile_weights};

/// Loading progress of a synthesis model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Unloaded,
    ConfigParsed,
    ArchitectureSelected,
    WeightsLoaded,
    Ready,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Unloaded => "unloaded",
            Stage::ConfigParsed => "config parsed",
            Stage::ArchitectureSelected => "architecture selected",
            Stage::WeightsLoaded => "weights loaded",
            Stage::Ready => "ready",
        })
    }
}

/// A loaded model with exactly one active variant.
pub struct SynthesisModel {
    path: PathBuf,
    config: ModelConfig,
    variant: Variant,
    report: WeightReport,
    network: Box<dyn SynthesisNetwork>,
}

impl fmt::Debug for SynthesisModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynthesisModel")
            .field("path", &self.path)
            .field("variant", &self.variant)
            .field("sample_rate", &self.config.sample_rate)
            .field("report", &self.report)
            .finish_non_exhaustive()
    }
}

impl SynthesisModel {
    /// Reads a checkpoint and builds its network through `factory`.
    ///
    /// Weights load non-strictly: mismatches are logged at WARN and kept in
    /// [`weight_report`](Self::weight_report). A checkpoint without weights
    /// is invalid, and a network that binds none of them is unavailable:
    /// its output would not depend on the checkpoint.
    pub fn load(path: impl AsRef<Path>, factory: &dyn VariantFactory) -> Result<Self, SynthError> {
        let path = path.as_ref();
        let ckpt = Checkpoint::open(path)?;

        let config = ModelConfig::from_checkpoint(&ckpt)?;
        debug!("{}: {}", Stage::ConfigParsed, path.display());

        let variant = Variant::select(&config);
        let mut network = factory.create(variant, &config)?;
        debug!("{}: {variant}", Stage::ArchitectureSelected);

        if ckpt.weight_count() == 0 {
            return Err(SynthError::InvalidCheckpoint(format!(
                "{}: checkpoint holds no weights",
                path.display()
            )));
        }
        let (matched, report) = reconcile_weights(&ckpt, &network.parameter_names());
        if matched.is_empty() {
            return Err(SynthError::ArchitectureUnavailable(format!(
                "{variant}: network binds none of the {} checkpoint weight(s) ({report})",
                ckpt.weight_count()
            )));
        }
        let weights: BTreeMap<_, _> = matched
            .into_iter()
            .filter_map(|name| ckpt.weight(&name).map(|w| (name, w)))
            .collect();
        let loaded = weights.len();
        network.load_weights(weights)?;
        if !report.is_clean() {
            warn!("{variant}: checkpoint weights do not match the network: {report}");
        }
        debug!("{}: {loaded} weight(s)", Stage::WeightsLoaded);

        info!(
            "model {} {}: {variant}, {} Hz, version {}",
            path.display(),
            Stage::Ready,
            config.sample_rate,
            config.version
        );
        Ok(Self {
            path: path.to_path_buf(),
            config,
            variant,
            report,
            network,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Native output sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    pub fn weight_report(&self) -> &WeightReport {
        &self.report
    }

    /// Synthesizes a waveform at the model's native rate.
    ///
    /// Pitch-conditioned variants need both pitch sequences, each as long as
    /// `features`; other variants need neither.
    pub fn infer(
        &mut self,
        features: &FeatureMatrix,
        pitch_bins: Option<&[i64]>,
        pitch_hz: Option<&[f32]>,
        speaker_id: i64,
    ) -> Result<Vec<f32>, SynthError> {
        let frames = features.frames();
        if frames == 0 {
            return Err(SynthError::Inference("no content frames".to_string()));
        }
        let want = self.variant.content_dim().width();
        if features.dim() != want {
            return Err(SynthError::Inference(format!(
                "{}: content width {} does not match {want}",
                self.variant,
                features.dim()
            )));
        }

        match (self.variant.pitch_conditioned(), pitch_bins, pitch_hz) {
            (true, Some(bins), Some(hz)) => {
                if bins.len() != frames || hz.len() != frames {
                    return Err(SynthError::Inference(format!(
                        "pitch has {}/{} frame(s), content has {frames}",
                        bins.len(),
                        hz.len()
                    )));
                }
            }
            (true, _, _) => {
                return Err(SynthError::Inference(format!(
                    "{} requires pitch bins and pitch Hz",
                    self.variant
                )));
            }
            (false, None, None) => {}
            (false, _, _) => {
                return Err(SynthError::Inference(format!(
                    "{} does not take pitch input",
                    self.variant
                )));
            }
        }

        let speakers_ok = match self.config.speaker_count {
            Some(count) => speaker_id >= 0 && (speaker_id as usize) < count,
            None => speaker_id >= 0,
        };
        if !speakers_ok {
            return Err(SynthError::Inference(format!(
                "speaker id {speaker_id} out of range (count {:?})",
                self.config.speaker_count
            )));
        }

        let inputs = NetworkInputs {
            features: features.as_slice(),
            frames,
            dim: features.dim(),
            pitch_bins,
            pitch_hz,
            speaker_id,
        };
        let wave = self.network.run(&inputs)?;
        if wave.is_empty() {
            return Err(SynthError::Inference("network produced no samples".to_string()));
        }
        debug!(
            "{}: {frames} frame(s) -> {} sample(s) at {} Hz",
            self.variant,
            wave.len(),
            self.config.sample_rate
        );
        Ok(wave)
    }
}
