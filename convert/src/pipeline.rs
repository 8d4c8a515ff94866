use std::path::{Path, PathBuf};
use std::time::Instant;

use rvc_content::{ContentFeatureExtractor, ExtractorConfig, ExtractorKind, select_extractor};
use rvc_pitch::{align_and_quantize, extract_f0};
use rvc_synth::{SynthesisModel, VariantFactory, WeightReport};
use tracing::{debug, info};

use crate::error::ConvertError;
use crate::model_id::ModelId;
use crate::settings::Settings;

/// Outcome of a successful conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    /// Where the converted audio was written.
    pub output: PathBuf,
    /// Rate of the written audio, the model's native rate.
    pub sample_rate: u32,
    /// Which content extractor ran; `Fallback` means degraded quality.
    pub extractor: ExtractorKind,
    /// Checkpoint weights that did not match the network.
    pub weight_report: WeightReport,
    /// Content frames synthesized.
    pub frames: usize,
}

/// A synthesis model together with the content extractor sized for it.
pub(crate) struct LoadedModel {
    id: ModelId,
    model: SynthesisModel,
    extractor: Box<dyn ContentFeatureExtractor>,
}

impl LoadedModel {
    pub(crate) fn load(
        id: ModelId,
        settings: &Settings,
        factory: &dyn VariantFactory,
    ) -> Result<Self, ConvertError> {
        let checkpoint = settings.checkpoint_path(id);
        if !checkpoint.is_file() {
            return Err(ConvertError::MissingFile(checkpoint));
        }
        if !settings.encoder_path.is_file() {
            return Err(ConvertError::MissingFile(settings.encoder_path.clone()));
        }
        let model = SynthesisModel::load(&checkpoint, factory)?;

        let extractor = select_extractor(&ExtractorConfig {
            encoder_path: settings.encoder_path.clone(),
            content_dim: model.variant().content_dim().width(),
            intra_threads: settings.intra_threads,
        });
        info!(
            "{id}: {} at {} Hz, {} content features",
            model.variant(),
            model.sample_rate(),
            extractor.kind()
        );
        Ok(Self {
            id,
            model,
            extractor,
        })
    }

    /// Converts `input` and writes the result to `output`.
    pub(crate) fn convert(
        &mut self,
        input: &Path,
        output: &Path,
        semitones: f32,
        settings: &Settings,
    ) -> Result<Conversion, ConvertError> {
        let start = Instant::now();
        let audio = rvc_audio::load(input)?;
        debug!("{}: {} is {:.2}s", self.id, input.display(), audio.duration_secs());

        let features = self.extractor.extract(&audio)?;
        let frames = features.frames();
        debug!("{}: {frames} content frame(s) of width {}", self.id, features.dim());
        if frames == 0 {
            return Err(ConvertError::TooShort(input.to_path_buf()));
        }

        let wave = if self.model.variant().pitch_conditioned() {
            let contour = extract_f0(&audio, &settings.f0);
            let pitch = align_and_quantize(&contour, frames, semitones, settings.normalization);
            self.model.infer(
                &features,
                Some(pitch.bins.as_slice()),
                Some(pitch.hz.as_slice()),
                settings.speaker_id,
            )?
        } else {
            if semitones != 0.0 {
                debug!("{}: model has no pitch input, ignoring shift {semitones:+}", self.id);
            }
            self.model.infer(&features, None, None, settings.speaker_id)?
        };

        let sample_rate = self.model.sample_rate();
        rvc_audio::save(&wave, output, sample_rate)?;
        info!(
            "{}: {} -> {} ({:.2}s of audio in {:.2?})",
            self.id,
            input.display(),
            output.display(),
            wave.len() as f64 / sample_rate as f64,
            start.elapsed()
        );

        Ok(Conversion {
            output: output.to_path_buf(),
            sample_rate,
            extractor: self.extractor.kind(),
            weight_report: self.model.weight_report().clone(),
            frames,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rvc_audio::AudioBuffer;
    use rvc_content::{ContentError, FeatureMatrix};
    use rvc_synth::{ModelConfig, NetworkInputs, SynthError, SynthesisNetwork, Variant, Weight};

    use super::*;
    use crate::error::ErrorKind;

    /// An encoder that yields no frames, as for audio shorter than one hop.
    struct EmptyExtractor;

    impl ContentFeatureExtractor for EmptyExtractor {
        fn extract(&self, _audio: &AudioBuffer) -> Result<FeatureMatrix, ContentError> {
            FeatureMatrix::new(0, 256, Vec::new())
        }

        fn dim(&self) -> usize {
            256
        }

        fn kind(&self) -> ExtractorKind {
            ExtractorKind::Neural
        }
    }

    struct SilentNetwork;

    impl SynthesisNetwork for SilentNetwork {
        fn parameter_names(&self) -> Vec<String> {
            vec!["dec.conv_pre.weight".into()]
        }

        fn load_weights(&mut self, _weights: BTreeMap<String, Weight>) -> Result<(), SynthError> {
            Ok(())
        }

        fn run(&mut self, inputs: &NetworkInputs<'_>) -> Result<Vec<f32>, SynthError> {
            Ok(vec![0.0; inputs.frames * 400])
        }
    }

    struct SilentFactory;

    impl VariantFactory for SilentFactory {
        fn create(
            &self,
            _variant: Variant,
            _cfg: &ModelConfig,
        ) -> Result<Box<dyn SynthesisNetwork>, SynthError> {
            Ok(Box::new(SilentNetwork))
        }
    }

    #[test]
    fn zero_content_frames_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::with_model_dir(dir.path());
        std::fs::write(&settings.encoder_path, b"placeholder").unwrap();
        let meta = BTreeMap::from([("f0".to_string(), "1".to_string())]);
        let weights = BTreeMap::from([(
            "dec.conv_pre.weight".to_string(),
            Weight::new(vec![1], vec![0.5]).unwrap(),
        )]);
        rvc_synth::save_checkpoint(settings.checkpoint_path(ModelId::Tsukuyomi), &meta, &weights)
            .unwrap();

        let input = dir.path().join("blip.wav");
        rvc_audio::save(&[0.1, -0.1, 0.05], &input, 16000).unwrap();
        let output = dir.path().join("out.wav");

        let mut loaded = LoadedModel::load(ModelId::Tsukuyomi, &settings, &SilentFactory).unwrap();
        loaded.extractor = Box::new(EmptyExtractor);
        let err = loaded.convert(&input, &output, 4.0, &settings).unwrap_err();
        assert!(matches!(err, ConvertError::TooShort(_)));
        assert_eq!(err.kind(), ErrorKind::UnreadableAudio);
        assert!(!output.exists());
    }
}
