use std::path::Path;
use std::sync::Arc;

use rvc_synth::VariantFactory;

use crate::error::ConvertError;
use crate::model_id::ModelId;
use crate::pipeline::{Conversion, LoadedModel};
use crate::settings::Settings;

/// Converts one file per call, loading the model each time.
///
/// Use [`Session`](crate::Session) to keep models resident across calls.
#[derive(Clone)]
pub struct Converter {
    settings: Settings,
    factory: Arc<dyn VariantFactory>,
}

impl Converter {
    /// Creates a converter running synthesis graphs from
    /// `settings.graphs_dir`.
    #[cfg(feature = "onnx")]
    pub fn new(settings: Settings) -> Self {
        let factory = rvc_synth::OnnxVariantFactory::new(&settings.graphs_dir)
            .with_intra_threads(settings.intra_threads);
        Self::with_factory(settings, Arc::new(factory))
    }

    pub fn with_factory(settings: Settings, factory: Arc<dyn VariantFactory>) -> Self {
        Self { settings, factory }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Converts `input` with the model named `model` and writes `output`.
    ///
    /// `model` is resolved before any file is touched. `semitones` shifts
    /// the pitch and is ignored by models without pitch input.
    pub fn convert(
        &self,
        input: impl AsRef<Path>,
        model: &str,
        output: impl AsRef<Path>,
        semitones: f32,
    ) -> Result<Conversion, ConvertError> {
        let id = ModelId::resolve(model)?;
        let mut loaded = LoadedModel::load(id, &self.settings, self.factory.as_ref())?;
        loaded.convert(input.as_ref(), output.as_ref(), semitones, &self.settings)
    }
}
