use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rvc_synth::VariantFactory;
use tracing::{debug, info};

use crate::error::ConvertError;
use crate::model_id::ModelId;
use crate::pipeline::{Conversion, LoadedModel};
use crate::settings::Settings;

type Slot = Arc<Mutex<Option<LoadedModel>>>;

/// Keeps loaded models resident between conversions.
///
/// Each model has its own lock, so conversions with different models run
/// in parallel while calls for the same model are serialized. The map lock
/// is held only to look up a model's slot.
pub struct Session {
    settings: Settings,
    factory: Arc<dyn VariantFactory>,
    slots: Mutex<HashMap<ModelId, Slot>>,
}

impl Session {
    /// Creates a session running synthesis graphs from `settings.graphs_dir`.
    #[cfg(feature = "onnx")]
    pub fn new(settings: Settings) -> Self {
        let factory = rvc_synth::OnnxVariantFactory::new(&settings.graphs_dir)
            .with_intra_threads(settings.intra_threads);
        Self::with_factory(settings, Arc::new(factory))
    }

    pub fn with_factory(settings: Settings, factory: Arc<dyn VariantFactory>) -> Self {
        Self {
            settings,
            factory,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn slot(&self, id: ModelId) -> Slot {
        let mut slots = self.slots.lock();
        slots.entry(id).or_default().clone()
    }

    /// Same contract as [`Converter::convert`](crate::Converter::convert);
    /// the model is loaded on first use and kept.
    pub fn convert(
        &self,
        input: impl AsRef<Path>,
        model: &str,
        output: impl AsRef<Path>,
        semitones: f32,
    ) -> Result<Conversion, ConvertError> {
        let id = ModelId::resolve(model)?;
        let slot = self.slot(id);
        let mut guard = slot.lock();
        let loaded = match guard.take() {
            Some(loaded) => {
                debug!("{id}: reusing resident model");
                loaded
            }
            None => LoadedModel::load(id, &self.settings, self.factory.as_ref())?,
        };
        guard
            .insert(loaded)
            .convert(input.as_ref(), output.as_ref(), semitones, &self.settings)
    }

    /// Models currently resident, sorted.
    pub fn resident(&self) -> Vec<ModelId> {
        let slots: Vec<(ModelId, Slot)> = self
            .slots
            .lock()
            .iter()
            .map(|(id, slot)| (*id, slot.clone()))
            .collect();
        let mut ids: Vec<ModelId> = slots
            .into_iter()
            .filter(|(_, slot)| slot.lock().is_some())
            .map(|(id, _)| id)
            .collect();
        ids.sort();
        ids
    }

    /// Drops `id` if resident; the next conversion reloads it.
    pub fn evict(&self, id: ModelId) -> bool {
        let slot = self.slots.lock().remove(&id);
        match slot {
            Some(slot) => slot.lock().take().is_some(),
            None => false,
        }
    }

    /// Releases every resident model.
    pub fn close(self) {
        let slots = std::mem::take(&mut *self.slots.lock());
        let count = slots
            .into_values()
            .filter(|slot| slot.lock().take().is_some())
            .count();
        info!("session closed, released {count} model(s)");
    }
}
