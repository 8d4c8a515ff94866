use std::fmt;

use crate::config::{ContentDim, ModelConfig, PitchMode};

/// The four synthesis network families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// 256-wide content, pitch conditioned (NSF decoder).
    Ms256Nsf,
    /// 256-wide content, no pitch.
    Ms256,
    /// 768-wide content, pitch conditioned (NSF decoder).
    Ms768Nsf,
    /// 768-wide content, no pitch.
    Ms768,
}

impl Variant {
    /// Picks the variant for a parsed configuration.
    pub fn select(cfg: &ModelConfig) -> Self {
        Self::for_shape(cfg.content_dim, cfg.pitch)
    }

    pub fn for_shape(dim: ContentDim, pitch: PitchMode) -> Self {
        match (dim, pitch) {
            (ContentDim::D256, PitchMode::Conditioned) => Variant::Ms256Nsf,
            (ContentDim::D256, PitchMode::Plain) => Variant::Ms256,
            (ContentDim::D768, PitchMode::Conditioned) => Variant::Ms768Nsf,
            (ContentDim::D768, PitchMode::Plain) => Variant::Ms768,
        }
    }

    pub fn all() -> [Variant; 4] {
        [
            Variant::Ms256Nsf,
            Variant::Ms256,
            Variant::Ms768Nsf,
            Variant::Ms768,
        ]
    }

    /// Network class name, also the graph file stem.
    pub fn graph_name(self) -> &'static str {
        match self {
            Variant::Ms256Nsf => "SynthesizerTrnMs256NSFsid",
            Variant::Ms256 => "SynthesizerTrnMs256NSFsid_nono",
            Variant::Ms768Nsf => "SynthesizerTrnMs768NSFsid",
            Variant::Ms768 => "SynthesizerTrnMs768NSFsid_nono",
        }
    }

    pub fn content_dim(self) -> ContentDim {
        match self {
            Variant::Ms256Nsf | Variant::Ms256 => ContentDim::D256,
            Variant::Ms768Nsf | Variant::Ms768 => ContentDim::D768,
        }
    }

    pub fn pitch_conditioned(self) -> bool {
        matches!(self, Variant::Ms256Nsf | Variant::Ms768Nsf)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.graph_name())
    }
}
