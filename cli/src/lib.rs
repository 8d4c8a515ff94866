//! Configuration, path and inspection utilities for the rvc command.
//!
//! Configuration is stored in ~/.rvc/{app_name}/config.yaml

pub mod config;
pub mod inspect;
pub mod paths;

pub use config::{Config, NormalizationMode, load_config};
pub use inspect::{DEFAULT_WEIGHT_LIMIT, ModelReport, WeightSummary, inspect};
pub use paths::Paths;
