//! End-to-end voice conversion.
//!
//! ```text
//! load audio ─┬─ content features ───────────────┬─ synthesize ─ save
//!             └─ F0 ─ align to frames ─ quantize ─┘
//! ```
//!
//! [`Converter`] loads the model on every call; [`Session`] keeps models
//! resident and serves different models in parallel. Models are named by
//! [`ModelId`], resolved before any file is read.

mod converter;
mod error;
mod model_id;
mod pipeline;
mod session;
mod settings;

pub use converter::Converter;
pub use error::{ConvertError, ErrorKind};
pub use model_id::ModelId;
pub use pipeline::Conversion;
pub use session::Session;
pub use settings::{DEFAULT_ENCODER_FILE, DEFAULT_GRAPHS_DIR, DEFAULT_MODEL_DIR, Settings};
