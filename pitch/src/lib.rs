//! Fundamental frequency (F0) estimation and processing.
//!
//! # Pipeline
//!
//! 1. [`extract_f0`]: 16 kHz mono audio -> [`PitchContour`] at a 10 ms hop
//!    (zero-crossing band analysis, then instantaneous-frequency refinement)
//! 2. [`align`]: contour -> `T` frames matching the content features
//! 3. [`quantize`]: transpose by semitones, map to coarse bins 1..=255
//!
//! [`align_and_quantize`] runs steps 2 and 3 in that order.
//!
//! # Example
//!
//! ```
//! use rvc_audio::AudioBuffer;
//! use rvc_pitch::{F0Config, PitchNormalization, align_and_quantize, extract_f0};
//!
//! let samples: Vec<f32> = (0..16000)
//!     .map(|i| 0.3 * (2.0 * std::f32::consts::PI * 200.0 * i as f32 / 16000.0).sin())
//!     .collect();
//! let audio = AudioBuffer::mono(samples, 16000).unwrap();
//!
//! let contour = extract_f0(&audio, &F0Config::default());
//! assert_eq!(contour.len(), 101);
//!
//! let pitch = align_and_quantize(&contour, 100, 0.0, PitchNormalization::PerUtterance);
//! assert_eq!(pitch.bins.len(), 100);
//! assert!(pitch.bins.iter().all(|b| (1..=255).contains(b)));
//! ```

mod config;
mod contour;
mod dio;
mod error;
mod estimator;
mod processor;
mod stonemask;

pub use config::F0Config;
pub use contour::{DEFAULT_FRAME_PERIOD_MS, PitchContour};
pub use error::PitchError;
pub use estimator::{extract_f0, try_extract_f0};
pub use processor::{
    MAX_BIN, MIN_BIN, PitchNormalization, QuantizedPitch, align, align_and_quantize, quantize,
};
