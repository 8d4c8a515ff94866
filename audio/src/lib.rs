//! Audio I/O and signal processing for voice conversion.
//!
//! This crate provides:
//!
//! - [`AudioBuffer`]: mono f32 samples with their sample rate
//! - [`load`] / [`save`]: WAV decoding (downmixed, resampled to 16 kHz) and
//!   uncompressed mono output at a caller-chosen rate
//! - `resampler`: one-shot sample rate conversion via rubato
//! - `dsp`: FFT, windows, mel filterbanks and MFCC features
//!
//! # Example
//!
//! ```no_run
//! use rvc_audio::{load, save, WORKING_RATE};
//!
//! let buffer = load("input.wav").unwrap();
//! assert_eq!(buffer.sample_rate(), WORKING_RATE);
//! save(buffer.samples(), "copy.wav", buffer.sample_rate()).unwrap();
//! ```

mod buffer;
pub mod dsp;
mod error;
pub mod resampler;
mod wav;

pub use buffer::AudioBuffer;
pub use error::AudioError;
pub use resampler::{downmix, resample};
pub use wav::{f32_to_pcm16, load, save, WORKING_RATE};
