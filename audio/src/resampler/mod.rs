//! Sample rate and channel conversion.
//!
//! Resampling uses rubato's FFT resampler, a pure Rust implementation
//! without any FFI dependencies. Conversion is one-shot: the whole buffer is
//! processed and the result is trimmed to the exact output length.
//!
//! # Example
//!
//! ```
//! use rvc_audio::resampler::resample;
//!
//! let input = vec![0.0f32; 44100];
//! let output = resample(&input, 44100, 16000).unwrap();
//! assert_eq!(output.len(), 16000);
//! ```

mod rubato_impl;

pub use rubato_impl::*;
