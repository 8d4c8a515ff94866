use crate::error::AudioError;

/// Mono audio samples in [-1, 1] at a fixed sample rate.
///
/// A buffer is never empty and never has a zero sample rate; both are
/// checked at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Creates a mono buffer.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self, AudioError> {
        if sample_rate == 0 {
            return Err(AudioError::InvalidBuffer("sample rate must be > 0".into()));
        }
        if samples.is_empty() {
            return Err(AudioError::InvalidBuffer("buffer has no samples".into()));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Returns the samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Returns the sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false for a constructed buffer.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_rejects_empty_and_zero_rate() {
        assert!(AudioBuffer::mono(Vec::new(), 16000).is_err());
        assert!(AudioBuffer::mono(vec![0.0; 10], 0).is_err());
    }

    #[test]
    fn duration_from_rate() {
        let buf = AudioBuffer::mono(vec![0.0; 32000], 16000).unwrap();
        assert_eq!(buf.len(), 32000);
        assert!((buf.duration_secs() - 2.0).abs() < 1e-9);
    }
}
