use crate::contour::DEFAULT_FRAME_PERIOD_MS;
use crate::error::PitchError;

/// Configuration for F0 estimation.
#[derive(Debug, Clone)]
pub struct F0Config {
    /// Lowest frequency considered voiced.
    pub floor_hz: f64,
    /// Highest frequency considered voiced.
    pub ceil_hz: f64,
    /// Analysis hop in milliseconds.
    pub frame_period_ms: f64,
    /// Candidate bands per octave.
    pub channels_in_octave: f64,
    /// Largest relative frame-to-frame change kept as continuous.
    pub allowed_range: f64,
    /// Refine the raw contour with instantaneous frequency.
    pub refine: bool,
}

impl Default for F0Config {
    fn default() -> Self {
        Self {
            floor_hz: 50.0,
            ceil_hz: 1100.0,
            frame_period_ms: DEFAULT_FRAME_PERIOD_MS,
            channels_in_octave: 2.0,
            allowed_range: 0.1,
            refine: true,
        }
    }
}

impl F0Config {
    /// Checks bounds, hop and band density.
    pub fn validate(&self) -> Result<(), PitchError> {
        let finite = [
            self.floor_hz,
            self.ceil_hz,
            self.frame_period_ms,
            self.channels_in_octave,
            self.allowed_range,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return Err(PitchError::InvalidConfig("non-finite parameter".into()));
        }
        if self.floor_hz <= 0.0 || self.ceil_hz <= self.floor_hz {
            return Err(PitchError::InvalidConfig(format!(
                "need 0 < floor < ceil, got {} .. {} Hz",
                self.floor_hz, self.ceil_hz
            )));
        }
        if self.frame_period_ms <= 0.0 {
            return Err(PitchError::InvalidConfig(format!(
                "frame period must be > 0, got {} ms",
                self.frame_period_ms
            )));
        }
        if self.channels_in_octave <= 0.0 || self.allowed_range <= 0.0 {
            return Err(PitchError::InvalidConfig(
                "channels_in_octave and allowed_range must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Hop actually used; an invalid hop falls back to the default.
    pub fn effective_period_ms(&self) -> f64 {
        if self.frame_period_ms.is_finite() && self.frame_period_ms > 0.0 {
            self.frame_period_ms
        } else {
            DEFAULT_FRAME_PERIOD_MS
        }
    }

    /// Frames produced for `num_samples` at `sample_rate`:
    /// `floor(duration_ms / period) + 1`.
    pub fn frame_count(&self, num_samples: usize, sample_rate: u32) -> usize {
        if sample_rate == 0 {
            return 1;
        }
        let duration_ms = 1000.0 * num_samples as f64 / sample_rate as f64;
        (duration_ms / self.effective_period_ms()).floor() as usize + 1
    }

    /// Shortest voiced run, in frames, kept by contour cleanup.
    pub(crate) fn voice_range_minimum(&self) -> usize {
        ((0.5 + 1000.0 / self.frame_period_ms / self.floor_hz) as usize) * 2 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = F0Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.voice_range_minimum(), 5);
    }

    #[test]
    fn frame_count_rule() {
        let cfg = F0Config::default();
        assert_eq!(cfg.frame_count(16000, 16000), 101);
        assert_eq!(cfg.frame_count(159, 16000), 1);
        assert_eq!(cfg.frame_count(160, 16000), 2);
        assert_eq!(cfg.frame_count(0, 16000), 1);
    }

    #[test]
    fn rejects_bad_bounds() {
        let cfg = F0Config {
            floor_hz: 500.0,
            ceil_hz: 100.0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(PitchError::InvalidConfig(_))));

        let cfg = F0Config {
            frame_period_ms: 0.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
        // Counting still works with the default hop.
        assert_eq!(cfg.frame_count(16000, 16000), 101);
    }
}
