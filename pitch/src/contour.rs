/// Default analysis hop in milliseconds.
pub const DEFAULT_FRAME_PERIOD_MS: f64 = 10.0;

/// Fundamental frequency per analysis frame.
///
/// `0.0` marks an unvoiced frame. Voiced values lie within the estimator's
/// floor and ceiling.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchContour {
    hz: Vec<f32>,
    frame_period_ms: f64,
}

impl PitchContour {
    /// Wraps per-frame values. Non-finite and negative values become unvoiced.
    pub fn new(hz: Vec<f32>, frame_period_ms: f64) -> Self {
        let hz = hz
            .into_iter()
            .map(|v| if v.is_finite() && v > 0.0 { v } else { 0.0 })
            .collect();
        Self {
            hz,
            frame_period_ms,
        }
    }

    /// All-unvoiced contour of `frames` frames.
    pub fn unvoiced(frames: usize, frame_period_ms: f64) -> Self {
        Self {
            hz: vec![0.0; frames],
            frame_period_ms,
        }
    }

    /// Per-frame values in Hz.
    pub fn hz(&self) -> &[f32] {
        &self.hz
    }

    /// Hop between frames in milliseconds.
    pub fn frame_period_ms(&self) -> f64 {
        self.frame_period_ms
    }

    pub fn len(&self) -> usize {
        self.hz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hz.is_empty()
    }

    /// Number of voiced frames.
    pub fn voiced_frames(&self) -> usize {
        self.hz.iter().filter(|&&v| v > 0.0).count()
    }

    /// True when no frame is voiced.
    pub fn is_unvoiced(&self) -> bool {
        self.voiced_frames() == 0
    }
}
