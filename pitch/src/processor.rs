//! Alignment of an F0 contour to the content frame count, transposition,
//! and quantization into the synthesis model's 255 pitch bins.

use tracing::debug;

use crate::contour::PitchContour;

/// Lowest bin; also used for unvoiced frames.
pub const MIN_BIN: i64 = 1;
/// Highest bin.
pub const MAX_BIN: i64 = 255;

/// How voiced frames are mapped onto the bin range.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PitchNormalization {
    /// Stretch this utterance's own voiced range over bins 1..=255.
    #[default]
    PerUtterance,
    /// Map a fixed Hz range over bins 1..=255, clamping outside it.
    Fixed { floor_hz: f32, ceil_hz: f32 },
}

impl PitchNormalization {
    /// The 50-1100 Hz range synthesis models are commonly trained with.
    pub fn training_range() -> Self {
        PitchNormalization::Fixed {
            floor_hz: 50.0,
            ceil_hz: 1100.0,
        }
    }
}

/// Quantized pitch plus the continuous transposed contour, both `T` long.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedPitch {
    /// Coarse pitch in `[1, 255]`; unvoiced frames are 1.
    pub bins: Vec<i64>,
    /// Transposed F0 in Hz; unvoiced frames are 0.
    pub hz: Vec<f32>,
}

impl QuantizedPitch {
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

fn voiced(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

/// Resamples `contour` to `target_frames` frames.
///
/// Frame `j` reads source position `j * (n - 1) / (T - 1)`. Between two
/// voiced frames the value is interpolated linearly; when either neighbour
/// is unvoiced the nearer source frame is copied, so the unvoiced marker is
/// never blended into a voiced value. Same length is the identity.
pub fn align(contour: &PitchContour, target_frames: usize) -> Vec<f32> {
    if target_frames == 0 {
        return Vec::new();
    }
    let src: Vec<f32> = contour
        .hz()
        .iter()
        .map(|&v| if voiced(v) { v } else { 0.0 })
        .collect();
    let n = src.len();
    if n == target_frames {
        return src;
    }
    if n == 0 {
        return vec![0.0; target_frames];
    }
    if n == 1 || target_frames == 1 {
        return vec![src[0]; target_frames];
    }

    let step = (n - 1) as f64 / (target_frames - 1) as f64;
    (0..target_frames)
        .map(|j| {
            let pos = j as f64 * step;
            let lo = (pos.floor() as usize).min(n - 1);
            let hi = (lo + 1).min(n - 1);
            let frac = pos - lo as f64;
            let (a, b) = (src[lo], src[hi]);
            if a > 0.0 && b > 0.0 {
                (a as f64 + (b as f64 - a as f64) * frac) as f32
            } else if frac < 0.5 {
                a
            } else {
                b
            }
        })
        .collect()
}

fn hz_to_mel(hz: f64) -> f64 {
    1127.0 * (1.0 + hz / 700.0).ln()
}

/// Transposes by `semitones` and quantizes to bins.
///
/// `f0' = f0 * 2^(semitones / 12)`, `mel = 1127 ln(1 + f0' / 700)`. With
/// [`PitchNormalization::PerUtterance`] voiced mels are min-max scaled to
/// `(mel - min) * 254 / (max - min) + 1` and truncated; a single distinct
/// voiced value maps to bin 1. Results are clamped to `[1, 255]`.
///
/// The arithmetic runs in f64; only the returned Hz values are narrowed.
pub fn quantize(f0: &[f32], semitones: f32, normalization: PitchNormalization) -> QuantizedPitch {
    let ratio = 2f64.powf(semitones as f64 / 12.0);
    let shifted: Vec<f64> = f0
        .iter()
        .map(|&v| {
            let v = v as f64;
            let s = v * ratio;
            if v.is_finite() && v > 0.0 && s > 0.0 && s <= f32::MAX as f64 {
                s
            } else {
                0.0
            }
        })
        .collect();
    let mel: Vec<f64> = shifted
        .iter()
        .map(|&v| if v > 0.0 { hz_to_mel(v) } else { 0.0 })
        .collect();

    let (lo, hi, round) = match normalization {
        PitchNormalization::PerUtterance => {
            let (lo, hi) = mel
                .iter()
                .filter(|&&m| m > 0.0)
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &m| {
                    (lo.min(m), hi.max(m))
                });
            (lo, hi, false)
        }
        PitchNormalization::Fixed { floor_hz, ceil_hz } => (
            hz_to_mel(floor_hz.max(0.0) as f64),
            hz_to_mel(ceil_hz.max(0.0) as f64),
            true,
        ),
    };
    let span = hi - lo;

    let bins = mel
        .iter()
        .map(|&m| {
            if m <= 0.0 || !(span.is_finite() && span > 0.0) {
                return MIN_BIN;
            }
            let scaled = (m - lo) * 254.0 / span + 1.0;
            let scaled = if round { scaled.round() } else { scaled.trunc() };
            (scaled as i64).clamp(MIN_BIN, MAX_BIN)
        })
        .collect();
    let hz = shifted.iter().map(|&v| v as f32).collect();

    QuantizedPitch { bins, hz }
}

/// [`align`] followed by [`quantize`].
pub fn align_and_quantize(
    contour: &PitchContour,
    target_frames: usize,
    semitones: f32,
    normalization: PitchNormalization,
) -> QuantizedPitch {
    let aligned = align(contour, target_frames);
    let q = quantize(&aligned, semitones, normalization);
    debug!(
        "pitch: {} -> {} frame(s), shift {semitones:+} semitone(s)",
        contour.len(),
        q.len()
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contour(hz: &[f32]) -> PitchContour {
        PitchContour::new(hz.to_vec(), 10.0)
    }

    #[test]
    fn align_identity() {
        let c = contour(&[0.0, 100.0, 110.0, 0.0, 120.0]);
        assert_eq!(align(&c, 5), c.hz());
    }

    #[test]
    fn align_interpolates_voiced_pairs() {
        let c = contour(&[100.0, 200.0]);
        let a = align(&c, 3);
        assert_eq!(a, vec![100.0, 150.0, 200.0]);
    }

    #[test]
    fn align_never_blends_unvoiced() {
        let c = contour(&[0.0, 200.0, 0.0]);
        let a = align(&c, 9);
        assert_eq!(a.len(), 9);
        for v in &a {
            assert!(*v == 0.0 || *v == 200.0, "blended value {v}");
        }
        assert_eq!(a[4], 200.0);
        assert_eq!(a[0], 0.0);
        assert_eq!(a[8], 0.0);
    }

    #[test]
    fn align_degenerate_lengths() {
        assert_eq!(align(&contour(&[]), 3), vec![0.0; 3]);
        assert_eq!(align(&contour(&[150.0]), 4), vec![150.0; 4]);
        assert!(align(&contour(&[1.0, 2.0]), 0).is_empty());
    }

    #[test]
    fn align_to_zero_frames() {
        for src in [&[][..], &[120.0][..], &[0.0, 130.0][..], &[100.0, 0.0, 140.0, 150.0][..]] {
            let c = contour(src);
            assert!(align(&c, 0).is_empty(), "source {src:?}");
            let q = align_and_quantize(&c, 0, 2.0, PitchNormalization::PerUtterance);
            assert!(q.is_empty(), "source {src:?}");
            assert!(q.hz.is_empty());
        }
    }

    #[test]
    fn quantize_truncates_in_double_precision() {
        // Reference computed entirely in f64, as the bins are defined.
        let f0: Vec<f32> = (0..600).map(|i| 60.0 + i as f32 * 1.7331).collect();
        let shift = 3.3f32;
        let ratio = 2f64.powf(shift as f64 / 12.0);
        let mel: Vec<f64> = f0
            .iter()
            .map(|&v| 1127.0 * (1.0 + v as f64 * ratio / 700.0).ln())
            .collect();
        let lo = mel.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = mel.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let expected: Vec<i64> = mel
            .iter()
            .map(|m| (((m - lo) * 254.0 / (hi - lo) + 1.0).trunc() as i64).clamp(1, 255))
            .collect();

        let q = quantize(&f0, shift, PitchNormalization::PerUtterance);
        let off = q.bins.iter().zip(&expected).filter(|(a, b)| a != b).count();
        assert_eq!(off, 0);
    }

    #[test]
    fn quantize_per_utterance_endpoints() {
        let q = quantize(&[0.0, 100.0, 200.0, 400.0], 0.0, PitchNormalization::PerUtterance);
        assert_eq!(q.bins[0], 1);
        assert_eq!(q.bins[1], 1);
        assert_eq!(q.bins[3], 255);
        assert!(q.bins[2] > 1 && q.bins[2] < 255);
        assert_eq!(q.hz, vec![0.0, 100.0, 200.0, 400.0]);
    }

    #[test]
    fn quantize_all_unvoiced() {
        let q = quantize(&[0.0; 6], 5.0, PitchNormalization::PerUtterance);
        assert_eq!(q.bins, vec![1; 6]);
        assert_eq!(q.hz, vec![0.0; 6]);
    }

    #[test]
    fn quantize_degenerate_range() {
        let q = quantize(&[0.0, 180.0, 180.0], 0.0, PitchNormalization::PerUtterance);
        assert_eq!(q.bins, vec![1, 1, 1]);
    }

    #[test]
    fn quantize_shift_octave() {
        let q = quantize(&[100.0, 0.0], 12.0, PitchNormalization::PerUtterance);
        assert!((q.hz[0] - 200.0).abs() < 1e-3);
        assert_eq!(q.hz[1], 0.0);
        let q = quantize(&[100.0], -12.0, PitchNormalization::PerUtterance);
        assert!((q.hz[0] - 50.0).abs() < 1e-3);
    }

    #[test]
    fn quantize_fixed_range() {
        let norm = PitchNormalization::training_range();
        let q = quantize(&[50.0, 1100.0, 2000.0, 10.0, 0.0], 0.0, norm);
        assert_eq!(q.bins, vec![1, 255, 255, 1, 1]);
    }

    #[test]
    fn quantize_sanitizes_non_finite() {
        let q = quantize(
            &[f32::NAN, 120.0, f32::INFINITY, 240.0],
            0.0,
            PitchNormalization::PerUtterance,
        );
        assert_eq!(q.bins[0], 1);
        assert_eq!(q.bins[2], 1);
        assert_eq!(q.hz[0], 0.0);
        assert_eq!(q.hz[2], 0.0);
        assert_eq!(q.bins[3], 255);
    }

    #[test]
    fn align_and_quantize_lengths() {
        let c = contour(&[0.0, 100.0, 120.0, 140.0, 0.0]);
        let q = align_and_quantize(&c, 12, 3.0, PitchNormalization::default());
        assert_eq!(q.bins.len(), 12);
        assert_eq!(q.hz.len(), 12);
    }
}
