//! Spectral front-end: FFT, windows, mel filterbanks and MFCC.
//!
//! Default MFCC parameters follow the common speech analysis convention at
//! 16 kHz:
//! - FFT size: 1024, centered frames (zero padded by half a window)
//! - Hop: 160 (10 ms)
//! - Window: periodic Hann
//! - Mel bands: 128 (Slaney, area normalized), 0 Hz to Nyquist
//! - Log compression: `10 * log10(max(power, 1e-10))`, 80 dB dynamic range
//! - Cepstrum: orthonormal DCT-II, first 40 coefficients

pub mod fft;
pub mod mel;
pub mod window;

use std::f64::consts::PI;

pub use fft::{FftPlan, next_pow2};

/// Configuration for MFCC extraction.
#[derive(Debug, Clone)]
pub struct MfccConfig {
    pub sample_rate: u32,
    pub fft_size: usize,
    pub hop_size: usize,
    pub num_mels: usize,
    pub num_coeffs: usize,
    pub low_hz: f64,
    /// Upper band edge; `None` means Nyquist.
    pub high_hz: Option<f64>,
    pub amin: f64,
    /// Dynamic range below the utterance maximum; `None` disables clipping.
    pub top_db: Option<f64>,
}

impl Default for MfccConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            fft_size: 1024,
            hop_size: 160,
            num_mels: 128,
            num_coeffs: 40,
            low_hz: 0.0,
            high_hz: None,
            amin: 1e-10,
            top_db: Some(80.0),
        }
    }
}

/// MFCC feature extractor.
pub struct Mfcc {
    cfg: MfccConfig,
    plan: FftPlan,
    window: Vec<f64>,
    mel_bank: Vec<Vec<f64>>,
    dct: Vec<Vec<f64>>,
}

impl Mfcc {
    /// Creates an extractor. `fft_size` is rounded up to a power of two.
    pub fn new(cfg: MfccConfig) -> Self {
        let plan = FftPlan::new(cfg.fft_size);
        let n_fft = plan.len();
        let high_hz = cfg.high_hz.unwrap_or(cfg.sample_rate as f64 / 2.0);
        let window = window::hann_periodic(n_fft);
        let mel_bank =
            mel::mel_filter_bank(cfg.num_mels, n_fft, cfg.sample_rate, cfg.low_hz, high_hz);
        let dct = dct_ortho_matrix(cfg.num_coeffs, cfg.num_mels);
        Self {
            cfg,
            plan,
            window,
            mel_bank,
            dct,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &MfccConfig {
        &self.cfg
    }

    /// Number of frames produced for `num_samples` input samples.
    pub fn num_frames(&self, num_samples: usize) -> usize {
        if num_samples == 0 {
            0
        } else {
            1 + num_samples / self.cfg.hop_size.max(1)
        }
    }

    /// Extracts `[T][num_coeffs]` coefficients, `T = 1 + len / hop_size`.
    ///
    /// Returns an empty matrix for empty input.
    pub fn extract(&self, pcm: &[f32]) -> Vec<Vec<f32>> {
        let log_mel = self.log_mel_spectrogram(pcm);
        log_mel
            .iter()
            .map(|frame| {
                self.dct
                    .iter()
                    .map(|basis| basis.iter().zip(frame).map(|(b, x)| b * x).sum::<f64>() as f32)
                    .collect()
            })
            .collect()
    }

    /// Log-power mel spectrogram, `[T][num_mels]` in dB.
    pub fn log_mel_spectrogram(&self, pcm: &[f32]) -> Vec<Vec<f64>> {
        let num_frames = self.num_frames(pcm.len());
        let n_fft = self.plan.len();
        let pad = n_fft / 2;
        let hop = self.cfg.hop_size.max(1);

        let mut frame = vec![0.0f64; n_fft];
        let mut mel = Vec::with_capacity(num_frames);
        for t in 0..num_frames {
            // Frame t covers padded[t*hop .. t*hop + n_fft], padded = [0; pad] ++ pcm ++ [0; pad]
            let start = (t * hop) as isize - pad as isize;
            for (i, slot) in frame.iter_mut().enumerate() {
                let idx = start + i as isize;
                let s = if idx >= 0 && (idx as usize) < pcm.len() {
                    pcm[idx as usize] as f64
                } else {
                    0.0
                };
                *slot = s * self.window[i];
            }
            let power = self.plan.power_spectrum(&frame);
            let bands: Vec<f64> = self
                .mel_bank
                .iter()
                .map(|filter| filter.iter().zip(&power).map(|(w, p)| w * p).sum())
                .collect();
            mel.push(bands);
        }

        power_to_db(&mut mel, self.cfg.amin, self.cfg.top_db);
        mel
    }
}

/// Converts a power spectrogram to decibels in place.
///
/// `10 * log10(max(amin, x))`, then values more than `top_db` below the
/// global maximum are raised to that floor.
pub fn power_to_db(spec: &mut [Vec<f64>], amin: f64, top_db: Option<f64>) {
    let mut max_db = f64::NEG_INFINITY;
    for row in spec.iter_mut() {
        for v in row.iter_mut() {
            *v = 10.0 * v.max(amin).log10();
            max_db = max_db.max(*v);
        }
    }
    if let Some(top) = top_db {
        let floor = max_db - top;
        for row in spec.iter_mut() {
            for v in row.iter_mut() {
                *v = v.max(floor);
            }
        }
    }
}

/// Orthonormal DCT-II basis, `[num_coeffs][n]`.
fn dct_ortho_matrix(num_coeffs: usize, n: usize) -> Vec<Vec<f64>> {
    let nf = n as f64;
    (0..num_coeffs)
        .map(|k| {
            let scale = if k == 0 {
                (1.0 / nf).sqrt()
            } else {
                (2.0 / nf).sqrt()
            };
            (0..n)
                .map(|i| scale * (PI * k as f64 * (2 * i + 1) as f64 / (2.0 * nf)).cos())
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / 16000.0).sin() as f32 * 0.5)
            .collect()
    }

    #[test]
    fn test_mfcc_frame_count() {
        let mfcc = Mfcc::new(MfccConfig::default());
        assert_eq!(mfcc.extract(&sine(440.0, 16000)).len(), 101);
        assert_eq!(mfcc.extract(&sine(440.0, 159)).len(), 1);
        assert_eq!(mfcc.extract(&sine(440.0, 160)).len(), 2);
        assert!(mfcc.extract(&[]).is_empty());
    }

    #[test]
    fn test_mfcc_dimension_and_finite() {
        let mfcc = Mfcc::new(MfccConfig::default());
        let feats = mfcc.extract(&sine(220.0, 8000));
        for row in &feats {
            assert_eq!(row.len(), 40);
            assert!(row.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_mfcc_deterministic() {
        let mfcc = Mfcc::new(MfccConfig::default());
        let x = sine(330.0, 4000);
        assert_eq!(mfcc.extract(&x), mfcc.extract(&x));
    }

    #[test]
    fn test_silence_is_floor() {
        let mfcc = Mfcc::new(MfccConfig::default());
        let spec = mfcc.log_mel_spectrogram(&vec![0.0; 1600]);
        for row in &spec {
            for &v in row {
                assert!((v + 100.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_power_to_db_top_db() {
        let mut s = vec![vec![1.0, 1e-12, 1e-3]];
        power_to_db(&mut s, 1e-10, Some(20.0));
        assert!((s[0][0] - 0.0).abs() < 1e-12);
        assert!((s[0][1] + 20.0).abs() < 1e-12);
        assert!((s[0][2] + 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_dct_orthonormal() {
        let d = dct_ortho_matrix(8, 8);
        for a in 0..8 {
            for b in 0..8 {
                let dot: f64 = d[a].iter().zip(&d[b]).map(|(x, y)| x * y).sum();
                let expected = if a == b { 1.0 } else { 0.0 };
                assert!((dot - expected).abs() < 1e-9);
            }
        }
    }
}
