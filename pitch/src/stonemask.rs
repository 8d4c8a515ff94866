//! F0 refinement by instantaneous frequency of the lowest harmonics.

use std::f64::consts::PI;

use rvc_audio::dsp::FftPlan;
use rvc_audio::dsp::window::blackman;

use crate::config::F0Config;

const MAX_HARMONICS: usize = 6;

/// Refinements moving a frame by more than this fraction are discarded.
const MAX_RELATIVE_CHANGE: f64 = 0.2;

/// Refines every voiced frame of `f0`; unvoiced frames stay 0.
pub(crate) fn stonemask(x: &[f64], fs: f64, times: &[f64], f0: &[f64], cfg: &F0Config) -> Vec<f64> {
    f0.iter()
        .zip(times)
        .map(|(&f, &t)| if f > 0.0 { refine(x, fs, t, f, cfg) } else { 0.0 })
        .collect()
}

/// Amplitude-weighted instantaneous frequency over the first harmonics,
/// measured with a Blackman window three periods long centered at `t`.
fn refine(x: &[f64], fs: f64, t: f64, initial: f64, cfg: &F0Config) -> f64 {
    let half = 1 + (1.5 * fs / initial) as usize;
    let len = 2 * half + 1;
    let plan = FftPlan::new(2 * len);
    let m = plan.len();

    let window = blackman(len);
    let d = (len - 1) as f64;
    // d/dn of the Blackman window
    let slope: Vec<f64> = (0..len)
        .map(|i| {
            let a = 2.0 * PI * i as f64 / d;
            (PI / d) * a.sin() - (0.32 * PI / d) * (2.0 * a).sin()
        })
        .collect();

    let center = (t * fs).round() as isize;
    let mut main_re = vec![0.0; m];
    let mut main_im = vec![0.0; m];
    let mut diff_re = vec![0.0; m];
    let mut diff_im = vec![0.0; m];
    for i in 0..len {
        let idx = center - half as isize + i as isize;
        let s = if idx >= 0 && (idx as usize) < x.len() {
            x[idx as usize]
        } else {
            0.0
        };
        main_re[i] = s * window[i];
        diff_re[i] = s * slope[i];
    }
    plan.forward(&mut main_re, &mut main_im);
    plan.forward(&mut diff_re, &mut diff_im);

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for h in 1..=MAX_HARMONICS {
        let k = (h as f64 * initial * m as f64 / fs).round() as usize;
        if k == 0 || k >= m / 2 {
            break;
        }
        let power = main_re[k] * main_re[k] + main_im[k] * main_im[k];
        if power <= 0.0 {
            continue;
        }
        let offset = (diff_im[k] * main_re[k] - diff_re[k] * main_im[k]) / power;
        let omega = 2.0 * PI * k as f64 / m as f64 - offset;
        let inst = omega * fs / (2.0 * PI) / h as f64;
        let amplitude = power.sqrt();
        numerator += amplitude * inst;
        denominator += amplitude;
    }
    if denominator <= 0.0 {
        return initial;
    }

    let refined = numerator / denominator;
    let accepted = refined.is_finite()
        && refined >= cfg.floor_hz
        && refined <= cfg.ceil_hz
        && (refined - initial).abs() / initial <= MAX_RELATIVE_CHANGE;
    if accepted { refined } else { initial }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, fs: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f64 / fs).sin())
            .collect()
    }

    #[test]
    fn pulls_rough_estimate_toward_true_pitch() {
        let fs = 16000.0;
        let x = sine(200.0, fs, 16000);
        let cfg = F0Config::default();
        let refined = refine(&x, fs, 0.5, 190.0, &cfg);
        assert!((refined - 200.0).abs() < 2.0, "refined {refined}");
    }

    #[test]
    fn unvoiced_frames_stay_zero() {
        let fs = 16000.0;
        let x = sine(200.0, fs, 4000);
        let out = stonemask(&x, fs, &[0.1, 0.12], &[0.0, 200.0], &F0Config::default());
        assert_eq!(out[0], 0.0);
        assert!((out[1] - 200.0).abs() < 2.0);
    }

    #[test]
    fn silence_keeps_initial() {
        let out = refine(&vec![0.0; 4000], 16000.0, 0.1, 150.0, &F0Config::default());
        assert_eq!(out, 150.0);
    }
}
