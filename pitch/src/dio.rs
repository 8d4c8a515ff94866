//! Raw F0 estimation from zero-crossing intervals of band-limited signals.
//!
//! For each candidate band the signal is smoothed with a Nuttall window
//! two band periods long, which keeps roughly one harmonic. Four interval
//! series (negative-going and positive-going zero crossings, peaks, dips)
//! each give a local frequency; their mean is the band's candidate and
//! their spread relative to the mean is its score. The lowest-score
//! in-range candidate wins per frame, then the contour is cleaned up.

use rvc_audio::dsp::window::nuttall;
use rvc_audio::dsp::{FftPlan, next_pow2};

use crate::config::F0Config;

/// Raw contour and the per-band candidates it was chosen from.
pub(crate) struct DioOutput {
    pub f0: Vec<f64>,
    pub times: Vec<f64>,
}

/// Estimates F0 at `frame_count` frames of `x` sampled at `fs`.
pub(crate) fn dio(x: &[f64], fs: f64, cfg: &F0Config, frame_count: usize) -> DioOutput {
    let times: Vec<f64> = (0..frame_count)
        .map(|i| i as f64 * cfg.frame_period_ms / 1000.0)
        .collect();
    let bands = band_boundaries(cfg);

    let max_half = half_average_length(fs, bands[0]);
    let plan = FftPlan::new(next_pow2(x.len() + 4 * max_half + 1));

    let mean = x.iter().sum::<f64>() / x.len().max(1) as f64;
    let mut spec_re = vec![0.0; plan.len()];
    let mut spec_im = vec![0.0; plan.len()];
    for (dst, &s) in spec_re.iter_mut().zip(x) {
        *dst = s - mean;
    }
    plan.forward(&mut spec_re, &mut spec_im);

    let mut candidates = vec![vec![0.0; frame_count]; bands.len()];
    let mut best = vec![0.0; frame_count];
    let mut best_score = vec![f64::INFINITY; frame_count];

    for (b, &boundary) in bands.iter().enumerate() {
        let filtered = low_pass(&plan, &spec_re, &spec_im, x.len(), fs, boundary);
        let series = crossing_series(&filtered, fs);
        for (j, &t) in times.iter().enumerate() {
            let Some((f0, score)) = band_candidate(&series, t, boundary, cfg) else {
                continue;
            };
            candidates[b][j] = f0;
            if score < best_score[j] {
                best_score[j] = score;
                best[j] = f0;
            }
        }
    }

    DioOutput {
        f0: fix_contour(&best, &candidates, cfg),
        times,
    }
}

/// Upper edges of the candidate bands, `floor * 2^((i + 1) / channels)`.
fn band_boundaries(cfg: &F0Config) -> Vec<f64> {
    let count = 1 + ((cfg.ceil_hz / cfg.floor_hz).log2() * cfg.channels_in_octave) as usize;
    (0..count)
        .map(|i| cfg.floor_hz * 2f64.powf((i + 1) as f64 / cfg.channels_in_octave))
        .collect()
}

fn half_average_length(fs: f64, boundary: f64) -> usize {
    ((fs / boundary / 2.0).round() as usize).max(1)
}

/// Smooths the signal with a Nuttall window spanning two band periods.
///
/// `spec_*` hold the spectrum of the DC-free signal at `plan.len()` points.
fn low_pass(
    plan: &FftPlan,
    spec_re: &[f64],
    spec_im: &[f64],
    n: usize,
    fs: f64,
    boundary: f64,
) -> Vec<f64> {
    let half = half_average_length(fs, boundary);
    let taps = nuttall(half * 4);

    let mut re = vec![0.0; plan.len()];
    let mut im = vec![0.0; plan.len()];
    re[..taps.len()].copy_from_slice(&taps);
    plan.forward(&mut re, &mut im);

    for k in 0..plan.len() {
        let r = spec_re[k] * re[k] - spec_im[k] * im[k];
        let i = spec_re[k] * im[k] + spec_im[k] * re[k];
        re[k] = r;
        im[k] = i;
    }
    plan.inverse(&mut re, &mut im);

    // Compensate the filter's group delay.
    let bias = half * 2;
    re[bias..bias + n].to_vec()
}

/// Local frequency estimates located at interval midpoints (seconds).
#[derive(Debug, Default)]
struct Intervals {
    locations: Vec<f64>,
    rates: Vec<f64>,
}

impl Intervals {
    /// Rate at time `t`, linearly interpolated; `None` outside the span.
    fn at(&self, t: f64) -> Option<f64> {
        let locs = &self.locations;
        if locs.len() < 2 || t < locs[0] || t > locs[locs.len() - 1] {
            return None;
        }
        let hi = locs.partition_point(|&l| l < t).max(1);
        let lo = hi - 1;
        let span = locs[hi] - locs[lo];
        if span <= 0.0 {
            return Some(self.rates[lo]);
        }
        let frac = (t - locs[lo]) / span;
        Some(self.rates[lo] + (self.rates[hi] - self.rates[lo]) * frac)
    }
}

/// Intervals between negative-going zero crossings of `y`.
fn zero_crossings(y: &[f64], fs: f64) -> Intervals {
    let mut edges = Vec::new();
    for i in 0..y.len().saturating_sub(1) {
        if y[i] > 0.0 && y[i + 1] <= 0.0 {
            let denom = y[i] - y[i + 1];
            let frac = if denom > 0.0 { y[i] / denom } else { 0.0 };
            edges.push(i as f64 + frac);
        }
    }

    let mut out = Intervals::default();
    for pair in edges.windows(2) {
        let width = pair[1] - pair[0];
        if width <= 0.0 {
            continue;
        }
        out.locations.push((pair[0] + pair[1]) / 2.0 / fs);
        out.rates.push(fs / width);
    }
    out
}

/// Negative-going, positive-going, peak and dip interval series.
fn crossing_series(filtered: &[f64], fs: f64) -> [Intervals; 4] {
    let negated: Vec<f64> = filtered.iter().map(|v| -v).collect();
    let slope: Vec<f64> = filtered.windows(2).map(|w| w[1] - w[0]).collect();
    let negated_slope: Vec<f64> = slope.iter().map(|v| -v).collect();
    [
        zero_crossings(filtered, fs),
        zero_crossings(&negated, fs),
        zero_crossings(&slope, fs),
        zero_crossings(&negated_slope, fs),
    ]
}

/// Candidate F0 and score for one band at time `t`.
fn band_candidate(
    series: &[Intervals; 4],
    t: f64,
    boundary: f64,
    cfg: &F0Config,
) -> Option<(f64, f64)> {
    let mut rates = [0.0; 4];
    for (slot, s) in rates.iter_mut().zip(series) {
        *slot = s.at(t)?;
    }
    let mean = rates.iter().sum::<f64>() / 4.0;
    if mean > boundary || mean < boundary / 2.0 || mean > cfg.ceil_hz || mean < cfg.floor_hz {
        return None;
    }
    let deviation = (rates.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / 3.0).sqrt();
    Some((mean, deviation / mean))
}

/// Removes jumps and short voiced islands, then regrows voiced runs from
/// neighbouring band candidates.
fn fix_contour(best: &[f64], candidates: &[Vec<f64>], cfg: &F0Config) -> Vec<f64> {
    let frames = best.len();
    let min_run = cfg.voice_range_minimum();

    // Edges carry too little context to trust.
    let mut base = vec![0.0; frames];
    if frames > 2 * min_run {
        base[min_run..frames - min_run].copy_from_slice(&best[min_run..frames - min_run]);
    }

    let mut f0 = vec![0.0; frames];
    for i in 1..frames {
        let (cur, prev) = (base[i], base[i - 1]);
        if cur > 0.0 && prev > 0.0 && (cur - prev).abs() / cur < cfg.allowed_range {
            f0[i] = cur;
        }
    }

    remove_short_runs(&mut f0, min_run);

    for i in 1..frames {
        if f0[i] == 0.0 && f0[i - 1] > 0.0 {
            f0[i] = nearest_candidate(candidates, i, f0[i - 1], cfg.allowed_range);
        }
    }
    for i in (0..frames.saturating_sub(1)).rev() {
        if f0[i] == 0.0 && f0[i + 1] > 0.0 {
            f0[i] = nearest_candidate(candidates, i, f0[i + 1], cfg.allowed_range);
        }
    }
    f0
}

fn remove_short_runs(f0: &mut [f64], min_run: usize) {
    let mut i = 0;
    while i < f0.len() {
        if f0[i] == 0.0 {
            i += 1;
            continue;
        }
        let start = i;
        while i < f0.len() && f0[i] > 0.0 {
            i += 1;
        }
        if i - start < min_run {
            f0[start..i].fill(0.0);
        }
    }
}

/// The candidate at frame `i` closest to `reference`, or 0 if none is
/// within `allowed_range`.
fn nearest_candidate(candidates: &[Vec<f64>], i: usize, reference: f64, allowed_range: f64) -> f64 {
    candidates
        .iter()
        .map(|band| band[i])
        .filter(|&c| c > 0.0)
        .min_by(|a, b| (a - reference).abs().total_cmp(&(b - reference).abs()))
        .filter(|&c| (c - reference).abs() / reference < allowed_range)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(freq: f64, fs: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f64 / fs).sin())
            .collect()
    }

    #[test]
    fn band_layout() {
        let bands = band_boundaries(&F0Config::default());
        assert_eq!(bands.len(), 9);
        assert!((bands[0] - 50.0 * 2f64.sqrt()).abs() < 1e-9);
        assert!((bands[1] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn crossings_of_pure_tone() {
        let y = sine(200.0, 16000.0, 1600);
        let iv = zero_crossings(&y, 16000.0);
        assert!(iv.rates.len() > 10);
        for r in &iv.rates {
            assert!((r - 200.0).abs() < 0.5, "rate {r}");
        }
        assert!(iv.at(0.0).is_none());
        assert!(iv.at(0.05).is_some());
    }

    #[test]
    fn tracks_steady_tone() {
        let fs = 16000.0;
        let x = sine(220.0, fs, 16000);
        let cfg = F0Config::default();
        let out = dio(&x, fs, &cfg, cfg.frame_count(x.len(), 16000));
        assert_eq!(out.f0.len(), 101);
        let voiced: Vec<f64> = out.f0.iter().copied().filter(|&v| v > 0.0).collect();
        assert!(voiced.len() > 80, "voiced {}", voiced.len());
        for v in voiced {
            assert!((v - 220.0).abs() < 220.0 * 0.05, "f0 {v}");
        }
    }

    #[test]
    fn silence_is_unvoiced() {
        let cfg = F0Config::default();
        let out = dio(&vec![0.0; 8000], 16000.0, &cfg, 51);
        assert!(out.f0.iter().all(|&v| v == 0.0));
        assert_eq!(out.times.len(), 51);
    }

    #[test]
    fn short_runs_removed() {
        let mut f0 = vec![0.0, 100.0, 100.0, 0.0, 100.0, 100.0, 100.0, 100.0, 100.0, 0.0];
        remove_short_runs(&mut f0, 5);
        assert_eq!(f0[1], 0.0);
        assert_eq!(f0[2], 0.0);
        assert!(f0[4..9].iter().all(|&v| v == 100.0));
    }

    #[test]
    fn nearest_candidate_respects_range() {
        let c = vec![vec![0.0, 105.0], vec![0.0, 150.0]];
        assert_eq!(nearest_candidate(&c, 1, 100.0, 0.1), 105.0);
        assert_eq!(nearest_candidate(&c, 1, 200.0, 0.1), 0.0);
        assert_eq!(nearest_candidate(&c, 0, 100.0, 0.1), 0.0);
    }
}
