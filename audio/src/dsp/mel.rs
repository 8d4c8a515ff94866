//! Slaney-style mel scale and area-normalized filterbank.

const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

/// Converts Hz to Slaney mel (linear below 1 kHz, logarithmic above).
pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

/// Converts Slaney mel back to Hz.
pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        mel * F_SP
    }
}

/// Builds a `[num_mels][fft_size / 2 + 1]` filterbank.
///
/// Triangles are spaced evenly on the Slaney mel scale between `low_hz` and
/// `high_hz`, and each is scaled by `2 / (right_hz - left_hz)` so all bands
/// have equal area.
pub fn mel_filter_bank(
    num_mels: usize,
    fft_size: usize,
    sample_rate: u32,
    low_hz: f64,
    high_hz: f64,
) -> Vec<Vec<f64>> {
    let bins = fft_size / 2 + 1;
    let nyquist = sample_rate as f64 / 2.0;
    let fft_freqs: Vec<f64> = (0..bins)
        .map(|k| {
            if bins == 1 {
                0.0
            } else {
                nyquist * k as f64 / (bins - 1) as f64
            }
        })
        .collect();

    let low_mel = hz_to_mel(low_hz);
    let high_mel = hz_to_mel(high_hz);
    let edges: Vec<f64> = (0..num_mels + 2)
        .map(|i| mel_to_hz(low_mel + (high_mel - low_mel) * i as f64 / (num_mels + 1) as f64))
        .collect();

    (0..num_mels)
        .map(|m| {
            let (left, center, right) = (edges[m], edges[m + 1], edges[m + 2]);
            let norm = 2.0 / (right - left);
            fft_freqs
                .iter()
                .map(|&f| {
                    let lower = (f - left) / (center - left);
                    let upper = (right - f) / (right - center);
                    lower.min(upper).max(0.0) * norm
                })
                .collect()
        })
        .collect()
}
