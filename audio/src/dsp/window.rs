//! Window functions.

use std::f64::consts::PI;

/// Periodic Hann window (DFT-even), the STFT default.
pub fn hann_periodic(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos())
        .collect()
}

/// Symmetric Blackman window.
pub fn blackman(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0; n];
    }
    let d = (n - 1) as f64;
    (0..n)
        .map(|i| {
            let x = 2.0 * PI * i as f64 / d;
            0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos()
        })
        .collect()
}

/// Symmetric 4-term Nuttall window.
pub fn nuttall(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0; n];
    }
    let d = (n - 1) as f64;
    (0..n)
        .map(|i| {
            let x = 2.0 * PI * i as f64 / d;
            0.355768 - 0.487396 * x.cos() + 0.144232 * (2.0 * x).cos()
                - 0.012604 * (3.0 * x).cos()
        })
        .collect()
}
