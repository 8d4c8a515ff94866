//! Radix-2 FFT with precomputed twiddles.

use std::f64::consts::PI;

/// Returns the smallest power of two that is >= `n` (1 for `n == 0`).
pub fn next_pow2(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// A reusable FFT plan for a fixed power-of-two length.
///
/// Twiddle factors and the bit-reversal table are computed once, so a plan
/// can be shared across every frame of an utterance.
#[derive(Debug, Clone)]
pub struct FftPlan {
    n: usize,
    cos: Vec<f64>,
    sin: Vec<f64>,
    rev: Vec<usize>,
}

impl FftPlan {
    /// Creates a plan for length `n`, rounded up to a power of two.
    pub fn new(n: usize) -> Self {
        let n = next_pow2(n);
        let half = n / 2;
        let cos = (0..half).map(|k| (-2.0 * PI * k as f64 / n as f64).cos()).collect();
        let sin = (0..half).map(|k| (-2.0 * PI * k as f64 / n as f64).sin()).collect();

        let bits = n.trailing_zeros();
        let rev = (0..n)
            .map(|i| {
                if bits == 0 {
                    0
                } else {
                    i.reverse_bits() >> (usize::BITS - bits)
                }
            })
            .collect();

        Self { n, cos, sin, rev }
    }

    /// Transform length.
    pub fn len(&self) -> usize {
        self.n
    }

    /// Always false; a plan has at least one point.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Forward transform in place. Both slices must have length `len()`.
    pub fn forward(&self, real: &mut [f64], imag: &mut [f64]) {
        self.butterflies(real, imag);
    }

    /// Inverse transform in place, scaled by `1/n`.
    pub fn inverse(&self, real: &mut [f64], imag: &mut [f64]) {
        for v in imag.iter_mut() {
            *v = -*v;
        }
        self.butterflies(real, imag);
        let scale = 1.0 / self.n as f64;
        for v in real.iter_mut() {
            *v *= scale;
        }
        for v in imag.iter_mut() {
            *v *= -scale;
        }
    }

    /// Power spectrum `|X[k]|^2` for `k` in `0..=n/2` of a real frame.
    ///
    /// `frame` shorter than the plan is zero-padded.
    pub fn power_spectrum(&self, frame: &[f64]) -> Vec<f64> {
        let mut real = vec![0.0; self.n];
        let mut imag = vec![0.0; self.n];
        let m = frame.len().min(self.n);
        real[..m].copy_from_slice(&frame[..m]);
        self.forward(&mut real, &mut imag);
        (0..=self.n / 2)
            .map(|k| real[k] * real[k] + imag[k] * imag[k])
            .collect()
    }

    fn butterflies(&self, real: &mut [f64], imag: &mut [f64]) {
        let n = self.n;
        debug_assert_eq!(real.len(), n);
        debug_assert_eq!(imag.len(), n);
        if n <= 1 {
            return;
        }

        for i in 0..n {
            let j = self.rev[i];
            if i < j {
                real.swap(i, j);
                imag.swap(i, j);
            }
        }

        let mut size = 2;
        while size <= n {
            let half = size / 2;
            let stride = n / size;
            for start in (0..n).step_by(size) {
                for k in 0..half {
                    let (w_r, w_i) = (self.cos[k * stride], self.sin[k * stride]);
                    let u = start + k;
                    let v = u + half;
                    let t_r = w_r * real[v] - w_i * imag[v];
                    let t_i = w_r * imag[v] + w_i * real[v];
                    real[v] = real[u] - t_r;
                    imag[v] = imag[u] - t_i;
                    real[u] += t_r;
                    imag[u] += t_i;
                }
            }
            size *= 2;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_pow2() {
        assert_eq!(next_pow2(0), 1);
        assert_eq!(next_pow2(1), 1);
        assert_eq!(next_pow2(5), 8);
        assert_eq!(next_pow2(1024), 1024);
        assert_eq!(next_pow2(1025), 2048);
    }

    #[test]
    fn test_fft_impulse() {
        let mut real = vec![0.0; 8];
        let mut imag = vec![0.0; 8];
        real[0] = 1.0;

        FftPlan::new(8).forward(&mut real, &mut imag);

        for &v in &real {
            assert!((v - 1.0).abs() < 1e-10);
        }
        for &v in &imag {
            assert!(v.abs() < 1e-10);
        }
    }

    #[test]
    fn test_fft_ifft_roundtrip() {
        let original = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let mut real = original.clone();
        let mut imag = vec![0.0; 8];

        let plan = FftPlan::new(8);
        plan.forward(&mut real, &mut imag);
        plan.inverse(&mut real, &mut imag);

        for (a, b) in real.iter().zip(original.iter()) {
            assert!((a - b).abs() < 1e-10, "{a} != {b}");
        }
    }

    #[test]
    fn test_power_spectrum_peak_bin() {
        let plan = FftPlan::new(64);
        let frame: Vec<f64> = (0..64)
            .map(|i| (2.0 * PI * 4.0 * i as f64 / 64.0).cos())
            .collect();
        let p = plan.power_spectrum(&frame);
        assert_eq!(p.len(), 33);
        let peak = p
            .iter()
            .enumerate()
            .fold((0, 0.0), |acc, (i, &v)| if v > acc.1 { (i, v) } else { acc });
        assert_eq!(peak.0, 4);
    }
}
