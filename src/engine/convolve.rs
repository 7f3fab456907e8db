//! FFT linear convolution
//!
//! The kernel spectrum is computed once and reused for every channel that
//! is convolved with it.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Convolver for a fixed kernel and signal length
pub struct FftConvolver {
    signal_len: usize,
    kernel_spectrum: Vec<Complex<f64>>,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl FftConvolver {
    /// Prepare a convolver for signals of `signal_len` frames
    ///
    /// The FFT size is the next power of two holding the full linear
    /// convolution, so no circular wrap-around reaches the kept frames.
    pub fn new(kernel: &[f32], signal_len: usize) -> Self {
        let full_len = (signal_len + kernel.len()).saturating_sub(1).max(1);
        let fft_size = full_len.next_power_of_two();

        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(fft_size);
        let inverse = planner.plan_fft_inverse(fft_size);

        let mut kernel_spectrum = zero_padded(kernel, fft_size);
        forward.process(&mut kernel_spectrum);

        Self {
            signal_len,
            kernel_spectrum,
            forward,
            inverse,
        }
    }

    /// Convolve one channel, keeping only the first `signal_len` frames
    pub fn convolve(&self, signal: &[f32]) -> Vec<f32> {
        let fft_size = self.kernel_spectrum.len();
        let kept = self.signal_len.min(signal.len());

        let mut spectrum = zero_padded(&signal[..kept], fft_size);
        self.forward.process(&mut spectrum);

        for (bin, k) in spectrum.iter_mut().zip(&self.kernel_spectrum) {
            *bin *= *k;
        }

        self.inverse.process(&mut spectrum);

        let scale = 1.0 / fft_size as f64;
        let mut out: Vec<f32> = spectrum
            .iter()
            .take(kept)
            .map(|c| (c.re * scale) as f32)
            .collect();
        out.resize(self.signal_len, 0.0);
        out
    }
}

/// Linear convolution of `signal` with `kernel`, truncated to the signal length
pub fn convolve_truncated(signal: &[f32], kernel: &[f32]) -> Vec<f32> {
    FftConvolver::new(kernel, signal.len()).convolve(signal)
}

fn zero_padded(samples: &[f32], len: usize) -> Vec<Complex<f64>> {
    let mut padded: Vec<Complex<f64>> = samples
        .iter()
        .map(|&s| Complex::new(s as f64, 0.0))
        .collect();
    padded.resize(len, Complex::new(0.0, 0.0));
    padded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct_convolution(x: &[f32], h: &[f32]) -> Vec<f32> {
        (0..x.len())
            .map(|n| {
                (0..h.len())
                    .filter(|&k| k <= n)
                    .map(|k| x[n - k] * h[k])
                    .sum()
            })
            .collect()
    }

    #[test]
    fn test_unit_impulse_is_identity() {
        let x = vec![0.5, -0.25, 0.125, 1.0, 0.0, -1.0];
        let out = convolve_truncated(&x, &[1.0]);
        for (a, b) in x.iter().zip(&out) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_delayed_impulse_shifts() {
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let out = convolve_truncated(&x, &[0.0, 0.0, 1.0]);
        let expected = [0.0, 0.0, 1.0, 2.0];
        for (a, b) in expected.iter().zip(&out) {
            assert!((a - b).abs() < 1e-6, "{:?}", out);
        }
    }

    #[test]
    fn test_matches_direct_convolution() {
        let x: Vec<f32> = (0..257).map(|i| ((i * 7919) % 200) as f32 / 100.0 - 1.0).collect();
        let h: Vec<f32> = (0..33).map(|i| (-(i as f32) / 8.0).exp() * if i % 2 == 0 { 1.0 } else { -0.5 }).collect();

        let fast = convolve_truncated(&x, &h);
        let slow = direct_convolution(&x, &h);

        assert_eq!(fast.len(), x.len());
        for (a, b) in fast.iter().zip(&slow) {
            assert!((a - b).abs() < 1e-4, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_kernel_longer_than_signal() {
        let x = vec![1.0, 1.0];
        let h = vec![0.5; 10];
        let out = convolve_truncated(&x, &h);
        assert_eq!(out.len(), 2);
        assert!((out[0] - 0.5).abs() < 1e-6);
        assert!((out[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_signal() {
        assert!(convolve_truncated(&[], &[1.0, 0.5]).is_empty());
    }
}
