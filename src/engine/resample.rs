//! Band-limited sample rate conversion
//!
//! Resamples by moving each channel to the frequency domain, truncating or
//! zero-extending the spectrum to the target length and transforming back.
//! Everything above the lower of the two Nyquist limits is discarded, so
//! downsampling does not alias.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::engine::buffer::AudioBuffer;
use crate::error::{DegraderError, Result};

/// Number of output frames for a conversion, `round(frames * to / from)`
pub fn resampled_len(frames: usize, from_rate: u32, to_rate: u32) -> usize {
    ((frames as f64) * (to_rate as f64) / (from_rate as f64)).round() as usize
}

/// Resample every channel of a buffer to `target_rate`
///
/// # Errors
/// `InvalidParameter` if `target_rate` is zero.
pub fn resample_buffer(buffer: &AudioBuffer, target_rate: u32) -> Result<AudioBuffer> {
    if target_rate == 0 {
        return Err(DegraderError::invalid_parameter(
            "sample_rate",
            "target sample rate must be positive",
        ));
    }

    if target_rate == buffer.sample_rate {
        return Ok(buffer.clone());
    }

    let out_len = resampled_len(buffer.len(), buffer.sample_rate, target_rate);
    if buffer.is_empty() || out_len == 0 {
        return Ok(AudioBuffer::silence(buffer.channels(), out_len, target_rate));
    }

    let resampler = FftResampler::new(buffer.len(), out_len);
    let samples = buffer
        .samples
        .iter()
        .map(|channel| resampler.process(channel))
        .collect();

    Ok(AudioBuffer {
        samples,
        sample_rate: target_rate,
    })
}

/// FFT resampler for a fixed input/output length pair
///
/// Plans are created once and reused for every channel.
pub struct FftResampler {
    in_len: usize,
    out_len: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl FftResampler {
    pub fn new(in_len: usize, out_len: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        Self {
            in_len,
            out_len,
            forward: planner.plan_fft_forward(in_len.max(1)),
            inverse: planner.plan_fft_inverse(out_len.max(1)),
        }
    }

    /// Resample one channel of exactly `in_len` samples
    pub fn process(&self, input: &[f32]) -> Vec<f32> {
        let n = self.in_len;
        let m = self.out_len;

        if n == 0 || m == 0 {
            return vec![0.0; m];
        }

        let mut spectrum: Vec<Complex<f64>> = input
            .iter()
            .take(n)
            .map(|&s| Complex::new(s as f64, 0.0))
            .collect();
        spectrum.resize(n, Complex::new(0.0, 0.0));
        self.forward.process(&mut spectrum);

        let mut out = vec![Complex::new(0.0, 0.0); m];
        let shared = n.min(m);
        let nyq = shared / 2 + 1;

        // Non-negative frequencies up to the shared Nyquist
        out[..nyq].copy_from_slice(&spectrum[..nyq]);

        // Negative frequencies
        if shared > 2 {
            let tail = shared - nyq;
            out[m - tail..].copy_from_slice(&spectrum[n - tail..]);
        }

        // An even shared length leaves one Nyquist bin that belongs to both
        // halves of the spectrum
        if shared % 2 == 0 {
            let half = shared / 2;
            if m < n {
                out[m - half] += spectrum[n - half];
            } else if m > n {
                out[half] *= 0.5;
                out[m - half] = out[half];
            }
        }

        self.inverse.process(&mut out);

        // rustfft does not normalize; the forward length sets the scale
        let scale = 1.0 / n as f64;
        out.iter().map(|c| (c.re * scale) as f32).collect()
    }
}
