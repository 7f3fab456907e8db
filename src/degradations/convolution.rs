//! Convolution degradation
//!
//! Simulates a room (or any linear system) by convolving the signal with an
//! impulse response and blending the result with the dry signal.

use tracing::debug;

use crate::degradations::degradation::Degradation;
use crate::degradations::params::{ParamKind, ParamSpec, ParameterSet};
use crate::engine::{load_audio, resample_buffer, AudioBuffer, FftConvolver};
use crate::error::{DegraderError, Result};
use crate::impl_degradation_common;

/// Convolution with an impulse response
///
/// # Parameters
/// - `impulse_response`: path of the impulse response (or a buffer given to
///   [`DegradationConvolution::with_impulse_response`])
/// - `level`: wet ratio in [0, 1] (default 1.0); other values are rejected
///
/// The blend `(1 - level) * dry + level * wet` is scaled so that its peak
/// matches the dry peak.
#[derive(Debug, Clone)]
pub struct DegradationConvolution {
    params: ParameterSet,
    impulse_response: Option<AudioBuffer>,
}

impl DegradationConvolution {
    pub fn new() -> Self {
        Self {
            params: ParameterSet::new(
                "convolution",
                vec![
                    ParamSpec::unset(
                        "impulse_response",
                        ParamKind::Path,
                        "Path of the impulse response [wav file]",
                    ),
                    ParamSpec::float(
                        "level",
                        1.0,
                        "Wet level of the convolved signal, between 0 and 1 inclusive",
                    ),
                ],
            ),
            impulse_response: None,
        }
    }

    /// Convolve with an already loaded impulse response
    pub fn with_impulse_response(impulse_response: AudioBuffer) -> Self {
        Self {
            impulse_response: Some(impulse_response),
            ..Self::new()
        }
    }

    fn level(&self) -> Result<f64> {
        let level = self.params.float("level")?;
        if !(0.0..=1.0).contains(&level) {
            return Err(DegraderError::invalid_parameter(
                "level",
                format!("must lie between 0 and 1, got {}", level),
            ));
        }
        Ok(level)
    }

    fn load_impulse_response(&self, sample_rate: u32) -> Result<AudioBuffer> {
        let ir = match &self.impulse_response {
            Some(ir) => ir.clone(),
            None => match self.params.get("impulse_response")? {
                Some(_) => load_audio(&self.params.path("impulse_response")?)?,
                None => {
                    return Err(DegraderError::invalid_parameter(
                        "impulse_response",
                        "an impulse response file or buffer is required",
                    ))
                }
            },
        };

        let ir = if ir.sample_rate != sample_rate && !ir.is_empty() {
            debug!(from = ir.sample_rate, to = sample_rate, "Resampling impulse response");
            resample_buffer(&ir, sample_rate)?
        } else {
            ir
        };

        if ir.is_empty() {
            return Err(DegraderError::invalid_parameter(
                "impulse_response",
                "impulse response has no frames",
            ));
        }
        Ok(ir)
    }
}

impl Default for DegradationConvolution {
    fn default() -> Self {
        Self::new()
    }
}

impl Degradation for DegradationConvolution {
    impl_degradation_common!(
        "convolution",
        "Convolves the audio with an impulse response, e.g. to add reverberation"
    );

    fn apply(&self, buffer: &AudioBuffer) -> Result<AudioBuffer> {
        let level = self.level()?;
        let ir = self.load_impulse_response(buffer.sample_rate)?;

        if ir.channels() != 1 && ir.channels() != buffer.channels() {
            return Err(DegraderError::invalid_parameter(
                "impulse_response",
                format!(
                    "impulse response has {} channels, audio has {}",
                    ir.channels(),
                    buffer.channels()
                ),
            ));
        }

        let frames = buffer.len();
        let wet: Vec<Vec<f32>> = if ir.channels() == 1 {
            let convolver = FftConvolver::new(&ir.samples[0], frames);
            buffer.samples.iter().map(|ch| convolver.convolve(ch)).collect()
        } else {
            buffer
                .samples
                .iter()
                .zip(&ir.samples)
                .map(|(ch, kernel)| FftConvolver::new(kernel, frames).convolve(ch))
                .collect()
        };

        let mixed: Vec<Vec<f64>> = buffer
            .samples
            .iter()
            .zip(&wet)
            .map(|(dry, wet)| {
                dry.iter()
                    .zip(wet)
                    .map(|(&d, &w)| (1.0 - level) * d as f64 + level * w as f64)
                    .collect()
            })
            .collect();

        // The blend is scaled back to the dry peak
        let dry_peak = buffer.peak() as f64;
        let mixed_peak = mixed.iter().flatten().fold(0.0f64, |m, s| m.max(s.abs()));
        let norm = if mixed_peak > 0.0 { dry_peak / mixed_peak } else { 1.0 };
        debug!(level, ir_frames = ir.len(), norm, "Convolving");

        let samples = mixed
            .into_iter()
            .map(|ch| ch.into_iter().map(|s| (s * norm) as f32).collect())
            .collect();

        Ok(AudioBuffer {
            samples,
            sample_rate: buffer.sample_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use test_case::test_case;

    fn signal() -> AudioBuffer {
        let left: Vec<f32> = (0..2000)
            .map(|i| (2.0 * std::f64::consts::PI * 200.0 * i as f64 / 8000.0).sin() as f32 * 0.8)
            .collect();
        let right: Vec<f32> = left.iter().map(|s| s * 0.25).collect();
        AudioBuffer::from_channels(vec![left, right], 8000).unwrap()
    }

    fn direct_convolution(x: &[f32], h: &[f32]) -> Vec<f64> {
        (0..x.len())
            .map(|n| {
                (0..h.len())
                    .filter(|&k| k <= n)
                    .map(|k| h[k] as f64 * x[n - k] as f64)
                    .sum()
            })
            .collect()
    }

    fn convolution_at(ir: AudioBuffer, level: &str) -> DegradationConvolution {
        let mut conv = DegradationConvolution::with_impulse_response(ir);
        conv.set_parameters_values(&[("level", level.into())]).unwrap();
        conv
    }

    #[test]
    fn test_unit_impulse_is_identity() {
        let buffer = signal();
        let ir = AudioBuffer::from_channels(vec![vec![1.0, 0.0, 0.0]], 8000).unwrap();

        let out = convolution_at(ir, "0.7").apply(&buffer).unwrap();

        assert_eq!(out.len(), buffer.len());
        assert_eq!(out.sample_rate, buffer.sample_rate);
        for (a, b) in buffer.samples.iter().flatten().zip(out.samples.iter().flatten()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_matches_direct_convolution() {
        let buffer = signal();
        let h = vec![0.5, 0.3, -0.2, 0.1, 0.05];
        let ir = AudioBuffer::from_channels(vec![h.clone()], 8000).unwrap();

        let out = convolution_at(ir, "1.0").apply(&buffer).unwrap();

        let wet: Vec<Vec<f64>> = buffer
            .samples
            .iter()
            .map(|ch| direct_convolution(ch, &h))
            .collect();
        let wet_peak = wet.iter().flatten().fold(0.0f64, |m, s| m.max(s.abs()));
        let norm = buffer.peak() as f64 / wet_peak;

        for (expected, actual) in wet.iter().flatten().zip(out.samples.iter().flatten()) {
            assert_relative_eq!(expected * norm, *actual as f64, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_output_peak_matches_dry_peak() {
        let buffer = signal();
        let ir = AudioBuffer::from_channels(vec![vec![0.1; 64]], 8000).unwrap();

        let out = convolution_at(ir, "1").apply(&buffer).unwrap();
        assert_relative_eq!(out.peak(), buffer.peak(), epsilon = 1e-5);
    }

    #[test]
    fn test_partial_level_blends_then_normalizes() {
        let buffer = signal();
        let h: Vec<f32> = (0..400)
            .map(|i| (-(i as f32) / 60.0).exp() * if i % 3 == 0 { 1.0 } else { -0.4 })
            .collect();
        let ir = AudioBuffer::from_channels(vec![h.clone()], 8000).unwrap();
        let level = 0.7;

        let out = convolution_at(ir, "0.7").apply(&buffer).unwrap();

        let mixed: Vec<Vec<f64>> = buffer
            .samples
            .iter()
            .map(|ch| {
                ch.iter()
                    .zip(direct_convolution(ch, &h))
                    .map(|(&d, w)| (1.0 - level) * d as f64 + level * w)
                    .collect()
            })
            .collect();
        let mixed_peak = mixed.iter().flatten().fold(0.0f64, |m, s| m.max(s.abs()));
        let norm = buffer.peak() as f64 / mixed_peak;

        for (expected, actual) in mixed.iter().flatten().zip(out.samples.iter().flatten()) {
            assert_relative_eq!(expected * norm, *actual as f64, epsilon = 1e-4);
        }
        assert_relative_eq!(out.peak(), buffer.peak(), epsilon = 1e-5);
    }

    #[test]
    fn test_level_zero_is_dry() {
        let buffer = signal();
        let ir = AudioBuffer::from_channels(vec![vec![0.2, 0.7, 0.1]], 8000).unwrap();

        let out = convolution_at(ir, "0").apply(&buffer).unwrap();
        assert_eq!(out, buffer);
    }

    #[test]
    fn test_per_channel_impulse_responses() {
        let buffer = signal();
        let ir = AudioBuffer::from_channels(vec![vec![1.0, 0.0], vec![0.0, 1.0]], 8000).unwrap();

        let out = convolution_at(ir, "1.0").apply(&buffer).unwrap();

        // Peak normalization is 1: left is the loudest and untouched
        assert_relative_eq!(out.samples[0][100], buffer.samples[0][100], epsilon = 1e-5);
        assert_relative_eq!(out.samples[1][0], 0.0, epsilon = 1e-6);
        assert_relative_eq!(out.samples[1][101], buffer.samples[1][100], epsilon = 1e-5);
    }

    #[test]
    fn test_impulse_response_is_resampled() {
        let buffer = signal();
        let mut delta = vec![0.0; 160];
        delta[0] = 1.0;
        let ir = AudioBuffer::from_channels(vec![delta], 16000).unwrap();

        let out = convolution_at(ir, "0.5").apply(&buffer).unwrap();
        assert_eq!(out.len(), buffer.len());
        assert!(out.is_finite());
    }

    #[test]
    fn test_channel_mismatch_is_rejected() {
        let mono = AudioBuffer::from_channels(vec![vec![0.1; 100]], 8000).unwrap();
        let ir = AudioBuffer::from_channels(vec![vec![1.0], vec![1.0]], 8000).unwrap();

        let result = convolution_at(ir, "0.5").apply(&mono);
        assert!(matches!(result, Err(DegraderError::InvalidParameter { .. })));
    }

    #[test_case("1.5" ; "above one")]
    #[test_case("-0.1" ; "negative")]
    fn test_level_out_of_range(level: &str) {
        let ir = AudioBuffer::from_channels(vec![vec![1.0]], 8000).unwrap();
        let result = convolution_at(ir, level).apply(&signal());
        assert!(matches!(result, Err(DegraderError::InvalidParameter { .. })));
    }

    #[test]
    fn test_missing_impulse_response() {
        let result = DegradationConvolution::new().apply(&signal());
        assert!(matches!(result, Err(DegraderError::InvalidParameter { .. })));
    }
}
