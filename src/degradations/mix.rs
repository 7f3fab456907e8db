//! Mix degradation
//!
//! Adds noise to the signal, scaled so that the signal-to-noise ratio of
//! the result hits a target in dB.
//!
//! The noise is adapted to the signal before mixing:
//! - resampled to the signal's rate when the rates differ
//! - mono noise is duplicated to every channel, other channel mismatches
//!   are downmixed to mono and then duplicated
//! - shorter noise is looped from its first frame, longer noise is cut

use tracing::debug;

use crate::degradations::degradation::Degradation;
use crate::degradations::params::{ParamKind, ParamSpec, ParameterSet};
use crate::engine::{db_to_linear, load_audio, resample_buffer, AudioBuffer};
use crate::error::{DegraderError, Result};
use crate::impl_degradation_common;

/// Noise mixing at a target SNR
///
/// # Parameters
/// - `noise`: path of the noise recording (or a buffer given to
///   [`DegradationMix::with_noise_buffer`])
/// - `snr`: target signal-to-noise ratio in dB (default 0)
#[derive(Debug, Clone)]
pub struct DegradationMix {
    params: ParameterSet,
    noise_buffer: Option<AudioBuffer>,
}

impl DegradationMix {
    pub fn new() -> Self {
        Self {
            params: ParameterSet::new(
                "mix",
                vec![
                    ParamSpec::unset("noise", ParamKind::Path, "Path of the noise to mix [wav file]"),
                    ParamSpec::float("snr", 0.0, "Signal to noise ratio [dBs]"),
                ],
            ),
            noise_buffer: None,
        }
    }

    /// Mix with an already loaded noise buffer instead of reading `noise`
    pub fn with_noise_buffer(noise: AudioBuffer) -> Self {
        Self {
            noise_buffer: Some(noise),
            ..Self::new()
        }
    }

    fn load_noise(&self) -> Result<AudioBuffer> {
        if let Some(noise) = &self.noise_buffer {
            return Ok(noise.clone());
        }

        match self.params.get("noise")? {
            Some(_) => load_audio(&self.params.path("noise")?),
            None => Err(DegraderError::invalid_parameter(
                "noise",
                "a noise file or buffer is required",
            )),
        }
    }
}

impl Default for DegradationMix {
    fn default() -> Self {
        Self::new()
    }
}

/// Bring noise to the signal's rate, channel count and length
fn adapt_noise(noise: &AudioBuffer, signal: &AudioBuffer) -> Result<AudioBuffer> {
    if noise.is_empty() {
        return Err(DegraderError::invalid_parameter("noise", "noise has no frames"));
    }

    let noise = if noise.sample_rate != signal.sample_rate {
        debug!(
            from = noise.sample_rate,
            to = signal.sample_rate,
            "Resampling noise"
        );
        resample_buffer(noise, signal.sample_rate)?
    } else {
        noise.clone()
    };

    if noise.is_empty() {
        return Err(DegraderError::invalid_parameter(
            "noise",
            "noise is too short for the signal's sample rate",
        ));
    }

    let noise = noise.with_channel_count(signal.channels());
    let frames = signal.len();

    let samples = noise
        .samples
        .iter()
        .map(|channel| channel.iter().copied().cycle().take(frames).collect())
        .collect();

    Ok(AudioBuffer {
        samples,
        sample_rate: signal.sample_rate,
    })
}

impl Degradation for DegradationMix {
    impl_degradation_common!("mix", "Mixes the sound with a noise at a given SNR");

    fn apply(&self, buffer: &AudioBuffer) -> Result<AudioBuffer> {
        let snr = self.params.float("snr")?;
        let noise = adapt_noise(&self.load_noise()?, buffer)?;

        let rms_noise = noise.rms();
        if rms_noise == 0.0 {
            return Err(DegraderError::invalid_parameter(
                "noise",
                "noise is silent, its RMS is zero",
            ));
        }

        let rms_signal = buffer.rms();
        let k = (rms_signal / rms_noise) * db_to_linear(-snr);
        debug!(snr, rms_signal, rms_noise, scale = k, "Mixing noise");

        let samples = buffer
            .samples
            .iter()
            .zip(&noise.samples)
            .map(|(signal, noise)| {
                signal
                    .iter()
                    .zip(noise)
                    .map(|(&s, &n)| (s as f64 + k * n as f64) as f32)
                    .collect()
            })
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
    use crate::engine::{linear_to_db, save_audio, WavFormat};
    use approx::assert_relative_eq;
    use test_case::test_case;

    fn tone(frames: usize, rate: u32) -> Vec<f32> {
        (0..frames)
            .map(|i| (2.0 * std::f64::consts::PI * 440.0 * i as f64 / rate as f64).sin() as f32 * 0.5)
            .collect()
    }

    /// Deterministic pseudo-random noise
    fn noise(frames: usize) -> Vec<f32> {
        let mut state: u32 = 0x1234_5678;
        (0..frames)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0
            })
            .collect()
    }

    fn measured_snr(signal: &AudioBuffer, mixed: &AudioBuffer) -> f64 {
        let residual: Vec<Vec<f32>> = mixed
            .samples
            .iter()
            .zip(&signal.samples)
            .map(|(m, s)| m.iter().zip(s).map(|(a, b)| a - b).collect())
            .collect();
        linear_to_db(signal.rms() / crate::engine::buffer::rms(&residual))
    }

    fn signal() -> AudioBuffer {
        let t = tone(8000, 8000);
        AudioBuffer::from_channels(vec![t.clone(), t], 8000).unwrap()
    }

    fn mix_at(noise_buffer: AudioBuffer, snr: f64) -> DegradationMix {
        let mut mix = DegradationMix::with_noise_buffer(noise_buffer);
        mix.set_parameters_values(&[("snr", snr.into())]).unwrap();
        mix
    }

    #[test_case(-12.0 ; "noisy")]
    #[test_case(0.0 ; "equal power")]
    #[test_case(20.0 ; "clean")]
    fn test_mix_hits_target_snr(snr: f64) {
        let signal = signal();
        let n = AudioBuffer::from_channels(vec![noise(8000), noise(8000)], 8000).unwrap();

        let out = mix_at(n, snr).apply(&signal).unwrap();

        assert_eq!(out.len(), signal.len());
        assert_eq!(out.channels(), 2);
        assert_relative_eq!(measured_snr(&signal, &out), snr, epsilon = 1e-3);
    }

    #[test]
    fn test_mix_is_deterministic() {
        let signal = signal();
        let n = AudioBuffer::from_channels(vec![noise(3000)], 8000).unwrap();
        let mix = mix_at(n, 5.0);

        let a = mix.apply(&signal).unwrap();
        let b = mix.apply(&signal).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_short_noise_is_looped() {
        let signal = signal();
        let n = AudioBuffer::from_channels(vec![noise(1000)], 8000).unwrap();

        let adapted = adapt_noise(&n, &signal).unwrap();

        assert_eq!(adapted.channels(), 2);
        assert_eq!(adapted.len(), 8000);
        assert_eq!(adapted.samples[0][1000], n.samples[0][0]);
        assert_eq!(adapted.samples[1][7999], n.samples[0][999]);
    }

    #[test]
    fn test_long_noise_is_truncated() {
        let signal = signal();
        let n = AudioBuffer::from_channels(vec![noise(20000), noise(20000)], 8000).unwrap();

        let adapted = adapt_noise(&n, &signal).unwrap();
        assert_eq!(adapted.len(), 8000);
        assert_eq!(adapted.samples[0][..], n.samples[0][..8000]);
    }

    #[test]
    fn test_multichannel_noise_mismatch_is_downmixed() {
        let t = tone(4000, 8000);
        let signal = AudioBuffer::from_channels(vec![t.clone(), t.clone(), t], 8000).unwrap();
        let n = AudioBuffer::from_channels(vec![vec![0.5; 4000], vec![-0.1; 4000]], 8000).unwrap();

        let adapted = adapt_noise(&n, &signal).unwrap();
        assert_eq!(adapted.channels(), 3);
        assert_relative_eq!(adapted.samples[2][10], 0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_noise_is_resampled() {
        let signal = signal();
        let n = AudioBuffer::from_channels(vec![noise(16000)], 16000).unwrap();

        let adapted = adapt_noise(&n, &signal).unwrap();
        assert_eq!(adapted.sample_rate, 8000);
        assert_eq!(adapted.len(), 8000);
    }

    #[test]
    fn test_silent_noise_is_rejected() {
        let n = AudioBuffer::silence(1, 100, 8000);
        let result = mix_at(n, 0.0).apply(&signal());
        assert!(matches!(result, Err(DegraderError::InvalidParameter { .. })));
    }

    #[test]
    fn test_missing_noise_is_rejected() {
        let result = DegradationMix::new().apply(&signal());
        assert!(matches!(result, Err(DegraderError::InvalidParameter { .. })));
    }

    #[test]
    fn test_noise_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.wav");
        let n = AudioBuffer::from_channels(vec![noise(4000)], 8000).unwrap();
        save_audio(&path, &n, WavFormat::float32()).unwrap();

        let mut mix = DegradationMix::new();
        mix.set_positional_values(&[path.to_str().unwrap(), "-12"]).unwrap();

        let signal = signal();
        let out = mix.apply(&signal).unwrap();
        assert_relative_eq!(measured_snr(&signal, &out), -12.0, epsilon = 1e-3);
    }
}
