//! Resample degradation

use crate::degradations::degradation::Degradation;
use crate::degradations::params::{ParamSpec, ParameterSet};
use crate::engine::{resample_buffer, AudioBuffer};
use crate::error::{DegraderError, Result};
use crate::impl_degradation_common;

/// Sample rate conversion
///
/// Content above the new Nyquist frequency is removed, everything below it
/// is kept.
#[derive(Debug, Clone)]
pub struct DegradationResample {
    params: ParameterSet,
}

impl DegradationResample {
    pub fn new() -> Self {
        Self {
            params: ParameterSet::new(
                "resample",
                vec![ParamSpec::integer("sample_rate", 8000, "Sample rate to change [Hz]")],
            ),
        }
    }

    fn target_rate(&self) -> Result<u32> {
        let rate = self.params.integer("sample_rate")?;
        u32::try_from(rate)
            .ok()
            .filter(|&r| r > 0)
            .ok_or_else(|| {
                DegraderError::invalid_parameter(
                    "sample_rate",
                    format!("must be a positive rate in Hz, got {}", rate),
                )
            })
    }
}

impl Default for DegradationResample {
    fn default() -> Self {
        Self::new()
    }
}

impl Degradation for DegradationResample {
    impl_degradation_common!("resample", "Resamples the audio to a new sample rate");

    fn apply(&self, buffer: &AudioBuffer) -> Result<AudioBuffer> {
        resample_buffer(buffer, self.target_rate()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::resampled_len;
    use test_case::test_case;

    fn stereo(frames: usize, rate: u32) -> AudioBuffer {
        let ch: Vec<f32> = (0..frames)
            .map(|i| (2.0 * std::f64::consts::PI * 300.0 * i as f64 / rate as f64).sin() as f32)
            .collect();
        AudioBuffer::from_channels(vec![ch.clone(), ch], rate).unwrap()
    }

    #[test_case(44100, 8000 ; "cd to narrowband")]
    #[test_case(16000, 8000 ; "wideband to narrowband")]
    #[test_case(8000, 22050 ; "upsample")]
    fn test_resample_rate_and_length(from: u32, to: u32) {
        let buffer = stereo(from as usize / 2 + 17, from);
        let mut resample = DegradationResample::new();
        resample
            .set_parameters_values(&[("sample_rate", to.into())])
            .unwrap();

        let out = resample.apply(&buffer).unwrap();

        assert_eq!(out.sample_rate, to);
        assert_eq!(out.channels(), 2);
        assert_eq!(out.len(), resampled_len(buffer.len(), from, to));
    }

    #[test]
    fn test_default_is_8000() {
        let out = DegradationResample::new().apply(&stereo(4410, 44100)).unwrap();
        assert_eq!(out.sample_rate, 8000);
        assert_eq!(out.len(), 800);
    }

    #[test]
    fn test_same_rate_is_a_copy() {
        let buffer = stereo(1000, 8000);
        let out = DegradationResample::new().apply(&buffer).unwrap();
        assert_eq!(out, buffer);
    }

    #[test_case("0" ; "zero")]
    #[test_case("-8000" ; "negative")]
    fn test_invalid_rate(rate: &str) {
        let mut resample = DegradationResample::new();
        resample.set_positional_values(&[rate]).unwrap();

        let result = resample.apply(&stereo(100, 8000));
        assert!(matches!(result, Err(DegraderError::InvalidParameter { .. })));
    }
}
