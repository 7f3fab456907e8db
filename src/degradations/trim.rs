//! Trim degradation
//!
//! Keeps the frames between `start_time` and `end_time`.

use crate::degradations::degradation::Degradation;
use crate::degradations::params::{ParamKind, ParamSpec, ParameterSet};
use crate::engine::AudioBuffer;
use crate::error::{DegraderError, Result};
use crate::impl_degradation_common;

#[derive(Debug, Clone)]
pub struct DegradationTrim {
    params: ParameterSet,
}

impl DegradationTrim {
    pub fn new() -> Self {
        Self {
            params: ParameterSet::new(
                "trim",
                vec![
                    ParamSpec::float("start_time", 0.0, "Time where the trimmed audio starts [seconds]"),
                    ParamSpec::unset(
                        "end_time",
                        ParamKind::Float,
                        "Time where the trimmed audio ends [seconds], none keeps the end",
                    ),
                ],
            ),
        }
    }

    /// Frame offsets `[start, end)` for a buffer
    fn offsets(&self, buffer: &AudioBuffer) -> Result<(usize, usize)> {
        let rate = buffer.sample_rate as f64;
        let frames = buffer.len();

        let start_time = self.params.float("start_time")?;
        let end_time = self.params.optional_float("end_time")?;

        if start_time < 0.0 {
            return Err(DegraderError::invalid_parameter(
                "start_time",
                format!("must not be negative, got {}", start_time),
            ));
        }

        let start = (start_time * rate).round();
        let end = match end_time {
            Some(t) if t < 0.0 => {
                return Err(DegraderError::invalid_parameter(
                    "end_time",
                    format!("must not be negative, got {}", t),
                ));
            }
            Some(t) => (t * rate).round(),
            None => frames as f64,
        };

        if start >= end {
            return Err(DegraderError::invalid_parameter(
                "start_time",
                format!(
                    "start ({} frames) must come before end ({} frames)",
                    start, end
                ),
            ));
        }

        if end > frames as f64 {
            return Err(DegraderError::invalid_parameter(
                "end_time",
                format!("end at frame {} is past the last frame {}", end, frames),
            ));
        }

        Ok((start as usize, end as usize))
    }
}

impl Default for DegradationTrim {
    fn default() -> Self {
        Self::new()
    }
}

impl Degradation for DegradationTrim {
    impl_degradation_common!("trim", "Keeps the audio between a start and an end time");

    fn apply(&self, buffer: &AudioBuffer) -> Result<AudioBuffer> {
        let (start, end) = self.offsets(buffer)?;

        let samples = buffer
            .samples
            .iter()
            .map(|channel| channel[start..end].to_vec())
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
    use crate::degradations::params::ParamValue;
    use test_case::test_case;

    fn two_seconds_stereo() -> AudioBuffer {
        let left: Vec<f32> = (0..16000).map(|i| i as f32 / 16000.0).collect();
        AudioBuffer::from_channels(vec![left.clone(), left], 8000).unwrap()
    }

    fn trim_with(values: &[(&str, ParamValue)]) -> DegradationTrim {
        let mut trim = DegradationTrim::new();
        trim.set_parameters_values(values).unwrap();
        trim
    }

    #[test]
    fn test_trim_start_only() {
        let buffer = two_seconds_stereo();
        let out = trim_with(&[("start_time", 1.into())]).apply(&buffer).unwrap();

        assert_eq!(out.len(), buffer.len() - 8000);
        assert_eq!(out.channels(), 2);
        assert_eq!(out.samples[0][0], buffer.samples[0][8000]);
    }

    #[test]
    fn test_trim_start_and_end() {
        let buffer = two_seconds_stereo();
        let out = trim_with(&[("start_time", 0.25.into()), ("end_time", "1.5".into())])
            .apply(&buffer)
            .unwrap();

        assert_eq!(out.len(), 12000 - 2000);
        assert_eq!(out.samples[1][0], buffer.samples[1][2000]);
    }

    #[test]
    fn test_trim_rounds_offsets() {
        // 0.00006 s * 8000 = 0.48 frames, rounds to 0
        let buffer = two_seconds_stereo();
        let out = trim_with(&[("start_time", 0.00006.into())]).apply(&buffer).unwrap();
        assert_eq!(out.len(), buffer.len());
    }

    #[test]
    fn test_default_trim_keeps_everything() {
        let buffer = two_seconds_stereo();
        let out = DegradationTrim::new().apply(&buffer).unwrap();
        assert_eq!(out, buffer);
    }

    #[test_case(&[("start_time", ParamValue::Float(-1.0))] ; "negative start")]
    #[test_case(&[("end_time", ParamValue::Float(-0.5))] ; "negative end")]
    #[test_case(&[("start_time", ParamValue::Float(1.0)), ("end_time", ParamValue::Float(1.0))] ; "empty range")]
    #[test_case(&[("start_time", ParamValue::Float(1.5)), ("end_time", ParamValue::Float(0.5))] ; "reversed range")]
    #[test_case(&[("end_time", ParamValue::Float(3.0))] ; "end past clip")]
    #[test_case(&[("start_time", ParamValue::Float(2.0))] ; "start at clip end")]
    fn test_invalid_ranges(values: &[(&str, ParamValue)]) {
        let buffer = two_seconds_stereo();
        let result = trim_with(values).apply(&buffer);
        assert!(matches!(result, Err(DegraderError::InvalidParameter { .. })));
    }

    #[test_case(f64::NAN ; "nan")]
    #[test_case(f64::INFINITY ; "infinity")]
    fn test_non_finite_start_is_rejected(start: f64) {
        let mut trim = DegradationTrim::new();
        let result = trim.set_parameters_values(&[("start_time", start.into())]);

        assert!(matches!(result, Err(DegraderError::InvalidParameter { .. })));
        assert_eq!(trim.apply(&two_seconds_stereo()).unwrap().len(), 16000);
    }
}
