//! Gain degradation
//!
//! Scales every sample by a decibel amount. No clipping is applied, so a
//! positive gain can push samples past full scale.

use crate::degradations::degradation::Degradation;
use crate::degradations::params::{ParamSpec, ParameterSet};
use crate::engine::{db_to_linear, AudioBuffer};
use crate::error::Result;
use crate::impl_degradation_common;

/// Gain change in dB
///
/// # Parameters
/// - `value`: gain in decibels (default 0, negative attenuates)
///
/// # Example
/// ```
/// use degrader::degradations::{Degradation, DegradationGain};
/// use degrader::engine::AudioBuffer;
///
/// let mut gain = DegradationGain::new();
/// gain.set_parameters_values(&[("value", (-6.0).into())]).unwrap();
///
/// let buffer = AudioBuffer::from_channels(vec![vec![1.0; 4]], 8000).unwrap();
/// let quieter = gain.apply(&buffer).unwrap();
/// assert!((quieter.samples[0][0] - 0.501187).abs() < 1e-4);
/// ```
#[derive(Debug, Clone)]
pub struct DegradationGain {
    params: ParameterSet,
}

impl DegradationGain {
    pub fn new() -> Self {
        Self {
            params: ParameterSet::new(
                "gain",
                vec![ParamSpec::float("value", 0.0, "Gain to apply [dB]")],
            ),
        }
    }
}

impl Default for DegradationGain {
    fn default() -> Self {
        Self::new()
    }
}

impl Degradation for DegradationGain {
    impl_degradation_common!("gain", "Applies a gain in dB, without clipping");

    fn apply(&self, buffer: &AudioBuffer) -> Result<AudioBuffer> {
        let factor = db_to_linear(self.params.float("value")?) as f32;

        let samples = buffer
            .samples
            .iter()
            .map(|channel| channel.iter().map(|&s| s * factor).collect())
            .collect();

        Ok(AudioBuffer {
            samples,
            sample_rate: buffer.sample_rate,
        })
    }
}
