//! Mp3 degradation
//!
//! Round-trips the audio through a lossy encoder to reproduce compression
//! artifacts. The result always has the input's rate, channel count and
//! length, whatever the codec hands back.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::codec::{LameCodec, LossyCodec};
use crate::degradations::degradation::Degradation;
use crate::degradations::params::{ParamSpec, ParameterSet};
use crate::engine::{resample_buffer, AudioBuffer};
use crate::error::{DegraderError, Result};
use crate::impl_degradation_common;

/// Lossy round trip at a given bitrate
///
/// # Parameters
/// - `bitrate`: `"<n>k"` or `"<n>"` kbit/s (default `"320k"`)
#[derive(Clone)]
pub struct DegradationMp3 {
    params: ParameterSet,
    codec: Arc<dyn LossyCodec>,
}

impl DegradationMp3 {
    /// Mp3 degradation using `lame` as configured by the environment
    pub fn new() -> Self {
        Self::with_codec(Arc::new(LameCodec::default()))
    }

    /// Mp3 degradation using a specific codec
    pub fn with_codec(codec: Arc<dyn LossyCodec>) -> Self {
        Self {
            params: ParameterSet::new(
                "mp3",
                vec![ParamSpec::text("bitrate", "320k", "Bitrate of the mp3 encoding [kbps]")],
            ),
            codec,
        }
    }

    fn bitrate_kbps(&self) -> Result<u32> {
        parse_bitrate(&self.params.text("bitrate")?)
    }
}

impl Default for DegradationMp3 {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DegradationMp3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DegradationMp3")
            .field("params", &self.params)
            .field("codec", &self.codec.name())
            .finish()
    }
}

/// Parse `"16k"` or `"16"` into kbit/s
pub fn parse_bitrate(text: &str) -> Result<u32> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_suffix('k')
        .or_else(|| trimmed.strip_suffix('K'))
        .unwrap_or(trimmed);

    match digits.parse::<u32>() {
        Ok(kbps) if kbps > 0 => Ok(kbps),
        _ => Err(DegraderError::invalid_parameter(
            "bitrate",
            format!("expected '<n>k' or '<n>' kbit/s, got '{}'", text),
        )),
    }
}

impl Degradation for DegradationMp3 {
    impl_degradation_common!("mp3", "Mp3 compression at a given bitrate");

    fn apply(&self, buffer: &AudioBuffer) -> Result<AudioBuffer> {
        let kbps = self.bitrate_kbps()?;

        let encoded = self.codec.encode(buffer, kbps)?;
        let decoded = self.codec.decode(&encoded)?;
        debug!(
            codec = self.codec.name(),
            kbps,
            bytes = encoded.len(),
            decoded_rate = decoded.sample_rate,
            decoded_frames = decoded.len(),
            "Lossy round trip"
        );

        let decoded = if decoded.sample_rate != buffer.sample_rate {
            resample_buffer(&decoded, buffer.sample_rate)?
        } else {
            decoded
        };

        Ok(decoded
            .with_channel_count(buffer.channels())
            .with_length(buffer.len()))
    }
}
