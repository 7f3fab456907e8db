//! Audio Buffer Management
//!
//! Provides the core audio buffer type and level utilities for Degrader.
//! Samples are stored channel-first as 32-bit floats; level math
//! accumulates in f64.

use crate::error::{DegraderError, Result};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
///
/// # Arguments
/// * `db` - Value in decibels
///
/// # Returns
/// Linear amplitude factor
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// # Returns
/// Value in decibels. Returns -f64::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f64) -> f64 {
    if linear <= 0.0 {
        f64::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Linear RMS over every sample of every channel
///
/// Returns 0.0 for empty input.
pub fn rms(channels: &[Vec<f32>]) -> f64 {
    let total: usize = channels.iter().map(|ch| ch.len()).sum();
    if total == 0 {
        return 0.0;
    }

    let sum_squares: f64 = channels
        .iter()
        .flat_map(|channel| channel.iter())
        .map(|&s| (s as f64) * (s as f64))
        .sum();

    (sum_squares / total as f64).sqrt()
}

/// Maximum absolute sample value over every channel
pub fn peak(channels: &[Vec<f32>]) -> f32 {
    channels
        .iter()
        .flat_map(|channel| channel.iter())
        .map(|&s| s.abs())
        .fold(0.0_f32, f32::max)
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Core audio buffer type for all degradations
///
/// Stores audio as non-interleaved 32-bit floating point samples.
/// Each channel is a separate `Vec<f32>`; mono audio is a single channel.
///
/// # Example
/// ```
/// use degrader::engine::AudioBuffer;
///
/// // One second of stereo silence at 44.1 kHz
/// let buffer = AudioBuffer::silence(2, 44100, 44100);
/// assert_eq!(buffer.channels(), 2);
/// assert_eq!(buffer.len(), 44100);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is frames
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a buffer from per-channel sample vectors
    ///
    /// # Errors
    /// `InvalidAudio` if there are no channels, the channels differ in
    /// length, or the sample rate is zero.
    pub fn from_channels(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if samples.is_empty() {
            return Err(DegraderError::InvalidAudio {
                reason: "Audio must have at least one channel".to_string(),
                source: None,
            });
        }

        if sample_rate == 0 {
            return Err(DegraderError::InvalidAudio {
                reason: "Sample rate must be positive".to_string(),
                source: None,
            });
        }

        let frames = samples[0].len();
        if let Some(bad) = samples.iter().position(|ch| ch.len() != frames) {
            return Err(DegraderError::InvalidAudio {
                reason: format!(
                    "Channel {} has {} frames, expected {}",
                    bad,
                    samples[bad].len(),
                    frames
                ),
                source: None,
            });
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create a zeroed buffer
    pub fn silence(channels: usize, frames: usize, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0_f32; frames]; channels.max(1)],
            sample_rate,
        }
    }

    /// Create an audio buffer from interleaved sample data
    ///
    /// # Arguments
    /// * `interleaved` - Interleaved sample data (L, R, L, R, ... for stereo)
    /// * `channels` - Number of interleaved channels
    /// * `sample_rate` - Sample rate in Hz
    pub fn from_interleaved(interleaved: &[f32], channels: usize, sample_rate: u32) -> Result<Self> {
        if channels == 0 {
            return Err(DegraderError::InvalidAudio {
                reason: "Audio must have at least one channel".to_string(),
                source: None,
            });
        }

        if interleaved.len() % channels != 0 {
            return Err(DegraderError::InvalidAudio {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    channels
                ),
                source: None,
            });
        }

        let frames = interleaved.len() / channels;
        let mut samples = vec![Vec::with_capacity(frames); channels];

        for frame in interleaved.chunks_exact(channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Self::from_channels(samples, sample_rate)
    }

    /// Convert the buffer to interleaved format
    pub fn to_interleaved(&self) -> Vec<f32> {
        let frames = self.len();
        let mut interleaved = Vec::with_capacity(self.channels() * frames);

        for frame in 0..frames {
            for channel in &self.samples {
                interleaved.push(channel[frame]);
            }
        }

        interleaved
    }

    /// Get the number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Get the number of frames (samples per channel)
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer holds no frames
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Get a sample at the specified channel and frame
    #[inline]
    pub fn get_sample(&self, channel: usize, index: usize) -> Option<f32> {
        self.samples
            .get(channel)
            .and_then(|ch| ch.get(index).copied())
    }

    /// Linear RMS over all channels
    pub fn rms(&self) -> f64 {
        rms(&self.samples)
    }

    /// Peak absolute value over all channels
    pub fn peak(&self) -> f32 {
        peak(&self.samples)
    }

    /// Sum of absolute sample values over all channels
    pub fn sum_abs(&self) -> f64 {
        self.samples
            .iter()
            .flat_map(|ch| ch.iter())
            .map(|&s| s.abs() as f64)
            .sum()
    }

    /// Check if all samples are finite (not NaN or Infinity)
    pub fn is_finite(&self) -> bool {
        self.samples
            .iter()
            .flat_map(|ch| ch.iter())
            .all(|s| s.is_finite())
    }

    /// Count samples whose magnitude exceeds full scale
    pub fn count_clipped(&self) -> usize {
        self.samples
            .iter()
            .flat_map(|ch| ch.iter())
            .filter(|s| s.abs() > 1.0)
            .count()
    }

    /// Downmix to a single channel by averaging
    pub fn to_mono(&self) -> Vec<f32> {
        let channels = self.channels() as f32;
        (0..self.len())
            .map(|i| self.samples.iter().map(|ch| ch[i]).sum::<f32>() / channels)
            .collect()
    }

    /// Adapt the channel count
    ///
    /// Equal counts are returned unchanged. Mono is duplicated to every
    /// target channel; anything else is downmixed to mono first.
    pub fn with_channel_count(&self, channels: usize) -> AudioBuffer {
        let channels = channels.max(1);
        if self.channels() == channels {
            return self.clone();
        }

        let mono = if self.channels() == 1 {
            self.samples[0].clone()
        } else {
            self.to_mono()
        };

        AudioBuffer {
            samples: vec![mono; channels],
            sample_rate: self.sample_rate,
        }
    }

    /// Truncate or zero-pad every channel to `frames`
    pub fn with_length(mut self, frames: usize) -> AudioBuffer {
        for channel in &mut self.samples {
            channel.resize(frames, 0.0);
        }
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
