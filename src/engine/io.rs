//! Audio file I/O for Degrader
//!
//! Reads and writes PCM WAV files. Samples are normalized to [-1, 1] f32
//! on load and kept at their native sample rate and channel count.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::{debug, warn};

use crate::engine::buffer::AudioBuffer;
use crate::error::{DegraderError, Result};

/// Output WAV encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    /// Bit depth: 16, 24 (integer PCM) or 32 (float)
    pub bit_depth: u16,
}

impl Default for WavFormat {
    fn default() -> Self {
        WavFormat { bit_depth: 16 }
    }
}

impl WavFormat {
    /// Create a format with the given bit depth
    pub fn new(bit_depth: u16) -> Self {
        WavFormat { bit_depth }
    }

    /// 32-bit float, lossless for in-memory buffers
    pub fn float32() -> Self {
        WavFormat { bit_depth: 32 }
    }

    /// Pick the closest writable format for a source file's spec
    pub fn from_spec(spec: &WavSpec) -> Self {
        match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Float, _) => WavFormat::float32(),
            (SampleFormat::Int, bits) if bits > 16 => WavFormat::new(24),
            _ => WavFormat::new(16),
        }
    }
}

/// Read the WAV header of a file without decoding samples
pub fn read_spec(path: &Path) -> Result<WavSpec> {
    ensure_exists(path)?;
    let reader = WavReader::open(path).map_err(|e| map_hound_error(path, e))?;
    Ok(reader.spec())
}

/// Load a WAV file into an AudioBuffer
///
/// # Errors
/// * `FileNotFound` - If the file does not exist
/// * `UnsupportedFormat` - If the file is not a readable PCM WAV
/// * `InvalidAudio` - If the sample data is truncated or has no channels
pub fn load_audio(path: &Path) -> Result<AudioBuffer> {
    ensure_exists(path)?;

    let reader = WavReader::open(path).map_err(|e| map_hound_error(path, e))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    if channels == 0 {
        return Err(DegraderError::InvalidAudio {
            reason: format!("{} declares zero channels", path.display()),
            source: None,
        });
    }

    let samples = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    let buffer = AudioBuffer::from_interleaved(&samples, channels, spec.sample_rate)?;

    debug!(
        path = %path.display(),
        channels,
        frames = buffer.len(),
        sample_rate = spec.sample_rate,
        "loaded audio"
    );

    Ok(buffer)
}

/// Write an AudioBuffer to a WAV file
///
/// Integer formats clamp to full scale; the number of clipped samples is
/// logged as a warning.
pub fn save_audio(path: &Path, buffer: &AudioBuffer, format: WavFormat) -> Result<()> {
    if !matches!(format.bit_depth, 16 | 24 | 32) {
        return Err(DegraderError::UnsupportedFormat {
            format: format!("{}-bit audio (only 16, 24, 32 supported)", format.bit_depth),
        });
    }

    let spec = WavSpec {
        channels: buffer.channels() as u16,
        sample_rate: buffer.sample_rate,
        bits_per_sample: format.bit_depth,
        sample_format: if format.bit_depth == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };

    if format.bit_depth != 32 {
        let clipped = buffer.count_clipped();
        if clipped > 0 {
            warn!(
                path = %path.display(),
                clipped,
                "samples exceed full scale and will be clipped on export"
            );
        }
    }

    let mut writer = WavWriter::create(path, spec).map_err(write_error)?;
    let interleaved = buffer.to_interleaved();

    match format.bit_depth {
        16 => {
            for sample in interleaved {
                let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                writer.write_sample(scaled).map_err(write_error)?;
            }
        }
        24 => {
            for sample in interleaved {
                // 24-bit stored as i32 in hound
                let scaled = (sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32;
                writer.write_sample(scaled).map_err(write_error)?;
            }
        }
        _ => {
            for sample in interleaved {
                writer.write_sample(sample).map_err(write_error)?;
            }
        }
    }

    writer.finalize().map_err(write_error)?;

    debug!(
        path = %path.display(),
        bit_depth = format.bit_depth,
        frames = buffer.len(),
        "saved audio"
    );

    Ok(())
}

// ============================================================================
// Internal helper functions
// ============================================================================

fn ensure_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(DegraderError::FileNotFound {
            path: path.display().to_string(),
            source: None,
        });
    }
    Ok(())
}

fn map_hound_error(path: &Path, err: hound::Error) -> DegraderError {
    match err {
        hound::Error::IoError(e) => DegraderError::Io(e),
        hound::Error::FormatError(reason) => DegraderError::UnsupportedFormat {
            format: format!("{} is not a valid WAV file ({})", path.display(), reason),
        },
        hound::Error::Unsupported => DegraderError::UnsupportedFormat {
            format: format!("{} uses an unsupported WAV encoding", path.display()),
        },
        other => DegraderError::InvalidAudio {
            reason: format!("Failed to read {}: {}", path.display(), other),
            source: Some(Box::new(other)),
        },
    }
}

fn write_error(err: hound::Error) -> DegraderError {
    match err {
        hound::Error::IoError(e) => DegraderError::Io(e),
        other => DegraderError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            other.to_string(),
        )),
    }
}

fn read_error(bits: &str, err: hound::Error) -> DegraderError {
    DegraderError::InvalidAudio {
        reason: format!("Failed to read {} samples: {}", bits, err),
        source: Some(Box::new(err)),
    }
}

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    match sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| read_error("float", e)),
        SampleFormat::Int => match bits_per_sample {
            8 => reader
                .samples::<i8>()
                .map(|s| s.map(|v| v as f32 / 128.0))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| read_error("8-bit", e)),
            16 => reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / 32768.0))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| read_error("16-bit", e)),
            24 => reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / 8388608.0))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| read_error("24-bit", e)),
            32 => reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / 2147483648.0))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| read_error("32-bit int", e)),
            _ => Err(DegraderError::UnsupportedFormat {
                format: format!("{}-bit integer audio", bits_per_sample),
            }),
        },
    }
}

// ============================================================================
// Tests
// ============================================================================
