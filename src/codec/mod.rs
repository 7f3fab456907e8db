//! Lossy codec collaborators
//!
//! The mp3 degradation only needs an encode/decode pair. `LameCodec` drives
//! the `lame` command-line encoder through files in a private temporary
//! directory; tests substitute their own `LossyCodec`.

use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::debug;

use crate::engine::{load_audio, save_audio, AudioBuffer, WavFormat};
use crate::error::{DegraderError, Result};

/// Environment variable naming the `lame` executable
pub const LAME_PATH_ENV: &str = "DEGRADER_LAME_PATH";

/// A lossy encoder/decoder pair
pub trait LossyCodec: Send + Sync {
    /// Short codec name for logs and errors
    fn name(&self) -> &str;

    /// Encode a buffer at `bitrate_kbps` kbit/s
    fn encode(&self, buffer: &AudioBuffer, bitrate_kbps: u32) -> Result<Vec<u8>>;

    /// Decode an encoded stream back to audio
    fn decode(&self, data: &[u8]) -> Result<AudioBuffer>;
}

/// Codec configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Path (or bare name) of the `lame` executable
    pub lame_path: PathBuf,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            lame_path: PathBuf::from("lame"),
        }
    }
}

impl CodecConfig {
    /// Read the configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        match env::var(LAME_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self {
                lame_path: PathBuf::from(path),
            },
            _ => Self::default(),
        }
    }

    /// Override the `lame` executable
    pub fn with_lame_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.lame_path = path.into();
        self
    }
}

/// MP3 codec backed by the `lame` executable
#[derive(Debug, Clone)]
pub struct LameCodec {
    config: CodecConfig,
}

impl LameCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    /// Whether the configured executable runs
    pub fn is_available(&self) -> bool {
        Command::new(&self.config.lame_path)
            .arg("--version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn run(&self, args: &[&Path], flags: &[&str]) -> Result<()> {
        debug!(
            lame = %self.config.lame_path.display(),
            ?flags,
            "Running lame"
        );

        let output: Output = Command::new(&self.config.lame_path)
            .arg("--quiet")
            .args(flags)
            .args(args)
            .output()
            .map_err(|e| DegraderError::Codec {
                reason: format!(
                    "failed to run '{}'",
                    self.config.lame_path.display()
                ),
                source: Some(Box::new(e)),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DegraderError::codec(format!(
                "lame exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

impl Default for LameCodec {
    fn default() -> Self {
        Self::new(CodecConfig::from_env())
    }
}

fn scratch_dir() -> Result<tempfile::TempDir> {
    tempfile::tempdir().map_err(|e| DegraderError::Codec {
        reason: "failed to create a scratch directory".to_string(),
        source: Some(Box::new(e)),
    })
}

impl LossyCodec for LameCodec {
    fn name(&self) -> &str {
        "lame"
    }

    fn encode(&self, buffer: &AudioBuffer, bitrate_kbps: u32) -> Result<Vec<u8>> {
        let dir = scratch_dir()?;
        let wav = dir.path().join("input.wav");
        let mp3 = dir.path().join("output.mp3");

        save_audio(&wav, buffer, WavFormat::new(16))?;
        let bitrate = bitrate_kbps.to_string();
        self.run(&[wav.as_path(), mp3.as_path()], &["-b", &bitrate])?;

        Ok(std::fs::read(&mp3)?)
    }

    fn decode(&self, data: &[u8]) -> Result<AudioBuffer> {
        let dir = scratch_dir()?;
        let mp3 = dir.path().join("input.mp3");
        let wav = dir.path().join("output.wav");

        std::fs::write(&mp3, data)?;
        self.run(&[mp3.as_path(), wav.as_path()], &["--decode"])?;

        load_audio(&wav).map_err(|e| DegraderError::Codec {
            reason: "lame produced unreadable audio".to_string(),
            source: Some(Box::new(e)),
        })
    }
}
