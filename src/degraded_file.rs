//! Degraded audio file
//!
//! Owns the working copy of one recording while degradations are applied
//! to it in order. The source file is never touched; the degraded result is
//! written to a new path when the file is saved.
//!
//! Lifecycle: `Loaded -> Degraded(1) -> ... -> Degraded(n) -> Finalized`,
//! where finalizing consumes the value.

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::degradations::{Degradation, ParamValue};
use crate::engine::{load_audio, read_spec, save_audio, AudioBuffer, WavFormat};
use crate::error::Result;

/// Where a file is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileState {
    /// Source loaded, nothing applied yet
    Loaded,
    /// This many degradations applied successfully
    Degraded(usize),
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileState::Loaded => write!(f, "Loaded"),
            FileState::Degraded(n) => write!(f, "Degraded({})", n),
        }
    }
}

/// Record of one successfully applied degradation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedDegradation {
    /// Registry name of the degradation
    pub name: String,
    /// Bound parameter values at the time of application
    pub params: Vec<(String, ParamValue)>,
    /// Frame count after the step
    pub frames: usize,
    /// Sample rate after the step
    pub sample_rate: u32,
    /// When the step was applied
    pub applied_at: DateTime<Utc>,
}

/// A recording being degraded
#[derive(Debug, Clone)]
pub struct DegradedAudioFile {
    /// Path the audio was read from, if any
    source_path: Option<PathBuf>,
    /// SHA-256 checksum of the source file
    source_checksum: Option<String>,
    /// WAV format of the source, reused when saving
    source_format: WavFormat,
    /// Current working copy
    buffer: AudioBuffer,
    /// Applied degradations, oldest first
    history: Vec<AppliedDegradation>,
}

impl DegradedAudioFile {
    /// Load a WAV file as the working copy
    ///
    /// # Errors
    /// Returns error if:
    /// - File does not exist
    /// - File is not a readable WAV file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let buffer = load_audio(path)?;
        let source_format = WavFormat::from_spec(&read_spec(path)?);
        let checksum = calculate_checksum(path)?;

        info!(
            path = %path.display(),
            channels = buffer.channels(),
            frames = buffer.len(),
            sample_rate = buffer.sample_rate,
            "Loaded audio file"
        );

        Ok(Self {
            source_path: Some(path.to_path_buf()),
            source_checksum: Some(checksum),
            source_format,
            buffer,
            history: Vec::new(),
        })
    }

    /// Wrap an in-memory buffer; saving defaults to 16-bit PCM
    pub fn from_buffer(buffer: AudioBuffer) -> Self {
        Self {
            source_path: None,
            source_checksum: None,
            source_format: WavFormat::default(),
            buffer,
            history: Vec::new(),
        }
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// SHA-256 of the source file, hex encoded
    pub fn source_checksum(&self) -> Option<&str> {
        self.source_checksum.as_deref()
    }

    pub fn source_format(&self) -> WavFormat {
        self.source_format
    }

    /// Current working copy
    pub fn buffer(&self) -> &AudioBuffer {
        &self.buffer
    }

    pub fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate
    }

    pub fn history(&self) -> &[AppliedDegradation] {
        &self.history
    }

    pub fn state(&self) -> FileState {
        match self.history.len() {
            0 => FileState::Loaded,
            n => FileState::Degraded(n),
        }
    }

    /// Apply one degradation to the working copy
    ///
    /// The buffer is only replaced when the degradation succeeds; on error
    /// the buffer, rate and history are exactly as before.
    pub fn apply_degradation(&mut self, degradation: &dyn Degradation) -> Result<()> {
        let params = degradation.parameters().bound_values();
        debug!(
            degradation = degradation.name(),
            ?params,
            frames = self.buffer.len(),
            sample_rate = self.buffer.sample_rate,
            "Applying degradation"
        );

        let degraded = degradation.apply(&self.buffer)?;

        self.history.push(AppliedDegradation {
            name: degradation.name().to_string(),
            params,
            frames: degraded.len(),
            sample_rate: degraded.sample_rate,
            applied_at: Utc::now(),
        });
        self.buffer = degraded;

        info!(
            degradation = degradation.name(),
            frames = self.buffer.len(),
            sample_rate = self.buffer.sample_rate,
            state = %self.state(),
            "Applied degradation"
        );
        Ok(())
    }

    /// Apply degradations in order, stopping at the first failure
    ///
    /// Steps before the failing one stay applied.
    pub fn apply_chain(&mut self, chain: &[Box<dyn Degradation>]) -> Result<()> {
        for degradation in chain {
            self.apply_degradation(degradation.as_ref())?;
        }
        Ok(())
    }

    /// History as pretty-printed JSON
    pub fn history_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.history)?)
    }

    /// Write the working copy in the source's format
    pub fn save(self, path: impl AsRef<Path>) -> Result<Vec<AppliedDegradation>> {
        let format = self.source_format;
        self.save_as(path, format)
    }

    /// Write the working copy in an explicit format
    ///
    /// Consumes the file; the history is handed back for reporting.
    pub fn save_as(self, path: impl AsRef<Path>, format: WavFormat) -> Result<Vec<AppliedDegradation>> {
        let path = path.as_ref();
        save_audio(path, &self.buffer, format)?;

        info!(
            path = %path.display(),
            bit_depth = format.bit_depth,
            degradations = self.history.len(),
            "Saved degraded file"
        );
        Ok(self.history)
    }
}

/// Calculate SHA-256 checksum of a file
fn calculate_checksum(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// Tests
// ============================================================================
