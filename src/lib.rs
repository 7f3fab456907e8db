//! Degrader - Reproducible Audio Degradation
//!
//! Degrader turns clean recordings into realistic degraded variants for
//! testing and training audio systems. Every degradation implements the
//! same contract, so they compose into chains:
//!
//! - `trim`: keep a time range
//! - `gain`: scale by a dB amount
//! - `mix`: add noise at a target signal-to-noise ratio
//! - `resample`: band-limited sample rate conversion
//! - `convolution`: blend with an impulse response (reverberation)
//! - `mp3`: lossy codec round trip
//!
//! # Architecture
//!
//! - `engine`: audio buffers, WAV I/O and the FFT kernels
//! - `degradations`: the `Degradation` trait, parameters and implementations
//! - `codec`: the external lossy encoder used by `mp3`
//! - `degraded_file`: applies degradations to one recording and saves it

pub mod cli;
pub mod codec;
pub mod degradations;
pub mod degraded_file;
pub mod engine;
pub mod error;

pub use degradations::{Degradation, DegradationUsageDocGenerator, ParamValue};
pub use degraded_file::{AppliedDegradation, DegradedAudioFile, FileState};
pub use engine::AudioBuffer;
pub use error::{DegraderError, Result};
