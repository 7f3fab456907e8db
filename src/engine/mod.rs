//! Audio Engine Module
//!
//! Core audio plumbing shared by all degradations:
//! - Audio buffer and level utilities
//! - WAV file I/O
//! - Band-limited resampling and FFT convolution kernels

pub mod buffer;
pub mod convolve;
pub mod io;
pub mod resample;

pub use buffer::{db_to_linear, linear_to_db, AudioBuffer};
pub use convolve::{convolve_truncated, FftConvolver};
pub use io::{load_audio, read_spec, save_audio, WavFormat};
pub use resample::{resample_buffer, resampled_len, FftResampler};
