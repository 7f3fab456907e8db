//! Degradations Library
//!
//! Controlled, reproducible ways of making clean audio worse.
//! All degradations implement the `Degradation` trait for uniform processing.

pub mod degradation;
pub mod params;
pub mod registry;
pub mod usage;

mod convolution;
mod gain;
mod mix;
mod mp3;
mod resample;
mod trim;

pub use convolution::DegradationConvolution;
pub use degradation::Degradation;
pub use gain::DegradationGain;
pub use mix::DegradationMix;
pub use mp3::{parse_bitrate, DegradationMp3};
pub use params::{ParamKind, ParamSpec, ParamValue, ParameterSet};
pub use registry::{
    available_degradations, create_degradation, create_degradation_with_config,
    parse_degradation_chain, parse_degradation_spec,
};
pub use resample::DegradationResample;
pub use trim::DegradationTrim;
pub use usage::DegradationUsageDocGenerator;
