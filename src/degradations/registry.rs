//! Degradation registry
//!
//! Fixed table of the degradations this crate knows, and parsing of the
//! `name,value1//value2` form used on the command line.

use crate::codec::{CodecConfig, LameCodec};
use crate::degradations::degradation::Degradation;
use crate::degradations::{
    DegradationConvolution, DegradationGain, DegradationMix, DegradationMp3,
    DegradationResample, DegradationTrim,
};
use crate::error::{DegraderError, Result};
use std::sync::Arc;
use tracing::debug;

/// Separator between the degradation name and its values
pub const NAME_SEPARATOR: char = ',';

/// Separator between positional values
pub const VALUE_SEPARATOR: &str = "//";

type Constructor = fn(&CodecConfig) -> Box<dyn Degradation>;

const DEGRADATIONS: &[(&str, Constructor)] = &[
    ("convolution", convolution),
    ("gain", gain),
    ("mix", mix),
    ("mp3", mp3),
    ("resample", resample),
    ("trim", trim),
];

fn convolution(_: &CodecConfig) -> Box<dyn Degradation> {
    Box::new(DegradationConvolution::new())
}

fn gain(_: &CodecConfig) -> Box<dyn Degradation> {
    Box::new(DegradationGain::new())
}

fn mix(_: &CodecConfig) -> Box<dyn Degradation> {
    Box::new(DegradationMix::new())
}

fn mp3(config: &CodecConfig) -> Box<dyn Degradation> {
    Box::new(DegradationMp3::with_codec(Arc::new(LameCodec::new(config.clone()))))
}

fn resample(_: &CodecConfig) -> Box<dyn Degradation> {
    Box::new(DegradationResample::new())
}

fn trim(_: &CodecConfig) -> Box<dyn Degradation> {
    Box::new(DegradationTrim::new())
}

/// Names of all registered degradations, sorted
pub fn available_degradations() -> Vec<&'static str> {
    DEGRADATIONS.iter().map(|(name, _)| *name).collect()
}

/// Create a degradation with default parameters
///
/// The mp3 degradation uses the codec configuration from the environment.
pub fn create_degradation(name: &str) -> Result<Box<dyn Degradation>> {
    create_degradation_with_config(name, &CodecConfig::from_env())
}

/// Create a degradation with default parameters and an explicit codec setup
pub fn create_degradation_with_config(
    name: &str,
    config: &CodecConfig,
) -> Result<Box<dyn Degradation>> {
    DEGRADATIONS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, constructor)| constructor(config))
        .ok_or_else(|| DegraderError::UnknownDegradation {
            name: name.to_string(),
        })
}

/// Build a degradation from `name,value1//value2//...`
///
/// Values bind positionally; missing trailing values keep their defaults.
///
/// # Example
/// ```
/// use degrader::codec::CodecConfig;
/// use degrader::degradations::{parse_degradation_spec, Degradation};
///
/// let gain = parse_degradation_spec("gain,-6", &CodecConfig::default()).unwrap();
/// assert_eq!(gain.name(), "gain");
/// ```
pub fn parse_degradation_spec(spec: &str, config: &CodecConfig) -> Result<Box<dyn Degradation>> {
    let (name, values) = match spec.split_once(NAME_SEPARATOR) {
        Some((name, values)) => (name.trim(), values),
        None => (spec.trim(), ""),
    };

    let mut degradation = create_degradation_with_config(name, config)?;

    if !values.is_empty() {
        let values: Vec<&str> = values.split(VALUE_SEPARATOR).collect();
        degradation.set_positional_values(&values)?;
    }

    debug!(
        degradation = name,
        params = ?degradation.parameters().bound_values(),
        "Parsed degradation"
    );
    Ok(degradation)
}

/// Parse a whole chain, stopping at the first invalid entry
pub fn parse_degradation_chain<S: AsRef<str>>(
    specs: &[S],
    config: &CodecConfig,
) -> Result<Vec<Box<dyn Degradation>>> {
    specs
        .iter()
        .map(|spec| parse_degradation_spec(spec.as_ref(), config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::degradations::params::ParamValue;
    use std::path::PathBuf;

    fn config() -> CodecConfig {
        CodecConfig::default()
    }

    #[test]
    fn test_available_degradations() {
        assert_eq!(
            available_degradations(),
            vec!["convolution", "gain", "mix", "mp3", "resample", "trim"]
        );
    }

    #[test]
    fn test_every_name_constructs() {
        for name in available_degradations() {
            let degradation = create_degradation_with_config(name, &config()).unwrap();
            assert_eq!(degradation.name(), name);
        }
    }

    #[test]
    fn test_unknown_degradation() {
        let result = create_degradation("reverse");
        assert!(matches!(
            result,
            Err(DegraderError::UnknownDegradation { .. })
        ));
    }

    #[test]
    fn test_parse_name_only() {
        let trim = parse_degradation_spec("trim", &config()).unwrap();
        assert_eq!(
            trim.parameters().get("start_time").unwrap(),
            Some(&ParamValue::Float(0.0))
        );
    }

    #[test]
    fn test_parse_positional_values() {
        let conv = parse_degradation_spec("convolution,/tmp/ir.wav//0.7", &config()).unwrap();

        assert_eq!(
            conv.parameters().path("impulse_response").unwrap(),
            PathBuf::from("/tmp/ir.wav")
        );
        assert_eq!(conv.parameters().float("level").unwrap(), 0.7);
    }

    #[test]
    fn test_parse_partial_values() {
        let trim = parse_degradation_spec("trim,0.5", &config()).unwrap();
        assert_eq!(trim.parameters().float("start_time").unwrap(), 0.5);
        assert_eq!(trim.parameters().get("end_time").unwrap(), None);
    }

    #[test]
    fn test_parse_invalid_value() {
        let result = parse_degradation_spec("gain,loud", &config());
        assert!(matches!(
            result,
            Err(DegraderError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_parse_chain_stops_at_unknown() {
        let result = parse_degradation_chain(&["gain,-6", "echo,1", "trim,1"], &config());
        assert!(matches!(
            result,
            Err(DegraderError::UnknownDegradation { ref name }) if name == "echo"
        ));
    }

    #[test]
    fn test_parse_chain() {
        let chain = parse_degradation_chain(&["resample,16000", "mp3,16k"], &config()).unwrap();
        let names: Vec<&str> = chain.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["resample", "mp3"]);
    }
}
