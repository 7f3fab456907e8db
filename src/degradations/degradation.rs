//! Degradation trait definition
//!
//! Base trait for all degradations.

use crate::degradations::params::{ParamSpec, ParamValue, ParameterSet};
use crate::engine::AudioBuffer;
use crate::error::Result;

/// Base trait for all degradations
///
/// A degradation holds only its bound parameters (plus optional pre-loaded
/// audio), never per-file state. `apply` borrows the input buffer and
/// returns a new one, so one instance can be applied to many files and
/// shared between threads.
pub trait Degradation: Send + Sync {
    /// Registry name, as written on the command line (`name,v1//v2`)
    fn name(&self) -> &'static str;

    /// One-line human description
    fn description(&self) -> &'static str;

    /// Bound parameter values
    fn parameters(&self) -> &ParameterSet;

    /// Mutable access to the bound parameter values
    fn parameters_mut(&mut self) -> &mut ParameterSet;

    /// Transform a buffer; the result may have a different length, channel
    /// count or sample rate
    fn apply(&self, buffer: &AudioBuffer) -> Result<AudioBuffer>;

    /// Ordered parameter declarations
    fn parameters_info(&self) -> &[ParamSpec] {
        self.parameters().specs()
    }

    /// Bind parameters by name, all or nothing
    fn set_parameters_values(&mut self, values: &[(&str, ParamValue)]) -> Result<()> {
        self.parameters_mut().set_values(values)
    }

    /// Bind text values in declaration order
    fn set_positional_values(&mut self, values: &[&str]) -> Result<()> {
        self.parameters_mut().set_positional(values)
    }
}

/// Helper macro to implement the common Degradation trait methods
///
/// Expects the implementing struct to keep its `ParameterSet` in a field
/// named `params`.
#[macro_export]
macro_rules! impl_degradation_common {
    ($name:expr, $description:expr) => {
        fn name(&self) -> &'static str {
            $name
        }

        fn description(&self) -> &'static str {
            $description
        }

        fn parameters(&self) -> &$crate::degradations::params::ParameterSet {
            &self.params
        }

        fn parameters_mut(&mut self) -> &mut $crate::degradations::params::ParameterSet {
            &mut self.params
        }
    };
}
