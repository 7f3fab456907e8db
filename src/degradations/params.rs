//! Degradation parameter model
//!
//! Every degradation declares an ordered list of typed parameters. Values
//! supplied by callers (numbers from code, text from the command line) are
//! coerced to the declared kind when they are bound.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DegraderError, Result};

/// Declared type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamKind {
    Float,
    Integer,
    Text,
    Path,
}

/// A parameter value, either supplied by a caller or bound after coercion
///
/// Serialized with its kind (`{"kind": "path", "value": "ir.wav"}`) so paths
/// and text read back as what they were.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ParamValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Path(PathBuf),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Debug keeps the decimal point: 2.0 renders as "2.0", not "2"
            ParamValue::Float(v) => write!(f, "{:?}", v),
            ParamValue::Integer(v) => write!(f, "{}", v),
            ParamValue::Text(v) => write!(f, "{}", v),
            ParamValue::Path(v) => write!(f, "{}", v.display()),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Float(v as f64)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Integer(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Integer(v as i64)
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        ParamValue::Integer(v as i64)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl From<PathBuf> for ParamValue {
    fn from(v: PathBuf) -> Self {
        ParamValue::Path(v)
    }
}

impl From<&Path> for ParamValue {
    fn from(v: &Path) -> Self {
        ParamValue::Path(v.to_path_buf())
    }
}

/// Specification for a degradation parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    /// `None` means the parameter has no default and must be bound, unless
    /// the degradation gives "unset" its own meaning
    pub default: Option<ParamValue>,
    pub description: &'static str,
}

impl ParamSpec {
    pub fn float(name: &'static str, default: f64, description: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Float,
            default: Some(ParamValue::Float(default)),
            description,
        }
    }

    pub fn integer(name: &'static str, default: i64, description: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Integer,
            default: Some(ParamValue::Integer(default)),
            description,
        }
    }

    pub fn text(name: &'static str, default: &str, description: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Text,
            default: Some(ParamValue::Text(default.to_string())),
            description,
        }
    }

    /// A parameter of any kind without a default value
    pub fn unset(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            default: None,
            description,
        }
    }

    /// Default rendered for help text; unset defaults render as `none`
    pub fn default_display(&self) -> String {
        self.default
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "none".to_string())
    }

    /// Convert a caller-supplied value to this parameter's kind
    pub fn coerce(&self, value: ParamValue) -> Result<ParamValue> {
        let mismatch = |found: &ParamValue| {
            DegraderError::invalid_parameter(
                self.name,
                format!("expected {:?}, got '{}'", self.kind, found),
            )
        };

        match (self.kind, value) {
            (ParamKind::Float, ParamValue::Float(v)) if v.is_finite() => Ok(ParamValue::Float(v)),
            (ParamKind::Float, ParamValue::Integer(v)) => Ok(ParamValue::Float(v as f64)),
            (ParamKind::Float, ParamValue::Text(text)) => {
                match text.trim().parse::<f64>() {
                    Ok(v) if v.is_finite() => Ok(ParamValue::Float(v)),
                    _ => Err(mismatch(&ParamValue::Text(text))),
                }
            }

            (ParamKind::Integer, ParamValue::Integer(v)) => Ok(ParamValue::Integer(v)),
            (ParamKind::Integer, ParamValue::Float(v)) => {
                float_to_integer(v).ok_or_else(|| mismatch(&ParamValue::Float(v)))
            }
            (ParamKind::Integer, ParamValue::Text(text)) => {
                let parsed = match text.trim().parse::<i64>() {
                    Ok(v) => Some(ParamValue::Integer(v)),
                    Err(_) => text.trim().parse::<f64>().ok().and_then(float_to_integer),
                };
                parsed.ok_or_else(|| mismatch(&ParamValue::Text(text)))
            }

            (ParamKind::Text, ParamValue::Text(v)) => Ok(ParamValue::Text(v)),
            (ParamKind::Text, other) => Ok(ParamValue::Text(other.to_string())),

            (ParamKind::Path, ParamValue::Path(v)) => Ok(ParamValue::Path(v)),
            (ParamKind::Path, ParamValue::Text(v)) => Ok(ParamValue::Path(PathBuf::from(v))),

            (_, other) => Err(mismatch(&other)),
        }
    }
}

fn float_to_integer(v: f64) -> Option<ParamValue> {
    (v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64)
        .then(|| ParamValue::Integer(v as i64))
}

/// Ordered parameter declarations plus their current values
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    owner: &'static str,
    specs: Vec<ParamSpec>,
    values: Vec<Option<ParamValue>>,
}

impl ParameterSet {
    /// Create a parameter set with every value at its default
    ///
    /// # Panics
    /// Panics if two specs share a name; declarations are static, so this
    /// is a programming error.
    pub fn new(owner: &'static str, specs: Vec<ParamSpec>) -> Self {
        for (i, spec) in specs.iter().enumerate() {
            assert!(
                !specs[..i].iter().any(|s| s.name == spec.name),
                "duplicate parameter '{}' in '{}'",
                spec.name,
                owner
            );
        }

        let values = specs.iter().map(|s| s.default.clone()).collect();
        Self {
            owner,
            specs,
            values,
        }
    }

    pub fn specs(&self) -> &[ParamSpec] {
        &self.specs
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.specs
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| DegraderError::UnknownParameter {
                degradation: self.owner.to_string(),
                name: name.to_string(),
            })
    }

    /// Bind values by name
    ///
    /// Either every value is bound or, on the first unknown name or failed
    /// coercion, none is.
    pub fn set_values(&mut self, values: &[(&str, ParamValue)]) -> Result<()> {
        let mut staged = Vec::with_capacity(values.len());
        for (name, value) in values {
            let index = self.index_of(name)?;
            let coerced = self.specs[index].coerce(value.clone())?;
            staged.push((index, coerced));
        }

        for (index, value) in staged {
            self.values[index] = Some(value);
        }
        Ok(())
    }

    /// Bind text values in declaration order
    pub fn set_positional(&mut self, values: &[&str]) -> Result<()> {
        if values.len() > self.specs.len() {
            return Err(DegraderError::invalid_parameter(
                self.owner,
                format!(
                    "got {} values but '{}' takes at most {}",
                    values.len(),
                    self.owner,
                    self.specs.len()
                ),
            ));
        }

        let named: Vec<(&str, ParamValue)> = self
            .specs
            .iter()
            .zip(values)
            .map(|(spec, value)| (spec.name, ParamValue::from(*value)))
            .collect();
        self.set_values(&named)
    }

    /// Current value, `None` when unset
    pub fn get(&self, name: &str) -> Result<Option<&ParamValue>> {
        let index = self.index_of(name)?;
        Ok(self.values[index].as_ref())
    }

    fn required(&self, name: &str) -> Result<&ParamValue> {
        self.get(name)?
            .ok_or_else(|| DegraderError::invalid_parameter(name, "a value is required"))
    }

    pub fn float(&self, name: &str) -> Result<f64> {
        self.optional_float(name)?
            .ok_or_else(|| DegraderError::invalid_parameter(name, "a value is required"))
    }

    pub fn optional_float(&self, name: &str) -> Result<Option<f64>> {
        match self.get(name)? {
            None => Ok(None),
            Some(ParamValue::Float(v)) => Ok(Some(*v)),
            Some(ParamValue::Integer(v)) => Ok(Some(*v as f64)),
            Some(other) => Err(DegraderError::invalid_parameter(
                name,
                format!("expected a number, got '{}'", other),
            )),
        }
    }

    pub fn integer(&self, name: &str) -> Result<i64> {
        match self.required(name)? {
            ParamValue::Integer(v) => Ok(*v),
            other => Err(DegraderError::invalid_parameter(
                name,
                format!("expected an integer, got '{}'", other),
            )),
        }
    }

    pub fn text(&self, name: &str) -> Result<String> {
        Ok(self.required(name)?.to_string())
    }

    pub fn path(&self, name: &str) -> Result<PathBuf> {
        match self.required(name)? {
            ParamValue::Path(p) => Ok(p.clone()),
            ParamValue::Text(t) => Ok(PathBuf::from(t)),
            other => Err(DegraderError::invalid_parameter(
                name,
                format!("expected a path, got '{}'", other),
            )),
        }
    }

    /// Bound values in declaration order, skipping unset ones
    pub fn bound_values(&self) -> Vec<(String, ParamValue)> {
        self.specs
            .iter()
            .zip(&self.values)
            .filter_map(|(spec, value)| value.clone().map(|v| (spec.name.to_string(), v)))
            .collect()
    }
}
