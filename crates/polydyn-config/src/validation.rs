//! Range and name validation for configuration files.
//!
//! The core clamps every value it receives, so a bad configuration would
//! otherwise be silently "fixed" on the audio thread. Validation runs on the
//! loading side instead and reports every problem at once.
//!
//! # Example
//!
//! ```rust
//! use polydyn_config::{SynthesizerConfig, ValidationError};
//!
//! let mut config = SynthesizerConfig::default();
//! config.volume = 3.0;
//! let err = config.validate().unwrap_err();
//! assert!(matches!(err, ValidationError::OutOfRange { .. }));
//! ```

use std::str::FromStr;
use thiserror::Error;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Parameter value out of range.
    #[error("parameter '{param}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Dotted path of the parameter.
        param: String,
        /// The value that was out of range.
        value: f32,
        /// Minimum allowed value.
        min: f32,
        /// Maximum allowed value.
        max: f32,
    },

    /// A name that does not match any known choice.
    #[error("parameter '{param}' has unknown value '{value}' (expected {expected})")]
    UnknownChoice {
        /// Dotted path of the parameter.
        param: String,
        /// The value found in the file.
        value: String,
        /// The accepted values.
        expected: String,
    },

    /// Structurally invalid value.
    #[error("invalid format for parameter '{param}': {reason}")]
    InvalidFormat {
        /// Dotted path of the parameter.
        param: String,
        /// Description of the format error.
        reason: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Flatten into the individual errors.
    pub fn into_errors(self) -> Vec<ValidationError> {
        match self {
            ValidationError::Multiple(errors) => errors,
            other => vec![other],
        }
    }
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Collects errors for one table of a configuration file.
pub(crate) struct Validator {
    section: &'static str,
    errors: Vec<ValidationError>,
}

impl Validator {
    pub(crate) fn new(section: &'static str) -> Self {
        Self {
            section,
            errors: Vec::new(),
        }
    }

    fn path(&self, param: &str) -> String {
        format!("{}.{param}", self.section)
    }

    pub(crate) fn range(&mut self, param: &str, value: f32, min: f32, max: f32) {
        if value.is_nan() || value < min || value > max {
            self.errors.push(ValidationError::OutOfRange {
                param: self.path(param),
                value,
                min,
                max,
            });
        }
    }

    pub(crate) fn at_least(&mut self, param: &str, value: f32, min: f32) {
        self.range(param, value, min, f32::INFINITY);
    }

    pub(crate) fn choice<T: FromStr>(&mut self, param: &str, value: &str, expected: &str) {
        if value.parse::<T>().is_err() {
            self.errors.push(ValidationError::UnknownChoice {
                param: self.path(param),
                value: value.to_string(),
                expected: expected.to_string(),
            });
        }
    }

    pub(crate) fn format(&mut self, param: &str, reason: impl Into<String>) {
        self.errors.push(ValidationError::InvalidFormat {
            param: self.path(param),
            reason: reason.into(),
        });
    }

    /// Absorb the errors of a nested validation.
    pub(crate) fn merge(&mut self, result: ValidationResult<()>) {
        if let Err(err) = result {
            self.errors.extend(err.into_errors());
        }
    }

    pub(crate) fn finish(mut self) -> ValidationResult<()> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => Err(ValidationError::Multiple(self.errors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_validator_passes() {
        assert_eq!(Validator::new("synth").finish(), Ok(()));
    }

    #[test]
    fn test_single_error_is_not_wrapped() {
        let mut v = Validator::new("filter");
        v.range("cutoff", 5.0, 20.0, 20000.0);
        let err = v.finish().unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfRange {
                param: "filter.cutoff".to_string(),
                value: 5.0,
                min: 20.0,
                max: 20000.0,
            }
        );
    }

    #[test]
    fn test_nan_is_out_of_range() {
        let mut v = Validator::new("lfo");
        v.range("rate", f32::NAN, 0.1, 20.0);
        assert!(v.finish().is_err());
    }

    #[test]
    fn test_multiple_errors_collected() {
        let mut v = Validator::new("gate");
        v.at_least("ratio", 0.5, 1.0);
        v.choice::<f32>("hold", "long", "a number");
        let err = v.finish().unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("multiple validation errors"), "got: {msg}");
        assert!(msg.contains("gate.ratio"), "got: {msg}");
        assert_eq!(err.into_errors().len(), 2);
    }

    #[test]
    fn test_merge_flattens() {
        let mut inner = Validator::new("a");
        inner.format("x", "bad");
        inner.format("y", "bad");
        let mut outer = Validator::new("b");
        outer.merge(inner.finish());
        assert_eq!(outer.finish().unwrap_err().into_errors().len(), 2);
    }
}
