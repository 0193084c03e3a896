//! Error taxonomy for the synthesis engine.

use thiserror::Error;

/// Failures raised while validating inputs or resolving calibration data.
///
/// Every variant is terminal: the engine never retries or clamps its way
/// around one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthError {
    /// Malformed or unsupported operation mode, unknown channel, or a
    /// calibration index the table cannot resolve.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A scalar input that is non-finite or outside its allowed range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl SynthError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidParameter { .. })
    }
}

impl From<serde_json::Error> for SynthError {
    fn from(e: serde_json::Error) -> Self {
        Self::Configuration(format!("failed to parse configuration: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, SynthError>;

/// Reject NaN/infinite values and anything at or below zero.
pub(crate) fn require_positive(name: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(SynthError::invalid(name, format!("must be finite, got {value}")));
    }
    if value <= 0.0 {
        return Err(SynthError::invalid(
            name,
            format!("must be greater than zero, got {value}"),
        ));
    }
    Ok(value)
}

/// Reject NaN/infinite and negative values; zero is allowed.
pub(crate) fn require_non_negative(name: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(SynthError::invalid(name, format!("must be finite, got {value}")));
    }
    if value < 0.0 {
        return Err(SynthError::invalid(
            name,
            format!("must not be negative, got {value}"),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_positive() {
        assert_eq!(require_positive("x", 2.5), Ok(2.5));
        assert!(require_positive("x", 0.0).unwrap_err().is_invalid_parameter());
        assert!(require_positive("x", -1.0).is_err());
        assert!(require_positive("x", f64::NAN).is_err());
        assert!(require_positive("x", f64::INFINITY).is_err());
    }

    #[test]
    fn test_require_non_negative_accepts_zero() {
        assert_eq!(require_non_negative("bias", 0.0), Ok(0.0));
        assert!(require_non_negative("bias", -0.5).is_err());
    }

    #[test]
    fn test_messages_name_the_parameter() {
        let err = require_positive("star_flux", -3.0).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("star_flux"), "{msg}");
        assert!(msg.contains("-3"), "{msg}");
    }

    #[test]
    fn test_json_errors_are_configuration_errors() {
        let err: SynthError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(err.is_configuration());
    }
}
