//! Error handling for Degrader
//!
//! Every error carries a stable code and, where it makes sense, recovery
//! suggestions for the command-line surface.

use thiserror::Error;

/// Result type alias for Degrader operations
pub type Result<T> = std::result::Result<T, DegraderError>;

/// Main error type for Degrader operations
#[derive(Error, Debug)]
pub enum DegraderError {
    // Parameter Errors
    #[error("Unknown parameter '{name}' for degradation '{degradation}'")]
    UnknownParameter { degradation: String, name: String },

    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Unknown degradation: {name}")]
    UnknownDegradation { name: String },

    // File Errors
    #[error("File not found: {path}")]
    FileNotFound {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Invalid audio: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // Codec Errors
    #[error("Codec error: {reason}")]
    Codec {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DegraderError {
    /// Shorthand for an `InvalidParameter` error
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        DegraderError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a `Codec` error without an underlying source
    pub fn codec(reason: impl Into<String>) -> Self {
        DegraderError::Codec {
            reason: reason.into(),
            source: None,
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            DegraderError::UnknownParameter { .. } => "UNKNOWN_PARAMETER",
            DegraderError::InvalidParameter { .. } => "INVALID_PARAMETER",
            DegraderError::UnknownDegradation { .. } => "UNKNOWN_DEGRADATION",
            DegraderError::FileNotFound { .. } => "FILE_NOT_FOUND",
            DegraderError::InvalidAudio { .. } => "INVALID_AUDIO",
            DegraderError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            DegraderError::Codec { .. } => "CODEC_ERROR",
            DegraderError::Io(_) => "IO_ERROR",
            DegraderError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable by changing the invocation
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DegraderError::UnknownParameter { .. }
                | DegraderError::InvalidParameter { .. }
                | DegraderError::UnknownDegradation { .. }
                | DegraderError::FileNotFound { .. }
                | DegraderError::UnsupportedFormat { .. }
                | DegraderError::Codec { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            DegraderError::UnknownParameter { .. } => vec![
                "Check the parameter name spelling",
                "Run 'degrader-cli list' to see the parameters of each degradation",
            ],
            DegraderError::InvalidParameter { .. } => vec![
                "Check the value is in the documented range",
                "Run 'degrader-cli list' to see an example for each degradation",
            ],
            DegraderError::UnknownDegradation { .. } => vec![
                "Run 'degrader-cli list' to see the available degradations",
            ],
            DegraderError::FileNotFound { .. } => vec![
                "Check the file path is correct",
                "Verify the file hasn't been moved or deleted",
            ],
            DegraderError::UnsupportedFormat { .. } => vec![
                "Convert the file to PCM WAV first",
                "Supported input: 8/16/24/32-bit integer or 32-bit float WAV",
            ],
            DegraderError::Codec { .. } => vec![
                "Make sure the 'lame' executable is installed",
                "Set DEGRADER_LAME_PATH or pass --lame-path to point at it",
                "Retry the command if the failure was transient",
            ],
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = DegraderError::UnknownParameter {
            degradation: "gain".to_string(),
            name: "volume".to_string(),
        };
        assert_eq!(err.error_code(), "UNKNOWN_PARAMETER");
        assert_eq!(
            err.to_string(),
            "Unknown parameter 'volume' for degradation 'gain'"
        );

        let err = DegraderError::codec("lame exited with status 1");
        assert_eq!(err.error_code(), "CODEC_ERROR");
    }

    #[test]
    fn test_recovery_suggestions() {
        let err = DegraderError::invalid_parameter("snr", "not a number");
        assert!(!err.recovery_suggestions().is_empty());
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_io_error_not_recoverable() {
        let err: DegraderError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert_eq!(err.error_code(), "IO_ERROR");
        assert!(!err.is_recoverable());
        assert!(err.recovery_suggestions().is_empty());
    }
}
