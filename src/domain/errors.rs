//! Domain error types
//!
//! This module defines the error hierarchy for the extractor.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main extractor error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum ExtractorError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Toast API errors
    #[error("Toast API error: {0}")]
    Api(#[from] ToastApiError),

    /// A table mapping could not be built or could not be applied to a record
    #[error("Mapping resolution error: {0}")]
    MappingResolution(String),

    /// Output table errors
    #[error("Output error: {0}")]
    Output(String),

    /// State management errors
    #[error("State management error: {0}")]
    State(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// The run was stopped by a shutdown signal
    #[error("Export interrupted: {0}")]
    Interrupted(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl ExtractorError {
    /// Whether the error was raised while exchanging credentials
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Api(ToastApiError::AuthenticationFailed(_)))
    }

    /// Whether the error came from a non-success response of the remote API
    pub fn is_remote_request(&self) -> bool {
        matches!(self, Self::Api(ToastApiError::RequestFailed { .. }))
    }
}

/// Toast API errors
///
/// Errors that occur when interacting with the Toast REST API.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Error)]
pub enum ToastApiError {
    /// Credential exchange was rejected
    #[error("Could not obtain access token: {0}")]
    AuthenticationFailed(String),

    /// Failed to reach the server
    #[error("Failed to connect to Toast API: {0}")]
    ConnectionFailed(String),

    /// Non-success response to a listing or directory call
    #[error("Request '{request}' failed with status {status}: {message}")]
    RequestFailed {
        request: String,
        status: u16,
        message: String,
    },

    /// Response body could not be decoded
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),
}

impl ToastApiError {
    /// Transport failures are worth another attempt, server answers are not
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_) | Self::Timeout(_))
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for ExtractorError {
    fn from(err: std::io::Error) -> Self {
        ExtractorError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for ExtractorError {
    fn from(err: serde_json::Error) -> Self {
        ExtractorError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for ExtractorError {
    fn from(err: toml::de::Error) -> Self {
        ExtractorError::Configuration(format!("TOML parse error: {err}"))
    }
}

// Conversion from csv writer errors
impl From<csv::Error> for ExtractorError {
    fn from(err: csv::Error) -> Self {
        ExtractorError::Output(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extractor_error_display() {
        let err = ExtractorError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_request_failed_names_request_and_message() {
        let err = ToastApiError::RequestFailed {
            request: "GET orders/v2/ordersBulk page=3".to_string(),
            status: 400,
            message: "startDate must be before endDate".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("orders/v2/ordersBulk"));
        assert!(text.contains("400"));
        assert!(text.contains("startDate must be before endDate"));
    }

    #[test]
    fn test_api_error_conversion() {
        let api_err = ToastApiError::AuthenticationFailed("401".to_string());
        let err: ExtractorError = api_err.into();
        assert!(err.is_authentication());
        assert!(!err.is_remote_request());
    }

    #[test]
    fn test_transient_classification() {
        assert!(ToastApiError::ConnectionFailed("reset".to_string()).is_transient());
        assert!(ToastApiError::Timeout("30s".to_string()).is_transient());
        assert!(!ToastApiError::RequestFailed {
            request: "GET x".to_string(),
            status: 500,
            message: String::new(),
        }
        .is_transient());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: ExtractorError = io_err.into();
        assert!(matches!(err, ExtractorError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: ExtractorError = json_err.into();
        assert!(matches!(err, ExtractorError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: ExtractorError = toml_err.into();
        assert!(matches!(err, ExtractorError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }
}
