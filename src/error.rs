//! Error types and handling for `AirSight`

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::validation::ValidationErrors;

/// Which outbound call a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Geocoding,
    AirQuality,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Geocoding => write!(f, "geocoding"),
            Stage::AirQuality => write!(f, "air quality"),
        }
    }
}

/// How a remote service let us down
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceFailure {
    /// Service answered with a non-2xx status
    Status(u16),
    /// Connection, TLS or body read failure
    Transport(String),
    /// Body was not the JSON shape we read
    MalformedPayload(String),
    /// Service reachable, but it had no data for this location
    MissingData,
}

impl fmt::Display for ServiceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceFailure::Status(code) => write!(f, "HTTP {code}"),
            ServiceFailure::Transport(message) => write!(f, "transport failure: {message}"),
            ServiceFailure::MalformedPayload(message) => write!(f, "malformed payload: {message}"),
            ServiceFailure::MissingData => write!(f, "no data in response"),
        }
    }
}

/// Main error type for `AirSight`
#[derive(Error, Debug)]
pub enum AirSightError {
    /// Form input rejected before any network call
    #[error("Invalid input: {0}")]
    Validation(ValidationErrors),

    /// Geocoder returned an empty result set
    #[error("Location not found: {query}")]
    LocationNotFound { query: String },

    /// Geocoding call failed
    #[error("Geocoding error: {0}")]
    Geocoding(ServiceFailure),

    /// Air quality call failed or returned no `current` payload
    #[error("Air quality API error: {0}")]
    AirQualityApi(ServiceFailure),

    /// An outbound call exceeded its deadline and was cancelled
    #[error("Timed out after {after:?} during {stage}")]
    Timeout { stage: Stage, after: Duration },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Anything we have no dedicated category for
    #[error("Application error: {message}")]
    General { message: String },
}

impl AirSightError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    pub fn location_not_found<S: Into<String>>(query: S) -> Self {
        Self::LocationNotFound {
            query: query.into(),
        }
    }

    pub fn timeout(stage: Stage, after: Duration) -> Self {
        Self::Timeout { stage, after }
    }

    /// Map a transport-level reqwest failure for the given stage
    pub fn from_reqwest(stage: Stage, after: Duration, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::timeout(stage, after);
        }
        let failure = if err.is_decode() {
            ServiceFailure::MalformedPayload(err.to_string())
        } else if let Some(status) = err.status() {
            ServiceFailure::Status(status.as_u16())
        } else {
            ServiceFailure::Transport(err.to_string())
        };
        match stage {
            Stage::Geocoding => Self::Geocoding(failure),
            Stage::AirQuality => Self::AirQualityApi(failure),
        }
    }

    /// Whether a manual retry with the same input could reasonably succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            AirSightError::Validation(_) | AirSightError::Config { .. }
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            AirSightError::Validation(errors) => format!("Invalid input: {errors}"),
            AirSightError::LocationNotFound { .. } => {
                "Location not found. Check that the city, region and country are correct."
                    .to_string()
            }
            AirSightError::Geocoding(ServiceFailure::Status(code)) => format!(
                "The location service responded with an error (HTTP {code}). Try again in a few minutes."
            ),
            AirSightError::Geocoding(ServiceFailure::Transport(_)) => {
                "Could not convert the location into coordinates. Check your internet connection."
                    .to_string()
            }
            AirSightError::Geocoding(
                ServiceFailure::MalformedPayload(_) | ServiceFailure::MissingData,
            ) => "The location service returned an unexpected response.".to_string(),
            AirSightError::AirQualityApi(ServiceFailure::Status(code)) => format!(
                "The air quality service responded with an error (HTTP {code}). Try again in a few minutes."
            ),
            AirSightError::AirQualityApi(ServiceFailure::Transport(_)) => {
                "Could not fetch air quality data. Check your internet connection.".to_string()
            }
            AirSightError::AirQualityApi(ServiceFailure::MissingData) => {
                "Air quality data is not available for this location.".to_string()
            }
            AirSightError::AirQualityApi(ServiceFailure::MalformedPayload(_)) => {
                "The air quality service returned an unexpected response.".to_string()
            }
            AirSightError::Timeout {
                stage: Stage::Geocoding,
                ..
            } => "Timed out while looking up the location. Try again.".to_string(),
            AirSightError::Timeout {
                stage: Stage::AirQuality,
                ..
            } => "Timed out while fetching air quality data. Try again.".to_string(),
            AirSightError::Config { .. } => {
                "Configuration error. Please check your config file and environment.".to_string()
            }
            AirSightError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            AirSightError::General { .. } => {
                "Unexpected error. Please try again later.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{Field, FieldError};

    #[test]
    fn test_error_creation() {
        let config_err = AirSightError::config("bad timeout");
        assert!(matches!(config_err, AirSightError::Config { .. }));

        let not_found = AirSightError::location_not_found("Nowhere, XX, Brasil");
        assert!(matches!(not_found, AirSightError::LocationNotFound { .. }));
        assert!(not_found.to_string().contains("Nowhere"));
    }

    #[test]
    fn test_http_status_and_missing_payload_messages_differ() {
        let http = AirSightError::AirQualityApi(ServiceFailure::Status(500));
        let missing = AirSightError::AirQualityApi(ServiceFailure::MissingData);
        assert_ne!(http.user_message(), missing.user_message());
        assert!(http.user_message().contains("500"));

        let geo_http = AirSightError::Geocoding(ServiceFailure::Status(404));
        let geo_bad = AirSightError::Geocoding(ServiceFailure::MalformedPayload("eof".into()));
        assert_ne!(geo_http.user_message(), geo_bad.user_message());
    }

    #[test]
    fn test_timeout_messages_name_the_stage() {
        let geo = AirSightError::timeout(Stage::Geocoding, Duration::from_secs(10));
        let aq = AirSightError::timeout(Stage::AirQuality, Duration::from_secs(10));
        assert!(geo.user_message().contains("location"));
        assert!(aq.user_message().contains("air quality"));
        assert!(geo.to_string().contains("geocoding"));
    }

    #[test]
    fn test_general_maps_to_generic_message() {
        let err = AirSightError::general("something odd");
        assert_eq!(err.user_message(), "Unexpected error. Please try again later.");
    }

    #[test]
    fn test_validation_is_not_retryable() {
        let errors = ValidationErrors::from(vec![FieldError::new(
            Field::City,
            "City is required",
        )]);
        let err = AirSightError::Validation(errors);
        assert!(!err.is_retryable());
        assert!(err.user_message().contains("City is required"));
        assert!(AirSightError::Geocoding(ServiceFailure::Status(503)).is_retryable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AirSightError = io_err.into();
        assert!(matches!(err, AirSightError::Io { .. }));
    }
}
