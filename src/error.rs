//! Error types and handling for the `TintWave` application

use thiserror::Error;

/// Message returned when a request carries neither a city nor coordinates
pub const MISSING_LOCATION_MESSAGE: &str = "City or coordinates required";

/// Main error type for the `TintWave` application
#[derive(Error, Debug)]
pub enum TintwaveError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Request named neither a city nor a coordinate pair
    #[error("City or coordinates required")]
    MissingLocation,

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Transport or decoding failure while talking to the weather provider
    #[error("Upstream error ({resource}): {message}")]
    Upstream { resource: String, message: String },

    /// Weather provider did not answer in time
    #[error("Upstream request for {resource} timed out")]
    Timeout { resource: String },

    /// Error reported by the weather provider inside a payload
    #[error("Provider error {code}: {message}")]
    Provider { code: u16, message: String },

    /// Non-success reply from the aggregation endpoint
    #[error("Endpoint returned {status}: {message}")]
    Endpoint { status: u16, message: String },

    /// Payload did not have the expected shape
    #[error("Unexpected payload: {message}")]
    UnexpectedPayload { message: String },
}

impl TintwaveError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new upstream error for the given provider resource
    pub fn upstream<R: Into<String>, S: Into<String>>(resource: R, message: S) -> Self {
        Self::Upstream {
            resource: resource.into(),
            message: message.into(),
        }
    }

    pub fn timeout<R: Into<String>>(resource: R) -> Self {
        Self::Timeout {
            resource: resource.into(),
        }
    }

    pub fn provider<S: Into<String>>(code: u16, message: S) -> Self {
        Self::Provider {
            code,
            message: message.into(),
        }
    }

    pub fn endpoint<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Endpoint {
            status,
            message: message.into(),
        }
    }

    pub fn unexpected_payload<S: Into<String>>(message: S) -> Self {
        Self::UnexpectedPayload {
            message: message.into(),
        }
    }

    /// Whether the error was caused by the caller rather than by the server
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TintwaveError::MissingLocation | TintwaveError::Validation { .. }
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TintwaveError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            TintwaveError::MissingLocation => MISSING_LOCATION_MESSAGE.to_string(),
            TintwaveError::Validation { message } => message.clone(),
            TintwaveError::Upstream { .. } | TintwaveError::Timeout { .. } => {
                "Unable to reach the weather service. Please try again.".to_string()
            }
            TintwaveError::Provider { message, .. } => capitalize(message),
            TintwaveError::Endpoint { message, .. } => message.clone(),
            TintwaveError::UnexpectedPayload { .. } => {
                "Unexpected response from weather service".to_string()
            }
        }
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
