//! Weather client error types.

use rainman_core::ConfigError;
use thiserror::Error;

/// Failures of the underlying HTTP exchange, passed through to the caller.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Decode(#[from] serde_json::Error),

    /// Raised by custom [`Transport`](crate::Transport) implementations.
    #[error("Transport error: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Weather provider returned HTTP {status}")]
    Provider { status: u16 },

    #[error("Network error: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid coordinates: ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
}

impl WeatherError {
    /// HTTP status carried by a provider error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Provider { status } => Some(*status),
            _ => None,
        }
    }

    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Configuration(e) => e.user_message(),
            Self::Provider { status: 401 } => "Weather API key is invalid. Check settings.",
            Self::Provider { status: 429 } => {
                "Weather request limit reached. Please try again later."
            }
            Self::Provider { status } if *status >= 500 => {
                "Weather service unavailable. Please try again later."
            }
            Self::Provider { .. } => "Weather service error. Please try again.",
            Self::Transport(_) => "Network error. Check your connection.",
            Self::InvalidCoordinates { .. } => "Location coordinates are invalid.",
        }
    }
}
