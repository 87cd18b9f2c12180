//! Configuration error types.
//!
//! Every way a Rainman configuration can be rejected maps to one variant here,
//! so callers can match on the cause instead of parsing messages.

use thiserror::Error;

/// Configuration errors, raised when building a `WeatherConfig` or when a
/// provider query cannot be constructed from it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("No API key provided to Rainman")]
    MissingApiKey,

    #[error("No provider was passed to Rainman")]
    MissingProvider,

    #[error("Couldn't find a configuration for provider: {0}")]
    UnknownProvider(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    Parse(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::MissingApiKey => "A weather API key is required. Check your settings.",
            ConfigError::MissingProvider => "Choose a weather provider in your settings.",
            ConfigError::UnknownProvider(_) => {
                "Unsupported weather provider. Use openweathermap or darksky."
            }
            ConfigError::Invalid(_) => "Invalid weather configuration. Check your settings.",
            ConfigError::Parse(_) => "Weather configuration is malformed. Check your settings.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_names_the_provider() {
        let err = ConfigError::UnknownProvider("weatherbit".into());
        assert!(err.to_string().contains("weatherbit"));
    }

    #[test]
    fn test_user_messages_are_non_empty() {
        let errors = [
            ConfigError::MissingApiKey,
            ConfigError::MissingProvider,
            ConfigError::UnknownProvider("x".into()),
            ConfigError::Invalid("x".into()),
            ConfigError::Parse("x".into()),
        ];

        for err in &errors {
            assert!(!err.user_message().is_empty(), "{:?}", err);
        }
    }
}
