//! Error types for the Sona core

use thiserror::Error;

/// Main error type for Sona operations
#[derive(Debug, Error)]
pub enum SonaError {
    /// Required credential or configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// The external generation capability failed
    #[error("Generation error: {0}")]
    Generation(String),

    /// Structured model output could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// User submitted blank input; no turn is produced
    #[error("Empty input: nothing to send")]
    EmptyInput,

    /// Template rendering error
    #[error("Template error: {0}")]
    Template(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network/HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Convenient Result type using SonaError
pub type Result<T> = std::result::Result<T, SonaError>;

impl SonaError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        SonaError::Config(msg.into())
    }

    /// Create a generation error
    pub fn generation(msg: impl Into<String>) -> Self {
        SonaError::Generation(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        SonaError::Parse(msg.into())
    }

    /// Create a template error
    pub fn template(msg: impl Into<String>) -> Self {
        SonaError::Template(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        SonaError::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = SonaError::config("missing api_key");
        assert_eq!(err.to_string(), "Configuration error: missing api_key");

        let err = SonaError::generation("backend unreachable");
        assert_eq!(err.to_string(), "Generation error: backend unreachable");
    }

    #[test]
    fn test_empty_input_display() {
        assert_eq!(
            SonaError::EmptyInput.to_string(),
            "Empty input: nothing to send"
        );
    }

    #[test]
    fn test_result_type() {
        fn returns_result() -> Result<i32> {
            Ok(7)
        }

        assert_eq!(returns_result().unwrap(), 7);
    }
}
