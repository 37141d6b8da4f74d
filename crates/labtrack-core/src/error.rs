use thiserror::Error;

/// Top-level error type for Labtrack configuration and identifier handling.
#[derive(Error, Debug)]
pub enum LabtrackError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid {kind} identifier: {value:?} is not a UUID")]
    InvalidId { kind: &'static str, value: String },
}

impl From<config::ConfigError> for LabtrackError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
