//! Error kinds shared by the connection manager and both providers.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LlmError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlmError {
    /// A required connection parameter is missing. Never reaches the network.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The remote endpoint rejected the credentials.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Transport failure, timeout or non-success status.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Success status, but a payload we cannot read.
    #[error("invalid response format: {0}")]
    InvalidResponseFormat(String),

    #[error("No active LLM connection")]
    NotConnected,

    /// A later connect or disconnect landed while this connect was validating.
    #[error("connection attempt superseded by a later request")]
    Superseded,
}

impl LlmError {
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::ProviderUnavailable(format!("request timed out: {}", err))
        } else {
            LlmError::ProviderUnavailable(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_connected_message() {
        assert_eq!(LlmError::NotConnected.to_string(), "No active LLM connection");
    }

    #[test]
    fn test_error_display_includes_detail() {
        let err = LlmError::Configuration("API key is required".to_string());
        assert_eq!(err.to_string(), "configuration error: API key is required");
    }
}
