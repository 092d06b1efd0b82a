//! Error handling module for the PinCo core engine.
//!
//! Provides a centralized error type with stable error codes, used across
//! the fetch, filter, and mutation layers.

/// Error codes as constants to avoid stringly-typed errors.
#[allow(dead_code)]
pub mod codes {
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const API_ERROR: &str = "API_ERROR";
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const AUTH_REQUIRED: &str = "AUTH_REQUIRED";
    pub const NOT_OWNER: &str = "NOT_OWNER";
    pub const MUTATION_IN_FLIGHT: &str = "MUTATION_IN_FLIGHT";
    pub const MISSING_BOOKMARK: &str = "MISSING_BOOKMARK";
    pub const NOT_FOUND: &str = "NOT_FOUND";
}

/// Core engine error type.
#[derive(Debug)]
pub enum CoreError {
    /// Transport-level failure (request rejected, timed out, connection lost)
    Network(String),
    /// Application-level error carried inside an HTTP success envelope
    Api { code: String, message: String },
    /// Response shape did not match any accepted variant
    Parse(String),
    /// Operation requires a logged-in user
    AuthRequired(String),
    /// Owner-only mutation attempted by a non-owner
    NotOwner(String),
    /// A mutation of the same family is already pending for this pin
    MutationInFlight(String),
    /// Bookmark removal requested without a known bookmark id
    MissingBookmark(String),
    /// Referenced pin is not present in the current set
    NotFound(String),
}

impl CoreError {
    /// Get the stable error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::Network(_) => codes::NETWORK_ERROR,
            CoreError::Api { .. } => codes::API_ERROR,
            CoreError::Parse(_) => codes::PARSE_ERROR,
            CoreError::AuthRequired(_) => codes::AUTH_REQUIRED,
            CoreError::NotOwner(_) => codes::NOT_OWNER,
            CoreError::MutationInFlight(_) => codes::MUTATION_IN_FLIGHT,
            CoreError::MissingBookmark(_) => codes::MISSING_BOOKMARK,
            CoreError::NotFound(_) => codes::NOT_FOUND,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            CoreError::Network(msg) => msg.clone(),
            CoreError::Api { code, message } => format!("{} ({})", message, code),
            CoreError::Parse(msg) => msg.clone(),
            CoreError::AuthRequired(msg) => msg.clone(),
            CoreError::NotOwner(msg) => msg.clone(),
            CoreError::MutationInFlight(msg) => msg.clone(),
            CoreError::MissingBookmark(msg) => msg.clone(),
            CoreError::NotFound(msg) => msg.clone(),
        }
    }

    /// True for failures the caller may retry by repeating the action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Network(_) | CoreError::Api { .. })
    }
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for CoreError {}

impl From<reqwest::Error> for CoreError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!("Network error: {:?}", err);
        CoreError::Network(format!("Request failed: {}", err))
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        CoreError::Parse(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code() {
        let err = CoreError::NotOwner("pin 7 belongs to user 2".to_string());
        assert_eq!(err.to_string(), "NOT_OWNER: pin 7 belongs to user 2");
    }

    #[test]
    fn test_api_error_message_carries_remote_code() {
        let err = CoreError::Api {
            code: "403".to_string(),
            message: "forbidden".to_string(),
        };
        assert_eq!(err.error_code(), codes::API_ERROR);
        assert_eq!(err.message(), "forbidden (403)");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(CoreError::Network("timeout".into()).is_retryable());
        assert!(!CoreError::NotOwner("nope".into()).is_retryable());
        assert!(!CoreError::MutationInFlight("busy".into()).is_retryable());
    }
}
