/// Core error types for Cadence
use thiserror::Error;

/// Result type alias using `CadenceError`
pub type Result<T> = std::result::Result<T, CadenceError>;

/// Core error type for Cadence
#[derive(Error, Debug)]
pub enum CadenceError {
    /// Credential missing, rejected or expired
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Network or storage failure while talking to the remote library
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Bytes could not be decoded as audio
    #[error("Decode error: {0}")]
    Decode(String),

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Output device failure
    #[error("Device error: {0}")]
    Device(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl CadenceError {
    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a fetch error
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a device error
    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// True for errors that only a fresh sign-in can fix
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// True when the remote side no longer knows the entity
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_names_entity_and_id() {
        let err = CadenceError::not_found("Track", "abc");
        assert_eq!(err.to_string(), "Track not found: abc");
        assert!(err.is_not_found());
        assert!(!err.is_auth());
    }

    #[test]
    fn auth_helper_is_classified() {
        assert!(CadenceError::auth("expired").is_auth());
    }
}
