//! Error types for the Drive client.

use cadence_core::CadenceError;
use thiserror::Error;

/// Errors that can occur when talking to the Drive API.
#[derive(Error, Debug)]
pub enum DriveError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// API returned an error response
    #[error("Drive API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Token rejected (HTTP 401/403) or no token available
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Token refresh failed for a reason other than rejection
    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    /// File id unknown to the API
    #[error("File not found: {0}")]
    NotFound(String),

    /// Invalid API base URL
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse an API response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Local file is not something we upload
    #[error("Not an audio file: {0}")]
    UnsupportedFile(String),

    /// IO error while reading a local file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// API is offline or unreachable
    #[error("Drive API unreachable: {0}")]
    Unreachable(String),
}

impl DriveError {
    /// Map a credential provider failure
    pub(crate) fn from_credentials(err: CadenceError) -> Self {
        match err {
            CadenceError::Auth(msg) => Self::AuthFailed(msg),
            other => Self::TokenRefreshFailed(other.to_string()),
        }
    }

    /// Map a transport failure, separating unreachable hosts from the rest
    pub(crate) fn from_send(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::Unreachable(err.to_string())
        } else {
            Self::Request(err)
        }
    }
}

impl From<DriveError> for CadenceError {
    fn from(err: DriveError) -> Self {
        match err {
            DriveError::AuthFailed(msg) => CadenceError::Auth(msg),
            DriveError::NotFound(id) => CadenceError::not_found("File", id),
            DriveError::InvalidUrl(msg) | DriveError::UnsupportedFile(msg) => {
                CadenceError::InvalidInput(msg)
            }
            DriveError::Io(e) => CadenceError::Io(e),
            other => CadenceError::Fetch(other.to_string()),
        }
    }
}

/// Result type for Drive operations.
pub type Result<T> = std::result::Result<T, DriveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_map_to_auth() {
        let core: CadenceError = DriveError::AuthFailed("401".into()).into();
        assert!(core.is_auth());
    }

    #[test]
    fn not_found_keeps_id() {
        let core: CadenceError = DriveError::NotFound("abc".into()).into();
        assert_eq!(core.to_string(), "File not found: abc");
    }

    #[test]
    fn refresh_transport_failure_is_not_an_auth_error() {
        let core: CadenceError = DriveError::TokenRefreshFailed("dns".into()).into();
        assert!(!core.is_auth());
    }

    #[test]
    fn api_errors_are_fetch_errors() {
        let core: CadenceError = DriveError::Api {
            status: 500,
            message: "backend".into(),
        }
        .into();
        assert!(matches!(core, CadenceError::Fetch(_)));
    }

    #[test]
    fn credential_errors_split_by_kind() {
        assert!(matches!(
            DriveError::from_credentials(CadenceError::auth("expired")),
            DriveError::AuthFailed(_)
        ));
        assert!(matches!(
            DriveError::from_credentials(CadenceError::fetch("dns")),
            DriveError::TokenRefreshFailed(_)
        ));
    }
}
