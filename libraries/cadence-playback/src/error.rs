//! Error types for playback management

use cadence_core::{CadenceError, TrackId};
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Credential rejected by the remote library
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Network or storage failure fetching bytes
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// Bytes are not playable audio
    #[error("Decode failed: {0}")]
    Decode(String),

    /// Track id no longer present in the store
    #[error("Track not found: {0}")]
    NotFound(TrackId),

    /// Audio output failure
    #[error("Audio device error: {0}")]
    Device(String),

    /// No track is currently loaded
    #[error("No track loaded")]
    NoTrackLoaded,

    /// The controller task is gone
    #[error("Playback controller has shut down")]
    ControllerClosed,
}

impl PlaybackError {
    /// Map a store failure for a specific track
    ///
    /// A `NotFound` from the store always names the track that was asked for.
    pub fn from_store(err: CadenceError, track: &TrackId) -> Self {
        match err {
            CadenceError::NotFound { .. } => Self::NotFound(track.clone()),
            other => other.into(),
        }
    }

    /// Map a decoder failure; anything the decoder reports is a decode error
    pub fn from_decoder(err: CadenceError) -> Self {
        match err {
            CadenceError::Decode(msg) => Self::Decode(msg),
            other => Self::Decode(other.to_string()),
        }
    }

    pub fn device(err: CadenceError) -> Self {
        match err {
            CadenceError::Device(msg) => Self::Device(msg),
            other => Self::Device(other.to_string()),
        }
    }
}

impl From<CadenceError> for PlaybackError {
    fn from(err: CadenceError) -> Self {
        match err {
            CadenceError::Auth(msg) => Self::Auth(msg),
            CadenceError::Decode(msg) => Self::Decode(msg),
            CadenceError::Device(msg) => Self::Device(msg),
            CadenceError::NotFound { id, .. } => Self::NotFound(TrackId::new(id)),
            CadenceError::Fetch(msg) => Self::Fetch(msg),
            other => Self::Fetch(other.to_string()),
        }
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
