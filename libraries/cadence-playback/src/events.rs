//! Playback notices
//!
//! One-shot, user-facing reports broadcast by the controller. Failures never
//! escape an intent call; they arrive here instead, alongside the matching
//! state transition.

use cadence_core::TrackId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Notices emitted by the controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackNotice {
    /// Credential rejected; the user has to sign in again
    SignInRequired,

    /// Fetch or decode of a selected track failed
    PlaybackFailed {
        track_id: TrackId,
        reason: String,
    },

    /// Track no longer exists in the remote library
    TrackUnavailable {
        track_id: TrackId,
    },

    /// A fresh listing replaced the library
    LibraryRefreshed {
        count: usize,
    },

    LibraryRefreshFailed {
        reason: String,
    },

    /// Audio output misbehaved
    DeviceFailure {
        reason: String,
    },
}

impl fmt::Display for PlaybackNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignInRequired => write!(f, "Session expired, sign in again"),
            Self::PlaybackFailed { track_id, reason } => {
                write!(f, "Could not play {}: {}", track_id, reason)
            }
            Self::TrackUnavailable { track_id } => {
                write!(f, "Track {} is no longer available", track_id)
            }
            Self::LibraryRefreshed { count } => write!(f, "Library refreshed: {} tracks", count),
            Self::LibraryRefreshFailed { reason } => {
                write!(f, "Library refresh failed: {}", reason)
            }
            Self::DeviceFailure { reason } => write!(f, "Audio device failure: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_render_for_the_user() {
        let notice = PlaybackNotice::PlaybackFailed {
            track_id: TrackId::new("abc"),
            reason: "timeout".to_string(),
        };
        assert_eq!(notice.to_string(), "Could not play abc: timeout");
        assert_eq!(
            PlaybackNotice::LibraryRefreshed { count: 3 }.to_string(),
            "Library refreshed: 3 tracks"
        );
    }
}
