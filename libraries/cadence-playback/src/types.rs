//! Core types for playback management

use cadence_core::TrackMeta;
use serde::{Deserialize, Serialize};

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop at the end of the queue
    #[default]
    Off,

    /// Wrap to the start of the queue
    All,

    /// Replay the current track
    One,
}

impl RepeatMode {
    /// Next mode in the `Off -> All -> One -> Off` cycle
    #[must_use]
    pub fn cycle(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }
}

impl std::fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Off => "off",
            Self::All => "all",
            Self::One => "one",
        })
    }
}

/// Coarse controller state, derived from `TransportState`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackPhase {
    /// No active track
    Idle,

    /// A fetch is in flight
    Loading,

    /// Active track is audible
    Playing,

    /// Active track is selected but silent
    Paused,
}

/// The process-wide transport state
///
/// Only the controller writes it; everyone else reads snapshots from the
/// controller handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportState {
    pub active_track: Option<TrackMeta>,

    /// Track whose fetch is in flight; the active track keeps playing meanwhile
    pub pending_track: Option<TrackMeta>,

    pub playing: bool,
    pub position_seconds: f64,

    /// `None` until the length of the active track is known
    pub duration_seconds: Option<f64>,

    /// Output gain in `[0, 1]`
    pub volume: f32,
    pub repeat_mode: RepeatMode,
    pub shuffle_on: bool,
}

impl TransportState {
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            active_track: None,
            pending_track: None,
            playing: false,
            position_seconds: 0.0,
            duration_seconds: None,
            volume: crate::volume::clamp_level(config.volume),
            repeat_mode: config.repeat,
            shuffle_on: config.shuffle,
        }
    }

    pub fn phase(&self) -> PlaybackPhase {
        if self.pending_track.is_some() {
            PlaybackPhase::Loading
        } else if self.active_track.is_none() {
            PlaybackPhase::Idle
        } else if self.playing {
            PlaybackPhase::Playing
        } else {
            PlaybackPhase::Paused
        }
    }
}

impl Default for TransportState {
    fn default() -> Self {
        Self::new(&PlaybackConfig::default())
    }
}

/// Playback configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Initial volume (0.0 - 1.0, default: 0.5)
    pub volume: f32,

    /// `prev()` restarts the current track instead of navigating once the
    /// position is past this many seconds (default: 3.0)
    pub restart_threshold_secs: f64,

    /// Initial repeat mode
    pub repeat: RepeatMode,

    /// Initial shuffle state
    pub shuffle: bool,

    /// Name of the remote folder holding the library
    pub library_folder: String,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 0.5,
            restart_threshold_secs: 3.0,
            repeat: RepeatMode::Off,
            shuffle: false,
            library_folder: "Cadence".to_string(),
        }
    }
}
