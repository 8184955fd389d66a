//! Core domain types for Cadence

mod audio;
mod ids;
mod track;

pub use audio::{DecodedAudio, DeviceEvent, SourceToken};
pub use ids::{AccessToken, FolderId, TrackId};
pub use track::{Library, TrackMeta};
