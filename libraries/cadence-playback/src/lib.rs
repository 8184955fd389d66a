//! Cadence - Playback Management
//!
//! Platform-agnostic playback control for Cadence.
//!
//! This crate provides:
//! - Queue model (linear and shuffled order, repeat policies)
//! - Playback engine (fetch, decode, single active buffer, device commands)
//! - Controller state machine (the only writer of transport state)
//!
//! # Architecture
//!
//! `cadence-playback` is completely platform-agnostic:
//! - No dependency on CPAL (desktop audio)
//! - No dependency on the Drive client
//! - No dependency on a particular decoder
//!
//! Store, decoder and device are reached through the traits in `cadence-core`.
//!
//! # Example
//!
//! ```rust,no_run
//! use cadence_core::{AudioDevice, LibraryStore, TrackDecoder};
//! use cadence_playback::{Controller, PlaybackConfig};
//! use std::sync::Arc;
//!
//! async fn start<D: AudioDevice + 'static>(
//!     store: Arc<dyn LibraryStore>,
//!     decoder: Arc<dyn TrackDecoder>,
//!     device: D,
//!     device_events: tokio::sync::mpsc::UnboundedReceiver<cadence_core::DeviceEvent>,
//! ) -> cadence_playback::Result<()> {
//!     let (controller, handle) =
//!         Controller::new(PlaybackConfig::default(), store, decoder, device, device_events);
//!     tokio::spawn(controller.run());
//!
//!     handle.refresh_library()?;
//!     handle.select_track("1AbC")?;
//!     handle.set_volume(0.8)?;
//!     Ok(())
//! }
//! ```

pub mod buffer;
pub mod controller;
pub mod engine;
pub mod error;
pub mod events;
pub mod queue;
pub mod shuffle;
pub mod types;
pub mod volume;

// Re-exports
pub use buffer::{ActiveBuffer, BufferLedger};
pub use controller::{Controller, ControllerHandle, Intent};
pub use engine::{EngineEvent, LoadedTrack, PlaybackEngine};
pub use error::{PlaybackError, Result};
pub use events::PlaybackNotice;
pub use queue::{build_queue, PlayQueue, QueueStep};
pub use types::{PlaybackConfig, PlaybackPhase, RepeatMode, TransportState};
pub use volume::Volume;
