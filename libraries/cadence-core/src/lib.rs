//! Cadence Core
//!
//! Platform-agnostic types, traits, and error handling shared by every
//! Cadence crate.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `TrackMeta`, `Library`, `DecodedAudio`, `DeviceEvent`
//! - **Seam Traits**: `CredentialProvider`, `LibraryStore`, `TrackDecoder`, `AudioDevice`
//! - **Error Handling**: Unified `CadenceError` and `Result` types
//!
//! Nothing in here performs I/O. Concrete stores, decoders and devices live in
//! their own crates and are wired together by the playback controller.
//!
//! # Example
//!
//! ```rust
//! use cadence_core::types::{Library, TrackId, TrackMeta};
//!
//! let library = Library::new(vec![
//!     TrackMeta::new("a1", "Intro.mp3", 1_024),
//!     TrackMeta::new("b2", "Outro.mp3", 2_048),
//! ]);
//!
//! assert_eq!(library.len(), 2);
//! assert_eq!(library.position(&TrackId::new("b2")), Some(1));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{CadenceError, Result};
pub use traits::{AudioDevice, CredentialProvider, LibraryStore, TrackDecoder};

pub use types::{
    AccessToken, DecodedAudio, DeviceEvent, FolderId, Library, SourceToken, TrackId, TrackMeta,
};
