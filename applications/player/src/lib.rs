//! Cadence Player Library
//!
//! Terminal player for a music library kept in a cloud drive folder: config
//! loading, the interactive session and uploads. The binary in `main.rs`
//! wires these to the playback controller and the audio device.

pub mod config;
pub mod error;
pub mod session;
pub mod upload;

pub use config::{AuthSettings, PlayerConfig};
pub use error::{PlayerError, Result};
pub use session::{parse_command, Command};
pub use upload::{UploadSummary, Uploader};
