//! Desktop audio output for Cadence
//!
//! Implements [`cadence_core::AudioDevice`] on top of CPAL. One device is
//! opened per process; decoded tracks are bound to it and it reports play
//! head movement and end of source as [`cadence_core::DeviceEvent`]s.
//!
//! ```rust,no_run
//! use cadence_audio_desktop::CpalDevice;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (events_tx, _events_rx) = tokio::sync::mpsc::unbounded_channel();
//! let device = CpalDevice::open(events_tx)?;
//! println!("Output at {} Hz", device.sample_rate());
//! # Ok(())
//! # }
//! ```

mod error;
mod output;
mod render;

pub use error::{DeviceError, Result};
pub use output::{CpalDevice, OutputFormat};
