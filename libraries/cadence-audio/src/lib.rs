//! Cadence Audio
//!
//! Turns fetched audio files into playable sample buffers.
//!
//! This crate provides:
//! - Audio decoding via Symphonia (MP3, FLAC, OGG, WAV, AAC) straight from
//!   in-memory bytes
//! - Downmixing of any channel layout to interleaved stereo f32
//! - Optional conversion to the output device's sample rate (rubato)
//!
//! # Example
//!
//! ```rust,no_run
//! use cadence_audio::SymphoniaDecoder;
//! use cadence_core::TrackDecoder;
//!
//! # fn example(bytes: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let decoder = SymphoniaDecoder::with_target_rate(48_000);
//! let audio = decoder.decode(&bytes, Some("audio/mpeg"))?;
//!
//! println!("Decoded {} frames at {} Hz", audio.frames(), audio.sample_rate);
//! # Ok(())
//! # }
//! ```

mod decoder;
mod error;
pub mod resample;

pub use decoder::SymphoniaDecoder;
pub use error::{AudioError, Result};
