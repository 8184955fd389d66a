//! Cadence Drive Client
//!
//! Remote library store for Cadence, backed by the Google Drive v3 REST API.
//!
//! # Features
//!
//! - **Library folder**: find-or-create by name
//! - **Listing**: audio-only, non-trashed, paged, oldest first
//! - **Download**: full file content for decoding
//! - **Upload**: multipart upload of local audio files
//! - **Credentials**: static bearer token or refresh-token exchange
//!
//! # Example
//!
//! ```ignore
//! use cadence_core::LibraryStore;
//! use cadence_drive::{DriveClient, DriveConfig, StaticTokenProvider};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = Arc::new(StaticTokenProvider::new("ya29.token"));
//!     let client = DriveClient::new(DriveConfig::default(), credentials)?;
//!
//!     let folder = client.ensure_folder("Cadence").await?;
//!     for track in client.list_tracks(&folder).await? {
//!         println!("{} ({} bytes)", track.display_name, track.byte_size);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod auth;
mod client;
mod download;
mod error;
mod library;
mod types;
mod upload;

// Re-export main types
pub use auth::{RefreshTokenConfig, RefreshTokenProvider, StaticTokenProvider};
pub use client::DriveClient;
pub use error::{DriveError, Result};
pub use types::{DriveConfig, DriveFile, FileList};
pub use upload::is_audio_path;
