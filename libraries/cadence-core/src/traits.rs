//! Seam traits between the playback controller and its collaborators
//!
//! The controller never reaches a network, codec or sound card directly; it
//! only sees these traits. Desktop and test builds plug in different
//! implementations.

use crate::error::Result;
use crate::types::{AccessToken, DecodedAudio, FolderId, SourceToken, TrackId, TrackMeta};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Supplies bearer tokens for the remote library
///
/// The consent flow that produced the credential is outside Cadence; an
/// implementation only hands out the current token and forgets it when told
/// the remote side rejected it.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Return a usable bearer token
    ///
    /// # Errors
    /// Returns `CadenceError::Auth` if no token can be produced
    async fn access_token(&self) -> Result<AccessToken>;

    /// Drop any cached token so the next call re-acquires one
    fn invalidate(&self) {}
}

/// Remote, folder-scoped object store holding the audio files
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// Find a folder by name, creating it if it does not exist
    async fn ensure_folder(&self, name: &str) -> Result<FolderId>;

    /// List the audio files in a folder, in store order
    ///
    /// Trashed items and non-audio content are excluded.
    async fn list_tracks(&self, folder: &FolderId) -> Result<Vec<TrackMeta>>;

    /// Download the full content of one track
    ///
    /// # Errors
    /// `Auth` if the credential is rejected, `NotFound` if the id is stale,
    /// `Fetch` for everything else
    async fn fetch_bytes(&self, track: &TrackId) -> Result<Vec<u8>>;

    /// Upload a file into a folder
    async fn upload(&self, folder: &FolderId, bytes: Vec<u8>, file_name: &str) -> Result<()>;
}

/// Turns encoded bytes into playable samples
///
/// Decoding is CPU-bound; callers run it on a blocking worker.
pub trait TrackDecoder: Send + Sync {
    /// Decode a complete in-memory file
    ///
    /// `mime_hint` is the content type reported by the store, if any.
    ///
    /// # Errors
    /// Returns `CadenceError::Decode` if the bytes are not a supported format
    fn decode(&self, bytes: &[u8], mime_hint: Option<&str>) -> Result<DecodedAudio>;
}

/// The single process-wide audio output
///
/// At most one source is bound at a time. Every event the device reports
/// carries the `SourceToken` of the binding that produced it.
pub trait AudioDevice: Send {
    /// Switch the device to a new source, replacing any previous one
    ///
    /// The device starts paused at position zero.
    fn bind(&mut self, token: SourceToken, audio: Arc<DecodedAudio>) -> Result<()>;

    /// Detach the current source, if any
    fn unbind(&mut self) -> Result<()>;

    /// Start or resume output
    fn play(&mut self) -> Result<()>;

    /// Pause output, keeping the position
    fn pause(&mut self) -> Result<()>;

    /// Move the play head of the bound source and re-tag it
    ///
    /// Events produced after the seek carry `token`, so anything the device
    /// reported before it can be told apart.
    fn seek(&mut self, token: SourceToken, position: Duration) -> Result<()>;

    /// Set the output gain (0.0 = silent, 1.0 = full volume)
    fn set_volume(&mut self, volume: f32) -> Result<()>;
}
