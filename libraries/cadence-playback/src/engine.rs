//! Playback engine
//!
//! Owns the single audio device and the single `ActiveBuffer`. Loading is
//! split in two: `load()` fetches and decodes off the controller (it returns
//! a detached future), `activate()` swaps the result in. Superseded loads are
//! simply never activated, so they never become a buffer.

use crate::buffer::{ActiveBuffer, BufferLedger};
use crate::error::{PlaybackError, Result};
use crate::volume::{clamp_position, Volume};
use cadence_core::{
    AudioDevice, DecodedAudio, DeviceEvent, LibraryStore, SourceToken, TrackDecoder, TrackMeta,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Fetched and decoded track, not yet bound to the device
#[derive(Debug)]
pub struct LoadedTrack {
    track: TrackMeta,
    audio: DecodedAudio,
}

impl LoadedTrack {
    pub fn new(track: TrackMeta, audio: DecodedAudio) -> Self {
        Self { track, audio }
    }

    pub fn track(&self) -> &TrackMeta {
        &self.track
    }
}

/// Device notification that belongs to the current binding
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineEvent {
    Position(f64),
    Duration(f64),
    Ended,
}

/// Drives the audio device on behalf of the controller
pub struct PlaybackEngine<D: AudioDevice> {
    store: Arc<dyn LibraryStore>,
    decoder: Arc<dyn TrackDecoder>,
    device: D,
    ledger: BufferLedger,
    active: Option<ActiveBuffer>,
    token: Option<SourceToken>,
    last_token: u64,
    playing: bool,
    position: f64,
    duration: Option<f64>,
    volume: Volume,
    ended_reported: bool,
}

impl<D: AudioDevice> PlaybackEngine<D> {
    pub fn new(store: Arc<dyn LibraryStore>, decoder: Arc<dyn TrackDecoder>, device: D) -> Self {
        Self {
            store,
            decoder,
            device,
            ledger: BufferLedger::new(),
            active: None,
            token: None,
            last_token: 0,
            playing: false,
            position: 0.0,
            duration: None,
            volume: Volume::default(),
            ended_reported: false,
        }
    }

    /// Fetch and decode a track
    ///
    /// The returned future borrows nothing from the engine, so it can run on a
    /// spawned task while the engine keeps serving the current track. Decoding
    /// happens on a blocking worker.
    pub fn load(
        &self,
        track: TrackMeta,
    ) -> impl Future<Output = Result<LoadedTrack>> + Send + 'static {
        let store = Arc::clone(&self.store);
        let decoder = Arc::clone(&self.decoder);

        async move {
            debug!(track_id = %track.id, "Fetching track bytes");
            let bytes = store
                .fetch_bytes(&track.id)
                .await
                .map_err(|e| PlaybackError::from_store(e, &track.id))?;

            let hint = track.mime_hint().map(str::to_owned);
            let audio = tokio::task::spawn_blocking(move || decoder.decode(&bytes, hint.as_deref()))
                .await
                .map_err(|e| PlaybackError::Decode(format!("decoder task failed: {}", e)))?
                .map_err(PlaybackError::from_decoder)?;

            Ok(LoadedTrack { track, audio })
        }
    }

    /// Make a loaded track the active one
    ///
    /// Order: new buffer ready, old buffer released, device switched. The
    /// device is left paused at position zero. Returns the track length.
    pub fn activate(&mut self, loaded: LoadedTrack) -> Result<f64> {
        let LoadedTrack { track, audio } = loaded;
        let audio = Arc::new(audio);
        let buffer = self.ledger.open(track, Arc::clone(&audio));
        let duration = buffer.duration_seconds();

        if let Some(old) = self.active.take() {
            old.release();
        }

        let token = self.issue_token();
        self.token = None;
        self.playing = false;
        self.position = 0.0;
        self.duration = None;
        self.ended_reported = false;

        self.device.bind(token, audio).map_err(PlaybackError::device)?;

        info!(track_id = %buffer.track().id, token = token.0, duration, "Track bound to device");
        self.token = Some(token);
        self.duration = Some(duration);
        self.active = Some(buffer);
        Ok(duration)
    }

    /// Unbind the device and free the active buffer
    pub fn release(&mut self) -> Result<()> {
        self.token = None;
        self.playing = false;
        self.ended_reported = false;
        if let Some(buffer) = self.active.take() {
            buffer.release();
            self.device.unbind().map_err(PlaybackError::device)?;
        }
        Ok(())
    }

    /// Start output; `Ok(false)` if already playing
    ///
    /// A track that already ended starts over from the top.
    pub fn play(&mut self) -> Result<bool> {
        if self.active.is_none() {
            return Err(PlaybackError::NoTrackLoaded);
        }
        if self.playing {
            return Ok(false);
        }
        if self.ended_reported {
            self.seek(0.0)?;
        }
        self.device.play().map_err(PlaybackError::device)?;
        self.playing = true;
        Ok(true)
    }

    /// Pause output; `Ok(false)` if already paused
    pub fn pause(&mut self) -> Result<bool> {
        if self.active.is_none() {
            return Err(PlaybackError::NoTrackLoaded);
        }
        if !self.playing {
            return Ok(false);
        }
        self.device.pause().map_err(PlaybackError::device)?;
        self.playing = false;
        Ok(true)
    }

    /// Move the play head, clamped to the track; returns the applied position
    ///
    /// The binding gets a fresh token, so position and end events the device
    /// queued before the seek no longer count.
    pub fn seek(&mut self, seconds: f64) -> Result<f64> {
        if self.active.is_none() {
            return Err(PlaybackError::NoTrackLoaded);
        }
        let target = clamp_position(seconds, self.duration);
        let token = self.issue_token();
        self.device
            .seek(token, Duration::from_secs_f64(target))
            .map_err(PlaybackError::device)?;
        trace!(token = token.0, position = target, "Binding re-tagged by seek");
        self.token = Some(token);
        self.position = target;
        self.ended_reported = false;
        Ok(target)
    }

    /// Set output gain, clamped to `[0, 1]`; returns the applied level
    pub fn set_volume(&mut self, level: f32) -> Result<f32> {
        let volume = Volume::new(level);
        self.device
            .set_volume(volume.level())
            .map_err(PlaybackError::device)?;
        self.volume = volume;
        Ok(volume.level())
    }

    /// Filter a device event against the current binding
    ///
    /// Events from earlier bindings or from before the last seek are dropped,
    /// and `Ended` is reported at most once per pass.
    pub fn observe(&mut self, event: DeviceEvent) -> Option<EngineEvent> {
        if self.token != Some(event.token()) {
            trace!(token = event.token().0, "Dropping stale device event");
            return None;
        }

        match event {
            DeviceEvent::PositionChanged { seconds, .. } => {
                self.position = seconds;
                Some(EngineEvent::Position(seconds))
            }
            DeviceEvent::DurationResolved { seconds, .. } => {
                self.duration = Some(seconds);
                Some(EngineEvent::Duration(seconds))
            }
            DeviceEvent::Ended { .. } => {
                if self.ended_reported {
                    return None;
                }
                self.ended_reported = true;
                self.playing = false;
                Some(EngineEvent::Ended)
            }
        }
    }

    pub fn has_buffer(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_track(&self) -> Option<&TrackMeta> {
        self.active.as_ref().map(ActiveBuffer::track)
    }

    /// The bound track played through and nothing restarted it
    pub fn has_ended(&self) -> bool {
        self.active.is_some() && self.ended_reported
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn volume(&self) -> f32 {
        self.volume.level()
    }

    pub fn current_token(&self) -> Option<SourceToken> {
        self.token
    }

    pub fn ledger(&self) -> &BufferLedger {
        &self.ledger
    }

    fn issue_token(&mut self) -> SourceToken {
        self.last_token += 1;
        SourceToken(self.last_token)
    }
}
