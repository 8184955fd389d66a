//! Playback controller
//!
//! A single actor that owns the `TransportState` and is the only party allowed
//! to command the audio device. It serializes three inputs:
//!
//! - intents from any number of [`ControllerHandle`] clones
//! - events pushed by the audio device
//! - completions of its own background work (track loads, library listings)
//!
//! Background work is versioned with a generation counter. A completion whose
//! generation is no longer current is discarded on arrival, so the audible
//! result always follows the latest user action rather than the latest fetch
//! to finish.

use crate::buffer::BufferLedger;
use crate::engine::{EngineEvent, LoadedTrack, PlaybackEngine};
use crate::error::{PlaybackError, Result};
use crate::events::PlaybackNotice;
use crate::queue::{self, build_queue, PlayQueue};
use crate::types::{PlaybackConfig, RepeatMode, TransportState};
use cadence_core::{
    AudioDevice, DeviceEvent, FolderId, Library, LibraryStore, TrackDecoder, TrackId, TrackMeta,
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, warn};

const NOTICE_CAPACITY: usize = 64;

/// User intents accepted by the controller
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Play a track; selecting the active track toggles play/pause
    SelectTrack(TrackId),
    TogglePlayPause,
    Play,
    Pause,
    Next,
    Prev,
    Seek(f64),
    SetVolume(f32),
    ToggleShuffle,
    CycleRepeat,
    RefreshLibrary,
    Shutdown,
}

enum Completion {
    Load {
        generation: u64,
        track: TrackMeta,
        result: Result<LoadedTrack>,
    },
    Library {
        generation: u64,
        result: cadence_core::Result<(FolderId, Vec<TrackMeta>)>,
    },
}

/// Where next/prev navigation starts from
enum Cursor {
    Unset,
    At(usize),
    Missing(TrackId),
}

/// The playback state machine
pub struct Controller<D: AudioDevice> {
    config: PlaybackConfig,
    store: Arc<dyn LibraryStore>,
    engine: PlaybackEngine<D>,

    state: TransportState,
    library: Library,
    queue: PlayQueue,
    folder: Option<FolderId>,

    load_generation: u64,
    library_generation: u64,

    intents: mpsc::UnboundedReceiver<Intent>,
    device_events: mpsc::UnboundedReceiver<DeviceEvent>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,

    state_tx: watch::Sender<TransportState>,
    library_tx: watch::Sender<Library>,
    notice_tx: broadcast::Sender<PlaybackNotice>,
}

impl<D: AudioDevice> Controller<D> {
    /// Create a controller and the handle used to talk to it
    ///
    /// `device_events` must be the receiving end of the channel the device
    /// pushes its events into.
    pub fn new(
        config: PlaybackConfig,
        store: Arc<dyn LibraryStore>,
        decoder: Arc<dyn TrackDecoder>,
        device: D,
        device_events: mpsc::UnboundedReceiver<DeviceEvent>,
    ) -> (Self, ControllerHandle) {
        let (intent_tx, intent_rx) = mpsc::unbounded_channel();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        let mut engine = PlaybackEngine::new(Arc::clone(&store), decoder, device);
        let mut state = TransportState::new(&config);
        match engine.set_volume(state.volume) {
            Ok(level) => state.volume = level,
            Err(e) => warn!(error = %e, "Failed to apply initial volume"),
        }

        let (state_tx, state_rx) = watch::channel(state.clone());
        let (library_tx, library_rx) = watch::channel(Library::default());
        let (notice_tx, _) = broadcast::channel(NOTICE_CAPACITY);

        let handle = ControllerHandle {
            intents: intent_tx,
            state: state_rx,
            library: library_rx,
            notices: notice_tx.clone(),
        };

        let controller = Self {
            config,
            store,
            engine,
            state,
            library: Library::default(),
            queue: PlayQueue::default(),
            folder: None,
            load_generation: 0,
            library_generation: 0,
            intents: intent_rx,
            device_events,
            completion_tx,
            completion_rx,
            state_tx,
            library_tx,
            notice_tx,
        };

        (controller, handle)
    }

    /// Process inputs until shut down or every handle is dropped
    pub async fn run(mut self) {
        info!("Playback controller started");
        while self.step().await {}
        info!("Playback controller stopped");
    }

    /// Wait for one input and process it
    ///
    /// Returns `false` once the controller has shut down.
    pub async fn step(&mut self) -> bool {
        let keep_running = tokio::select! {
            biased;

            intent = self.intents.recv() => match intent {
                Some(Intent::Shutdown) | None => false,
                Some(intent) => {
                    self.handle_intent(intent);
                    true
                }
            },
            Some(event) = self.device_events.recv() => {
                self.handle_device_event(event);
                true
            }
            Some(completion) = self.completion_rx.recv() => {
                self.handle_completion(completion);
                true
            }
        };

        if !keep_running {
            self.shut_down();
        }
        self.publish();
        keep_running
    }

    pub fn state(&self) -> &TransportState {
        &self.state
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn queue(&self) -> &PlayQueue {
        &self.queue
    }

    pub fn ledger(&self) -> &BufferLedger {
        self.engine.ledger()
    }

    // ===== Intents =====

    fn handle_intent(&mut self, intent: Intent) {
        debug!(?intent, "Handling intent");
        match intent {
            Intent::SelectTrack(id) => self.select_track(&id),
            Intent::TogglePlayPause => self.toggle_play_pause(),
            Intent::Play => self.play(),
            Intent::Pause => self.pause(),
            Intent::Next => self.skip_next(),
            Intent::Prev => self.skip_prev(),
            Intent::Seek(seconds) => self.seek(seconds),
            Intent::SetVolume(level) => self.set_volume(level),
            Intent::ToggleShuffle => {
                self.state.shuffle_on = !self.state.shuffle_on;
                self.rebuild_queue();
                info!(shuffle = self.state.shuffle_on, "Shuffle toggled");
            }
            Intent::CycleRepeat => {
                self.state.repeat_mode = self.state.repeat_mode.cycle();
                info!(repeat = %self.state.repeat_mode, "Repeat mode changed");
            }
            Intent::RefreshLibrary => self.refresh_library(),
            Intent::Shutdown => {}
        }
    }

    fn select_track(&mut self, id: &TrackId) {
        if self.is_pending(id) {
            debug!(track_id = %id, "Track is already loading");
            return;
        }

        // The resident buffer still plays even if a refresh dropped the track
        if self.is_active(id) && self.engine.has_buffer() {
            if self.state.pending_track.is_some() {
                self.cancel_pending();
                if self.engine.has_ended() {
                    self.play();
                }
            } else {
                self.toggle_play_pause();
            }
            return;
        }

        let Some(track) = self.library.get(id).cloned() else {
            warn!(track_id = %id, "Selected track is not in the library");
            self.notify(PlaybackNotice::TrackUnavailable {
                track_id: id.clone(),
            });
            return;
        };

        self.start_load(track);
    }

    fn toggle_play_pause(&mut self) {
        if self.state.playing {
            self.pause();
        } else {
            self.play();
        }
    }

    fn play(&mut self) {
        if self.engine.has_buffer() {
            match self.engine.play() {
                Ok(changed) => {
                    if changed {
                        debug!("Playback resumed");
                    }
                    // Moves back to zero if the track had ended
                    self.state.position_seconds = self.engine.position();
                    self.state.playing = true;
                }
                Err(e) => self.device_failed(&e),
            }
            return;
        }

        if self.state.pending_track.is_some() {
            return;
        }

        // Released at end of queue, or nothing selected yet
        let target = self
            .state
            .active_track
            .clone()
            .or_else(|| self.queue.get(0).cloned());
        if let Some(track) = target {
            self.start_load(track);
        }
    }

    fn pause(&mut self) {
        if !self.engine.has_buffer() {
            return;
        }
        match self.engine.pause() {
            Ok(changed) => {
                if changed {
                    debug!("Playback paused");
                }
                self.state.playing = false;
            }
            Err(e) => self.device_failed(&e),
        }
    }

    fn seek(&mut self, seconds: f64) {
        if !self.engine.has_buffer() {
            debug!(seconds, "Ignoring seek with no loaded track");
            return;
        }
        match self.engine.seek(seconds) {
            Ok(position) => self.state.position_seconds = position,
            Err(e) => self.device_failed(&e),
        }
    }

    fn set_volume(&mut self, level: f32) {
        match self.engine.set_volume(level) {
            Ok(level) => self.state.volume = level,
            Err(e) => self.device_failed(&e),
        }
    }

    fn skip_next(&mut self) {
        let index = match self.cursor() {
            Cursor::At(index) => index,
            Cursor::Unset => {
                self.go_to_index(0);
                return;
            }
            Cursor::Missing(id) => {
                self.report_missing(id);
                self.go_to_index(0);
                return;
            }
        };

        match queue::next(&self.queue, index, self.state.repeat_mode) {
            Some(step) => {
                if step.wrapped {
                    debug!("Queue wrapped to start");
                }
                self.go_to_index(step.index);
            }
            None => {
                debug!("Next at end of queue");
                self.pause();
            }
        }
    }

    fn skip_prev(&mut self) {
        if self.state.pending_track.is_none()
            && self.engine.has_buffer()
            && self.state.position_seconds > self.config.restart_threshold_secs
        {
            debug!(
                position = self.state.position_seconds,
                "Restarting current track instead of moving back"
            );
            self.seek(0.0);
            return;
        }

        let last = self.queue.len().saturating_sub(1);
        let index = match self.cursor() {
            Cursor::At(index) => queue::prev(&self.queue, index),
            Cursor::Unset => Some(last),
            Cursor::Missing(id) => {
                self.report_missing(id);
                Some(last)
            }
        };
        if let Some(index) = index {
            self.go_to_index(index);
        }
    }

    fn refresh_library(&mut self) {
        self.library_generation += 1;
        let generation = self.library_generation;
        info!(generation, folder = %self.config.library_folder, "Refreshing library");

        let listing = fetch_listing(
            Arc::clone(&self.store),
            self.folder.clone(),
            self.config.library_folder.clone(),
        );
        let completions = self.completion_tx.clone();
        tokio::spawn(async move {
            let result = listing.await;
            // The controller may be gone by now
            let _ = completions.send(Completion::Library { generation, result });
        });
    }

    // ===== Navigation =====

    fn cursor(&self) -> Cursor {
        let anchor = self
            .state
            .pending_track
            .as_ref()
            .or(self.state.active_track.as_ref());
        match anchor {
            None => Cursor::Unset,
            Some(track) => self
                .queue
                .index_of(&track.id)
                .map_or_else(|| Cursor::Missing(track.id.clone()), Cursor::At),
        }
    }

    fn go_to_index(&mut self, index: usize) {
        if let Some(track) = self.queue.get(index).cloned() {
            self.go_to(track);
        }
    }

    fn go_to(&mut self, track: TrackMeta) {
        if self.is_active(&track.id) && self.engine.has_buffer() {
            self.cancel_pending();
            self.replay_active();
            return;
        }
        if self.is_pending(&track.id) {
            return;
        }
        self.start_load(track);
    }

    /// Seek to zero and play, using the bytes already resident
    fn replay_active(&mut self) {
        let result = self.engine.seek(0.0).and_then(|_| self.engine.play());
        match result {
            Ok(_) => {
                self.state.position_seconds = 0.0;
                self.state.playing = true;
            }
            Err(e) => self.device_failed(&e),
        }
    }

    fn track_ended(&mut self) {
        self.state.playing = false;
        if let Some(track) = &self.state.active_track {
            info!(track_id = %track.id, "Track ended");
        }

        if self.state.repeat_mode == RepeatMode::One {
            self.replay_active();
            return;
        }

        // A pending load takes over when it lands; load_failed covers the rest
        if self.state.pending_track.is_some() {
            return;
        }

        match self.cursor() {
            Cursor::At(index) => match queue::next(&self.queue, index, self.state.repeat_mode) {
                Some(step) => self.go_to_index(step.index),
                None => self.finish_queue(),
            },
            Cursor::Missing(id) => {
                self.report_missing(id);
                self.finish_queue();
            }
            Cursor::Unset => {}
        }
    }

    /// Paused-at-end: keep the last track selected, free its buffer
    fn finish_queue(&mut self) {
        info!("Stopped at end of track");
        if let Err(e) = self.engine.release() {
            self.device_failed(&e);
        }
        self.state.playing = false;
    }

    // ===== Loading =====

    fn start_load(&mut self, track: TrackMeta) {
        self.load_generation += 1;
        let generation = self.load_generation;
        info!(track_id = %track.id, generation, "Loading track");

        self.state.pending_track = Some(track.clone());
        let load = self.engine.load(track.clone());
        let completions = self.completion_tx.clone();
        tokio::spawn(async move {
            let result = load.await;
            let _ = completions.send(Completion::Load {
                generation,
                track,
                result,
            });
        });
    }

    fn cancel_pending(&mut self) {
        if let Some(track) = self.state.pending_track.take() {
            self.load_generation += 1;
            debug!(track_id = %track.id, "Pending load cancelled");
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Load {
                generation,
                track,
                result,
            } => self.finish_load(generation, track, result),
            Completion::Library { generation, result } => self.finish_refresh(generation, result),
        }
    }

    fn finish_load(&mut self, generation: u64, track: TrackMeta, result: Result<LoadedTrack>) {
        if generation != self.load_generation {
            debug!(
                track_id = %track.id,
                generation,
                current = self.load_generation,
                "Discarding superseded load"
            );
            return;
        }
        self.state.pending_track = None;

        match result {
            Ok(loaded) => self.activate(loaded),
            Err(err) => self.load_failed(&track, err),
        }
    }

    fn activate(&mut self, loaded: LoadedTrack) {
        let track = loaded.track().clone();
        match self.engine.activate(loaded) {
            Ok(duration) => {
                self.state.active_track = Some(track);
                self.state.position_seconds = 0.0;
                self.state.duration_seconds = Some(duration);
                self.state.playing = false;
                self.play();
            }
            Err(e) => {
                // The previous buffer was already released
                self.clear_active();
                self.device_failed(&e);
            }
        }
    }

    fn load_failed(&mut self, track: &TrackMeta, err: PlaybackError) {
        match err {
            PlaybackError::Auth(reason) => {
                warn!(track_id = %track.id, %reason, "Credential rejected while fetching track");
                self.notify(PlaybackNotice::SignInRequired);
            }
            PlaybackError::NotFound(id) => self.drop_unavailable(&id),
            other => {
                warn!(track_id = %track.id, error = %other, "Track failed to load");
                self.notify(PlaybackNotice::PlaybackFailed {
                    track_id: track.id.clone(),
                    reason: other.to_string(),
                });
            }
        }

        // The active track ran out while this load was in flight
        if self.engine.has_ended() {
            self.finish_queue();
        }
    }

    /// The store no longer knows this track: forget it everywhere
    fn drop_unavailable(&mut self, id: &TrackId) {
        warn!(track_id = %id, "Track is no longer in the remote library");
        if self.library.remove(id).is_some() {
            self.rebuild_queue();
            self.library_tx.send_replace(self.library.clone());
        }

        if self.is_active(id) {
            if let Err(e) = self.engine.release() {
                self.device_failed(&e);
            }
            self.clear_active();
        }

        self.notify(PlaybackNotice::TrackUnavailable {
            track_id: id.clone(),
        });
    }

    fn finish_refresh(
        &mut self,
        generation: u64,
        result: cadence_core::Result<(FolderId, Vec<TrackMeta>)>,
    ) {
        if generation != self.library_generation {
            debug!(generation, "Discarding superseded library listing");
            return;
        }

        match result {
            Ok((folder, tracks)) => {
                self.folder = Some(folder);
                self.library = Library::new(tracks);
                self.rebuild_queue();
                self.library_tx.send_replace(self.library.clone());

                let count = self.library.len();
                info!(count, "Library refreshed");
                self.notify(PlaybackNotice::LibraryRefreshed { count });
            }
            Err(err) if err.is_auth() => {
                warn!(error = %err, "Credential rejected while listing library");
                self.notify(PlaybackNotice::SignInRequired);
            }
            Err(err) => {
                if err.is_not_found() {
                    // Resolve the folder again on the next refresh
                    self.folder = None;
                }
                warn!(error = %err, "Library refresh failed");
                self.notify(PlaybackNotice::LibraryRefreshFailed {
                    reason: err.to_string(),
                });
            }
        }
    }

    // ===== Device =====

    fn handle_device_event(&mut self, event: DeviceEvent) {
        match self.engine.observe(event) {
            Some(EngineEvent::Position(seconds)) => self.state.position_seconds = seconds,
            Some(EngineEvent::Duration(seconds)) => self.state.duration_seconds = Some(seconds),
            Some(EngineEvent::Ended) => self.track_ended(),
            None => {}
        }
    }

    fn device_failed(&self, err: &PlaybackError) {
        error!(error = %err, "Audio device failure");
        self.notify(PlaybackNotice::DeviceFailure {
            reason: err.to_string(),
        });
    }

    fn shut_down(&mut self) {
        info!("Playback controller shutting down");
        self.cancel_pending();
        if let Err(e) = self.engine.release() {
            warn!(error = %e, "Failed to release audio device on shutdown");
        }
        self.state.playing = false;
    }

    // ===== Helpers =====

    fn rebuild_queue(&mut self) {
        self.queue = build_queue(&self.library, self.state.shuffle_on);
    }

    fn clear_active(&mut self) {
        self.state.active_track = None;
        self.state.playing = false;
        self.state.position_seconds = 0.0;
        self.state.duration_seconds = None;
    }

    fn is_active(&self, id: &TrackId) -> bool {
        self.state
            .active_track
            .as_ref()
            .is_some_and(|track| &track.id == id)
    }

    fn is_pending(&self, id: &TrackId) -> bool {
        self.state
            .pending_track
            .as_ref()
            .is_some_and(|track| &track.id == id)
    }

    fn report_missing(&self, id: TrackId) {
        warn!(track_id = %id, "Current track is no longer in the queue");
        self.notify(PlaybackNotice::TrackUnavailable { track_id: id });
    }

    fn notify(&self, notice: PlaybackNotice) {
        // No subscribers is fine
        let _ = self.notice_tx.send(notice);
    }

    fn publish(&self) {
        let state = &self.state;
        self.state_tx.send_if_modified(|current| {
            if current == state {
                false
            } else {
                current.clone_from(state);
                true
            }
        });
    }
}

async fn fetch_listing(
    store: Arc<dyn LibraryStore>,
    folder: Option<FolderId>,
    folder_name: String,
) -> cadence_core::Result<(FolderId, Vec<TrackMeta>)> {
    let folder = match folder {
        Some(folder) => folder,
        None => store.ensure_folder(&folder_name).await?,
    };
    let tracks = store.list_tracks(&folder).await?;
    Ok((folder, tracks))
}

/// Cloneable front end of a running [`Controller`]
///
/// Intent methods never block and never report playback failures; those
/// arrive as [`PlaybackNotice`]s. They only fail once the controller is gone.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    intents: mpsc::UnboundedSender<Intent>,
    state: watch::Receiver<TransportState>,
    library: watch::Receiver<Library>,
    notices: broadcast::Sender<PlaybackNotice>,
}

impl ControllerHandle {
    pub fn send(&self, intent: Intent) -> Result<()> {
        self.intents
            .send(intent)
            .map_err(|_| PlaybackError::ControllerClosed)
    }

    pub fn select_track(&self, id: impl Into<TrackId>) -> Result<()> {
        self.send(Intent::SelectTrack(id.into()))
    }

    pub fn toggle_play_pause(&self) -> Result<()> {
        self.send(Intent::TogglePlayPause)
    }

    pub fn play(&self) -> Result<()> {
        self.send(Intent::Play)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(Intent::Pause)
    }

    pub fn next(&self) -> Result<()> {
        self.send(Intent::Next)
    }

    pub fn prev(&self) -> Result<()> {
        self.send(Intent::Prev)
    }

    pub fn seek(&self, seconds: f64) -> Result<()> {
        self.send(Intent::Seek(seconds))
    }

    pub fn set_volume(&self, level: f32) -> Result<()> {
        self.send(Intent::SetVolume(level))
    }

    pub fn toggle_shuffle(&self) -> Result<()> {
        self.send(Intent::ToggleShuffle)
    }

    pub fn cycle_repeat(&self) -> Result<()> {
        self.send(Intent::CycleRepeat)
    }

    pub fn refresh_library(&self) -> Result<()> {
        self.send(Intent::RefreshLibrary)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(Intent::Shutdown)
    }

    /// Snapshot of the transport state
    pub fn state(&self) -> TransportState {
        self.state.borrow().clone()
    }

    /// Receiver that wakes on every transport change
    pub fn subscribe(&self) -> watch::Receiver<TransportState> {
        self.state.clone()
    }

    /// Snapshot of the current library listing
    pub fn library(&self) -> Library {
        self.library.borrow().clone()
    }

    pub fn library_updates(&self) -> watch::Receiver<Library> {
        self.library.clone()
    }

    pub fn notices(&self) -> broadcast::Receiver<PlaybackNotice> {
        self.notices.subscribe()
    }
}
