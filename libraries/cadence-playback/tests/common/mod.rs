//! Shared test doubles for playback tests
//!
//! In-memory store, decoder and device, plus a harness that drives the
//! controller one input at a time.

#![allow(dead_code)]

use async_trait::async_trait;
use cadence_core::{
    AudioDevice, CadenceError, DecodedAudio, DeviceEvent, FolderId, LibraryStore, SourceToken,
    TrackDecoder, TrackId, TrackMeta,
};
use cadence_playback::{Controller, ControllerHandle, PlaybackConfig, PlaybackNotice};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Seconds of audio the fake decoder produces for every track
pub const TRACK_SECONDS: f64 = 10.0;
const FAKE_RATE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Auth,
    Fetch,
    NotFound,
    /// Return bytes the decoder rejects
    Garbage,
}

// ===== Store =====

#[derive(Default)]
pub struct FakeStore {
    tracks: Mutex<Vec<TrackMeta>>,
    gates: Mutex<HashMap<TrackId, oneshot::Receiver<()>>>,
    failures: Mutex<HashMap<TrackId, Failure>>,
    fetches: Mutex<HashMap<TrackId, usize>>,
    list_failure: Mutex<Option<Failure>>,
    ensure_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl FakeStore {
    pub fn with_tracks(ids: &[&str]) -> Self {
        let store = Self::default();
        *store.tracks.lock().unwrap() = ids
            .iter()
            .map(|id| TrackMeta::new(*id, format!("{}.mp3", id), 1_000).with_mime_type("audio/mpeg"))
            .collect();
        store
    }

    /// Hold the next fetch of `id` until the returned sender fires (or drops)
    pub fn gate(&self, id: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(TrackId::new(id), rx);
        tx
    }

    pub fn fail(&self, id: &str, failure: Failure) {
        self.failures.lock().unwrap().insert(TrackId::new(id), failure);
    }

    pub fn fail_listing(&self, failure: Failure) {
        *self.list_failure.lock().unwrap() = Some(failure);
    }

    pub fn restore_listing(&self) {
        *self.list_failure.lock().unwrap() = None;
    }

    /// Delete a track on the remote side
    pub fn remove_remote(&self, id: &str) {
        self.tracks.lock().unwrap().retain(|t| t.id.as_str() != id);
    }

    pub fn fetch_count(&self, id: &str) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .get(&TrackId::new(id))
            .copied()
            .unwrap_or(0)
    }

    pub fn ensure_calls(&self) -> usize {
        self.ensure_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

fn failure_error(failure: Failure, id: &str) -> CadenceError {
    match failure {
        Failure::Auth => CadenceError::auth("token rejected (401)"),
        Failure::Fetch => CadenceError::fetch("connection reset"),
        Failure::NotFound => CadenceError::not_found("File", id),
        Failure::Garbage => CadenceError::fetch("unexpected garbage failure"),
    }
}

#[async_trait]
impl LibraryStore for FakeStore {
    async fn ensure_folder(&self, name: &str) -> cadence_core::Result<FolderId> {
        self.ensure_calls.fetch_add(1, Ordering::SeqCst);
        Ok(FolderId::new(format!("folder-{}", name)))
    }

    async fn list_tracks(&self, _folder: &FolderId) -> cadence_core::Result<Vec<TrackMeta>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = *self.list_failure.lock().unwrap() {
            return Err(failure_error(failure, "listing"));
        }
        Ok(self.tracks.lock().unwrap().clone())
    }

    async fn fetch_bytes(&self, track: &TrackId) -> cadence_core::Result<Vec<u8>> {
        *self.fetches.lock().unwrap().entry(track.clone()).or_insert(0) += 1;

        let gate = self.gates.lock().unwrap().remove(track);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let failure = self.failures.lock().unwrap().get(track).copied();
        match failure {
            Some(Failure::Garbage) => return Ok(b"not audio at all".to_vec()),
            Some(failure) => return Err(failure_error(failure, track.as_str())),
            None => {}
        }

        let known = self.tracks.lock().unwrap().iter().any(|t| &t.id == track);
        if !known {
            return Err(CadenceError::not_found("File", track.as_str()));
        }
        Ok(format!("audio:{}", track).into_bytes())
    }

    async fn upload(
        &self,
        _folder: &FolderId,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> cadence_core::Result<()> {
        let id = format!("up-{}", file_name);
        self.tracks
            .lock()
            .unwrap()
            .push(TrackMeta::new(id, file_name, bytes.len() as u64));
        Ok(())
    }
}

// ===== Decoder =====

pub struct FakeDecoder;

impl TrackDecoder for FakeDecoder {
    fn decode(&self, bytes: &[u8], _mime_hint: Option<&str>) -> cadence_core::Result<DecodedAudio> {
        if !bytes.starts_with(b"audio:") {
            return Err(CadenceError::decode("unrecognized format"));
        }
        let frames = (TRACK_SECONDS as usize) * FAKE_RATE as usize;
        Ok(DecodedAudio::new(vec![0.0; frames * 2], FAKE_RATE, 2))
    }
}

// ===== Device =====

#[derive(Debug, Default)]
pub struct DeviceLog {
    pub token: Option<SourceToken>,
    pub bound: bool,
    pub playing: bool,
    pub position: Duration,
    pub volume: f32,
    pub binds: usize,
    pub unbinds: usize,
}

#[derive(Clone, Default)]
pub struct FakeDevice {
    pub log: Arc<Mutex<DeviceLog>>,
}

impl AudioDevice for FakeDevice {
    fn bind(&mut self, token: SourceToken, _audio: Arc<DecodedAudio>) -> cadence_core::Result<()> {
        let mut log = self.log.lock().unwrap();
        log.token = Some(token);
        log.bound = true;
        log.playing = false;
        log.position = Duration::ZERO;
        log.binds += 1;
        Ok(())
    }

    fn unbind(&mut self) -> cadence_core::Result<()> {
        let mut log = self.log.lock().unwrap();
        log.token = None;
        log.bound = false;
        log.playing = false;
        log.unbinds += 1;
        Ok(())
    }

    fn play(&mut self) -> cadence_core::Result<()> {
        self.log.lock().unwrap().playing = true;
        Ok(())
    }

    fn pause(&mut self) -> cadence_core::Result<()> {
        self.log.lock().unwrap().playing = false;
        Ok(())
    }

    fn seek(&mut self, token: SourceToken, position: Duration) -> cadence_core::Result<()> {
        let mut log = self.log.lock().unwrap();
        log.token = Some(token);
        log.position = position;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> cadence_core::Result<()> {
        self.log.lock().unwrap().volume = volume;
        Ok(())
    }
}

// ===== Harness =====

pub struct Harness {
    pub controller: Controller<FakeDevice>,
    pub handle: ControllerHandle,
    pub store: Arc<FakeStore>,
    pub device: Arc<Mutex<DeviceLog>>,
    pub events: mpsc::UnboundedSender<DeviceEvent>,
    pub notices: broadcast::Receiver<PlaybackNotice>,
}

impl Harness {
    pub fn new(ids: &[&str]) -> Self {
        Self::with_config(PlaybackConfig::default(), ids)
    }

    pub fn with_config(config: PlaybackConfig, ids: &[&str]) -> Self {
        let store = Arc::new(FakeStore::with_tracks(ids));
        let device = FakeDevice::default();
        let log = Arc::clone(&device.log);
        let (events, events_rx) = mpsc::unbounded_channel();

        let (controller, handle) = Controller::new(
            config,
            Arc::clone(&store) as Arc<dyn LibraryStore>,
            Arc::new(FakeDecoder),
            device,
            events_rx,
        );
        let notices = handle.notices();

        Self {
            controller,
            handle,
            store,
            device: log,
            events,
            notices,
        }
    }

    /// Harness with the library already listed
    pub async fn loaded(ids: &[&str]) -> Self {
        let mut harness = Self::new(ids);
        harness.refresh().await;
        harness
    }

    /// Process exactly one input
    pub async fn step(&mut self) {
        let running = tokio::time::timeout(Duration::from_secs(2), self.controller.step())
            .await
            .expect("controller had nothing to process");
        assert!(running, "controller stopped unexpectedly");
    }

    /// Process inputs until none arrive for a short while
    pub async fn settle(&mut self) {
        while tokio::time::timeout(Duration::from_millis(100), self.controller.step())
            .await
            .is_ok()
        {}
    }

    pub async fn refresh(&mut self) {
        self.handle.refresh_library().unwrap();
        self.step().await;
        self.step().await;
    }

    /// Select a track and let its load complete
    pub async fn select(&mut self, id: &str) {
        self.handle.select_track(id).unwrap();
        self.step().await;
        self.step().await;
    }

    /// Push a device event for the current binding and process it
    pub async fn device_event(&mut self, make: impl FnOnce(SourceToken) -> DeviceEvent) {
        let token = self.token();
        self.events.send(make(token)).unwrap();
        self.step().await;
    }

    pub async fn end_track(&mut self) {
        self.device_event(|token| DeviceEvent::Ended { token }).await;
    }

    pub async fn tick(&mut self, seconds: f64) {
        self.device_event(|token| DeviceEvent::PositionChanged { token, seconds })
            .await;
    }

    pub fn token(&self) -> SourceToken {
        self.device
            .lock()
            .unwrap()
            .token
            .expect("no source bound to the device")
    }

    pub fn active_id(&self) -> Option<String> {
        self.controller
            .state()
            .active_track
            .as_ref()
            .map(|t| t.id.as_str().to_string())
    }

    pub fn pending_id(&self) -> Option<String> {
        self.controller
            .state()
            .pending_track
            .as_ref()
            .map(|t| t.id.as_str().to_string())
    }

    pub fn drain_notices(&mut self) -> Vec<PlaybackNotice> {
        let mut out = Vec::new();
        while let Ok(notice) = self.notices.try_recv() {
            out.push(notice);
        }
        out
    }
}
