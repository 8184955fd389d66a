//! Playback engine tests
//!
//! Exercises the engine directly, without the controller on top.

mod common;

use cadence_core::{DeviceEvent, LibraryStore, SourceToken, TrackMeta};
use cadence_playback::{EngineEvent, PlaybackEngine, PlaybackError};
use common::{Failure, FakeDecoder, FakeDevice, FakeStore, TRACK_SECONDS};
use std::sync::Arc;

fn engine(ids: &[&str]) -> (PlaybackEngine<FakeDevice>, Arc<FakeStore>, FakeDevice) {
    let store = Arc::new(FakeStore::with_tracks(ids));
    let device = FakeDevice::default();
    let engine = PlaybackEngine::new(
        Arc::clone(&store) as Arc<dyn LibraryStore>,
        Arc::new(FakeDecoder),
        device.clone(),
    );
    (engine, store, device)
}

fn track(id: &str) -> TrackMeta {
    TrackMeta::new(id, format!("{}.mp3", id), 1_000)
}

#[tokio::test]
async fn load_does_not_touch_the_device() {
    let (engine, _store, device) = engine(&["a"]);

    let loaded = engine.load(track("a")).await.unwrap();

    assert_eq!(loaded.track().id.as_str(), "a");
    assert_eq!(engine.ledger().created(), 0);
    assert_eq!(device.log.lock().unwrap().binds, 0);
}

#[tokio::test]
async fn activate_swaps_buffers_and_tokens() {
    let (mut engine, _store, device) = engine(&["a", "b"]);

    let first = engine.load(track("a")).await.unwrap();
    let duration = engine.activate(first).unwrap();
    assert_eq!(duration, TRACK_SECONDS);
    let token_a = engine.current_token().unwrap();

    let second = engine.load(track("b")).await.unwrap();
    engine.activate(second).unwrap();
    let token_b = engine.current_token().unwrap();

    assert_ne!(token_a, token_b);
    assert_eq!(engine.ledger().live(), 1);
    assert_eq!(engine.ledger().created(), 2);
    assert_eq!(engine.active_track().map(|t| t.id.as_str()), Some("b"));
    assert_eq!(device.log.lock().unwrap().token, Some(token_b));
}

#[tokio::test]
async fn load_errors_are_classified() {
    let (engine, store, _device) = engine(&["auth", "net", "junk"]);
    store.fail("auth", Failure::Auth);
    store.fail("net", Failure::Fetch);
    store.fail("junk", Failure::Garbage);

    assert!(matches!(
        engine.load(track("auth")).await,
        Err(PlaybackError::Auth(_))
    ));
    assert!(matches!(
        engine.load(track("net")).await,
        Err(PlaybackError::Fetch(_))
    ));
    assert!(matches!(
        engine.load(track("junk")).await,
        Err(PlaybackError::Decode(_))
    ));
    assert!(matches!(
        engine.load(track("missing")).await,
        Err(PlaybackError::NotFound(id)) if id.as_str() == "missing"
    ));
}

#[tokio::test]
async fn transport_without_track_is_an_error() {
    let (mut engine, _store, _device) = engine(&[]);

    assert!(matches!(engine.play(), Err(PlaybackError::NoTrackLoaded)));
    assert!(matches!(engine.pause(), Err(PlaybackError::NoTrackLoaded)));
    assert!(matches!(engine.seek(1.0), Err(PlaybackError::NoTrackLoaded)));
    assert!(engine.release().is_ok());
}

#[tokio::test]
async fn play_and_pause_report_changes_only() {
    let (mut engine, _store, device) = engine(&["a"]);
    let loaded = engine.load(track("a")).await.unwrap();
    engine.activate(loaded).unwrap();

    assert!(engine.play().unwrap());
    assert!(!engine.play().unwrap());
    assert!(device.log.lock().unwrap().playing);

    assert!(engine.pause().unwrap());
    assert!(!engine.pause().unwrap());
    assert!(!device.log.lock().unwrap().playing);
}

#[tokio::test]
async fn stale_and_repeated_end_events_are_filtered() {
    let (mut engine, _store, _device) = engine(&["a"]);
    let loaded = engine.load(track("a")).await.unwrap();
    engine.activate(loaded).unwrap();
    engine.play().unwrap();
    let token = engine.current_token().unwrap();

    let stale = DeviceEvent::Ended {
        token: SourceToken(token.0 + 100),
    };
    assert_eq!(engine.observe(stale), None);

    assert_eq!(
        engine.observe(DeviceEvent::Ended { token }),
        Some(EngineEvent::Ended)
    );
    assert!(!engine.is_playing());
    assert_eq!(engine.observe(DeviceEvent::Ended { token }), None);

    // Seeking back re-arms the end notification under a new token
    engine.seek(0.0).unwrap();
    let restarted = engine.current_token().unwrap();
    assert_ne!(restarted, token);
    assert_eq!(
        engine.observe(DeviceEvent::Ended { token: restarted }),
        Some(EngineEvent::Ended)
    );
}

#[tokio::test]
async fn events_queued_before_a_seek_are_dropped() {
    let (mut engine, _store, device) = engine(&["a"]);
    let loaded = engine.load(track("a")).await.unwrap();
    engine.activate(loaded).unwrap();
    engine.play().unwrap();
    let before = engine.current_token().unwrap();

    engine.seek(0.0).unwrap();
    let after = engine.current_token().unwrap();
    assert_eq!(device.log.lock().unwrap().token, Some(after));

    let late_tick = DeviceEvent::PositionChanged {
        token: before,
        seconds: 9.9,
    };
    assert_eq!(engine.observe(late_tick), None);
    assert_eq!(engine.observe(DeviceEvent::Ended { token: before }), None);
    assert_eq!(engine.position(), 0.0);
    assert!(engine.is_playing());
}

#[tokio::test]
async fn play_after_end_restarts_from_the_top() {
    let (mut engine, _store, device) = engine(&["a"]);
    let loaded = engine.load(track("a")).await.unwrap();
    engine.activate(loaded).unwrap();
    engine.play().unwrap();
    let token = engine.current_token().unwrap();
    engine.observe(DeviceEvent::PositionChanged {
        token,
        seconds: TRACK_SECONDS,
    });
    engine.observe(DeviceEvent::Ended { token });

    assert!(engine.play().unwrap());

    let restarted = engine.current_token().unwrap();
    assert_ne!(restarted, token);
    assert_eq!(engine.position(), 0.0);
    assert!(device.log.lock().unwrap().playing);
    assert_eq!(
        engine.observe(DeviceEvent::Ended { token: restarted }),
        Some(EngineEvent::Ended)
    );
}

#[tokio::test]
async fn duration_event_updates_seek_bound() {
    let (mut engine, _store, _device) = engine(&["a"]);
    let loaded = engine.load(track("a")).await.unwrap();
    engine.activate(loaded).unwrap();
    let token = engine.current_token().unwrap();

    engine.observe(DeviceEvent::DurationResolved {
        token,
        seconds: 4.0,
    });
    assert_eq!(engine.duration(), Some(4.0));
    assert_eq!(engine.seek(99.0).unwrap(), 4.0);
}

#[tokio::test]
async fn release_unbinds_and_frees_buffer() {
    let (mut engine, _store, device) = engine(&["a"]);
    let loaded = engine.load(track("a")).await.unwrap();
    engine.activate(loaded).unwrap();

    engine.release().unwrap();

    assert!(!engine.has_buffer());
    assert_eq!(engine.current_token(), None);
    assert_eq!(engine.ledger().live(), 0);
    let log = device.log.lock().unwrap();
    assert!(!log.bound);
    assert_eq!(log.unbinds, 1);
}

#[tokio::test]
async fn volume_is_clamped_before_reaching_device() {
    let (mut engine, _store, device) = engine(&[]);
    assert_eq!(engine.volume(), 0.5);

    assert_eq!(engine.set_volume(2.0).unwrap(), 1.0);
    assert_eq!(device.log.lock().unwrap().volume, 1.0);
    assert_eq!(engine.set_volume(f32::NAN).unwrap(), 0.0);
    assert_eq!(engine.volume(), 0.0);
}
