//! Tests against the real default output device
//!
//! Headless machines have no output device; each test returns early there.

use cadence_audio_desktop::{CpalDevice, DeviceError};
use cadence_core::{AudioDevice, DecodedAudio, DeviceEvent, SourceToken};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn open() -> Option<(CpalDevice, mpsc::UnboundedReceiver<DeviceEvent>)> {
    let (tx, rx) = mpsc::unbounded_channel();
    match CpalDevice::open(tx) {
        Ok(device) => Some((device, rx)),
        Err(
            DeviceError::DeviceNotFound
            | DeviceError::ConfigError(_)
            | DeviceError::StreamBuildError(_)
            | DeviceError::PlayError(_),
        ) => None,
        Err(e) => panic!("Unexpected error: {}", e),
    }
}

fn silence(device: &CpalDevice, seconds: f64) -> Arc<DecodedAudio> {
    let rate = device.sample_rate();
    let frames = (f64::from(rate) * seconds) as usize;
    Arc::new(DecodedAudio::new(vec![0.0; frames * 2], rate, 2))
}

#[test]
fn test_open_reports_format() {
    let Some((device, _rx)) = open() else {
        return;
    };
    assert!(device.sample_rate() > 0);
    assert!(device.format().channels > 0);
}

#[tokio::test]
async fn test_bind_resolves_duration() {
    let Some((mut device, mut rx)) = open() else {
        return;
    };
    let audio = silence(&device, 1.0);
    device.bind(SourceToken(7), audio).unwrap();

    let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();
    match event {
        DeviceEvent::DurationResolved { token, seconds } => {
            assert_eq!(token, SourceToken(7));
            assert!((seconds - 1.0).abs() < 0.01);
        }
        other => panic!("Expected DurationResolved, got {:?}", other),
    }
}

#[tokio::test]
async fn test_short_source_plays_to_end() {
    let Some((mut device, mut rx)) = open() else {
        return;
    };
    let audio = silence(&device, 0.2);
    device.set_volume(0.0).unwrap();
    device.bind(SourceToken(1), audio).unwrap();
    device.play().unwrap();

    let ended = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(event) = rx.recv().await {
            if let DeviceEvent::Ended { token } = event {
                return token;
            }
        }
        panic!("event channel closed");
    })
    .await
    .unwrap();
    assert_eq!(ended, SourceToken(1));
}

#[test]
fn test_commands_after_unbind_succeed() {
    let Some((mut device, _rx)) = open() else {
        return;
    };
    device.unbind().unwrap();
    device.play().unwrap();
    device.pause().unwrap();
    device.seek(SourceToken(2), Duration::from_secs(1)).unwrap();
}
