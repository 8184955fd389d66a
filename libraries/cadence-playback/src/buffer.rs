//! ActiveBuffer lifecycle
//!
//! At most one `ActiveBuffer` may be alive at a time. The ledger counts live
//! buffers so callers (and tests) can check that rapid track switching never
//! leaks one.

use cadence_core::{DecodedAudio, TrackMeta};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
struct Counts {
    live: AtomicUsize,
    created: AtomicU64,
}

/// Shared counter of materialized buffers
#[derive(Debug, Clone, Default)]
pub struct BufferLedger {
    counts: Arc<Counts>,
}

impl BufferLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffers currently alive
    pub fn live(&self) -> usize {
        self.counts.live.load(Ordering::SeqCst)
    }

    /// Buffers created since the ledger was made
    pub fn created(&self) -> u64 {
        self.counts.created.load(Ordering::SeqCst)
    }

    pub(crate) fn open(&self, track: TrackMeta, audio: Arc<DecodedAudio>) -> ActiveBuffer {
        self.counts.live.fetch_add(1, Ordering::SeqCst);
        let serial = self.counts.created.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(track_id = %track.id, serial, "Buffer materialized");
        ActiveBuffer {
            track,
            audio,
            serial,
            ledger: self.clone(),
        }
    }
}

/// Playable local copy of the currently loaded track
///
/// Owned exclusively by the playback engine. Dropping it frees the samples
/// (once the device lets go of its handle) and updates the ledger.
#[derive(Debug)]
pub struct ActiveBuffer {
    track: TrackMeta,
    audio: Arc<DecodedAudio>,
    serial: u64,
    ledger: BufferLedger,
}

impl ActiveBuffer {
    pub fn track(&self) -> &TrackMeta {
        &self.track
    }

    pub fn audio(&self) -> &Arc<DecodedAudio> {
        &self.audio
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn duration_seconds(&self) -> f64 {
        self.audio.duration().as_secs_f64()
    }

    /// Release the buffer now
    pub fn release(self) {
        debug!(track_id = %self.track.id, serial = self.serial, "Releasing buffer");
    }
}

impl Drop for ActiveBuffer {
    fn drop(&mut self) {
        self.ledger.counts.live.fetch_sub(1, Ordering::SeqCst);
    }
}
