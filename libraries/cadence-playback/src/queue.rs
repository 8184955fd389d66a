//! Queue model
//!
//! Derives the play order from the library listing. The queue is always
//! rebuilt from scratch (never patched) so it stays a permutation of the
//! library. Every function here is total: no errors, no panics.

use crate::shuffle::shuffle_tracks_with;
use crate::types::RepeatMode;
use cadence_core::{Library, TrackId, TrackMeta};
use rand::Rng;

/// Ordered sequence used for next/prev navigation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayQueue {
    tracks: Vec<TrackMeta>,
    shuffled: bool,
}

/// Result of moving forward in the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStep {
    pub index: usize,
    /// True when the step went past the end and started over
    pub wrapped: bool,
}

impl PlayQueue {
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffled
    }

    pub fn get(&self, index: usize) -> Option<&TrackMeta> {
        self.tracks.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrackMeta> {
        self.tracks.iter()
    }

    /// Index of a track, or `None` if it is no longer in the library
    pub fn index_of(&self, id: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| &t.id == id)
    }
}

/// Build the play queue for a library
///
/// Linear order is the library's order; shuffled order is a fresh uniform
/// permutation on every call.
pub fn build_queue(library: &Library, shuffle_on: bool) -> PlayQueue {
    build_queue_with(library, shuffle_on, &mut rand::thread_rng())
}

/// Same as [`build_queue`] with a caller-supplied generator
pub fn build_queue_with<R: Rng + ?Sized>(
    library: &Library,
    shuffle_on: bool,
    rng: &mut R,
) -> PlayQueue {
    let mut tracks = library.tracks().to_vec();
    if shuffle_on {
        shuffle_tracks_with(&mut tracks, rng);
    }
    PlayQueue {
        tracks,
        shuffled: shuffle_on,
    }
}

/// Step forward from `current`
///
/// Returns `None` at end of queue unless `repeat` is `All`, in which case it
/// wraps to index 0.
pub fn next(queue: &PlayQueue, current: usize, repeat: RepeatMode) -> Option<QueueStep> {
    let len = queue.len();
    if len == 0 {
        return None;
    }

    let candidate = current.saturating_add(1);
    if candidate < len {
        Some(QueueStep {
            index: candidate,
            wrapped: false,
        })
    } else if repeat == RepeatMode::All {
        Some(QueueStep {
            index: 0,
            wrapped: true,
        })
    } else {
        None
    }
}

/// Step backward from `current`
///
/// Always wraps to the last index from the first one, whatever the repeat
/// mode. `None` only for an empty queue.
pub fn prev(queue: &PlayQueue, current: usize) -> Option<usize> {
    let len = queue.len();
    if len == 0 {
        return None;
    }

    match current.checked_sub(1) {
        Some(index) if index < len => Some(index),
        _ => Some(len - 1),
    }
}
