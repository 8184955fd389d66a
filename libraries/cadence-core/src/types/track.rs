//! Track listing types

use super::ids::TrackId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One playable item as listed by the remote store
///
/// Immutable once listed. A fresh listing replaces the whole `Library`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMeta {
    pub id: TrackId,
    pub display_name: String,
    pub byte_size: u64,
    /// Content type reported by the store (e.g. `audio/mpeg`)
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
}

impl TrackMeta {
    /// Create a track with no content type or creation time
    pub fn new(id: impl Into<TrackId>, display_name: impl Into<String>, byte_size: u64) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            byte_size,
            mime_type: String::new(),
            created_time: None,
        }
    }

    /// Set the content type
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Content type, if the store reported one
    pub fn mime_hint(&self) -> Option<&str> {
        if self.mime_type.is_empty() {
            None
        } else {
            Some(&self.mime_type)
        }
    }
}

/// Ordered listing of a library folder, in store order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Library {
    tracks: Vec<TrackMeta>,
}

impl Library {
    pub fn new(tracks: Vec<TrackMeta>) -> Self {
        Self { tracks }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrackMeta> {
        self.tracks.iter()
    }

    pub fn tracks(&self) -> &[TrackMeta] {
        &self.tracks
    }

    /// Look up a track by id
    pub fn get(&self, id: &TrackId) -> Option<&TrackMeta> {
        self.tracks.iter().find(|t| &t.id == id)
    }

    /// Position of a track in store order
    pub fn position(&self, id: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| &t.id == id)
    }

    pub fn contains(&self, id: &TrackId) -> bool {
        self.position(id).is_some()
    }

    /// Drop a track that the store no longer knows, returning it
    pub fn remove(&mut self, id: &TrackId) -> Option<TrackMeta> {
        let index = self.position(id)?;
        Some(self.tracks.remove(index))
    }
}

impl From<Vec<TrackMeta>> for Library {
    fn from(tracks: Vec<TrackMeta>) -> Self {
        Self::new(tracks)
    }
}

impl<'a> IntoIterator for &'a Library {
    type Item = &'a TrackMeta;
    type IntoIter = std::slice::Iter<'a, TrackMeta>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.iter()
    }
}
