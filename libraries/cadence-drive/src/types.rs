//! Types for Drive API requests and responses.

use cadence_core::TrackMeta;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content type Drive uses for folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Configuration for the Drive client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// API root (e.g. "https://www.googleapis.com")
    pub api_base: String,
    /// Files per listing page
    pub page_size: u32,
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl DriveConfig {
    /// Create a config pointing at a different API root (tests, proxies).
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            ..Self::default()
        }
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.googleapis.com".to_string(),
            page_size: 1000,
            timeout_secs: 60,
            connect_timeout_secs: 10,
        }
    }
}

// =============================================================================
// Files
// =============================================================================

/// A file resource as returned by `files.list`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    /// Drive reports sizes as decimal strings
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
}

impl DriveFile {
    pub fn is_audio(&self) -> bool {
        self.mime_type.starts_with("audio/")
    }

    pub fn into_track(self) -> TrackMeta {
        let byte_size = self
            .size
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        TrackMeta {
            id: self.id.into(),
            display_name: self.name,
            byte_size,
            mime_type: self.mime_type,
            created_time: self.created_time,
        }
    }
}

/// One page of `files.list`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    pub next_page_token: Option<String>,
}

/// Minimal file resource returned by create calls.
#[derive(Debug, Deserialize)]
pub struct CreatedFile {
    pub id: String,
}

/// Request body for creating a folder.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest<'a> {
    pub name: &'a str,
    pub mime_type: &'a str,
}

/// Metadata part of a multipart upload.
#[derive(Debug, Serialize)]
pub struct UploadMetadata<'a> {
    pub name: &'a str,
    pub parents: [&'a str; 1],
}

// =============================================================================
// OAuth
// =============================================================================

/// Response from the OAuth token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Token validity in seconds
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drive_file_converts_to_track() {
        let file: DriveFile = serde_json::from_value(serde_json::json!({
            "id": "1AbC",
            "name": "Song.mp3",
            "size": "4096",
            "mimeType": "audio/mpeg",
            "createdTime": "2024-03-01T10:20:30.000Z"
        }))
        .unwrap();

        assert!(file.is_audio());
        let track = file.into_track();
        assert_eq!(track.id.as_str(), "1AbC");
        assert_eq!(track.byte_size, 4096);
        assert_eq!(track.mime_type, "audio/mpeg");
        assert!(track.created_time.is_some());
    }

    #[test]
    fn missing_or_bad_size_is_zero() {
        let file: DriveFile = serde_json::from_value(serde_json::json!({
            "id": "x",
            "name": "x.ogg",
            "size": "lots",
            "mimeType": "audio/ogg"
        }))
        .unwrap();
        assert_eq!(file.into_track().byte_size, 0);
    }

    #[test]
    fn default_config_targets_google() {
        let config = DriveConfig::default();
        assert_eq!(config.api_base, "https://www.googleapis.com");
        assert_eq!(config.page_size, 1000);
    }
}
