//! Track upload.

use crate::client::DriveClient;
use crate::error::{DriveError, Result};
use crate::types::{CreatedFile, UploadMetadata};
use cadence_core::FolderId;
use reqwest::multipart::{Form, Part};
use std::path::Path;
use tracing::{debug, info};

impl DriveClient {
    /// Upload in-memory content as a new file in `folder`.
    ///
    /// Returns the id Drive assigned to the new file.
    pub async fn upload_bytes(
        &self,
        folder: &FolderId,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<String> {
        let metadata = serde_json::to_string(&UploadMetadata {
            name: file_name,
            parents: [folder.as_str()],
        })
        .map_err(|e| DriveError::ParseError(e.to_string()))?;

        let size = bytes.len();
        let metadata_part = Part::text(metadata).mime_str("application/json")?;
        let file_part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(&audio_mime_type(file_name))?;
        let form = Form::new()
            .part("metadata", metadata_part)
            .part("file", file_part);

        let url = format!("{}/upload/drive/v3/files", self.base_url);
        debug!(url = %url, file = %file_name, size, "Uploading track");

        let request = self
            .http
            .post(&url)
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .multipart(form);
        let response = self.send(request).await?;
        let response = self.check(response, folder.as_str()).await?;
        let created: CreatedFile = Self::json(response, "upload response").await?;

        info!(file = %file_name, size, track_id = %created.id, "Track uploaded");
        Ok(created.id)
    }

    /// Upload a local audio file into `folder`.
    ///
    /// Files whose guessed content type is not `audio/*` are rejected with
    /// `DriveError::UnsupportedFile` before anything is read.
    pub async fn upload_file(&self, folder: &FolderId, path: &Path) -> Result<String> {
        if !is_audio_path(path) {
            return Err(DriveError::UnsupportedFile(path.display().to_string()));
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("track")
            .to_string();
        let contents = tokio::fs::read(path).await?;

        self.upload_bytes(folder, contents, &file_name).await
    }
}

/// True when the file extension maps to an `audio/*` content type.
pub fn is_audio_path(path: &Path) -> bool {
    mime_guess::from_path(path)
        .iter()
        .any(|m| m.type_() == mime_guess::mime::AUDIO)
}

fn audio_mime_type(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .iter()
        .find(|m| m.type_() == mime_guess::mime::AUDIO)
        .map_or_else(|| "application/octet-stream".to_string(), |m| m.to_string())
}
