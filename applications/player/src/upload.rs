//! Uploading local files into the library folder

use crate::error::Result;
use cadence_drive::{is_audio_path, DriveClient};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of one upload batch
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UploadSummary {
    pub uploaded: Vec<PathBuf>,
    /// Not audio by content type
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl fmt::Display for UploadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uploaded {} file(s)", self.uploaded.len())?;
        if !self.skipped.is_empty() {
            write!(f, ", skipped {} non-audio", self.skipped.len())?;
        }
        for (path, reason) in &self.failed {
            write!(f, "\n  failed {}: {}", path.display(), reason)?;
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct Uploader {
    client: Arc<DriveClient>,
    folder_name: String,
}

impl Uploader {
    pub fn new(client: Arc<DriveClient>, folder_name: impl Into<String>) -> Self {
        Self {
            client,
            folder_name: folder_name.into(),
        }
    }

    /// Upload every audio file in `files` to the library folder.
    ///
    /// Non-audio files are skipped and per-file failures are collected; only
    /// failing to resolve the folder aborts the batch.
    pub async fn upload_all(&self, files: &[PathBuf]) -> Result<UploadSummary> {
        let mut summary = UploadSummary::default();

        let (audio, other): (Vec<&PathBuf>, Vec<&PathBuf>) =
            files.iter().partition(|path| is_audio_path(path));
        for path in other {
            warn!(path = %path.display(), "Skipping non-audio file");
            summary.skipped.push(path.clone());
        }
        if audio.is_empty() {
            return Ok(summary);
        }

        let folder = self.client.find_or_create_folder(&self.folder_name).await?;

        for path in audio {
            match self.client.upload_file(&folder, Path::new(path)).await {
                Ok(id) => {
                    info!(path = %path.display(), file_id = %id, "Uploaded");
                    summary.uploaded.push(path.clone());
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Upload failed");
                    summary.failed.push((path.clone(), e.to_string()));
                }
            }
        }

        Ok(summary)
    }
}
