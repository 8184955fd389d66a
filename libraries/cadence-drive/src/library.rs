//! Folder lookup and track listing.

use crate::client::DriveClient;
use crate::error::Result;
use crate::types::{CreateFolderRequest, CreatedFile, FileList, FOLDER_MIME_TYPE};
use cadence_core::{FolderId, TrackMeta};
use tracing::{debug, info};

const LIST_FIELDS: &str = "nextPageToken,files(id,name,size,mimeType,createdTime)";

impl DriveClient {
    /// Find a non-trashed folder by name, creating it if missing.
    pub async fn find_or_create_folder(&self, name: &str) -> Result<FolderId> {
        if let Some(id) = self.find_folder(name).await? {
            debug!(folder = %name, folder_id = %id, "Found library folder");
            return Ok(id);
        }
        self.create_folder(name).await
    }

    /// Look up a folder by exact name.
    pub async fn find_folder(&self, name: &str) -> Result<Option<FolderId>> {
        let query = format!(
            "mimeType = '{}' and name = '{}' and trashed = false",
            FOLDER_MIME_TYPE,
            escape_query(name)
        );
        let url = format!("{}/drive/v3/files", self.base_url);

        let request = self.http.get(&url).query(&[
            ("q", query.as_str()),
            ("fields", "files(id,name)"),
            ("pageSize", "1"),
        ]);
        let response = self.send(request).await?;
        let response = self.check(response, name).await?;
        let list: FileList = Self::json(response, "folder lookup").await?;

        Ok(list.files.into_iter().next().map(|f| FolderId::new(f.id)))
    }

    /// Create a folder in the Drive root.
    pub async fn create_folder(&self, name: &str) -> Result<FolderId> {
        let url = format!("{}/drive/v3/files", self.base_url);
        let body = CreateFolderRequest {
            name,
            mime_type: FOLDER_MIME_TYPE,
        };

        let request = self.http.post(&url).query(&[("fields", "id")]).json(&body);
        let response = self.send(request).await?;
        let response = self.check(response, name).await?;
        let created: CreatedFile = Self::json(response, "created folder").await?;

        info!(folder = %name, folder_id = %created.id, "Created library folder");
        Ok(FolderId::new(created.id))
    }

    /// List audio files in a folder, oldest first, following every page.
    pub async fn list_audio_files(&self, folder: &FolderId) -> Result<Vec<TrackMeta>> {
        let query = format!(
            "'{}' in parents and mimeType contains 'audio/' and trashed = false",
            escape_query(folder.as_str())
        );
        let url = format!("{}/drive/v3/files", self.base_url);
        let page_size = self.page_size.to_string();

        let mut tracks = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut params = vec![
                ("q", query.as_str()),
                ("fields", LIST_FIELDS),
                ("pageSize", page_size.as_str()),
                ("orderBy", "createdTime"),
            ];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }

            debug!(url = %url, folder_id = %folder, page = pages, "Listing folder");
            let request = self.http.get(&url).query(&params);
            let response = self.send(request).await?;
            let response = self.check(response, folder.as_str()).await?;
            let list: FileList = Self::json(response, "file list").await?;
            pages += 1;

            tracks.extend(
                list.files
                    .into_iter()
                    .filter(|f| f.is_audio())
                    .map(|f| f.into_track()),
            );

            match list.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        info!(folder_id = %folder, tracks = tracks.len(), pages, "Listed library folder");
        Ok(tracks)
    }
}

/// Escape a value for a single-quoted Drive query string.
pub(crate) fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
