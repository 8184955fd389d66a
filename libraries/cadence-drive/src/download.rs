//! Track content download.

use crate::client::DriveClient;
use crate::error::Result;
use cadence_core::TrackId;
use tracing::{debug, info};

impl DriveClient {
    /// Download the full content of a file.
    pub async fn download(&self, track: &TrackId) -> Result<Vec<u8>> {
        let url = format!("{}/drive/v3/files/{}", self.base_url, track);
        debug!(url = %url, track_id = %track, "Downloading track");

        let request = self.http.get(&url).query(&[("alt", "media")]);
        let response = self.send(request).await?;
        let response = self.check(response, track.as_str()).await?;
        let bytes = response.bytes().await?;

        info!(track_id = %track, size = bytes.len(), "Track downloaded");
        Ok(bytes.to_vec())
    }
}
