//! Main Drive client.

use crate::error::{DriveError, Result};
use crate::types::DriveConfig;
use async_trait::async_trait;
use cadence_core::{CredentialProvider, FolderId, LibraryStore, TrackId, TrackMeta};
use reqwest::{Client, RequestBuilder, Response};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Client for the Drive v3 REST API, scoped to one library folder at a time.
///
/// Every request carries a bearer token from the credential provider. A 401
/// or 403 invalidates the provider's cached token so the next request
/// re-acquires one.
///
/// # Example
///
/// ```ignore
/// use cadence_drive::{DriveClient, DriveConfig, StaticTokenProvider};
/// use std::sync::Arc;
///
/// let credentials = Arc::new(StaticTokenProvider::new("ya29.token"));
/// let client = DriveClient::new(DriveConfig::default(), credentials)?;
///
/// let folder = client.ensure_folder("Cadence").await?;
/// let tracks = client.list_tracks(&folder).await?;
/// println!("Found {} tracks", tracks.len());
/// ```
pub struct DriveClient {
    pub(crate) http: Client,
    pub(crate) base_url: String,
    pub(crate) page_size: u32,
    credentials: Arc<dyn CredentialProvider>,
}

impl DriveClient {
    /// Create a new client with the given configuration.
    pub fn new(config: DriveConfig, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        let base_url = normalize_base_url(&config.api_base)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(format!("Cadence/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            page_size: config.page_size.clamp(1, 1000),
            credentials,
        })
    }

    /// Normalized API root, without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Attach a bearer token and send.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let token = self
            .credentials
            .access_token()
            .await
            .map_err(DriveError::from_credentials)?;

        request
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(DriveError::from_send)
    }

    /// Turn a non-success status into an error.
    ///
    /// `subject` names what was asked for, for the `NotFound` case.
    pub(crate) async fn check(&self, response: Response, subject: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 | 403 => {
                warn!(status = status.as_u16(), "Drive rejected credential");
                self.credentials.invalidate();
                Err(DriveError::AuthFailed(format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    message
                )))
            }
            404 => Err(DriveError::NotFound(subject.to_string())),
            code => {
                debug!(status = code, body = %message, "Drive request failed");
                Err(DriveError::Api {
                    status: code,
                    message,
                })
            }
        }
    }

    /// Decode a JSON body.
    pub(crate) async fn json<T: serde::de::DeserializeOwned>(
        response: Response,
        what: &str,
    ) -> Result<T> {
        response
            .json()
            .await
            .map_err(|e| DriveError::ParseError(format!("Failed to parse {}: {}", what, e)))
    }
}

fn normalize_base_url(raw: &str) -> Result<String> {
    if raw.trim().is_empty() {
        return Err(DriveError::InvalidUrl("URL cannot be empty".into()));
    }

    let url = raw.trim().trim_end_matches('/').to_string();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(DriveError::InvalidUrl(
            "URL must start with http:// or https://".into(),
        ));
    }

    url::Url::parse(&url).map_err(|e| DriveError::InvalidUrl(e.to_string()))?;
    Ok(url)
}

#[async_trait]
impl LibraryStore for DriveClient {
    async fn ensure_folder(&self, name: &str) -> cadence_core::Result<FolderId> {
        Ok(self.find_or_create_folder(name).await?)
    }

    async fn list_tracks(&self, folder: &FolderId) -> cadence_core::Result<Vec<TrackMeta>> {
        Ok(self.list_audio_files(folder).await?)
    }

    async fn fetch_bytes(&self, track: &TrackId) -> cadence_core::Result<Vec<u8>> {
        Ok(self.download(track).await?)
    }

    async fn upload(
        &self,
        folder: &FolderId,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> cadence_core::Result<()> {
        self.upload_bytes(folder, bytes, file_name).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        assert_eq!(
            normalize_base_url("https://www.googleapis.com///").unwrap(),
            "https://www.googleapis.com"
        );
    }

    #[test]
    fn bad_base_urls_are_rejected() {
        assert!(matches!(
            normalize_base_url(""),
            Err(DriveError::InvalidUrl(msg)) if msg.contains("empty")
        ));
        assert!(matches!(
            normalize_base_url("ftp://example.com"),
            Err(DriveError::InvalidUrl(_))
        ));
        assert!(matches!(
            normalize_base_url("googleapis.com"),
            Err(DriveError::InvalidUrl(_))
        ));
    }
}
