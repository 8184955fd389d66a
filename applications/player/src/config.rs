/// Player configuration
use crate::error::{PlayerError, Result};
use cadence_core::CredentialProvider;
use cadence_drive::{DriveConfig, RefreshTokenConfig, RefreshTokenProvider, StaticTokenProvider};
use cadence_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Config file read when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "cadence.toml";

/// Prefix for environment overrides, e.g. `CADENCE_AUTH__ACCESS_TOKEN`
pub const ENV_PREFIX: &str = "CADENCE";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default)]
    pub drive: DriveConfig,

    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub playback: PlaybackConfig,
}

/// Credentials for the Drive API.
///
/// Either a ready bearer token, or the three values needed to mint tokens
/// from a refresh token. The token takes precedence when both are present.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthSettings {
    pub access_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub token_url: Option<String>,
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

impl AuthSettings {
    fn refresh_config(&self) -> Option<RefreshTokenConfig> {
        let client_id = present(self.client_id.as_ref())?;
        let client_secret = present(self.client_secret.as_ref())?;
        let refresh_token = present(self.refresh_token.as_ref())?;
        let mut config = RefreshTokenConfig {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            refresh_token: refresh_token.to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
        };
        if let Some(url) = present(self.token_url.as_ref()) {
            config.token_url = url.to_string();
        }
        Some(config)
    }

    pub fn has_credentials(&self) -> bool {
        present(self.access_token.as_ref()).is_some() || self.refresh_config().is_some()
    }

    /// Build the provider these settings describe
    pub fn provider(&self) -> Result<Arc<dyn CredentialProvider>> {
        if let Some(token) = present(self.access_token.as_ref()) {
            return Ok(Arc::new(StaticTokenProvider::new(token)));
        }
        match self.refresh_config() {
            Some(config) => Ok(Arc::new(RefreshTokenProvider::new(config)?)),
            None => Err(missing_credentials()),
        }
    }
}

fn missing_credentials() -> PlayerError {
    PlayerError::Config(
        "No Drive credentials: set auth.access_token (CADENCE_AUTH__ACCESS_TOKEN) \
         or auth.client_id, auth.client_secret and auth.refresh_token"
            .to_string(),
    )
}

impl PlayerConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `cadence.toml` in the working
    /// directory is read if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(
            path,
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
    }

    /// Load with a caller-supplied environment source
    pub fn load_with_env(path: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(PlayerError::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(env);

        let config = settings.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.auth.has_credentials() {
            return Err(missing_credentials());
        }

        if self.playback.library_folder.trim().is_empty() {
            return Err(PlayerError::Config(
                "playback.library_folder must not be empty".to_string(),
            ));
        }

        if !self.playback.restart_threshold_secs.is_finite()
            || self.playback.restart_threshold_secs < 0.0
        {
            return Err(PlayerError::Config(format!(
                "playback.restart_threshold_secs must be a non-negative number, got {}",
                self.playback.restart_threshold_secs
            )));
        }

        Ok(())
    }
}
