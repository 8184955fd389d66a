//! Common test utilities and fixtures
#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Environment source that sees only `vars`, never the real process env
pub fn env_from(vars: &[(&str, &str)]) -> config::Environment {
    let map: config::Map<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    config::Environment::with_prefix("CADENCE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .source(Some(map))
}

/// Write `contents` to `name` inside `dir` and return the path
pub fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

pub mod fixtures {
    pub const FULL_CONFIG: &str = r#"
[drive]
api_base = "http://localhost:9000"
page_size = 200

[auth]
access_token = "file-token"

[playback]
volume = 0.8
restart_threshold_secs = 5.0
repeat = "all"
shuffle = true
library_folder = "Music"
"#;

    pub const REFRESH_ONLY: &str = r#"
[auth]
client_id = "client"
client_secret = "secret"
refresh_token = "refresh"
"#;
}
