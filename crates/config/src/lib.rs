// Configuration loading

pub mod keys;
pub mod session;
pub mod settings;

use std::path::PathBuf;

pub use keys::{get_api_key, KeyLookup, KeySource, API_KEY_ENV};
pub use session::Session;
pub use settings::Settings;

/// Name of the per-user configuration directory.
pub const APP_DIR: &str = "unfollowers";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("keychain error: {0}")]
    Keychain(String),
}

/// `<config_dir>/unfollowers`, or `./unfollowers` when the platform has none.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

pub(crate) fn write_json<T: serde::Serialize>(
    path: &std::path::Path,
    value: &T,
    what: &'static str,
) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(value)
        .map_err(|source| ConfigError::Serialize { what, source })?;
    std::fs::write(path, json).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}
