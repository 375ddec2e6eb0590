// Saved identity from the last resolved session
// Stored at ~/.config/unfollowers/session.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Session {
    pub version: u32,
    /// Last resolved identity
    pub fid: Option<u64>,
    /// Handle of that identity (display only)
    pub username: Option<String>,
}

impl Session {
    pub const VERSION: u32 = 1;

    pub fn new(fid: u64, username: Option<String>) -> Self {
        Self {
            version: Self::VERSION,
            fid: Some(fid),
            username,
        }
    }

    pub fn path() -> PathBuf {
        crate::config_dir().join("session.json")
    }

    pub fn load() -> Option<Self> {
        Self::load_from(&Self::path())
    }

    pub fn load_from(path: &Path) -> Option<Self> {
        fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        crate::write_json(path, self, "session")
    }
}
