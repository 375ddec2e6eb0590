// Graph API key lookup
//
// The key is resolved from:
// 1. Environment variable NEYNAR_API_KEY (process configuration)
// 2. System keychain (fallback for interactive use)
//
// Keys are NEVER stored in settings.json

use std::env;

use crate::ConfigError;

/// Environment variable holding the graph API key.
pub const API_KEY_ENV: &str = "NEYNAR_API_KEY";

/// Service name for keychain storage
const KEYCHAIN_SERVICE: &str = "unfollowers";

/// Keychain account for the graph API key
const KEYCHAIN_ACCOUNT: &str = "graph/neynar";

/// Source of an API key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Key passed explicitly (e.g. a CLI flag)
    Explicit,
    /// Key retrieved from environment variable
    Environment,
    /// Key retrieved from system keychain
    Keychain,
    /// No key found
    None,
}

impl KeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::Explicit => "explicit",
            KeySource::Environment => "environment",
            KeySource::Keychain => "keychain",
            KeySource::None => "none",
        }
    }
}

/// Result of key lookup
#[derive(Debug, Clone)]
pub struct KeyLookup {
    pub key: Option<String>,
    pub source: KeySource,
}

impl KeyLookup {
    pub fn missing() -> Self {
        Self { key: None, source: KeySource::None }
    }

    pub fn is_present(&self) -> bool {
        self.key.is_some()
    }
}

/// Get the graph API key (environment first, then keychain).
pub fn get_api_key() -> KeyLookup {
    lookup(API_KEY_ENV, KEYCHAIN_ACCOUNT)
}

fn lookup(env_name: &str, account: &str) -> KeyLookup {
    if let Ok(key) = env::var(env_name) {
        let key = key.trim();
        if !key.is_empty() {
            return KeyLookup {
                key: Some(key.to_string()),
                source: KeySource::Environment,
            };
        }
    }

    #[cfg(feature = "keychain")]
    {
        if let Ok(entry) = keyring::Entry::new(KEYCHAIN_SERVICE, account) {
            if let Ok(key) = entry.get_password() {
                if !key.trim().is_empty() {
                    return KeyLookup {
                        key: Some(key.trim().to_string()),
                        source: KeySource::Keychain,
                    };
                }
            }
        }
    }
    #[cfg(not(feature = "keychain"))]
    let _ = account;

    KeyLookup::missing()
}

/// Store the API key in the system keychain
#[cfg(feature = "keychain")]
pub fn set_api_key(key: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT)
        .map_err(|e| ConfigError::Keychain(format!("failed to create keychain entry: {e}")))?;

    entry
        .set_password(key.trim())
        .map_err(|e| ConfigError::Keychain(format!("failed to store key in keychain: {e}")))
}

#[cfg(not(feature = "keychain"))]
pub fn set_api_key(_key: &str) -> Result<(), ConfigError> {
    Err(ConfigError::Keychain(format!(
        "keychain support not enabled; set {API_KEY_ENV} instead"
    )))
}

/// Delete the API key from the system keychain
#[cfg(feature = "keychain")]
pub fn delete_api_key() -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT)
        .map_err(|e| ConfigError::Keychain(format!("failed to access keychain entry: {e}")))?;

    entry
        .delete_credential()
        .map_err(|e| ConfigError::Keychain(format!("failed to delete key from keychain: {e}")))
}

#[cfg(not(feature = "keychain"))]
pub fn delete_api_key() -> Result<(), ConfigError> {
    Err(ConfigError::Keychain("keychain support not enabled".to_string()))
}

/// Check if keychain support is available
pub fn keychain_available() -> bool {
    #[cfg(feature = "keychain")]
    {
        keyring::Entry::new(KEYCHAIN_SERVICE, "availability").is_ok()
    }
    #[cfg(not(feature = "keychain"))]
    {
        false
    }
}
