//! Credential resolution for the graph API.
//!
//! Precedence: explicit value (CLI flag) > `NEYNAR_API_KEY` > keychain.
//! A missing key is not an error here; it surfaces as
//! `FetchError::MissingCredential` when a fetch is attempted.

use unfollowers_config::{get_api_key, KeyLookup, KeySource};

/// Credentials and endpoint for the graph API.
#[derive(Clone)]
pub struct ApiCredentials {
    /// Value of the `api_key` header
    pub api_key: Option<String>,
    /// API base URL (e.g., "https://api.neynar.com/v2/farcaster")
    pub api_base: String,
    /// Where the key came from (for diagnostics)
    pub source: KeySource,
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("source", &self.source)
            .finish()
    }
}

impl ApiCredentials {
    pub fn new(api_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self::from_lookup(
            KeyLookup {
                key: Some(api_key.into()),
                source: KeySource::Explicit,
            },
            api_base,
        )
    }

    /// Resolve from an optional explicit key, falling back to env/keychain.
    pub fn resolve(explicit: Option<String>, api_base: impl Into<String>) -> Self {
        let explicit = explicit
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        let lookup = match explicit {
            Some(key) => KeyLookup {
                key: Some(key),
                source: KeySource::Explicit,
            },
            None => get_api_key(),
        };
        Self::from_lookup(lookup, api_base)
    }

    pub fn from_lookup(lookup: KeyLookup, api_base: impl Into<String>) -> Self {
        let api_key = lookup
            .key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        let source = if api_key.is_some() { lookup.source } else { KeySource::None };
        Self {
            api_key,
            api_base: normalize_base(&api_base.into()),
            source,
        }
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }
}

fn normalize_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}
