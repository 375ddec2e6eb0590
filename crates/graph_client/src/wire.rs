//! Response envelope of the list endpoints: `{ "result": { "users": [...] } }`.

use serde::Deserialize;
use unfollowers_recon::UserRecord;

use crate::error::FetchError;

#[derive(Debug, Deserialize)]
struct UsersEnvelope {
    result: UsersResult,
}

#[derive(Debug, Deserialize)]
struct UsersResult {
    users: Vec<UserRecord>,
}

/// Parse a list response body. Any other shape is a malformed response.
pub fn parse_users(endpoint: &str, body: &str) -> Result<Vec<UserRecord>, FetchError> {
    // Some proxies prepend a BOM
    let trimmed = body.trim_start_matches('\u{feff}');
    let envelope: UsersEnvelope =
        serde_json::from_str(trimmed).map_err(|e| FetchError::MalformedResponse {
            endpoint: endpoint.to_string(),
            message: format!("{} (body: {})", e, snippet(trimmed)),
        })?;
    Ok(envelope.result.users)
}

/// First 200 chars of a body, for error messages.
pub(crate) fn snippet(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
