//! CLI Exit Code Registry
//!
//! Single source of truth for the exit codes of the `unfollowers` binary.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code  | Meaning                                        |
//! |-------|------------------------------------------------|
//! | 0     | Success                                        |
//! | 1     | General error (unspecified)                    |
//! | 2     | Usage error (bad args, no identity to check)   |
//! | 50    | No API key (flag, env var, or keychain)        |
//! | 51    | Upstream rejected the request or network error |
//! | 52    | Upstream answered with an unexpected shape     |
//! | 53    | Request timed out                              |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Update the table above
//! 3. Wire it into `fetch_exit_code` or the relevant command

use unfollowers_graph_client::FetchError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing identity.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Fetch (50-59)
// =============================================================================

/// No API key provided (neither flag, env var nor keychain).
pub const EXIT_FETCH_NOT_AUTH: u8 = 50;

/// Upstream returned a non-success status, or the network failed.
pub const EXIT_FETCH_UPSTREAM: u8 = 51;

/// Upstream body did not match `{ result: { users: [...] } }`.
pub const EXIT_FETCH_MALFORMED: u8 = 52;

/// Request exceeded the configured timeout.
pub const EXIT_FETCH_TIMEOUT: u8 = 53;

/// Map a FetchError to its exit code.
pub fn fetch_exit_code(err: &FetchError) -> u8 {
    match err {
        FetchError::MissingCredential { .. } => EXIT_FETCH_NOT_AUTH,
        FetchError::Client(_) => EXIT_ERROR,
        FetchError::Network { .. } | FetchError::Http { .. } => EXIT_FETCH_UPSTREAM,
        FetchError::MalformedResponse { .. } => EXIT_FETCH_MALFORMED,
        FetchError::Timeout { .. } => EXIT_FETCH_TIMEOUT,
    }
}
