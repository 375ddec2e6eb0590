//! Graph API client - followers/following reads for one identity.
//!
//! This crate is the single source of truth for the graph wire contract:
//! endpoints, `api_key` header, page cap, response envelope.
//!
//! No reconciliation. No retries. No pagination beyond the first page.

mod auth;
mod client;
mod error;
mod wire;

pub use auth::ApiCredentials;
pub use client::{GraphClient, GraphFetcher, USER_AGENT};
pub use error::{FetchError, FETCH_FAILED_MESSAGE};
pub use wire::parse_users;
