//! Relationship graph HTTP client.
//!
//! Async reqwest client. One pass = two list reads (followers, following)
//! dispatched together and joined all-or-nothing. No retries.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};
use unfollowers_config::API_KEY_ENV;
use unfollowers_recon::{Identity, RelationshipKind, RelationshipSnapshot, SnapshotPair, PAGE_SIZE};

use crate::auth::ApiCredentials;
use crate::error::FetchError;
use crate::wire::{parse_users, snippet};

pub const USER_AGENT: &str = concat!("unfollowers/", env!("CARGO_PKG_VERSION"));

/// Header carrying the API key.
const API_KEY_HEADER: &str = "api_key";

/// Source of relationship snapshots for one identity.
#[async_trait]
pub trait GraphFetcher: Send + Sync {
    /// Fetch followers and following for `identity`. Either both lists come
    /// back or the pass fails; there is no partial result.
    async fn fetch_snapshots(&self, identity: Identity) -> Result<SnapshotPair, FetchError>;
}

/// Graph API client.
#[derive(Debug, Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    creds: ApiCredentials,
}

impl GraphClient {
    /// Create a client with its own HTTP connection pool.
    pub fn new(creds: ApiCredentials, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { http, creds })
    }

    /// Fetch one relationship list, capped at `PAGE_SIZE`.
    pub async fn fetch_list(
        &self,
        identity: Identity,
        kind: RelationshipKind,
    ) -> Result<RelationshipSnapshot, FetchError> {
        let api_key = self
            .creds
            .api_key
            .as_deref()
            .ok_or(FetchError::MissingCredential { env: API_KEY_ENV })?;

        let endpoint = format!("/user/{}", kind.endpoint());
        let url = format!("{}{}", self.creds.api_base, endpoint);

        debug!(%identity, endpoint = %endpoint, "requesting relationship list");

        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, api_key)
            .query(&[("fid", identity.get().to_string()), ("limit", PAGE_SIZE.to_string())])
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&endpoint, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(&endpoint, e))?;

        if !status.is_success() {
            return Err(FetchError::Http {
                endpoint,
                status: status.as_u16(),
                body: snippet(&body).to_string(),
            });
        }

        let mut users = parse_users(&endpoint, &body)?;
        if users.len() > PAGE_SIZE {
            warn!(
                endpoint = %endpoint,
                returned = users.len(),
                cap = PAGE_SIZE,
                "list exceeded page size, truncating"
            );
            users.truncate(PAGE_SIZE);
        }

        debug!(%identity, endpoint = %endpoint, count = users.len(), "relationship list received");

        Ok(RelationshipSnapshot::new(kind, users, Utc::now()))
    }
}

#[async_trait]
impl GraphFetcher for GraphClient {
    async fn fetch_snapshots(&self, identity: Identity) -> Result<SnapshotPair, FetchError> {
        if !self.creds.has_key() {
            return Err(FetchError::MissingCredential { env: API_KEY_ENV });
        }

        let (followers, following) = tokio::try_join!(
            self.fetch_list(identity, RelationshipKind::Followers),
            self.fetch_list(identity, RelationshipKind::Following),
        )?;

        Ok(SnapshotPair {
            identity,
            followers,
            following,
        })
    }
}
