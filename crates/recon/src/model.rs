use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, TimeZone, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// Fixed per-call cap on relationship lists. Graphs larger than this are
/// observed lossily.
pub const PAGE_SIZE: usize = 200;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Numeric id of the subject account (a Farcaster fid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub u64);

impl Identity {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Identity {
    fn from(fid: u64) -> Self {
        Self(fid)
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A member of a relationship list, as returned by the graph API.
///
/// Equality and hashing look at `id` only. An `unfollowed_at` that is
/// neither RFC 3339 nor epoch milliseconds reads as absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "fid")]
    pub id: u64,
    #[serde(rename = "username")]
    pub handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(
        default,
        rename = "unfollowed_at",
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub observed_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Millis(i64),
    FractionalMillis(f64),
    Other(IgnoredAny),
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let parsed = match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Text(text) => DateTime::parse_from_rfc3339(text.trim())
            .map(|t| t.with_timezone(&Utc))
            .ok()
            .or_else(|| text.trim().parse::<i64>().ok().and_then(from_millis)),
        RawTimestamp::Millis(ms) => from_millis(ms),
        RawTimestamp::FractionalMillis(ms) if ms.is_finite() => from_millis(ms as i64),
        RawTimestamp::FractionalMillis(_) | RawTimestamp::Other(_) => None,
    };
    Ok(parsed)
}

fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

impl UserRecord {
    pub fn new(id: u64, handle: impl Into<String>) -> Self {
        Self {
            id,
            handle: handle.into(),
            display_name: None,
            observed_at: None,
        }
    }

    pub fn observed(mut self, at: DateTime<Utc>) -> Self {
        self.observed_at = Some(at);
        self
    }
}

impl PartialEq for UserRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for UserRecord {}

impl Hash for UserRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// Accounts following the identity.
    Followers,
    /// Accounts the identity follows.
    Following,
}

impl RelationshipKind {
    /// Path segment of the list endpoint.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Followers => "followers",
            Self::Following => "following",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

/// One capped relationship list, as of `fetched_at`.
#[derive(Debug, Clone)]
pub struct RelationshipSnapshot {
    pub kind: RelationshipKind,
    pub users: Vec<UserRecord>,
    pub fetched_at: DateTime<Utc>,
}

impl RelationshipSnapshot {
    pub fn new(kind: RelationshipKind, users: Vec<UserRecord>, fetched_at: DateTime<Utc>) -> Self {
        Self { kind, users, fetched_at }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Followers and following lists fetched within the same pass.
#[derive(Debug, Clone)]
pub struct SnapshotPair {
    pub identity: Identity,
    pub followers: RelationshipSnapshot,
    pub following: RelationshipSnapshot,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnfollowerRecord {
    pub id: u64,
    pub handle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub observed_at: DateTime<Utc>,
}

/// Ranked unfollowers, newest first, at most `limit` entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
    pub limit: usize,
    pub unfollowers: Vec<UnfollowerRecord>,
}

impl ReconciliationResult {
    pub fn empty(limit: usize) -> Self {
        Self {
            identity: None,
            limit,
            unfollowers: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.unfollowers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unfollowers.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UnfollowerRecord> {
        self.unfollowers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_record_wire_names() {
        let json = r#"{"fid":3,"username":"dwr","display_name":"Dan","unfollowed_at":"2026-01-15T10:00:00Z","pfp_url":"x"}"#;
        let user: UserRecord = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, 3);
        assert_eq!(user.handle, "dwr");
        assert_eq!(user.display_name.as_deref(), Some("Dan"));
        assert!(user.observed_at.is_some());

        let back = serde_json::to_value(&user).unwrap();
        assert_eq!(back["fid"], 3);
        assert_eq!(back["username"], "dwr");
        assert_eq!(back["display_name"], "Dan");
    }

    #[test]
    fn extra_fields_do_not_collide() {
        let json = r#"{"fid":7,"id":99,"username":"a","handle":"b","display_name":"A","displayName":"B"}"#;
        let user: UserRecord = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.handle, "a");
        assert_eq!(user.display_name.as_deref(), Some("A"));
    }

    #[test]
    fn timestamp_accepts_epoch_millis() {
        let expected = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let ms = expected.timestamp_millis();
        for json in [
            format!(r#"{{"fid":1,"username":"a","unfollowed_at":{ms}}}"#),
            format!(r#"{{"fid":1,"username":"a","unfollowed_at":"{ms}"}}"#),
            format!(r#"{{"fid":1,"username":"a","unfollowed_at":{ms}.0}}"#),
        ] {
            let user: UserRecord = serde_json::from_str(&json).unwrap();
            assert_eq!(user.observed_at, Some(expected), "{json}");
        }
    }

    #[test]
    fn unreadable_timestamp_is_absent() {
        for value in [r#""last tuesday""#, "null", "true", r#"{"t":1}"#] {
            let json = format!(r#"{{"fid":1,"username":"a","unfollowed_at":{value}}}"#);
            let user: UserRecord = serde_json::from_str(&json).unwrap();
            assert!(user.observed_at.is_none(), "{value}");
        }
    }

    #[test]
    fn user_record_missing_handle_is_error() {
        assert!(serde_json::from_str::<UserRecord>(r#"{"fid":7}"#).is_err());
    }

    #[test]
    fn equality_is_by_id() {
        assert_eq!(UserRecord::new(1, "a"), UserRecord::new(1, "renamed"));
        assert_ne!(UserRecord::new(1, "a"), UserRecord::new(2, "a"));
    }

    #[test]
    fn identity_is_transparent() {
        assert_eq!(serde_json::to_string(&Identity(42)).unwrap(), "42");
        assert_eq!(Identity(42).to_string(), "42");
    }
}
