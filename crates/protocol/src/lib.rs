//! Host Embedding Protocol - v1 Wire Format
//!
//! This crate defines the protocol types exchanged between the host runtime
//! (the frame container that knows who the viewer is) and the unfollowers
//! client. The wire format is JSONL (newline-delimited JSON) over stdio.
//!
//! # Protocol Version
//!
//! This is **protocol v1**. Changes require:
//! 1. Version bump in PROTOCOL_VERSION
//! 2. Updated golden lines in the tests below
//! 3. Backward compatibility handling
//!
//! # Usage
//!
//! ```ignore
//! use unfollowers_protocol::{parse_event, ClientMessage, HostEvent};
//!
//! let event = parse_event(r#"{"type":"context","fid":3}"#)?;
//! let line = ClientMessage::ready().to_line()?;
//! ```

use serde::{Deserialize, Serialize};

/// Current protocol version. Increment for breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed host event: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("empty line")]
    Empty,
    #[error("host event is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
}

// =============================================================================
// Host → Client
// =============================================================================

/// Lifecycle and context signals sent by the host runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// Viewer context. `fid: None` means no identity is resolved yet.
    Context {
        #[serde(default)]
        fid: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
        /// Whether the frame is already added to the viewer's client
        #[serde(default)]
        added: bool,
    },
    /// Explicit refresh request.
    Refresh,
    FrameAdded,
    FrameAddRejected {
        #[serde(default)]
        reason: String,
    },
    FrameRemoved,
    NotificationsEnabled,
    NotificationsDisabled,
    PrimaryButtonClicked,
    /// Consumer is going away. Nothing may change after this.
    Teardown,
}

impl HostEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Context { .. } => "context",
            Self::Refresh => "refresh",
            Self::FrameAdded => "frame_added",
            Self::FrameAddRejected { .. } => "frame_add_rejected",
            Self::FrameRemoved => "frame_removed",
            Self::NotificationsEnabled => "notifications_enabled",
            Self::NotificationsDisabled => "notifications_disabled",
            Self::PrimaryButtonClicked => "primary_button_clicked",
            Self::Teardown => "teardown",
        }
    }
}

/// Parse one JSONL line into a host event.
pub fn parse_event(line: &str) -> Result<HostEvent, ProtocolError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ProtocolError::Empty);
    }
    Ok(serde_json::from_str(line)?)
}

/// Parse one raw input line. Invalid UTF-8 is a protocol error like any
/// other malformed line.
pub fn parse_event_bytes(line: &[u8]) -> Result<HostEvent, ProtocolError> {
    parse_event(std::str::from_utf8(line)?)
}

// =============================================================================
// Client → Host
// =============================================================================

/// Messages written back to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Sent once, when the client is ready to receive events.
    Ready { protocol_version: u32 },
    /// Snapshot of the presentable state, sent on every change.
    State(StateMessage),
    /// A host line could not be understood.
    Error { message: String },
    /// Ask the host to prompt the viewer to add the frame. Sent at most once.
    AddFrame,
}

impl ClientMessage {
    pub fn ready() -> Self {
        Self::Ready {
            protocol_version: PROTOCOL_VERSION,
        }
    }

    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Pass status as seen by the presenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

impl PassStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for PassStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMessage {
    pub status: PassStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fid: Option<u64>,
    /// Present only when `status == ready`
    pub unfollowers: Option<Vec<UnfollowerEntry>>,
    /// Present only when `status == error`
    pub error_message: Option<String>,
    pub added: bool,
    /// Whether an `add_frame` request has been sent to the host
    #[serde(default)]
    pub add_frame_requested: bool,
    /// Reason given by the host for the last rejected add
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_frame_rejected: Option<String>,
    pub notifications_enabled: bool,
    /// RFC 3339 time of the last completed pass
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnfollowerEntry {
    pub fid: u64,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// RFC 3339
    pub observed_at: String,
}
