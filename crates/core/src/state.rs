//! Pass state machine: `Idle → Loading → Ready | Error`, re-entrant.
//!
//! Pure data, no I/O. Every write goes through a [`PassTicket`] so a pass
//! that has been superseded, or that finishes after teardown, cannot change
//! what the presenter sees.

use chrono::{DateTime, Utc};
use serde::Serialize;
use unfollowers_graph_client::FetchError;
use unfollowers_protocol::{PassStatus, StateMessage, UnfollowerEntry};
use unfollowers_recon::{Identity, ReconciliationResult};

/// Handle for one in-flight pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassTicket {
    generation: u64,
    identity: Identity,
}

impl PassTicket {
    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Read-only projection handed to presenters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifecycleView {
    pub status: PassStatus,
    pub identity: Option<Identity>,
    /// Some only when `status == Ready`
    pub result: Option<ReconciliationResult>,
    /// Some only when `status == Error`
    pub error_message: Option<String>,
    pub added: bool,
    /// The host has been asked to prompt for adding the frame
    pub add_frame_requested: bool,
    /// Reason of the last rejected add; cleared once the frame is added
    pub add_frame_rejected: Option<String>,
    pub notifications_enabled: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl LifecycleView {
    /// Wire form for the host protocol.
    pub fn to_message(&self) -> StateMessage {
        StateMessage {
            status: self.status,
            fid: self.identity.map(Identity::get),
            unfollowers: self.result.as_ref().map(|r| {
                r.iter()
                    .map(|u| UnfollowerEntry {
                        fid: u.id,
                        username: u.handle.clone(),
                        display_name: u.display_name.clone(),
                        observed_at: u.observed_at.to_rfc3339(),
                    })
                    .collect()
            }),
            error_message: self.error_message.clone(),
            added: self.added,
            add_frame_requested: self.add_frame_requested,
            add_frame_rejected: self.add_frame_rejected.clone(),
            notifications_enabled: self.notifications_enabled,
            updated_at: self.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Default)]
pub struct RefreshState {
    status: PassStatus,
    identity: Option<Identity>,
    result: Option<ReconciliationResult>,
    error_message: Option<String>,
    added: bool,
    add_frame_requested: bool,
    add_frame_rejected: Option<String>,
    notifications_enabled: bool,
    updated_at: Option<DateTime<Utc>>,
    generation: u64,
    torn_down: bool,
}

impl RefreshState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> PassStatus {
        self.status
    }

    pub fn identity(&self) -> Option<Identity> {
        self.identity
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Enter `Loading` for `identity`. Any earlier ticket becomes stale.
    /// Returns `None` after teardown.
    pub fn begin(&mut self, identity: Identity) -> Option<PassTicket> {
        if self.torn_down {
            return None;
        }
        self.generation += 1;
        self.status = PassStatus::Loading;
        self.identity = Some(identity);
        self.result = None;
        self.error_message = None;
        Some(PassTicket {
            generation: self.generation,
            identity,
        })
    }

    /// Apply the outcome of a pass. Returns false (and changes nothing) if
    /// the ticket is stale or the state has been torn down.
    pub fn complete(
        &mut self,
        ticket: PassTicket,
        outcome: Result<ReconciliationResult, &FetchError>,
        at: DateTime<Utc>,
    ) -> bool {
        if !self.accepts(ticket) {
            return false;
        }
        match outcome {
            Ok(mut result) => {
                result.identity = Some(ticket.identity);
                self.status = PassStatus::Ready;
                self.result = Some(result);
                self.error_message = None;
            }
            Err(err) => {
                self.status = PassStatus::Error;
                self.result = None;
                self.error_message = Some(err.user_message().to_string());
            }
        }
        self.updated_at = Some(at);
        true
    }

    /// Whether `ticket` is the current, still-observed pass.
    pub fn accepts(&self, ticket: PassTicket) -> bool {
        !self.torn_down
            && self.status == PassStatus::Loading
            && ticket.generation == self.generation
    }

    /// Returns true if the flag changed.
    pub fn set_added(&mut self, added: bool) -> bool {
        if self.torn_down || self.added == added {
            return false;
        }
        self.added = added;
        if added {
            self.add_frame_rejected = None;
        }
        true
    }

    /// Mark the add-frame prompt as requested. Only the first call while the
    /// frame is not added succeeds.
    pub fn request_add_frame(&mut self) -> bool {
        if self.torn_down || self.added || self.add_frame_requested {
            return false;
        }
        self.add_frame_requested = true;
        true
    }

    /// Record the host's reason for refusing the add.
    pub fn reject_add_frame(&mut self, reason: impl Into<String>) -> bool {
        if self.torn_down {
            return false;
        }
        self.add_frame_rejected = Some(reason.into());
        true
    }

    /// Returns true if the flag changed.
    pub fn set_notifications_enabled(&mut self, enabled: bool) -> bool {
        if self.torn_down || self.notifications_enabled == enabled {
            return false;
        }
        self.notifications_enabled = enabled;
        true
    }

    /// Stop observing. Irreversible.
    pub fn teardown(&mut self) {
        self.torn_down = true;
    }

    pub fn view(&self) -> LifecycleView {
        LifecycleView {
            status: self.status,
            identity: self.identity,
            result: self.result.clone(),
            error_message: self.error_message.clone(),
            added: self.added,
            add_frame_requested: self.add_frame_requested,
            add_frame_rejected: self.add_frame_rejected.clone(),
            notifications_enabled: self.notifications_enabled,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use unfollowers_graph_client::FETCH_FAILED_MESSAGE;
    use unfollowers_recon::UnfollowerRecord;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 9, 30, 0).unwrap()
    }

    fn result_with(ids: &[u64]) -> ReconciliationResult {
        ReconciliationResult {
            identity: None,
            limit: 5,
            unfollowers: ids
                .iter()
                .map(|&id| UnfollowerRecord {
                    id,
                    handle: format!("u{id}"),
                    display_name: None,
                    observed_at: at(),
                })
                .collect(),
        }
    }

    fn timeout() -> FetchError {
        FetchError::Timeout {
            endpoint: "/user/followers".into(),
        }
    }

    #[test]
    fn starts_idle() {
        let state = RefreshState::new();
        let view = state.view();
        assert_eq!(view.status, PassStatus::Idle);
        assert!(view.result.is_none());
        assert!(view.error_message.is_none());
        assert!(view.identity.is_none());
    }

    #[test]
    fn loading_then_ready() {
        let mut state = RefreshState::new();
        let ticket = state.begin(Identity(3)).unwrap();
        assert_eq!(state.status(), PassStatus::Loading);

        assert!(state.complete(ticket, Ok(result_with(&[2])), at()));
        let view = state.view();
        assert_eq!(view.status, PassStatus::Ready);
        let result = view.result.unwrap();
        assert_eq!(result.identity, Some(Identity(3)));
        assert_eq!(result.unfollowers[0].id, 2);
        assert_eq!(view.updated_at, Some(at()));
    }

    #[test]
    fn error_clears_previous_result() {
        let mut state = RefreshState::new();
        let t1 = state.begin(Identity(3)).unwrap();
        state.complete(t1, Ok(result_with(&[2])), at());

        let t2 = state.begin(Identity(3)).unwrap();
        assert!(state.view().result.is_none(), "no stale result while loading");
        assert!(state.complete(t2, Err(&timeout()), at()));

        let view = state.view();
        assert_eq!(view.status, PassStatus::Error);
        assert!(view.result.is_none());
        assert_eq!(view.error_message.as_deref(), Some(FETCH_FAILED_MESSAGE));
    }

    #[test]
    fn superseded_ticket_is_discarded() {
        let mut state = RefreshState::new();
        let old = state.begin(Identity(1)).unwrap();
        let new = state.begin(Identity(2)).unwrap();

        assert!(!state.complete(old, Ok(result_with(&[10])), at()));
        assert_eq!(state.status(), PassStatus::Loading);

        assert!(state.complete(new, Ok(result_with(&[20])), at()));
        assert_eq!(state.view().result.unwrap().unfollowers[0].id, 20);
        assert_eq!(state.identity(), Some(Identity(2)));
    }

    #[test]
    fn ticket_cannot_complete_twice() {
        let mut state = RefreshState::new();
        let ticket = state.begin(Identity(1)).unwrap();
        assert!(state.complete(ticket, Ok(result_with(&[1])), at()));
        assert!(!state.complete(ticket, Err(&timeout()), at()));
        assert_eq!(state.status(), PassStatus::Ready);
    }

    #[test]
    fn teardown_freezes_everything() {
        let mut state = RefreshState::new();
        let ticket = state.begin(Identity(1)).unwrap();
        state.teardown();

        assert!(!state.complete(ticket, Ok(result_with(&[1])), at()));
        assert!(state.begin(Identity(2)).is_none());
        assert!(!state.set_added(true));
        assert!(!state.set_notifications_enabled(true));
        assert!(!state.request_add_frame());
        assert!(!state.reject_add_frame("late"));

        let view = state.view();
        assert_eq!(view.status, PassStatus::Loading);
        assert_eq!(view.identity, Some(Identity(1)));
        assert!(!view.added);
        assert!(state.is_torn_down());
    }

    #[test]
    fn flags_report_changes() {
        let mut state = RefreshState::new();
        assert!(state.set_added(true));
        assert!(!state.set_added(true));
        assert!(state.set_notifications_enabled(true));
        assert!(state.set_notifications_enabled(false));
    }

    #[test]
    fn add_frame_requested_once() {
        let mut state = RefreshState::new();
        assert!(state.request_add_frame());
        assert!(!state.request_add_frame());
        assert!(state.view().add_frame_requested);

        assert!(state.reject_add_frame("rejected_by_user"));
        assert_eq!(state.view().add_frame_rejected.as_deref(), Some("rejected_by_user"));

        state.set_added(true);
        assert!(state.view().add_frame_rejected.is_none());
    }

    #[test]
    fn no_add_frame_request_when_already_added() {
        let mut state = RefreshState::new();
        state.set_added(true);
        assert!(!state.request_add_frame());
        assert!(!state.view().add_frame_requested);
    }

    #[test]
    fn view_to_message() {
        let mut state = RefreshState::new();
        state.set_added(true);
        let ticket = state.begin(Identity(3)).unwrap();
        state.complete(ticket, Ok(result_with(&[2, 4])), at());

        let msg = state.view().to_message();
        assert_eq!(msg.status, PassStatus::Ready);
        assert_eq!(msg.fid, Some(3));
        assert!(msg.added);
        let entries = msg.unfollowers.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].username, "u4");
        assert_eq!(entries[0].observed_at, "2026-02-01T09:30:00+00:00");
        assert!(msg.error_message.is_none());
    }
}
