//! Host-driven refresh loop.
//!
//! One task owns the [`RefreshState`]. Passes run as spawned tasks and hand
//! their outcome back over a channel tagged with the ticket they were started
//! with, so only the latest pass can land.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use unfollowers_graph_client::{FetchError, GraphFetcher};
use unfollowers_protocol::{HostEvent, PassStatus};
use unfollowers_recon::{reconcile, Identity, ReconciliationResult};

use crate::state::{LifecycleView, PassTicket, RefreshState};

type PassOutcome = (PassTicket, Result<ReconciliationResult, FetchError>);

pub struct RefreshLifecycle<F> {
    fetcher: Arc<F>,
    limit: usize,
    state: RefreshState,
    view_tx: watch::Sender<LifecycleView>,
}

impl<F: GraphFetcher + 'static> RefreshLifecycle<F> {
    pub fn new(fetcher: F, limit: usize) -> Self {
        Self::with_shared(Arc::new(fetcher), limit)
    }

    pub fn with_shared(fetcher: Arc<F>, limit: usize) -> Self {
        let state = RefreshState::new();
        let (view_tx, _) = watch::channel(state.view());
        Self {
            fetcher,
            limit,
            state,
            view_tx,
        }
    }

    /// Receiver that sees every published view.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleView> {
        self.view_tx.subscribe()
    }

    pub fn view(&self) -> LifecycleView {
        self.state.view()
    }

    /// Run a single pass to completion.
    ///
    /// The state ends in `Ready` or `Error` either way; the fetch error is
    /// returned as well so callers can pick an exit code.
    pub async fn refresh_once(&mut self, identity: Identity) -> Result<LifecycleView, FetchError> {
        let Some(ticket) = self.begin(identity) else {
            return Ok(self.view());
        };
        let outcome = run_pass(self.fetcher.as_ref(), identity, self.limit).await;
        match outcome {
            Ok(result) => {
                self.finish(ticket, Ok(result));
                Ok(self.view())
            }
            Err(err) => {
                self.finish(ticket, Err(&err));
                Err(err)
            }
        }
    }

    /// Drive the lifecycle from host events until teardown or until the
    /// sender is dropped. Returns the final view.
    pub async fn run(mut self, mut events: mpsc::Receiver<HostEvent>) -> LifecycleView {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<PassOutcome>();

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        debug!("host event stream closed");
                        break;
                    };
                    if !self.handle_event(event, &done_tx) {
                        break;
                    }
                }
                Some((ticket, outcome)) = done_rx.recv() => {
                    match outcome {
                        Ok(result) => self.finish(ticket, Ok(result)),
                        Err(err) => self.finish(ticket, Err(&err)),
                    }
                }
            }
        }

        self.state.teardown();
        info!("lifecycle torn down");
        self.state.view()
    }

    /// Returns false once the loop should stop.
    fn handle_event(&mut self, event: HostEvent, done_tx: &mpsc::UnboundedSender<PassOutcome>) -> bool {
        debug!(event = event.name(), "host event");
        match event {
            HostEvent::Context { fid, username, added } => {
                self.set_added(added);
                if !added && self.state.request_add_frame() {
                    info!("frame not added, requesting add prompt");
                    self.publish();
                }
                match fid.map(Identity) {
                    None => debug!("context has no identity, not refreshing"),
                    Some(identity) => {
                        let settled = matches!(self.state.status(), PassStatus::Loading | PassStatus::Ready);
                        if self.state.identity() == Some(identity) && settled {
                            debug!(%identity, "identity unchanged, keeping current pass");
                        } else {
                            info!(%identity, username = username.as_deref().unwrap_or(""), "identity resolved");
                            self.spawn_pass(identity, done_tx);
                        }
                    }
                }
            }
            HostEvent::Refresh => match self.state.identity() {
                Some(identity) => self.spawn_pass(identity, done_tx),
                None => warn!("refresh requested before identity is known, ignoring"),
            },
            HostEvent::FrameAdded => self.set_added(true),
            HostEvent::FrameRemoved => self.set_added(false),
            HostEvent::FrameAddRejected { reason } => {
                info!(%reason, "frame add rejected");
                if self.state.reject_add_frame(reason) {
                    self.publish();
                }
            }
            HostEvent::NotificationsEnabled => self.set_notifications(true),
            HostEvent::NotificationsDisabled => self.set_notifications(false),
            HostEvent::PrimaryButtonClicked => debug!("primary button clicked"),
            HostEvent::Teardown => return false,
        }
        true
    }

    fn spawn_pass(&mut self, identity: Identity, done_tx: &mpsc::UnboundedSender<PassOutcome>) {
        let Some(ticket) = self.begin(identity) else {
            return;
        };
        let fetcher = Arc::clone(&self.fetcher);
        let limit = self.limit;
        let tx = done_tx.clone();
        tokio::spawn(async move {
            let outcome = run_pass(fetcher.as_ref(), identity, limit).await;
            // Receiver is gone after teardown
            let _ = tx.send((ticket, outcome));
        });
    }

    fn begin(&mut self, identity: Identity) -> Option<PassTicket> {
        let ticket = self.state.begin(identity)?;
        debug!(%identity, generation = ticket.generation(), "pass started");
        self.publish();
        Some(ticket)
    }

    fn finish(&mut self, ticket: PassTicket, outcome: Result<ReconciliationResult, &FetchError>) {
        let identity = ticket.identity();
        if !self.state.accepts(ticket) {
            debug!(%identity, generation = ticket.generation(), "discarding superseded pass");
            return;
        }
        match &outcome {
            Ok(result) => info!(%identity, unfollowers = result.len(), "pass complete"),
            Err(err) if err.is_malformed() => {
                error!(%identity, kind = err.kind(), error = %err, "relationship data malformed")
            }
            Err(err) => error!(%identity, kind = err.kind(), error = %err, "relationship fetch failed"),
        }
        if self.state.complete(ticket, outcome, Utc::now()) {
            self.publish();
        }
    }

    fn set_added(&mut self, added: bool) {
        if self.state.set_added(added) {
            self.publish();
        }
    }

    fn set_notifications(&mut self, enabled: bool) {
        if self.state.set_notifications_enabled(enabled) {
            self.publish();
        }
    }

    fn publish(&self) {
        if !self.state.is_torn_down() {
            self.view_tx.send_replace(self.state.view());
        }
    }
}

async fn run_pass<F: GraphFetcher + ?Sized>(
    fetcher: &F,
    identity: Identity,
    limit: usize,
) -> Result<ReconciliationResult, FetchError> {
    let pair = fetcher.fetch_snapshots(identity).await?;
    if pair.identity != identity {
        warn!(requested = %identity, returned = %pair.identity, "fetcher returned another identity");
    }
    let result = reconcile(&pair.followers, &pair.following, limit);
    debug!(
        %identity,
        followers = pair.followers.len(),
        following = pair.following.len(),
        unfollowers = result.len(),
        "reconciled"
    );
    Ok(result)
}
