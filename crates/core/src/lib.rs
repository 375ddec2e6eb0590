//! Refresh lifecycle for the unfollowers client.
//!
//! [`RefreshState`] is the pure `Idle → Loading → Ready | Error` machine.
//! [`RefreshLifecycle`] drives it from host events: it starts passes,
//! discards superseded ones and publishes a [`LifecycleView`] after every
//! change until teardown.

pub mod lifecycle;
pub mod state;

pub use lifecycle::RefreshLifecycle;
pub use state::{LifecycleView, PassTicket, RefreshState};
pub use unfollowers_protocol::PassStatus;
