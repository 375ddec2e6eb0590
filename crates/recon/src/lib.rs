//! `unfollowers-recon` - follower/following reconciliation engine.
//!
//! Pure engine crate: receives two pre-fetched relationship snapshots,
//! returns a ranked, bounded unfollower list. No network or IO dependencies.

pub mod engine;
pub mod model;

pub use engine::reconcile;
pub use model::{
    Identity, ReconciliationResult, RelationshipKind, RelationshipSnapshot, SnapshotPair,
    UnfollowerRecord, UserRecord, PAGE_SIZE,
};
