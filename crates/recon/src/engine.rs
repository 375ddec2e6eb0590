use std::collections::HashSet;

use crate::model::{ReconciliationResult, RelationshipSnapshot, UnfollowerRecord};

/// Reconcile one pass worth of snapshots into a ranked unfollower list.
///
/// Members of `following` absent from `followers` are kept, deduplicated by
/// id (first occurrence wins), ranked newest first by `observed_at` and
/// truncated to `limit`. A record without its own timestamp is stamped with
/// the `following` snapshot's fetch time. Ties keep `following` order.
pub fn reconcile(
    followers: &RelationshipSnapshot,
    following: &RelationshipSnapshot,
    limit: usize,
) -> ReconciliationResult {
    if following.is_empty() || limit == 0 {
        return ReconciliationResult::empty(limit);
    }

    let current: HashSet<u64> = followers.users.iter().map(|u| u.id).collect();
    let mut seen: HashSet<u64> = HashSet::with_capacity(following.len());

    let mut unfollowers: Vec<UnfollowerRecord> = following
        .users
        .iter()
        .filter(|u| seen.insert(u.id))
        .filter(|u| !current.contains(&u.id))
        .map(|u| UnfollowerRecord {
            id: u.id,
            handle: u.handle.clone(),
            display_name: u.display_name.clone(),
            observed_at: u.observed_at.unwrap_or(following.fetched_at),
        })
        .collect();

    // sort_by is stable
    unfollowers.sort_by(|a, b| b.observed_at.cmp(&a.observed_at));
    unfollowers.truncate(limit);

    ReconciliationResult {
        identity: None,
        limit,
        unfollowers,
    }
}
