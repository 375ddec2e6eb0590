// Property-based tests for follower reconciliation.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::HashSet;

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use unfollowers_recon::*;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
}

/// Small id space so duplicates and overlaps are common.
fn arb_user() -> impl Strategy<Value = UserRecord> {
    (0u64..40, prop::option::of(-500i64..500)).prop_map(|(id, offset)| {
        let user = UserRecord::new(id, format!("user{id}"));
        match offset {
            Some(minutes) => user.observed(base_time() + Duration::minutes(minutes)),
            None => user,
        }
    })
}

fn arb_snapshot(kind: RelationshipKind) -> impl Strategy<Value = RelationshipSnapshot> {
    prop::collection::vec(arb_user(), 0..60)
        .prop_map(move |users| RelationshipSnapshot::new(kind, users, base_time()))
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn never_exceeds_limit(
        followers in arb_snapshot(RelationshipKind::Followers),
        following in arb_snapshot(RelationshipKind::Following),
        limit in 0usize..15,
    ) {
        let result = reconcile(&followers, &following, limit);
        prop_assert!(result.len() <= limit);
    }

    #[test]
    fn ordered_newest_first_without_duplicates(
        followers in arb_snapshot(RelationshipKind::Followers),
        following in arb_snapshot(RelationshipKind::Following),
        limit in 1usize..15,
    ) {
        let result = reconcile(&followers, &following, limit);

        for pair in result.unfollowers.windows(2) {
            prop_assert!(pair[0].observed_at >= pair[1].observed_at);
        }

        let mut ids = HashSet::new();
        for u in result.iter() {
            prop_assert!(ids.insert(u.id), "duplicate id {}", u.id);
        }
    }

    #[test]
    fn only_following_members_absent_from_followers(
        followers in arb_snapshot(RelationshipKind::Followers),
        following in arb_snapshot(RelationshipKind::Following),
        limit in 1usize..15,
    ) {
        let result = reconcile(&followers, &following, limit);
        let follower_ids: HashSet<u64> = followers.users.iter().map(|u| u.id).collect();
        let following_ids: HashSet<u64> = following.users.iter().map(|u| u.id).collect();

        for u in result.iter() {
            prop_assert!(!follower_ids.contains(&u.id));
            prop_assert!(following_ids.contains(&u.id));
        }
    }

    #[test]
    fn deterministic_and_idempotent(
        followers in arb_snapshot(RelationshipKind::Followers),
        following in arb_snapshot(RelationshipKind::Following),
        limit in 0usize..15,
    ) {
        let first = reconcile(&followers, &following, limit);
        let second = reconcile(&followers, &following, limit);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn empty_following_is_always_empty(
        followers in arb_snapshot(RelationshipKind::Followers),
        limit in 0usize..15,
    ) {
        let following = RelationshipSnapshot::new(RelationshipKind::Following, vec![], base_time());
        prop_assert!(reconcile(&followers, &following, limit).is_empty());
    }

    #[test]
    fn empty_followers_keeps_all_distinct_following(
        following in arb_snapshot(RelationshipKind::Following),
        limit in 0usize..15,
    ) {
        let followers = RelationshipSnapshot::new(RelationshipKind::Followers, vec![], base_time());
        let distinct: HashSet<u64> = following.users.iter().map(|u| u.id).collect();
        let result = reconcile(&followers, &following, limit);
        prop_assert_eq!(result.len(), distinct.len().min(limit));
    }
}

// ---------------------------------------------------------------------------
// End-to-end scenarios
// ---------------------------------------------------------------------------

fn snap(kind: RelationshipKind, users: Vec<UserRecord>) -> RelationshipSnapshot {
    RelationshipSnapshot::new(kind, users, base_time())
}

#[test]
fn scenario_one_member_missing() {
    let following = snap(
        RelationshipKind::Following,
        vec![UserRecord::new(1, "a"), UserRecord::new(2, "b")],
    );
    let followers = snap(RelationshipKind::Followers, vec![UserRecord::new(1, "a")]);

    let result = reconcile(&followers, &following, 5);
    assert_eq!(result.len(), 1);
    assert_eq!(result.unfollowers[0].id, 2);
    assert_eq!(result.unfollowers[0].handle, "b");
}

#[test]
fn scenario_identical_sets() {
    let users = vec![UserRecord::new(1, "a"), UserRecord::new(2, "b"), UserRecord::new(3, "c")];
    let result = reconcile(
        &snap(RelationshipKind::Followers, users.clone()),
        &snap(RelationshipKind::Following, users),
        5,
    );
    assert!(result.is_empty());
}

#[test]
fn scenario_eight_missing_limit_five() {
    let mut following: Vec<UserRecord> = (10..18)
        .map(|id| UserRecord::new(id, format!("u{id}")).observed(base_time() + Duration::days(id as i64)))
        .collect();
    following.push(UserRecord::new(1, "still_here"));
    let followers = snap(RelationshipKind::Followers, vec![UserRecord::new(1, "still_here")]);

    let result = reconcile(&followers, &snap(RelationshipKind::Following, following), 5);
    let ids: Vec<u64> = result.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![17, 16, 15, 14, 13]);
}
