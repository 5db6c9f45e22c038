//! Proptest strategies for retrigger properties.

use chrono::{DateTime, TimeDelta, Utc};
use proptest::prelude::*;
use std::collections::HashSet;

/// Millisecond-precision instants between 2000 and 2100
pub fn instant_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (946_684_800_000i64..4_102_444_800_000i64)
        .prop_filter_map("representable instant", DateTime::<Utc>::from_timestamp_millis)
}

/// Offsets of up to two years either way, in milliseconds
pub fn offset_strategy() -> impl Strategy<Value = TimeDelta> {
    (-63_072_000_000i64..63_072_000_000i64).prop_map(TimeDelta::milliseconds)
}

/// 22-character URL-safe slugs, the shape the scheduler uses for task ids
pub fn slug_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{22}"
}

/// Distinct (old, new) id pairs with no id shared between the two sides
pub fn id_pairs_strategy(max: usize) -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec((slug_strategy(), slug_strategy()), 1..=max).prop_filter(
        "ids must be distinct",
        |pairs| {
            let mut seen = HashSet::new();
            pairs
                .iter()
                .all(|(old, new)| seen.insert(old.clone()) && seen.insert(new.clone()))
        },
    )
}

/// Free text that cannot contain a slug
pub fn filler_strategy() -> impl Strategy<Value = String> {
    "[a-z ./:]{0,16}"
}

/// Random DAG as per-node dependency lists (edges only point at lower
/// indexes), together with a shuffled discovery order
pub fn dag_strategy() -> impl Strategy<Value = (Vec<Vec<usize>>, Vec<usize>)> {
    (1usize..12)
        .prop_flat_map(|n| {
            (
                prop::collection::vec(any::<bool>(), n * n),
                Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
            )
        })
        .prop_map(|(mask, order)| {
            let n = order.len();
            let dependencies = (0..n)
                .map(|i| (0..i).filter(|&j| mask[i * n + j]).collect())
                .collect();
            (dependencies, order)
        })
}
