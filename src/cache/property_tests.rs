//! Property-Based Tests for the Response Cache
//!
//! Uses proptest to check invalidation scope and read behaviour over arbitrary key sets.

use proptest::prelude::*;
use serde_json::json;
use std::collections::HashSet;
use std::time::Duration;

use crate::cache::{CacheKey, ResponseCache};

// == Test Configuration ==
const TEST_TTL: Duration = Duration::from_secs(15 * 60);

// == Strategies ==
/// Generates backend URLs from a small pool so collisions are common
fn target_strategy() -> impl Strategy<Value = String> {
    "[a-c]{1,3}".prop_map(|host| format!("https://{host}.example/exec"))
}

fn action_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("default".to_string()),
        Just("getProblems".to_string()),
        Just("getDueReviews".to_string()),
        "[a-zA-Z]{1,12}",
    ]
}

fn key_strategy() -> impl Strategy<Value = CacheKey> {
    (target_strategy(), action_strategy()).prop_map(|(t, a)| CacheKey::new(t, a))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Invalidating a target removes exactly the entries stored for that
    // target and leaves every other entry servable.
    #[test]
    fn prop_invalidation_scoped_to_target(
        keys in prop::collection::vec(key_strategy(), 1..40),
        victim in target_strategy()
    ) {
        let mut cache = ResponseCache::new(TEST_TTL);
        let unique: HashSet<CacheKey> = keys.into_iter().collect();

        for key in &unique {
            cache.store(key.clone(), json!(key.to_string()));
        }

        let expected_removed = unique.iter().filter(|k| k.target == victim).count();
        let removed = cache.invalidate_target(&victim);

        prop_assert_eq!(removed, expected_removed);
        prop_assert_eq!(cache.len(), unique.len() - expected_removed);

        for key in &unique {
            let found = cache.lookup(key);
            if key.target == victim {
                prop_assert!(found.is_none(), "{} should be invalidated", key);
            } else {
                prop_assert_eq!(found, Some(json!(key.to_string())));
            }
        }
    }

    // Reads within the TTL are idempotent: they return the same payload
    // and leave the entry and its timestamp as they were.
    #[test]
    fn prop_lookup_is_idempotent(key in key_strategy(), reads in 1usize..20) {
        let mut cache = ResponseCache::new(TEST_TTL);
        cache.store(key.clone(), json!({"payload": key.action.clone()}));
        let stored_at = cache.peek(&key).map(|e| e.stored_at);

        for _ in 0..reads {
            prop_assert_eq!(cache.lookup(&key), Some(json!({"payload": key.action.clone()})));
        }

        prop_assert_eq!(cache.peek(&key).map(|e| e.stored_at), stored_at);
        prop_assert_eq!(cache.len(), 1);
        prop_assert_eq!(cache.stats().hits, reads as u64);
    }

    // The last write for a key wins and never duplicates the entry.
    #[test]
    fn prop_overwrite_semantics(
        key in key_strategy(),
        first in any::<i64>(),
        second in any::<i64>()
    ) {
        let mut cache = ResponseCache::new(TEST_TTL);

        cache.store(key.clone(), json!(first));
        cache.store(key.clone(), json!(second));

        prop_assert_eq!(cache.lookup(&key), Some(json!(second)));
        prop_assert_eq!(cache.len(), 1, "Should have exactly one entry after overwrite");
    }
}
