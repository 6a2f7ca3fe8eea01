//! Property-Based Tests for MIMIR Core
//!
//! Uses `proptest` to check the memory store and safety gate invariants
//! under random inputs.

use proptest::prelude::*;

use mimir_core::memory::MemoryStore;
use mimir_core::response::{ActionResponse, ResponseError};
use mimir_core::safety::{self, DENYLIST};

fn fresh_store(cap: usize) -> (tempfile::TempDir, MemoryStore) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = MemoryStore::with_capacity(dir.path().join("botMemory.json"), cap);
    (dir, store)
}

// ---------------------------------------------------------------------------
// Property: whitespace-only appends never change the store
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn blank_appends_are_noops(
        seed in prop::collection::vec("[a-z ]{1,12}", 0..5),
        blank in "[ \t\n\r]{0,8}",
    ) {
        let (_dir, store) = fresh_store(200);
        for s in &seed {
            store.append(s);
        }
        let before = store.load();
        store.append(&blank);
        prop_assert_eq!(store.load(), before);
    }
}

// ---------------------------------------------------------------------------
// Property: the store keeps exactly the most recent `cap` entries, in order
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn cap_keeps_most_recent_in_order(cap in 1usize..12, extra in 0usize..20) {
        let (_dir, store) = fresh_store(cap);
        let total = cap + extra;
        for i in 0..total {
            store.append(&format!("fact {i}"));
        }

        let expected: Vec<String> = (total.saturating_sub(cap)..total)
            .map(|i| format!("fact {i}"))
            .collect();
        prop_assert_eq!(store.load(), expected);
    }

    #[test]
    fn append_lands_last_and_trimmed(text in "[ ]{0,3}[a-zA-Z0-9]{1,20}[ ]{0,3}") {
        let (_dir, store) = fresh_store(200);
        store.append("earlier");
        store.append(&text);
        let loaded = store.load();
        prop_assert_eq!(loaded.last().map(String::as_str), Some(text.trim()));
    }
}

#[test]
fn two_hundred_cap_with_default_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = MemoryStore::new(dir.path().join("botMemory.json"));
    for i in 0..250 {
        store.append(&format!("entry {i}"));
    }
    let loaded = store.load();
    assert_eq!(loaded.len(), 200);
    assert_eq!(loaded.first().map(String::as_str), Some("entry 50"));
    assert_eq!(loaded.last().map(String::as_str), Some("entry 249"));
}

// ---------------------------------------------------------------------------
// Property: any denylisted substring, in any case, is rejected
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn denylisted_code_is_never_safe(
        idx in 0..DENYLIST.len(),
        prefix in "[a-z ]{0,10}",
        suffix in "[a-z ]{0,10}",
        upper in any::<bool>(),
    ) {
        let pattern = DENYLIST[idx];
        let pattern = if upper { pattern.to_uppercase() } else { pattern.to_string() };
        let code = format!("{prefix}{pattern}{suffix}");
        prop_assert!(!safety::is_safe(&code));
    }

    #[test]
    fn single_action_calls_are_safe(target in "[a-z_]{1,12}") {
        // Some denylist entries are plain words, e.g. `unlink`.
        prop_assume!(safety::first_match(&target).is_none());
        let code = format!("bot.dig({target}); bot.chat('{target}')");
        prop_assert!(safety::is_safe(&code));
    }
}

// ---------------------------------------------------------------------------
// Property: parse never panics and only yields the two documented errors
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn parse_is_total(raw in ".{0,64}") {
        match ActionResponse::parse(&raw) {
            Ok(resp) => prop_assert!(!resp.code.trim().is_empty()),
            Err(ResponseError::MalformedResponse(_) | ResponseError::MissingCode) => {}
        }
    }
}
