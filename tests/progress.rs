use giftfall::error::StoreError;
use giftfall::progress::{BonusRecord, KeyValueStore, MemoryStore, Progress, BONUS_RECORD_KEY, UNLOCKED_LEVEL_KEY};
use pretty_assertions::assert_eq;
use speculoos::prelude::*;

/// A store whose every operation fails.
struct BrokenStore;

impl KeyValueStore for BrokenStore {
    fn load(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("disk on fire".to_string()))
    }

    fn save(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk on fire".to_string()))
    }
}

fn progress_with(entries: &[(&str, &str)]) -> (Progress, MemoryStore) {
    let store = MemoryStore::new();
    for (key, value) in entries {
        store.insert(key, value);
    }
    (Progress::load(Box::new(store.clone())), store)
}

#[test]
fn test_fresh_profile() {
    let (progress, _store) = progress_with(&[]);
    assert_that(&progress.unlocked()).is_equal_to(1);
    assert_that(&progress.is_unlocked(1)).is_true();
    assert_that(&progress.is_unlocked(2)).is_false();
    assert_that(&progress.bonus_record()).is_equal_to(BonusRecord::default());
}

#[test]
fn test_unlock_is_persisted_and_never_lowered() {
    let (mut progress, store) = progress_with(&[]);

    progress.unlock_level(4);
    assert_that(&progress.unlocked()).is_equal_to(4);
    assert_that(&store.get(UNLOCKED_LEVEL_KEY)).is_equal_to(Some("4".to_string()));

    progress.unlock_level(2);
    assert_that(&progress.unlocked()).is_equal_to(4);
    assert_that(&store.get(UNLOCKED_LEVEL_KEY)).is_equal_to(Some("4".to_string()));
}

#[test]
fn test_final_level_unlocks_everything() {
    let (mut progress, store) = progress_with(&[]);
    progress.unlock_level(7);
    assert_that(&progress.unlocked()).is_equal_to(8);
    assert_that(&store.get(UNLOCKED_LEVEL_KEY)).is_equal_to(Some("8".to_string()));

    let (stored_seven, _) = progress_with(&[(UNLOCKED_LEVEL_KEY, "7")]);
    assert_that(&stored_seven.unlocked()).is_equal_to(8);
    assert_that(&stored_seven.is_unlocked(7)).is_true();
}

#[test]
fn test_malformed_values_fall_back_to_defaults() {
    let (progress, _) = progress_with(&[(UNLOCKED_LEVEL_KEY, "banana"), (BONUS_RECORD_KEY, "{not json")]);
    assert_that(&progress.unlocked()).is_equal_to(1);
    assert_that(&progress.bonus_record()).is_equal_to(BonusRecord::default());

    let (zero, _) = progress_with(&[(UNLOCKED_LEVEL_KEY, "0")]);
    assert_that(&zero.unlocked()).is_equal_to(1);
}

#[test]
fn test_stored_bonus_record_is_loaded() {
    let (progress, _) = progress_with(&[(BONUS_RECORD_KEY, r#"{"gifts":12,"seconds":40}"#)]);
    assert_eq!(progress.bonus_record(), BonusRecord { gifts: 12, seconds: 40 });

    let (partial, _) = progress_with(&[(BONUS_RECORD_KEY, r#"{"seconds":9}"#)]);
    assert_eq!(partial.bonus_record(), BonusRecord { gifts: 0, seconds: 9 });
}

#[test]
fn test_bonus_record_keeps_best_of_each_field() {
    let (mut progress, store) = progress_with(&[]);

    let record = progress.record_bonus(10, 30);
    assert_eq!(record, BonusRecord { gifts: 10, seconds: 30 });

    let record = progress.record_bonus(4, 45);
    assert_eq!(record, BonusRecord { gifts: 10, seconds: 45 });

    let raw = store.get(BONUS_RECORD_KEY).expect("record persisted");
    let stored: BonusRecord = serde_json::from_str(&raw).expect("record is json");
    assert_eq!(stored, record);
}

#[test]
fn test_unimproved_record_is_not_rewritten() {
    let (mut progress, store) = progress_with(&[(BONUS_RECORD_KEY, r#"{"gifts":5,"seconds":5}"#)]);
    store.insert(BONUS_RECORD_KEY, "sentinel");

    progress.record_bonus(3, 2);

    assert_that(&store.get(BONUS_RECORD_KEY)).is_equal_to(Some("sentinel".to_string()));
}

#[test]
fn test_broken_store_is_ignored() {
    let mut progress = Progress::load(Box::new(BrokenStore));
    assert_that(&progress.unlocked()).is_equal_to(1);

    progress.unlock_level(3);
    let record = progress.record_bonus(2, 8);

    assert_that(&progress.unlocked()).is_equal_to(3);
    assert_eq!(record, BonusRecord { gifts: 2, seconds: 8 });
}
