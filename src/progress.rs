//! Persistent player progress behind a narrow key-value interface.
//!
//! Storage is best effort: a failing store is logged and otherwise ignored, the
//! in-memory progress stays authoritative for the session.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::ALL_LEVELS_UNLOCKED;
use crate::error::StoreError;

pub const UNLOCKED_LEVEL_KEY: &str = "giftfall:unlocked-level";
pub const BONUS_RECORD_KEY: &str = "giftfall:bonus-record";

/// The id stored for the final level; reaching it means every level is unlocked.
const FINAL_LEVEL: u8 = 7;

pub trait KeyValueStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// A store that lives only as long as the process. Clones share their entries.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.get(key))
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.insert(key, value);
        Ok(())
    }
}

/// Best endurance result, each field tracked independently.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusRecord {
    #[serde(default)]
    pub gifts: u32,
    #[serde(default)]
    pub seconds: u32,
}

impl BonusRecord {
    /// Keeps the maximum of each field. Returns whether anything improved.
    pub fn merge(&mut self, gifts: u32, seconds: u32) -> bool {
        let mut improved = false;
        if gifts > self.gifts {
            self.gifts = gifts;
            improved = true;
        }
        if seconds > self.seconds {
            self.seconds = seconds;
            improved = true;
        }
        improved
    }
}

/// The final level unlocks everything, so it is stored as [`ALL_LEVELS_UNLOCKED`].
fn resolve_unlock(id: u8) -> u8 {
    if id == FINAL_LEVEL {
        ALL_LEVELS_UNLOCKED
    } else {
        id
    }
}

pub struct Progress {
    store: Box<dyn KeyValueStore>,
    unlocked: u8,
    bonus: BonusRecord,
}

impl Progress {
    /// Reads progress from `store`, falling back to a fresh profile on any failure.
    pub fn load(store: Box<dyn KeyValueStore>) -> Self {
        let unlocked = match store.load(UNLOCKED_LEVEL_KEY) {
            Ok(Some(raw)) => match raw.trim().parse::<u8>() {
                Ok(id) if id > 0 => resolve_unlock(id).min(ALL_LEVELS_UNLOCKED),
                _ => {
                    warn!(raw = %raw, "Ignoring malformed unlocked level");
                    1
                }
            },
            Ok(None) => 1,
            Err(err) => {
                warn!(error = %err, "Progress store unavailable, starting fresh");
                1
            }
        };

        let bonus = match store.load(BONUS_RECORD_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!(error = %err, "Ignoring malformed bonus record");
                BonusRecord::default()
            }),
            Ok(None) => BonusRecord::default(),
            Err(err) => {
                warn!(error = %err, "Bonus record unavailable");
                BonusRecord::default()
            }
        };

        debug!(unlocked, ?bonus, "Progress loaded");
        Self { store, unlocked, bonus }
    }

    /// Highest level id the player may start.
    pub fn unlocked(&self) -> u8 {
        self.unlocked
    }

    pub fn is_unlocked(&self, id: u8) -> bool {
        id <= self.unlocked
    }

    pub fn bonus_record(&self) -> BonusRecord {
        self.bonus
    }

    /// Raises the unlocked level to `id`; never lowers it.
    pub fn unlock_level(&mut self, id: u8) {
        let resolved = resolve_unlock(id);
        if resolved <= self.unlocked {
            return;
        }
        self.unlocked = resolved;
        debug!(unlocked = resolved, "Level unlocked");
        if let Err(err) = self.store.save(UNLOCKED_LEVEL_KEY, &resolved.to_string()) {
            warn!(error = %err, "Failed to persist unlocked level");
        }
    }

    /// Merges an endurance result into the bonus record and returns the record.
    pub fn record_bonus(&mut self, gifts: u32, seconds: u32) -> BonusRecord {
        if self.bonus.merge(gifts, seconds) {
            debug!(record = ?self.bonus, "Bonus record improved");
            if let Err(err) = self.persist_bonus() {
                warn!(error = %err, "Failed to persist bonus record");
            }
        }
        self.bonus
    }

    fn persist_bonus(&mut self) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&self.bonus)?;
        self.store.save(BONUS_RECORD_KEY, &raw)
    }
}
