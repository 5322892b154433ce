//! Item Store with Memory Accounting
//!
//! This module implements the heart of embercache: a single-owner store
//! that maps key bytes to [`Item`]s and keeps strict memory accounting
//! over every live value.
//!
//! ## Design Decisions
//!
//! 1. **Single release point**: every path that takes an item out of the
//!    index hands it to [`Store::destroy`], which moves the counters and
//!    drops the value. A Plain buffer can therefore only be freed once.
//! 2. **Lazy expiry**: there is no background sweep. An expired item is
//!    discovered, unlinked and destroyed when its key is next looked up
//!    through [`Store::find_valid`].
//! 3. **Context passing**: the store is passed `&mut` into every command
//!    handler instead of living in ambient global state. One command runs
//!    to completion before the next, so no locking exists at this layer.
//!
//! ## Accounting Invariant
//!
//! `memory_used` always equals the sum over live items of
//! `item.size + ITEM_OVERHEAD`. The admission gate for new Set
//! allocations compares it against the configured ceiling.

use std::collections::HashMap;

use bytes::Bytes;
use tracing::debug;

use crate::storage::item::{Item, Value, ITEM_OVERHEAD, NUMBER_SIZE};

/// Configured limits for a store instance.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Memory accounting threshold gating new Set allocations, in bytes.
    pub memory_ceiling: u64,
    /// Upper clamp applied to any requested item TTL, in seconds.
    pub max_item_ttl: i64,
    /// Keys longer than this are truncated during parsing.
    pub max_key_size: usize,
    /// Values longer than this are truncated during parsing.
    pub max_value_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            memory_ceiling: 128 * 1024 * 1024,
            max_item_ttl: 30 * 24 * 3600,
            max_key_size: 512,
            max_value_size: 1024 * 1024,
        }
    }
}

/// The key index plus process-wide store counters.
///
/// The index is an exact-match map from key bytes to item; the handlers
/// only ever use its insert/find/remove surface, so its internal shape
/// is an implementation detail.
///
/// # Example
///
/// ```
/// use embercache::storage::{Store, Value};
/// use bytes::Bytes;
///
/// let mut store = Store::default();
/// store.insert(Bytes::from("name"), Value::Plain(Bytes::from("ember")), -1, 100);
/// assert_eq!(store.item_count(), 1);
///
/// let item = store.find_valid(b"name", 100).unwrap();
/// assert_eq!(item.value, Value::Plain(Bytes::from("ember")));
/// ```
#[derive(Debug)]
pub struct Store {
    /// Exact-match key index.
    index: HashMap<Bytes, Item>,

    /// Configured limits.
    config: StoreConfig,

    /// Number of live items.
    item_count: u64,

    /// Bytes accounted to live items, including per-item overhead.
    memory_used: u64,

    /// Unix seconds of the first item creation (0 = never written).
    first_write_at: u64,

    /// Unix seconds of the most recent item creation.
    last_write_at: u64,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl Store {
    /// Creates an empty store with the given limits.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            index: HashMap::new(),
            config,
            item_count: 0,
            memory_used: 0,
            first_write_at: 0,
            last_write_at: 0,
        }
    }

    /// The configured limits.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Number of live items.
    pub fn item_count(&self) -> u64 {
        self.item_count
    }

    /// Bytes accounted to live items, including per-item overhead.
    pub fn memory_used(&self) -> u64 {
        self.memory_used
    }

    /// Unix seconds of the first write, or 0 if nothing was ever stored.
    pub fn first_write_at(&self) -> u64 {
        self.first_write_at
    }

    /// Unix seconds of the most recent write.
    pub fn last_write_at(&self) -> u64 {
        self.last_write_at
    }

    /// Admission gate for new Set allocations.
    pub fn has_capacity(&self) -> bool {
        self.memory_used <= self.config.memory_ceiling
    }

    /// Creates an item from `value` and inserts it under `key`.
    ///
    /// Accounting is charged for the new item before the insert; if the
    /// key was already occupied the prior item is destroyed, whatever its
    /// own TTL state. Replacement is unconditional.
    pub fn insert(&mut self, key: Bytes, value: Value, ttl: i64, now: u64) {
        let item = Item::new(value, ttl, now);

        self.item_count += 1;
        self.memory_used += (item.size + ITEM_OVERHEAD) as u64;
        if self.first_write_at == 0 {
            self.first_write_at = now;
        }
        self.last_write_at = now;

        if let Some(old) = self.index.insert(key, item) {
            self.destroy(old);
        }
    }

    /// Releases an item that has already been unlinked from the index.
    ///
    /// Counters move symmetrically to [`Store::insert`]; dropping the
    /// item here is the single point where a Plain buffer is freed.
    pub fn destroy(&mut self, item: Item) {
        self.item_count -= 1;
        self.memory_used -= (item.size + ITEM_OVERHEAD) as u64;
    }

    /// Looks up a key without any validity check.
    pub fn find_mut(&mut self, key: &[u8]) -> Option<&mut Item> {
        self.index.get_mut(key)
    }

    /// True if the key is present in the index, expired or not.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.index.contains_key(key)
    }

    /// Unlinks a key from the index without touching the counters.
    ///
    /// The caller owns the returned item and must route it through
    /// [`Store::destroy`].
    pub fn remove(&mut self, key: &[u8]) -> Option<Item> {
        self.index.remove(key)
    }

    /// Looks up a key and applies the lazy expiry check.
    ///
    /// An item found expired is removed from the index and destroyed
    /// before `None` is returned; this is the sole expiration mechanism,
    /// shared by every read path.
    pub fn find_valid(&mut self, key: &[u8], now: u64) -> Option<&mut Item> {
        let expired = match self.index.get(key) {
            Some(item) => item.is_expired(now),
            None => return None,
        };

        if expired {
            if let Some(item) = self.index.remove(key) {
                debug!(ttl = item.ttl, "item expired, dropped on access");
                self.destroy(item);
            }
            return None;
        }

        self.index.get_mut(key)
    }

    /// Converts an existing item to Number encoding in place.
    ///
    /// The Plain buffer is released by the assignment and the accounting
    /// moves from the old buffer length to the native integer width.
    /// Returns a snapshot of the new value.
    pub fn convert_to_number(&mut self, key: &[u8], num: i64) -> Option<Value> {
        let item = self.index.get_mut(key)?;
        let old_size = item.size;
        item.value = Value::Number(num);
        item.size = NUMBER_SIZE;
        self.memory_used = self.memory_used - old_size as u64 + NUMBER_SIZE as u64;
        Some(item.value.clone())
    }
}
