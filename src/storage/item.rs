//! Stored Item Representation
//!
//! An [`Item`] is the record the store keeps per key: the value itself,
//! its logical size, a creation timestamp and a TTL in seconds.
//!
//! Values come in two encodings:
//!
//! - `Plain` owns a byte buffer. The buffer is released exactly once,
//!   when the item is dropped inside [`Store::destroy`].
//! - `Number` holds an `i64` inline with no heap allocation at all.
//!   Counters that live their whole life as numbers never reallocate.
//!
//! The encoding is a real sum type. The original trick of reusing a
//! pointer-sized slot to store either a buffer pointer or an integer is
//! exactly the kind of reinterpretation this representation forbids.
//!
//! [`Store::destroy`]: crate::storage::Store::destroy

use bytes::Bytes;

/// Accounting overhead charged per live item on top of its logical size.
pub const ITEM_OVERHEAD: usize = std::mem::size_of::<Item>();

/// Logical size of every `Number` item: the native integer width.
pub const NUMBER_SIZE: usize = std::mem::size_of::<i64>();

/// The two representations a stored value can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// An exclusively owned byte buffer.
    Plain(Bytes),
    /// An inline integer. No buffer is ever associated with this variant.
    Number(i64),
}

impl Value {
    /// The logical byte size used for memory accounting.
    pub fn size(&self) -> usize {
        match self {
            Value::Plain(buf) => buf.len(),
            Value::Number(_) => NUMBER_SIZE,
        }
    }
}

/// A stored value record.
///
/// `ttl <= 0` means the item never expires. `created_at` is reset by a
/// TTL refresh, so the expiry window always counts from the most recent
/// of creation and refresh.
#[derive(Debug, Clone)]
pub struct Item {
    /// The value and its encoding tag.
    pub value: Value,
    /// Logical byte length of the value (buffer length for Plain,
    /// [`NUMBER_SIZE`] for Number).
    pub size: usize,
    /// Unix seconds at creation or last TTL refresh.
    pub created_at: u64,
    /// Time-to-live in seconds; zero or negative disables expiry.
    pub ttl: i64,
}

impl Item {
    /// Creates an item stamped with the given clock reading.
    pub fn new(value: Value, ttl: i64, now: u64) -> Self {
        let size = value.size();
        Self {
            value,
            size,
            created_at: now,
            ttl,
        }
    }

    /// Lazy expiry test: true once strictly more than `ttl` seconds have
    /// passed since `created_at`. Items with `ttl <= 0` never expire.
    pub fn is_expired(&self, now: u64) -> bool {
        self.ttl > 0 && now.saturating_sub(self.created_at) > self.ttl as u64
    }
}
