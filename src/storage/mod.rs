//! Storage Module
//!
//! This module provides the item store at the core of embercache:
//! a single-owner key index with per-item lifecycle management, strict
//! memory accounting and lazy TTL expiry.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                        Store                            │
//! │                                                         │
//! │  key index            counters                          │
//! │  ┌───────────────┐    item_count                        │
//! │  │ key ──> Item  │    memory_used / memory_ceiling      │
//! │  │ key ──> Item  │    first_write_at / last_write_at    │
//! │  │ key ──> Item  │                                      │
//! │  └───────────────┘                                      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Two value encodings**: an owned byte buffer or an inline integer
//! - **Strict accounting**: `memory_used` tracks `size + overhead` of
//!   every live item and gates Set admissions against the ceiling
//! - **Lazy expiry**: expired items are reaped on access, never by a
//!   background sweep
//!
//! ## Example
//!
//! ```
//! use embercache::storage::{Store, Value};
//! use bytes::Bytes;
//!
//! let mut store = Store::default();
//! store.insert(Bytes::from("session"), Value::Plain(Bytes::from("token")), 60, 1_000);
//!
//! // Valid for 60 seconds after creation...
//! assert!(store.find_valid(b"session", 1_060).is_some());
//! // ...and reaped on the first access after that.
//! assert!(store.find_valid(b"session", 1_061).is_none());
//! assert_eq!(store.item_count(), 0);
//! ```

pub mod engine;
pub mod item;

// Re-export commonly used types
pub use engine::{Store, StoreConfig};
pub use item::{Item, Value, ITEM_OVERHEAD, NUMBER_SIZE};
