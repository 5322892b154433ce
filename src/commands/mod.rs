//! Command Processing Module
//!
//! This module implements the query-execution layer of embercache: it
//! receives a complete request buffer, decodes the opcode, executes the
//! matching handler against the store, and returns the reply.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │ Request parsing │  (protocol module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │    dispatch     │  (this module)
//! │                 │
//! │  - Route        │
//! │  - Parse payload│
//! │  - Execute      │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │     Store       │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Operations
//!
//! - `SET key value` — store a never-expiring value
//! - `TTL key seconds` — refresh an item's expiry window
//! - `GET key` — fetch a value, reaping it if expired
//! - `DEL key` — remove a key unconditionally
//! - `INC key` / `DEC key` — counter arithmetic with in-place encoding
//!   conversion
//! - `END` — acknowledge and close the connection

pub mod handler;

// Re-export the dispatch entry point
pub use handler::dispatch;
