//! # EmberCache - A Compact In-Memory Key-Value Cache
//!
//! EmberCache is an in-memory key-value cache speaking a small binary
//! protocol. It demonstrates systems programming concepts like binary
//! protocol parsing, memory accounting, and async network servers.
//!
//! ## Features
//!
//! - **Binary Protocol**: Two-byte opcodes with raw byte payloads
//! - **Memory Accounting**: Every stored byte is charged against a ceiling
//! - **TTL Support**: Per-item expiry, enforced lazily on access
//! - **Numeric Items**: Counters stored as native integers, not strings
//! - **Async I/O**: Built on Tokio for handling many concurrent connections
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         EmberCache                           │
//! │                                                              │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐       │
//! │  │ TCP Server  │───>│ Connection  │───>│   Query     │       │
//! │  │ (Listener)  │    │  Handler    │    │ Dispatcher  │       │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘       │
//! │                                               │              │
//! │  ┌─────────────┐                              ▼              │
//! │  │  Request    │    ┌──────────────────────────────────────┐ │
//! │  │  Parser     │    │                Store                 │ │
//! │  │ (opcodes)   │    │  key index · memory gauge · expiry   │ │
//! │  └─────────────┘    └──────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use embercache::connection::{handle_connection, ConnectionStats};
//! use embercache::storage::Store;
//! use std::sync::{Arc, Mutex};
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(Mutex::new(Store::default()));
//!     let stats = Arc::new(ConnectionStats::new());
//!
//!     let listener = TcpListener::bind("127.0.0.1:10128").await.unwrap();
//!
//!     loop {
//!         let (stream, addr) = listener.accept().await.unwrap();
//!         let store = Arc::clone(&store);
//!         let stats = Arc::clone(&stats);
//!
//!         tokio::spawn(handle_connection(stream, addr, store, stats));
//!     }
//! }
//! ```
//!
//! ## Supported Commands
//!
//! - `SET key value` — store a value, returning a snapshot of it
//! - `TTL key seconds` — set expiry on an existing item
//! - `GET key` — fetch a live item's value
//! - `DEL key` — remove an item
//! - `INC key` / `DEC key` — adjust a numeric item by one
//! - `END` — say goodbye; the server replies OK and closes
//!
//! ## Module Overview
//!
//! - [`protocol`]: binary request parser and reply types
//! - [`storage`]: item store with memory accounting and lazy expiry
//! - [`commands`]: the query dispatcher and per-command handlers
//! - [`connection`]: client connection management
//!
//! ## Design Highlights
//!
//! ### Run-To-Completion Commands
//!
//! Commands execute one at a time against the store, each running to
//! completion before the next begins. There is no partial state to
//! observe and no per-key locking to reason about.
//!
//! ### Exact Memory Accounting
//!
//! A single gauge tracks value bytes plus per-item overhead. Writes are
//! refused once the gauge crosses the configured ceiling, and every
//! removal path credits the gauge back through one release point.
//!
//! ### Lazy Expiry
//!
//! Expired items are detected and reclaimed when a command touches them.
//! An item past its TTL is indistinguishable from an absent one.

pub mod commands;
pub mod connection;
pub mod protocol;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::dispatch;
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{ParseError, Reply, ReplyCode};
pub use storage::{Store, StoreConfig};

/// The default port EmberCache listens on
pub const DEFAULT_PORT: u16 = 10128;

/// The default host EmberCache binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of EmberCache
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
