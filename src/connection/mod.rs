//! Connection Module
//!
//! Networking layer between the TCP socket and the query dispatcher.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           TCP Stream (client)           │
//! └─────────────────┬───────────────────────┘
//!                   │ length-prefixed frames
//! ┌─────────────────▼───────────────────────┐
//! │           ConnectionHandler             │
//! │  read frame → dispatch → write reply    │
//! └─────────────────┬───────────────────────┘
//!                   │ one lock hold per command
//! ┌─────────────────▼───────────────────────┐
//! │           Mutex<Store>                  │
//! └─────────────────────────────────────────┘
//! ```

pub mod handler;

pub use handler::{
    handle_connection, unix_now, ConnectionError, ConnectionHandler, ConnectionStats,
    MAX_FRAME_SIZE,
};
