//! Connection Handler Module
//!
//! This module handles individual client connections. Each client gets
//! its own task that reads framed requests, runs them through the query
//! dispatcher, and writes framed replies back.
//!
//! ## Framing
//!
//! TCP is a stream protocol, so both directions carry length-prefixed
//! frames: a `u32` little-endian byte count followed by that many bytes.
//! A request frame body is `opcode(u16-LE) ++ payload`; a reply frame
//! body is the serialized [`Reply`]. Frames above a fixed bound are
//! rejected before any allocation happens.
//!
//! ## Execution model
//!
//! The store is shared behind a mutex and locked for exactly one
//! dispatch at a time, which preserves the core's run-to-completion
//! model: every command executes fully against a quiescent store before
//! the next one starts. The lock is never held across socket I/O, so a
//! slow client cannot stall other connections' commands.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, info, trace, warn};

use crate::commands::dispatch;
use crate::protocol::ParseError;
use crate::storage::Store;

/// Maximum accepted request frame size (opcode + payload).
pub const MAX_FRAME_SIZE: usize = 2 * 1024 * 1024;

/// Statistics for connection handling.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total commands processed
    pub commands_processed: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Errors that can occur while handling a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Request decoding failed; the client is dropped
    #[error("dispatch error: {0}")]
    Dispatch(#[from] ParseError),

    /// A request frame exceeded the size bound
    #[error("frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// Client disconnected between frames
    #[error("client disconnected")]
    ClientDisconnected,
}

/// Handles a single client connection.
pub struct ConnectionHandler {
    /// The TCP stream for this connection
    stream: BufWriter<TcpStream>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// The shared store
    store: Arc<Mutex<Store>>,

    /// Connection statistics (shared)
    stats: Arc<ConnectionStats>,
}

impl ConnectionHandler {
    /// Creates a new connection handler.
    pub fn new(
        stream: TcpStream,
        addr: SocketAddr,
        store: Arc<Mutex<Store>>,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream: BufWriter::new(stream),
            addr,
            store,
            stats,
        }
    }

    /// Runs the main connection loop.
    ///
    /// Reads requests, dispatches them, and writes replies until the
    /// client disconnects, sends END, or an error occurs.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(client = %self.addr, "client disconnected gracefully"),
            Err(ConnectionError::ClientDisconnected) => {
                debug!(client = %self.addr, "client disconnected")
            }
            Err(ConnectionError::Io(io_err))
                if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                debug!(client = %self.addr, "connection reset by client")
            }
            Err(e) => warn!(client = %self.addr, error = %e, "connection error"),
        }

        self.stats.connection_closed();
        result
    }

    /// The read-dispatch-reply loop.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            let request = self.read_frame().await?;

            // One dispatch per lock hold; the lock never spans I/O.
            let reply = {
                let mut store = self.store.lock().unwrap();
                dispatch(&mut store, unix_now(), &request)?
            };
            self.stats.command_processed();

            let close_after = reply.close_after;
            let mut frame = Vec::new();
            reply.serialize_into(&mut frame);
            self.write_frame(&frame).await?;

            if close_after {
                debug!(client = %self.addr, "closing connection after reply");
                return Ok(());
            }
        }
    }

    /// Reads one length-prefixed request frame.
    async fn read_frame(&mut self) -> Result<Vec<u8>, ConnectionError> {
        let len = match self.stream.read_u32_le().await {
            Ok(len) => len as usize,
            // EOF at a frame boundary is a normal disconnect.
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(ConnectionError::ClientDisconnected)
            }
            Err(e) => return Err(e.into()),
        };

        if len > MAX_FRAME_SIZE {
            return Err(ConnectionError::FrameTooLarge {
                size: len,
                max: MAX_FRAME_SIZE,
            });
        }

        let mut buf = vec![0u8; len];
        self.stream.read_exact(&mut buf).await?;
        self.stats.bytes_read(4 + len);
        trace!(client = %self.addr, bytes = len, "read request frame");

        Ok(buf)
    }

    /// Writes one length-prefixed reply frame.
    async fn write_frame(&mut self, body: &[u8]) -> Result<(), ConnectionError> {
        self.stream.write_u32_le(body.len() as u32).await?;
        self.stream.write_all(body).await?;
        self.stream.flush().await?;
        self.stats.bytes_written(4 + body.len());
        trace!(client = %self.addr, bytes = body.len(), "sent reply frame");
        Ok(())
    }
}

/// Current unix time in seconds, the clock reading commands execute under.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Handles a client connection to completion.
///
/// Convenience wrapper that builds a [`ConnectionHandler`] and runs it,
/// downgrading expected disconnect errors to debug logs.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    store: Arc<Mutex<Store>>,
    stats: Arc<ConnectionStats>,
) {
    let handler = ConnectionHandler::new(stream, addr, store, stats);
    if let Err(e) = handler.run().await {
        match e {
            ConnectionError::ClientDisconnected => {}
            ConnectionError::Io(ref io_err)
                if io_err.kind() == std::io::ErrorKind::ConnectionReset => {}
            _ => {
                debug!(client = %addr, error = %e, "connection ended with error");
            }
        }
    }
}
