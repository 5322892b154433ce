//! Binary Protocol Implementation
//!
//! This module implements the embercache wire protocol: a compact binary
//! format with a fixed-width opcode at the head of every request and a
//! coded (optionally value-carrying) reply.
//!
//! ## Modules
//!
//! - `types`: opcodes, reply codes and reply serialization
//! - `parser`: request decoding and the shared payload scanners
//!
//! ## Example
//!
//! ```
//! use embercache::protocol::{parse_request, Opcode, Reply, ReplyCode};
//!
//! let mut request = 3u16.to_le_bytes().to_vec(); // GET
//! request.extend_from_slice(b"session");
//!
//! let (opcode, payload) = parse_request(&request).unwrap();
//! assert_eq!(opcode, Opcode::Get);
//! assert_eq!(payload, b"session");
//!
//! let reply = Reply::code(ReplyCode::NotFound);
//! assert_eq!(reply.serialize(), vec![1, 0]);
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{bounded_key, parse_i64_exact, parse_request, split_key_rest, ParseError, ParseResult};
pub use types::{Opcode, Reply, ReplyBody, ReplyCode, ReplyValue, OPCODE_SIZE};
