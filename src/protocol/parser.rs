//! Request Parsing
//!
//! Bounded, length-checked parsing for request buffers. The connection
//! layer guarantees framing (each request arrives as one complete
//! buffer); this module splits the opcode from the payload and provides
//! the payload scanners the command handlers share.
//!
//! ## Payload shapes
//!
//! - `SET key value` and `TTL key ttl` are space-delimited: the key is
//!   scanned forward until a space or a bound is hit, the rest is the
//!   value (respectively the ttl string).
//! - `GET key`, `DEL key`, `INC key`, `DEC key`: the key is the entire
//!   remaining payload.
//!
//! Both key and value bounds truncate rather than error, matching the
//! configured maximum sizes.

use thiserror::Error;

use crate::protocol::types::{Opcode, OPCODE_SIZE};

/// Errors that can occur while decoding a request head.
///
/// Both fail fast: the store is never touched and the connection layer
/// drops the client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The request buffer is shorter than the opcode field.
    #[error("request shorter than the opcode header")]
    Truncated,

    /// The opcode value is not in the dispatch table.
    #[error("unknown opcode: {0:#06x}")]
    UnknownOpcode(u16),
}

/// Result type for request parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// Splits a request buffer into its decoded opcode and raw payload.
pub fn parse_request(buf: &[u8]) -> ParseResult<(Opcode, &[u8])> {
    if buf.len() < OPCODE_SIZE {
        return Err(ParseError::Truncated);
    }
    let op = u16::from_le_bytes([buf[0], buf[1]]);
    let opcode = Opcode::from_wire(op).ok_or(ParseError::UnknownOpcode(op))?;
    Ok((opcode, &buf[OPCODE_SIZE..]))
}

/// Splits a `<key><space><rest>` payload with bounded scanning.
///
/// The key is the bytes before the first space, scanning no further than
/// `min(payload length, max_key)`. If no space occurs inside the bound
/// the key is cut at the bound and one byte is skipped before the rest
/// begins, exactly as if the bound position held the delimiter. The rest
/// is additionally truncated to `max_rest`.
pub fn split_key_rest<'a>(
    payload: &'a [u8],
    max_key: usize,
    max_rest: usize,
) -> (&'a [u8], &'a [u8]) {
    let bound = payload.len().min(max_key);
    let key_len = payload[..bound]
        .iter()
        .position(|&b| b == b' ')
        .unwrap_or(bound);

    let key = &payload[..key_len];
    let rest = payload.get(key_len + 1..).unwrap_or(&[]);
    let rest = &rest[..rest.len().min(max_rest)];

    (key, rest)
}

/// The whole-payload key form, truncated to the key bound.
pub fn bounded_key(payload: &[u8], max_key: usize) -> &[u8] {
    &payload[..payload.len().min(max_key)]
}

/// Parses a decimal integer that must consume the entire slice.
///
/// Partial parses (`"12x"`), embedded whitespace and empty input are all
/// rejected; a leading `-` is accepted.
pub fn parse_i64_exact(bytes: &[u8]) -> Option<i64> {
    let s = std::str::from_utf8(bytes).ok()?;
    s.parse::<i64>().ok()
}
