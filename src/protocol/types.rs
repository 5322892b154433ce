//! Wire Protocol Data Types
//!
//! This module defines the opcode table and the reply types of the
//! embercache binary protocol.
//!
//! ## Protocol Format
//!
//! Every request starts with a fixed-width opcode field, little-endian:
//!
//! ```text
//! ┌───────────────┬──────────────────────────────┐
//! │ opcode (u16)  │ opcode-specific payload      │
//! └───────────────┴──────────────────────────────┘
//! ```
//!
//! Replies start with a `u16` status code. A `VALUE` reply additionally
//! carries the item snapshot:
//!
//! ```text
//! ┌─────────────┬───────────────┬──────────────┬───────────┐
//! │ code (u16)  │ encoding (u8) │ len (u32)    │ data      │
//! └─────────────┴───────────────┴──────────────┴───────────┘
//! ```
//!
//! where encoding 0 is a plain buffer and encoding 1 is an inline
//! integer whose data is the `i64` in little-endian (len = 8).

use bytes::Bytes;
use std::fmt;

/// Width of the opcode field at the head of every request.
pub const OPCODE_SIZE: usize = std::mem::size_of::<u16>();

/// Wire values for the request opcodes.
pub mod opcode {
    pub const SET: u16 = 1;
    pub const TTL: u16 = 2;
    pub const GET: u16 = 3;
    pub const DEL: u16 = 4;
    pub const INC: u16 = 5;
    pub const DEC: u16 = 6;
    pub const END: u16 = 7;
}

/// Wire values for the value-encoding tag inside a `VALUE` reply.
pub mod encoding {
    pub const PLAIN: u8 = 0;
    pub const NUMBER: u8 = 1;
}

/// A decoded request opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Set,
    Ttl,
    Get,
    Del,
    Inc,
    Dec,
    End,
}

impl Opcode {
    /// Decodes a wire opcode, or `None` for an unrecognized value.
    pub fn from_wire(op: u16) -> Option<Self> {
        match op {
            opcode::SET => Some(Opcode::Set),
            opcode::TTL => Some(Opcode::Ttl),
            opcode::GET => Some(Opcode::Get),
            opcode::DEL => Some(Opcode::Del),
            opcode::INC => Some(Opcode::Inc),
            opcode::DEC => Some(Opcode::Dec),
            opcode::END => Some(Opcode::End),
            _ => None,
        }
    }

    /// The wire value for this opcode.
    pub fn to_wire(self) -> u16 {
        match self {
            Opcode::Set => opcode::SET,
            Opcode::Ttl => opcode::TTL,
            Opcode::Get => opcode::GET,
            Opcode::Del => opcode::DEL,
            Opcode::Inc => opcode::INC,
            Opcode::Dec => opcode::DEC,
            Opcode::End => opcode::END,
        }
    }
}

/// Reply status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyCode {
    /// The command succeeded with no value attached.
    Ok,
    /// Key absent, or discovered expired at access time.
    NotFound,
    /// A payload or stored value failed full integer parsing.
    NotANumber,
    /// Set rejected because the memory ceiling is already met.
    OutOfMemory,
    /// The command succeeded and a value snapshot follows.
    Value,
}

impl ReplyCode {
    /// The wire value for this code.
    pub fn to_wire(self) -> u16 {
        match self {
            ReplyCode::Ok => 0,
            ReplyCode::NotFound => 1,
            ReplyCode::NotANumber => 2,
            ReplyCode::OutOfMemory => 3,
            ReplyCode::Value => 4,
        }
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReplyCode::Ok => "OK",
            ReplyCode::NotFound => "ERR_NOT_FOUND",
            ReplyCode::NotANumber => "ERR_NOT_A_NUMBER",
            ReplyCode::OutOfMemory => "ERR_OUT_OF_MEMORY",
            ReplyCode::Value => "VALUE",
        };
        write!(f, "{}", name)
    }
}

/// Snapshot of a stored value carried inside a `VALUE` reply.
///
/// A `Plain` snapshot shares the item's buffer (cheap refcounted clone),
/// so enqueueing a reply never copies the stored bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyValue {
    Plain(Bytes),
    Number(i64),
}

/// The payload of a reply: a bare status code or a value snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyBody {
    Code(ReplyCode),
    Value(ReplyValue),
}

/// A reply queued for asynchronous delivery to the client.
///
/// Handlers construct replies and return them by value; the connection
/// layer owns the actual write-out, so slow clients never stall command
/// execution. `close_after` asks the connection to shut down once the
/// reply has been flushed (used by the END opcode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub body: ReplyBody,
    pub close_after: bool,
}

impl Reply {
    /// A bare status-code reply.
    pub fn code(code: ReplyCode) -> Self {
        Self {
            body: ReplyBody::Code(code),
            close_after: false,
        }
    }

    /// A value reply.
    pub fn value(value: ReplyValue) -> Self {
        Self {
            body: ReplyBody::Value(value),
            close_after: false,
        }
    }

    /// A status-code reply that closes the connection after delivery.
    pub fn closing(code: ReplyCode) -> Self {
        Self {
            body: ReplyBody::Code(code),
            close_after: true,
        }
    }

    /// Serializes the reply to its wire format.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes the reply into an existing buffer.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match &self.body {
            ReplyBody::Code(code) => {
                buf.extend_from_slice(&code.to_wire().to_le_bytes());
            }
            ReplyBody::Value(value) => {
                buf.extend_from_slice(&ReplyCode::Value.to_wire().to_le_bytes());
                match value {
                    ReplyValue::Plain(data) => {
                        buf.push(encoding::PLAIN);
                        buf.extend_from_slice(&(data.len() as u32).to_le_bytes());
                        buf.extend_from_slice(data);
                    }
                    ReplyValue::Number(n) => {
                        buf.push(encoding::NUMBER);
                        buf.extend_from_slice(&(std::mem::size_of::<i64>() as u32).to_le_bytes());
                        buf.extend_from_slice(&n.to_le_bytes());
                    }
                }
            }
        }
    }
}
