//! # Error Types
//!
//! Error handling for the object codec, the frame codec and the transports.
//!
//! Every failure in the crate is a variant of [`ProtocolError`]. Codec errors
//! are immediate and all-or-nothing: a failing decode never hands back a
//! partially built value.
//!
//! ## Error Categories
//! - **Buffer errors**: truncated or malformed input
//! - **Type errors**: unknown tags, unimplemented kinds, oversize values
//! - **Framing errors**: unsupported flags, invalid headers, oversize frames
//! - **Lookup errors**: missing keys, out-of-range indices, kind mismatches
//! - **Transport errors**: I/O failures, closed connections, timeouts
//!
//! ## Example Usage
//! ```rust
//! use sfs_protocol::core::{Buffer, decode};
//! use sfs_protocol::error::ProtocolError;
//!
//! let mut buf = Buffer::new(&[0x04, 0x00, 0x01]);
//! match decode(&mut buf) {
//!     Err(ProtocolError::BufferUnderflow { requested, remaining }) => {
//!         assert_eq!((requested, remaining), (4, 2));
//!     }
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use std::io;
use thiserror::Error;

use crate::core::TypeCode;

// ProtocolError is the primary error type for all codec and transport operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Buffer underflow: requested {requested} bytes, {remaining} remaining")]
    BufferUnderflow { requested: usize, remaining: usize },

    #[error("Unknown type code: {0}")]
    UnknownType(u8),

    #[error("Type code {0} is already registered")]
    DuplicateType(u8),

    #[error("{0:?} is not implemented")]
    Unimplemented(TypeCode),

    #[error("Invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("Nesting depth exceeds maximum of {0}")]
    DepthExceeded(usize),

    #[error("Unsupported frame flags: {0:#04x}")]
    UnsupportedFlag(u8),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Packet too large: {0} bytes")]
    OversizedPacket(usize),

    #[error("Missing key: {0}")]
    MissingKey(String),

    #[error("Index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Type mismatch: expected {expected:?}, found {found:?}")]
    TypeMismatch { expected: TypeCode, found: TypeCode },

    #[error("Unexpected message type")]
    UnexpectedMessage,

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timeout occurred")]
    Timeout,

    #[error("Unsupported transport scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ProtocolError {
    /// Whether the error leaves a stream connection desynchronized.
    ///
    /// After a framing-level failure the peer's byte stream can no longer be
    /// trusted to sit at a frame boundary, so the connection should be closed.
    pub fn is_fatal_for_stream(&self) -> bool {
        matches!(
            self,
            ProtocolError::Io(_)
                | ProtocolError::UnsupportedFlag(_)
                | ProtocolError::InvalidFrame(_)
                | ProtocolError::OversizedPacket(_)
                | ProtocolError::ConnectionClosed
        )
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
