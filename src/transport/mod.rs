//! # Transport Layer
//!
//! Moves frames over a reliable byte stream.
//!
//! The transports contain no codec logic: they hand complete frames to
//! [`SfsCodec`](crate::protocol::SfsCodec) and the `protocol` functions.
//!
//! ## Transports
//! - **TCP**: [`tcp::TcpTransport`] for a single connection and
//!   [`tcp::TcpAcceptor`] for the listening side
//! - **Factory**: `tcp://host:port` URLs to transports

pub mod factory;
pub mod tcp;

use bytes::Bytes;

use crate::error::Result;
use crate::protocol::Message;

pub use factory::{client_from_url, server_from_url, TcpEndpoint};
pub use tcp::{Incoming, TcpAcceptor, TcpTransport};

/// A bidirectional frame stream.
///
/// Sending or receiving on a transport that is not open fails with
/// [`ProtocolError::ConnectionClosed`](crate::error::ProtocolError::ConnectionClosed).
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Establishes the connection. A no-op when already open.
    async fn open(&mut self) -> Result<()>;

    async fn send(&mut self, msg: &Message) -> Result<()>;

    async fn recv(&mut self) -> Result<Message>;

    /// Writes one complete frame, header included, as-is.
    async fn send_raw(&mut self, frame: Bytes) -> Result<()>;

    /// Reads exactly one frame, header included.
    async fn recv_raw(&mut self) -> Result<Bytes>;

    /// Closes the connection. A no-op when already closed.
    async fn close(&mut self) -> Result<()>;

    fn is_open(&self) -> bool;
}
