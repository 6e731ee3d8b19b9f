//! # sfs-protocol
//!
//! Binary object codec and message framing for the SFS2X game-server protocol
//! family.
//!
//! Applications build a tree of typed values ([`SFSObject`], [`SFSArray`],
//! [`Field`]), encode it to the compact tagged binary form and decode it back
//! to an identical tree. Messages wrap such a tree in a `{c, a, p}` envelope
//! and a length-prefixed frame.
//!
//! ## Layers
//! - [`core`]: buffer cursor, type registry, value model and codec
//! - [`protocol`]: frame header, message envelope, streaming codec, dispatcher
//! - [`transport`]: TCP client/acceptor and `tcp://` URL factory
//! - [`config`], [`utils`]: configuration, logging, metrics, timeouts
//!
//! ## Example
//! ```rust
//! use sfs_protocol::{protocol, Message, SFSObject};
//!
//! let mut params = SFSObject::new();
//! params.put_utf_string("zn", "BasicExamples").put_int("id", 7);
//!
//! let msg = Message::new(0, 1, params);
//! let frame = protocol::encode(&msg).unwrap();
//! assert_eq!(frame[0], 0x80);
//! assert_eq!(protocol::decode(&frame).unwrap(), msg);
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod utils;

pub use crate::config::{CodecConfig, FloatOrder, ProtocolConfig};
pub use crate::core::{Buffer, Field, FromField, Registry, RegistryBuilder, SFSArray, SFSObject, TypeCode};
pub use crate::error::{ProtocolError, Result};
pub use crate::protocol::{Dispatcher, Flags, Message, SfsCodec};
pub use crate::transport::{Transport, TcpAcceptor, TcpTransport};
