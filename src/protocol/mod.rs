//! # Message Protocol
//!
//! Framing and the `{c, a, p}` message envelope on top of the value codec.
//!
//! ## Components
//! - **Flags**: frame header bit set
//! - **Codec**: one-shot `encode`/`decode` plus the streaming [`SfsCodec`]
//! - **Message**: controller, action and parameter object
//! - **Dispatcher**: routes decoded messages to handlers
//!
//! ## Security
//! - Encrypted and compressed frames are rejected before their length is read
//! - Frame lengths above `CodecConfig::max_frame_size` are rejected before buffering
//! - Trailing bytes inside a payload invalidate the frame

pub mod codec;
pub mod constants;
pub mod dispatcher;
pub mod flags;
pub mod message;

pub use codec::{
    decode, decode_buffer, decode_buffer_with, decode_frame, decode_with, encode,
    encode_field_into, encode_with, FrameHeader, SfsCodec,
};
pub use constants::{ControllerId, SysAction};
pub use dispatcher::Dispatcher;
pub use flags::Flags;
pub use message::Message;
