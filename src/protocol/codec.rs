//! # Frame Codec
//!
//! Wraps an encoded field in a frame header and back.
//!
//! ## Wire Format
//! ```text
//! [Flags(1)] [Length(2) | Length(4) if BIG_SIZE] [Payload(Length)]
//! ```
//! `BINARY` is always set on encode. `BIG_SIZE` is set exactly when the
//! payload does not fit a u16 length.
//!
//! The free functions work on complete byte slices. [`SfsCodec`] is the
//! streaming form used with `tokio_util::codec::Framed`; it never consumes a
//! partial frame from its read buffer.

use std::sync::Arc;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::config::{CodecConfig, MAX_FRAME_SIZE};
use crate::core::{Buffer, Field, Registry, RegistryBuilder, SFSObject};
use crate::error::{ProtocolError, Result};
use crate::protocol::flags::Flags;
use crate::protocol::message::Message;

/// Header length with a u16 length prefix.
pub const SHORT_HEADER_LEN: usize = 3;

/// Header length with a u32 length prefix.
pub const BIG_HEADER_LEN: usize = 5;

/// Parsed frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub flags: Flags,
    pub length: usize,
}

impl FrameHeader {
    /// Header for a binary payload of `length` bytes.
    pub fn for_payload(length: usize) -> Result<Self> {
        let mut flags = Flags::BINARY;
        if length > u16::MAX as usize {
            if length > u32::MAX as usize {
                return Err(ProtocolError::LengthExceedsLimit {
                    field: "frame",
                    len: length,
                    max: u32::MAX as usize,
                });
            }
            flags |= Flags::BIG_SIZE;
        }
        Ok(Self { flags, length })
    }

    pub fn header_len(&self) -> usize {
        header_len(self.flags)
    }

    /// Header plus payload.
    pub fn frame_len(&self) -> usize {
        self.header_len() + self.length
    }

    pub fn write(&self, dst: &mut BytesMut) {
        dst.reserve(self.header_len());
        dst.put_u8(self.flags.bits());
        if self.flags.contains(Flags::BIG_SIZE) {
            dst.put_u32(self.length as u32);
        } else {
            dst.put_u16(self.length as u16);
        }
    }

    /// Reads a header from the cursor.
    ///
    /// Encrypted or compressed frames are rejected right after the flags byte,
    /// before any length or payload byte is read.
    pub fn parse(buf: &mut Buffer<'_>) -> Result<Self> {
        let flags = check_flags(buf.read_u8()?)?;
        let length = if flags.contains(Flags::BIG_SIZE) {
            buf.read_u32()? as usize
        } else {
            buf.read_u16()? as usize
        };
        Ok(Self { flags, length })
    }
}

fn header_len(flags: Flags) -> usize {
    if flags.contains(Flags::BIG_SIZE) {
        BIG_HEADER_LEN
    } else {
        SHORT_HEADER_LEN
    }
}

fn check_flags(bits: u8) -> Result<Flags> {
    let flags = Flags::from_bits(bits);
    if flags.intersects(Flags::UNSUPPORTED) {
        return Err(ProtocolError::UnsupportedFlag(bits));
    }
    if !flags.contains(Flags::BINARY) {
        return Err(ProtocolError::InvalidFrame(format!(
            "BINARY flag not set (flags {bits:#04x})"
        )));
    }
    Ok(flags)
}

/// Encodes a message as one frame with the global registry.
pub fn encode(msg: &Message) -> Result<Bytes> {
    encode_with(Registry::global(), msg)
}

/// Encodes a message as one frame with an explicit registry.
pub fn encode_with(registry: &Registry, msg: &Message) -> Result<Bytes> {
    let mut dst = BytesMut::new();
    encode_field_into(registry, &Field::Object(msg.to_sfs_object()), &mut dst)?;
    Ok(dst.freeze())
}

/// Frames any field. On error `dst` is left as it was.
pub fn encode_field_into(registry: &Registry, payload: &Field, dst: &mut BytesMut) -> Result<()> {
    let header = FrameHeader::for_payload(payload.encoded_len())?;
    let start = dst.len();
    dst.reserve(header.frame_len());
    header.write(dst);
    registry
        .encode_into(payload, dst)
        .inspect_err(|_| dst.truncate(start))
}

/// Decodes a slice holding exactly one frame.
pub fn decode(bytes: &[u8]) -> Result<Message> {
    decode_with(Registry::global(), bytes)
}

/// Decodes a slice holding exactly one frame with an explicit registry.
pub fn decode_with(registry: &Registry, bytes: &[u8]) -> Result<Message> {
    let mut buf = Buffer::new(bytes);
    let msg = decode_buffer_with(registry, &mut buf)?;
    if !buf.is_empty() {
        return Err(ProtocolError::InvalidFrame(format!(
            "{} bytes after end of frame",
            buf.remaining()
        )));
    }
    Ok(msg)
}

/// Decodes the next frame from the cursor with the global registry.
///
/// On success the cursor sits right after the frame; on error it is unchanged.
pub fn decode_buffer(buf: &mut Buffer<'_>) -> Result<Message> {
    decode_buffer_with(Registry::global(), buf)
}

pub fn decode_buffer_with(registry: &Registry, buf: &mut Buffer<'_>) -> Result<Message> {
    let payload = decode_frame(registry, buf)?;
    let obj = payload.into_object().map_err(|other| {
        ProtocolError::InvalidFrame(format!("payload is {}, not an SFSObject", other.type_code()))
    })?;
    Message::from_sfs_object(obj)
}

/// Decodes the payload field of the next frame, whatever its kind.
pub fn decode_frame(registry: &Registry, buf: &mut Buffer<'_>) -> Result<Field> {
    let start = buf.tell();
    decode_frame_inner(registry, buf).inspect_err(|_| {
        // Rewinding to a position already visited cannot fail.
        let _ = buf.seek(start);
    })
}

fn decode_frame_inner(registry: &Registry, buf: &mut Buffer<'_>) -> Result<Field> {
    let header = FrameHeader::parse(buf)?;
    let payload = buf.read(header.length)?;
    let mut inner = Buffer::new(payload);
    let field = registry.decode(&mut inner)?;
    if !inner.is_empty() {
        return Err(ProtocolError::InvalidFrame(format!(
            "{} trailing bytes in payload",
            inner.remaining()
        )));
    }
    Ok(field)
}

/// Streaming frame codec for `tokio_util::codec::Framed`.
///
/// Decodes to raw frames (header included); [`SfsCodec::decode_message`] turns
/// one into a [`Message`]. Encodes raw frames verbatim or messages.
#[derive(Debug, Clone)]
pub struct SfsCodec {
    registry: Arc<Registry>,
    max_frame_size: usize,
}

impl Default for SfsCodec {
    fn default() -> Self {
        Self {
            registry: Registry::shared(),
            max_frame_size: MAX_FRAME_SIZE,
        }
    }
}

impl SfsCodec {
    pub fn new(registry: Arc<Registry>, max_frame_size: usize) -> Self {
        Self {
            registry,
            max_frame_size,
        }
    }

    /// Codec over the built-in kinds with options and limits from `config`.
    pub fn from_config(config: &CodecConfig) -> Self {
        let registry = RegistryBuilder::with_builtins().config(config.clone()).build();
        Self::new(Arc::new(registry), config.max_frame_size)
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Decodes a complete frame produced by this codec's decoder.
    pub fn decode_message(&self, frame: &[u8]) -> Result<Message> {
        decode_with(&self.registry, frame)
    }
}

impl Decoder for SfsCodec {
    type Item = Bytes;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        let Some(&bits) = src.first() else {
            return Ok(None);
        };
        let flags = check_flags(bits).inspect_err(|e| warn!(error = %e, "Rejected frame header"))?;

        let header_len = header_len(flags);
        if src.len() < header_len {
            return Ok(None);
        }
        let mut len_bytes = &src[1..header_len];
        let length = if flags.contains(Flags::BIG_SIZE) {
            len_bytes.get_u32() as usize
        } else {
            len_bytes.get_u16() as usize
        };
        if length > self.max_frame_size {
            warn!(length, max = self.max_frame_size, "Rejected oversized frame");
            return Err(ProtocolError::OversizedPacket(length));
        }

        let total = header_len + length;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }
        Ok(Some(src.split_to(total).freeze()))
    }
}

impl Encoder<Bytes> for SfsCodec {
    type Error = ProtocolError;

    fn encode(&mut self, frame: Bytes, dst: &mut BytesMut) -> Result<()> {
        dst.extend_from_slice(&frame);
        Ok(())
    }
}

impl Encoder<Message> for SfsCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> Result<()> {
        let payload = Field::Object(SFSObject::from(msg));
        let length = payload.encoded_len();
        if length > self.max_frame_size {
            return Err(ProtocolError::OversizedPacket(length));
        }
        encode_field_into(&self.registry, &payload, dst)
    }
}
