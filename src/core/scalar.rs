//! Fixed-width element packing shared by scalar fields and their arrays.
//!
//! Scalars and homogeneous arrays differ only in the element width and the
//! conversion to bytes, so both go through the generic helpers here.

use bytes::{BufMut, BytesMut};

use crate::config::FloatOrder;
use crate::core::buffer::Buffer;
use crate::error::{ProtocolError, Result};

/// Maximum length of anything carried behind a u16 prefix.
pub const MAX_U16_LEN: usize = u16::MAX as usize;

/// Maximum length of anything carried behind a u32 prefix.
pub const MAX_U32_LEN: usize = u32::MAX as usize;

/// A value with a fixed on-wire width.
pub(crate) trait Scalar: Copy + Sized {
    const WIDTH: usize;

    fn put(self, dst: &mut BytesMut, order: FloatOrder);

    fn get(buf: &mut Buffer<'_>, order: FloatOrder) -> Result<Self>;
}

impl Scalar for bool {
    const WIDTH: usize = 1;

    fn put(self, dst: &mut BytesMut, _order: FloatOrder) {
        dst.put_u8(self as u8);
    }

    fn get(buf: &mut Buffer<'_>, _order: FloatOrder) -> Result<Self> {
        Ok(buf.read_u8()? != 0)
    }
}

impl Scalar for u8 {
    const WIDTH: usize = 1;

    fn put(self, dst: &mut BytesMut, _order: FloatOrder) {
        dst.put_u8(self);
    }

    fn get(buf: &mut Buffer<'_>, _order: FloatOrder) -> Result<Self> {
        buf.read_u8()
    }
}

impl Scalar for i8 {
    const WIDTH: usize = 1;

    fn put(self, dst: &mut BytesMut, _order: FloatOrder) {
        dst.put_i8(self);
    }

    fn get(buf: &mut Buffer<'_>, _order: FloatOrder) -> Result<Self> {
        buf.read_i8()
    }
}

impl Scalar for i16 {
    const WIDTH: usize = 2;

    fn put(self, dst: &mut BytesMut, _order: FloatOrder) {
        dst.put_i16(self);
    }

    fn get(buf: &mut Buffer<'_>, _order: FloatOrder) -> Result<Self> {
        buf.read_i16()
    }
}

impl Scalar for i32 {
    const WIDTH: usize = 4;

    fn put(self, dst: &mut BytesMut, _order: FloatOrder) {
        dst.put_i32(self);
    }

    fn get(buf: &mut Buffer<'_>, _order: FloatOrder) -> Result<Self> {
        buf.read_i32()
    }
}

impl Scalar for i64 {
    const WIDTH: usize = 8;

    fn put(self, dst: &mut BytesMut, _order: FloatOrder) {
        dst.put_i64(self);
    }

    fn get(buf: &mut Buffer<'_>, _order: FloatOrder) -> Result<Self> {
        buf.read_i64()
    }
}

impl Scalar for f32 {
    const WIDTH: usize = 4;

    fn put(self, dst: &mut BytesMut, order: FloatOrder) {
        match order {
            FloatOrder::BigEndian => dst.put_f32(self),
            FloatOrder::Native => dst.put_slice(&self.to_ne_bytes()),
        }
    }

    fn get(buf: &mut Buffer<'_>, order: FloatOrder) -> Result<Self> {
        buf.read_f32(order)
    }
}

impl Scalar for f64 {
    const WIDTH: usize = 8;

    fn put(self, dst: &mut BytesMut, order: FloatOrder) {
        match order {
            FloatOrder::BigEndian => dst.put_f64(self),
            FloatOrder::Native => dst.put_slice(&self.to_ne_bytes()),
        }
    }

    fn get(buf: &mut Buffer<'_>, order: FloatOrder) -> Result<Self> {
        buf.read_f64(order)
    }
}

/// Checks that `len` fits behind a u16 prefix.
#[inline]
pub(crate) fn check_u16_len(len: usize, field: &'static str) -> Result<u16> {
    u16::try_from(len).map_err(|_| ProtocolError::LengthExceedsLimit {
        field,
        len,
        max: MAX_U16_LEN,
    })
}

/// Writes a u16 element count followed by the packed elements.
pub(crate) fn put_array<T: Scalar>(
    dst: &mut BytesMut,
    values: &[T],
    order: FloatOrder,
    field: &'static str,
) -> Result<()> {
    let count = check_u16_len(values.len(), field)?;
    dst.reserve(2 + values.len() * T::WIDTH);
    dst.put_u16(count);
    for v in values {
        v.put(dst, order);
    }
    Ok(())
}

/// Reads a u16 element count followed by the packed elements.
///
/// The whole array is bounds-checked before anything is allocated.
pub(crate) fn get_array<T: Scalar>(buf: &mut Buffer<'_>, order: FloatOrder) -> Result<Vec<T>> {
    let count = buf.read_u16()? as usize;
    let needed = count * T::WIDTH;
    if needed > buf.remaining() {
        return Err(ProtocolError::BufferUnderflow {
            requested: needed,
            remaining: buf.remaining(),
        });
    }
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(T::get(buf, order)?);
    }
    Ok(out)
}

/// Writes a u16-length-prefixed UTF-8 string.
pub(crate) fn put_str16(dst: &mut BytesMut, s: &str, field: &'static str) -> Result<()> {
    let len = check_u16_len(s.len(), field)?;
    dst.reserve(2 + s.len());
    dst.put_u16(len);
    dst.put_slice(s.as_bytes());
    Ok(())
}

/// Writes a u32-length-prefixed UTF-8 string.
pub(crate) fn put_str32(dst: &mut BytesMut, s: &str, field: &'static str) -> Result<()> {
    let len = u32::try_from(s.len()).map_err(|_| ProtocolError::LengthExceedsLimit {
        field,
        len: s.len(),
        max: MAX_U32_LEN,
    })?;
    dst.reserve(4 + s.len());
    dst.put_u32(len);
    dst.put_slice(s.as_bytes());
    Ok(())
}
