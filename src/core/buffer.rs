//! Bounds-checked read cursor.
//!
//! A [`Buffer`] is a zero-copy view over caller-owned bytes with a single read
//! position. Every read checks `pos + n <= len` first and leaves the cursor
//! untouched when it fails, so a failed read never half-consumes input.

use crate::config::FloatOrder;
use crate::error::{ProtocolError, Result};

/// Read cursor over an immutable byte slice.
#[derive(Debug, Clone)]
pub struct Buffer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Buffer<'a> {
    /// Creates a buffer positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Total length of the underlying bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Number of bytes left after the cursor.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true if the cursor reached the end.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Current cursor position.
    pub fn tell(&self) -> usize {
        self.pos
    }

    /// Moves the cursor to an absolute position.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(ProtocolError::BufferUnderflow {
                requested: pos,
                remaining: self.data.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Returns the next `n` bytes without advancing.
    #[inline]
    pub fn peek(&self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or(ProtocolError::BufferUnderflow {
                requested: n,
                remaining: self.remaining(),
            })?;
        Ok(&self.data[self.pos..end])
    }

    /// Returns the next `n` bytes and advances past them.
    #[inline]
    pub fn read(&mut self, n: usize) -> Result<&'a [u8]> {
        let bytes = self.peek(n)?;
        self.pos += n;
        Ok(bytes)
    }

    #[inline]
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    #[inline]
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    #[inline]
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    #[inline]
    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(self.read_array()?))
    }

    /// Reads an IEEE-754 single in the given byte order.
    #[inline]
    pub fn read_f32(&mut self, order: FloatOrder) -> Result<f32> {
        let bytes = self.read_array()?;
        Ok(match order {
            FloatOrder::BigEndian => f32::from_be_bytes(bytes),
            FloatOrder::Native => f32::from_ne_bytes(bytes),
        })
    }

    /// Reads an IEEE-754 double in the given byte order.
    #[inline]
    pub fn read_f64(&mut self, order: FloatOrder) -> Result<f64> {
        let bytes = self.read_array()?;
        Ok(match order {
            FloatOrder::BigEndian => f64::from_be_bytes(bytes),
            FloatOrder::Native => f64::from_ne_bytes(bytes),
        })
    }

    /// Reads `len` bytes and validates them as UTF-8.
    ///
    /// The cursor only moves if both the read and the validation succeed.
    pub fn read_str(&mut self, len: usize, field: &'static str) -> Result<&'a str> {
        let bytes = self.peek(len)?;
        let s = std::str::from_utf8(bytes).map_err(|_| ProtocolError::InvalidUtf8 { field })?;
        self.pos += len;
        Ok(s)
    }

    /// Reads a u16-length-prefixed UTF-8 string.
    pub fn read_str16(&mut self, field: &'static str) -> Result<&'a str> {
        let start = self.pos;
        let len = self.read_u16()? as usize;
        self.read_str(len, field).inspect_err(|_| self.pos = start)
    }

    /// Reads a u32-length-prefixed UTF-8 string.
    pub fn read_str32(&mut self, field: &'static str) -> Result<&'a str> {
        let start = self.pos;
        let len = self.read_u32()? as usize;
        self.read_str(len, field).inspect_err(|_| self.pos = start)
    }
}

impl<'a> From<&'a [u8]> for Buffer<'a> {
    fn from(data: &'a [u8]) -> Self {
        Buffer::new(data)
    }
}
