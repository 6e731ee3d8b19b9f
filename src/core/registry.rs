//! # Type Registry
//!
//! Maps a one-byte type code to the function that decodes its payload.
//!
//! A [`RegistryBuilder`] collects decoders and is frozen into an immutable
//! [`Registry`]. Once frozen there is no way to register anything else, so a
//! registry shared between threads never needs locking.
//!
//! ```rust
//! use sfs_protocol::core::{Buffer, Field, Registry, RegistryBuilder};
//! use sfs_protocol::core::registry::DecodeContext;
//! use sfs_protocol::error::Result;
//!
//! // A peer-specific kind carried under an unused code.
//! fn decode_flag(buf: &mut Buffer<'_>, _ctx: &mut DecodeContext<'_>) -> Result<Field> {
//!     Ok(Field::Bool(buf.read_u8()? == 0xFF))
//! }
//!
//! let registry: Registry = RegistryBuilder::with_builtins()
//!     .register(0x40, decode_flag)
//!     .unwrap()
//!     .build();
//!
//! let mut buf = Buffer::new(&[0x40, 0xFF]);
//! assert_eq!(registry.decode(&mut buf).unwrap(), Field::Bool(true));
//! ```

use std::sync::{Arc, OnceLock};

use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::config::{CodecConfig, FloatOrder};
use crate::core::buffer::Buffer;
use crate::core::decode;
use crate::core::field::Field;
use crate::core::type_code::TypeCode;
use crate::error::{ProtocolError, Result};

/// Decodes one payload. The type code has already been consumed.
pub type DecodeFn = fn(&mut Buffer<'_>, &mut DecodeContext<'_>) -> Result<Field>;

type DecoderTable = [Option<DecodeFn>; 256];

/// Mutable collection of decoders, frozen by [`RegistryBuilder::build`].
#[derive(Clone)]
pub struct RegistryBuilder {
    decoders: DecoderTable,
    config: CodecConfig,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl RegistryBuilder {
    /// A builder with no decoders at all.
    pub fn empty() -> Self {
        Self {
            decoders: [None; 256],
            config: CodecConfig::default(),
        }
    }

    /// A builder pre-populated with every built-in kind.
    pub fn with_builtins() -> Self {
        let mut builder = Self::empty();
        for code in TypeCode::ALL {
            builder.decoders[code.as_u8() as usize] = Some(decode::builtin(code));
        }
        builder
    }

    /// Sets the codec options used by every decode through the registry.
    pub fn config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a decoder under an unused code.
    pub fn register(mut self, code: u8, decoder: DecodeFn) -> Result<Self> {
        if self.decoders[code as usize].is_some() {
            return Err(ProtocolError::DuplicateType(code));
        }
        self.decoders[code as usize] = Some(decoder);
        Ok(self)
    }

    /// Installs a decoder, replacing whatever was registered under `code`.
    pub fn replace(mut self, code: u8, decoder: DecodeFn) -> Self {
        self.decoders[code as usize] = Some(decoder);
        self
    }

    pub fn build(self) -> Registry {
        Registry {
            decoders: self.decoders,
            config: self.config,
        }
    }
}

/// Immutable type-code → decoder table plus the codec options.
pub struct Registry {
    decoders: DecoderTable,
    config: CodecConfig,
}

static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();

impl Default for Registry {
    fn default() -> Self {
        RegistryBuilder::with_builtins().build()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let codes: Vec<u8> = (0..=255u8)
            .filter(|c| self.decoders[*c as usize].is_some())
            .collect();
        f.debug_struct("Registry")
            .field("codes", &codes)
            .field("config", &self.config)
            .finish()
    }
}

impl Registry {
    /// Process-wide registry with the built-in kinds and default options.
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(|| Arc::new(Registry::default()))
    }

    /// Shared handle to [`Registry::global`] for owners that need `Arc`.
    pub fn shared() -> Arc<Registry> {
        GLOBAL.get_or_init(|| Arc::new(Registry::default())).clone()
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn float_order(&self) -> FloatOrder {
        self.config.float_order
    }

    /// Returns true if a decoder is registered for `code`.
    pub fn contains(&self, code: u8) -> bool {
        self.decoders[code as usize].is_some()
    }

    pub fn lookup(&self, code: u8) -> Option<DecodeFn> {
        self.decoders[code as usize]
    }

    /// Decodes one tagged field from the cursor.
    pub fn decode(&self, buf: &mut Buffer<'_>) -> Result<Field> {
        let mut ctx = DecodeContext::new(self);
        ctx.decode(buf)
    }

    /// Encodes a field with this registry's float byte order.
    pub fn encode(&self, field: &Field) -> Result<Bytes> {
        field.to_bytes_with(self.config.float_order)
    }

    /// Appends an encoded field to `dst` with this registry's float byte order.
    pub fn encode_into(&self, field: &Field, dst: &mut BytesMut) -> Result<()> {
        field.encode(dst, self.config.float_order)
    }
}

/// State threaded through a single decode call.
///
/// Tracks how many containers deep the cursor is so adversarial nesting fails
/// with [`ProtocolError::DepthExceeded`] instead of exhausting the stack.
#[derive(Debug)]
pub struct DecodeContext<'r> {
    registry: &'r Registry,
    depth: usize,
}

impl<'r> DecodeContext<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry, depth: 0 }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn float_order(&self) -> FloatOrder {
        self.registry.config.float_order
    }

    /// Number of containers currently entered.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Reads a type code and dispatches to its decoder.
    ///
    /// An unknown code fails with [`ProtocolError::UnknownType`] right after
    /// the tag byte.
    pub fn decode(&mut self, buf: &mut Buffer<'_>) -> Result<Field> {
        let code = buf.read_u8()?;
        let decoder = self
            .registry
            .lookup(code)
            .ok_or(ProtocolError::UnknownType(code))?;
        trace!(code, depth = self.depth, offset = buf.tell(), "decoding field");
        decoder(buf, self)
    }

    /// Runs `f` one container level deeper.
    pub fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let max = self.registry.config.max_depth;
        if self.depth >= max {
            return Err(ProtocolError::DepthExceeded(max));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }
}
