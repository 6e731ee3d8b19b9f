//! Frame header flag byte.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bit set carried in the first byte of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flags(u8);

impl Flags {
    /// Payload is a binary serialized field. Always set by this codec.
    pub const BINARY: Flags = Flags(0x80);
    /// Payload is encrypted. Rejected on decode.
    pub const ENCRYPTED: Flags = Flags(0x40);
    /// Payload is compressed. Rejected on decode.
    pub const COMPRESSED: Flags = Flags(0x20);
    /// Frame travelled through an HTTP tunnel. Informational only.
    pub const BLUE_BOXED: Flags = Flags(0x10);
    /// Length prefix is 4 bytes instead of 2.
    pub const BIG_SIZE: Flags = Flags(0x08);

    /// Flags this codec refuses to handle.
    pub const UNSUPPORTED: Flags = Flags(0x40 | 0x20);

    pub const fn empty() -> Self {
        Flags(0)
    }

    pub const fn from_bits(bits: u8) -> Self {
        Flags(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True if every bit of `other` is set.
    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if any bit of `other` is set.
    pub const fn intersects(self, other: Flags) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        self.0 |= rhs.0;
    }
}

impl From<u8> for Flags {
    fn from(bits: u8) -> Self {
        Flags(bits)
    }
}

impl From<Flags> for u8 {
    fn from(flags: Flags) -> u8 {
        flags.0
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(Flags, &str); 5] = [
            (Flags::BINARY, "BINARY"),
            (Flags::ENCRYPTED, "ENCRYPTED"),
            (Flags::COMPRESSED, "COMPRESSED"),
            (Flags::BLUE_BOXED, "BLUE_BOXED"),
            (Flags::BIG_SIZE, "BIG_SIZE"),
        ];
        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("0")?;
        }
        Ok(())
    }
}
