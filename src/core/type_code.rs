//! Wire type codes.
//!
//! One byte identifies the kind of every encoded field. The values are
//! protocol constants shared with every peer and must never be renumbered.

use crate::error::ProtocolError;

/// Kind tag written in front of every encoded field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TypeCode {
    Null = 0,
    Bool = 1,
    Byte = 2,
    Short = 3,
    Int = 4,
    Long = 5,
    Float = 6,
    Double = 7,
    UtfString = 8,
    BoolArray = 9,
    ByteArray = 10,
    ShortArray = 11,
    IntArray = 12,
    LongArray = 13,
    FloatArray = 14,
    DoubleArray = 15,
    UtfStringArray = 16,
    SfsArray = 17,
    SfsObject = 18,
    Class = 19,
    Text = 20,
}

impl TypeCode {
    /// Every built-in code, in wire order.
    pub const ALL: [TypeCode; 21] = [
        TypeCode::Null,
        TypeCode::Bool,
        TypeCode::Byte,
        TypeCode::Short,
        TypeCode::Int,
        TypeCode::Long,
        TypeCode::Float,
        TypeCode::Double,
        TypeCode::UtfString,
        TypeCode::BoolArray,
        TypeCode::ByteArray,
        TypeCode::ShortArray,
        TypeCode::IntArray,
        TypeCode::LongArray,
        TypeCode::FloatArray,
        TypeCode::DoubleArray,
        TypeCode::UtfStringArray,
        TypeCode::SfsArray,
        TypeCode::SfsObject,
        TypeCode::Class,
        TypeCode::Text,
    ];

    /// The byte written on the wire.
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Look up a built-in code by its wire byte.
    pub fn from_u8(byte: u8) -> Option<Self> {
        Self::ALL.get(byte as usize).copied()
    }

    /// Human-readable name, matching the protocol's own naming.
    pub fn name(self) -> &'static str {
        match self {
            TypeCode::Null => "NULL",
            TypeCode::Bool => "BOOL",
            TypeCode::Byte => "BYTE",
            TypeCode::Short => "SHORT",
            TypeCode::Int => "INT",
            TypeCode::Long => "LONG",
            TypeCode::Float => "FLOAT",
            TypeCode::Double => "DOUBLE",
            TypeCode::UtfString => "UTF_STRING",
            TypeCode::BoolArray => "BOOL_ARRAY",
            TypeCode::ByteArray => "BYTE_ARRAY",
            TypeCode::ShortArray => "SHORT_ARRAY",
            TypeCode::IntArray => "INT_ARRAY",
            TypeCode::LongArray => "LONG_ARRAY",
            TypeCode::FloatArray => "FLOAT_ARRAY",
            TypeCode::DoubleArray => "DOUBLE_ARRAY",
            TypeCode::UtfStringArray => "UTF_STRING_ARRAY",
            TypeCode::SfsArray => "SFS_ARRAY",
            TypeCode::SfsObject => "SFS_OBJECT",
            TypeCode::Class => "CLASS",
            TypeCode::Text => "TEXT",
        }
    }

    /// Whether fields of this kind hold other fields.
    pub fn is_container(self) -> bool {
        matches!(self, TypeCode::SfsArray | TypeCode::SfsObject)
    }
}

impl From<TypeCode> for u8 {
    fn from(code: TypeCode) -> Self {
        code as u8
    }
}

impl TryFrom<u8> for TypeCode {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        TypeCode::from_u8(byte).ok_or(ProtocolError::UnknownType(byte))
    }
}

impl std::fmt::Display for TypeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
