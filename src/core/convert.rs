//! Typed extraction from [`Field`].
//!
//! [`FromField`] backs the generic `get` accessors on both containers: it names
//! the kind a Rust type expects and borrows the value out when the field holds
//! that kind.

use crate::core::array::SFSArray;
use crate::core::field::Field;
use crate::core::object::SFSObject;
use crate::core::type_code::TypeCode;
use crate::error::{ProtocolError, Result};

/// A Rust type that can be read out of a field of one specific kind.
pub trait FromField<'a>: Sized {
    /// Kind reported in [`ProtocolError::TypeMismatch`] when extraction fails.
    const EXPECTED: TypeCode;

    fn from_field(field: &'a Field) -> Option<Self>;

    /// Like [`FromField::from_field`] but fails with a type mismatch.
    fn extract(field: &'a Field) -> Result<Self> {
        Self::from_field(field).ok_or(ProtocolError::TypeMismatch {
            expected: Self::EXPECTED,
            found: field.type_code(),
        })
    }
}

macro_rules! impl_copy {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl<'a> FromField<'a> for $ty {
                const EXPECTED: TypeCode = TypeCode::$variant;

                fn from_field(field: &'a Field) -> Option<Self> {
                    match field {
                        Field::$variant(v) => Some(*v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

macro_rules! impl_borrowed {
    ($($ty:ty => $variant:ident / $code:ident),* $(,)?) => {
        $(
            impl<'a> FromField<'a> for &'a $ty {
                const EXPECTED: TypeCode = TypeCode::$code;

                fn from_field(field: &'a Field) -> Option<Self> {
                    match field {
                        Field::$variant(v) => Some(v as &$ty),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_copy! {
    bool => Bool,
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
}

impl_borrowed! {
    [bool] => BoolArray / BoolArray,
    [u8] => ByteArray / ByteArray,
    [i16] => ShortArray / ShortArray,
    [i32] => IntArray / IntArray,
    [i64] => LongArray / LongArray,
    [f32] => FloatArray / FloatArray,
    [f64] => DoubleArray / DoubleArray,
    [String] => UtfStringArray / UtfStringArray,
    SFSArray => Array / SfsArray,
    SFSObject => Object / SfsObject,
}

/// Both string kinds read as `&str`.
impl<'a> FromField<'a> for &'a str {
    const EXPECTED: TypeCode = TypeCode::UtfString;

    fn from_field(field: &'a Field) -> Option<Self> {
        match field {
            Field::UtfString(s) | Field::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl<'a> FromField<'a> for &'a Field {
    const EXPECTED: TypeCode = TypeCode::Null;

    fn from_field(field: &'a Field) -> Option<Self> {
        Some(field)
    }
}
