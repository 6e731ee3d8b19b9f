//! # Field
//!
//! The tagged value model. A [`Field`] is one node of a value tree: a
//! primitive, a homogeneous array, or a container owning further fields.
//!
//! ## Wire Format
//! ```text
//! [TypeCode(1)] [Payload(N)]
//! ```
//! The payload layout depends on the kind; see [`Field::encode`]. Containers
//! embed their children with the children's own type codes.

use bytes::{BufMut, Bytes, BytesMut};
use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::config::FloatOrder;
use crate::core::array::SFSArray;
use crate::core::object::SFSObject;
use crate::core::scalar::{check_u16_len, put_array, put_str16, put_str32, Scalar};
use crate::core::type_code::TypeCode;
use crate::error::{ProtocolError, Result};

/// A single tagged value.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    /// String behind a u16 length prefix.
    UtfString(String),
    /// String behind a u32 length prefix.
    Text(String),
    BoolArray(Vec<bool>),
    /// Raw bytes. Elements are read unsigned; a peer's signed `-1` is `0xFF`.
    ByteArray(Vec<u8>),
    ShortArray(Vec<i16>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
    FloatArray(Vec<f32>),
    DoubleArray(Vec<f64>),
    UtfStringArray(Vec<String>),
    Array(SFSArray),
    Object(SFSObject),
    /// Reserved for serialized class instances. Cannot be encoded or decoded.
    Class,
}

impl Field {
    /// The wire tag for this value.
    pub fn type_code(&self) -> TypeCode {
        match self {
            Field::Null => TypeCode::Null,
            Field::Bool(_) => TypeCode::Bool,
            Field::Byte(_) => TypeCode::Byte,
            Field::Short(_) => TypeCode::Short,
            Field::Int(_) => TypeCode::Int,
            Field::Long(_) => TypeCode::Long,
            Field::Float(_) => TypeCode::Float,
            Field::Double(_) => TypeCode::Double,
            Field::UtfString(_) => TypeCode::UtfString,
            Field::Text(_) => TypeCode::Text,
            Field::BoolArray(_) => TypeCode::BoolArray,
            Field::ByteArray(_) => TypeCode::ByteArray,
            Field::ShortArray(_) => TypeCode::ShortArray,
            Field::IntArray(_) => TypeCode::IntArray,
            Field::LongArray(_) => TypeCode::LongArray,
            Field::FloatArray(_) => TypeCode::FloatArray,
            Field::DoubleArray(_) => TypeCode::DoubleArray,
            Field::UtfStringArray(_) => TypeCode::UtfStringArray,
            Field::Array(_) => TypeCode::SfsArray,
            Field::Object(_) => TypeCode::SfsObject,
            Field::Class => TypeCode::Class,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }

    pub fn as_object(&self) -> Option<&SFSObject> {
        match self {
            Field::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&SFSArray> {
        match self {
            Field::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Unwraps an `SFSObject`, handing the field back on mismatch.
    pub fn into_object(self) -> std::result::Result<SFSObject, Field> {
        match self {
            Field::Object(obj) => Ok(obj),
            other => Err(other),
        }
    }

    /// Unwraps an `SFSArray`, handing the field back on mismatch.
    pub fn into_array(self) -> std::result::Result<SFSArray, Field> {
        match self {
            Field::Array(arr) => Ok(arr),
            other => Err(other),
        }
    }

    /// Serializes to `[type_code][payload]` with big-endian floats.
    pub fn to_bytes(&self) -> Result<Bytes> {
        self.to_bytes_with(FloatOrder::BigEndian)
    }

    /// Serializes to `[type_code][payload]` with the given float byte order.
    pub fn to_bytes_with(&self, order: FloatOrder) -> Result<Bytes> {
        let mut dst = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut dst, order)?;
        Ok(dst.freeze())
    }

    /// Appends the encoded field to `dst`.
    ///
    /// On error `dst` is truncated back to its original length.
    ///
    /// | Kind | Payload |
    /// |---|---|
    /// | Null | empty |
    /// | Bool | 1 byte, 0/1 |
    /// | Byte/Short/Int/Long | 1/2/4/8 bytes, big-endian |
    /// | Float/Double | 4/8 bytes IEEE-754 in `order` |
    /// | UtfString / Text | u16 / u32 length + UTF-8 |
    /// | *Array | u16 count + packed elements |
    /// | SFSObject | u16 count + (u16 key len + key + child)* |
    /// | SFSArray | u16 count + child* |
    pub fn encode(&self, dst: &mut BytesMut, order: FloatOrder) -> Result<()> {
        let start = dst.len();
        self.encode_inner(dst, order).inspect_err(|_| dst.truncate(start))
    }

    fn encode_inner(&self, dst: &mut BytesMut, order: FloatOrder) -> Result<()> {
        if let Field::Class = self {
            return Err(ProtocolError::Unimplemented(TypeCode::Class));
        }
        dst.put_u8(self.type_code().as_u8());

        match self {
            Field::Null | Field::Class => {}
            Field::Bool(v) => dst.put_u8(*v as u8),
            Field::Byte(v) => dst.put_i8(*v),
            Field::Short(v) => dst.put_i16(*v),
            Field::Int(v) => dst.put_i32(*v),
            Field::Long(v) => dst.put_i64(*v),
            Field::Float(v) => (*v).put(dst, order),
            Field::Double(v) => (*v).put(dst, order),
            Field::UtfString(s) => put_str16(dst, s, "utf_string")?,
            Field::Text(s) => put_str32(dst, s, "text")?,
            Field::BoolArray(v) => put_array(dst, v, order, "bool_array")?,
            Field::ByteArray(v) => put_array(dst, v, order, "byte_array")?,
            Field::ShortArray(v) => put_array(dst, v, order, "short_array")?,
            Field::IntArray(v) => put_array(dst, v, order, "int_array")?,
            Field::LongArray(v) => put_array(dst, v, order, "long_array")?,
            Field::FloatArray(v) => put_array(dst, v, order, "float_array")?,
            Field::DoubleArray(v) => put_array(dst, v, order, "double_array")?,
            Field::UtfStringArray(v) => {
                dst.put_u16(check_u16_len(v.len(), "utf_string_array")?);
                for s in v {
                    put_str16(dst, s, "utf_string_array")?;
                }
            }
            Field::Array(arr) => {
                dst.put_u16(check_u16_len(arr.len(), "sfs_array")?);
                for child in arr.iter() {
                    child.encode_inner(dst, order)?;
                }
            }
            Field::Object(obj) => {
                dst.put_u16(check_u16_len(obj.len(), "sfs_object")?);
                for (key, child) in obj.iter() {
                    put_str16(dst, key, "key")?;
                    child.encode_inner(dst, order)?;
                }
            }
        }
        Ok(())
    }

    /// Exact number of bytes [`Field::encode`] writes, tag included.
    pub fn encoded_len(&self) -> usize {
        1 + match self {
            Field::Null | Field::Class => 0,
            Field::Bool(_) | Field::Byte(_) => 1,
            Field::Short(_) => 2,
            Field::Int(_) | Field::Float(_) => 4,
            Field::Long(_) | Field::Double(_) => 8,
            Field::UtfString(s) => 2 + s.len(),
            Field::Text(s) => 4 + s.len(),
            Field::BoolArray(v) => 2 + v.len(),
            Field::ByteArray(v) => 2 + v.len(),
            Field::ShortArray(v) => 2 + v.len() * 2,
            Field::IntArray(v) => 2 + v.len() * 4,
            Field::FloatArray(v) => 2 + v.len() * 4,
            Field::LongArray(v) => 2 + v.len() * 8,
            Field::DoubleArray(v) => 2 + v.len() * 8,
            Field::UtfStringArray(v) => 2 + v.iter().map(|s| 2 + s.len()).sum::<usize>(),
            Field::Array(arr) => 2 + arr.iter().map(Field::encoded_len).sum::<usize>(),
            Field::Object(obj) => {
                2 + obj
                    .iter()
                    .map(|(k, v)| 2 + k.len() + v.encoded_len())
                    .sum::<usize>()
            }
        }
    }
}

macro_rules! impl_from_native {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Field {
                fn from(v: $ty) -> Self {
                    Field::$variant(v)
                }
            }
        )*
    };
}

impl_from_native! {
    bool => Bool,
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    String => UtfString,
    Vec<bool> => BoolArray,
    Vec<u8> => ByteArray,
    Vec<i16> => ShortArray,
    Vec<i32> => IntArray,
    Vec<i64> => LongArray,
    Vec<f32> => FloatArray,
    Vec<f64> => DoubleArray,
    Vec<String> => UtfStringArray,
    SFSArray => Array,
    SFSObject => Object,
}

impl From<&str> for Field {
    fn from(v: &str) -> Self {
        Field::UtfString(v.to_owned())
    }
}

impl From<&[u8]> for Field {
    fn from(v: &[u8]) -> Self {
        Field::ByteArray(v.to_vec())
    }
}

impl From<Vec<&str>> for Field {
    fn from(v: Vec<&str>) -> Self {
        Field::UtfStringArray(v.into_iter().map(str::to_owned).collect())
    }
}

impl<T: Into<Field>> From<Option<T>> for Field {
    fn from(v: Option<T>) -> Self {
        v.map_or(Field::Null, Into::into)
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Field::Null | Field::Class => serializer.serialize_unit(),
            Field::Bool(v) => serializer.serialize_bool(*v),
            Field::Byte(v) => serializer.serialize_i8(*v),
            Field::Short(v) => serializer.serialize_i16(*v),
            Field::Int(v) => serializer.serialize_i32(*v),
            Field::Long(v) => serializer.serialize_i64(*v),
            Field::Float(v) => serializer.serialize_f32(*v),
            Field::Double(v) => serializer.serialize_f64(*v),
            Field::UtfString(s) | Field::Text(s) => serializer.serialize_str(s),
            Field::BoolArray(v) => v.serialize(serializer),
            Field::ByteArray(v) => {
                // Numeric sequence rather than a byte blob, so JSON dumps stay readable.
                let mut seq = serializer.serialize_seq(Some(v.len()))?;
                for b in v {
                    seq.serialize_element(b)?;
                }
                seq.end()
            }
            Field::ShortArray(v) => v.serialize(serializer),
            Field::IntArray(v) => v.serialize(serializer),
            Field::LongArray(v) => v.serialize(serializer),
            Field::FloatArray(v) => v.serialize(serializer),
            Field::DoubleArray(v) => v.serialize(serializer),
            Field::UtfStringArray(v) => v.serialize(serializer),
            Field::Array(arr) => arr.serialize(serializer),
            Field::Object(obj) => obj.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_layout() {
        let bytes = Field::Int(12).to_bytes().unwrap();
        assert_eq!(&bytes[..], &[0x04, 0x00, 0x00, 0x00, 0x0C]);
    }

    #[test]
    fn test_bool_layout() {
        assert_eq!(&Field::Bool(true).to_bytes().unwrap()[..], &[0x01, 0x01]);
        assert_eq!(&Field::Bool(false).to_bytes().unwrap()[..], &[0x01, 0x00]);
    }

    #[test]
    fn test_text_uses_u32_prefix() {
        let bytes = Field::Text("hi".into()).to_bytes().unwrap();
        assert_eq!(&bytes[..], &[0x14, 0x00, 0x00, 0x00, 0x02, b'h', b'i']);
    }

    #[test]
    fn test_utf_string_array_layout() {
        let bytes = Field::from(vec!["a", "bc"]).to_bytes().unwrap();
        assert_eq!(
            &bytes[..],
            &[0x10, 0x00, 0x02, 0x00, 0x01, b'a', 0x00, 0x02, b'b', b'c']
        );
    }

    #[test]
    fn test_float_big_endian_default() {
        let bytes = Field::Float(1.0).to_bytes().unwrap();
        assert_eq!(&bytes[..], &[0x06, 0x3F, 0x80, 0x00, 0x00]);
    }

    #[test]
    fn test_class_refuses_to_encode() {
        let mut dst = BytesMut::from(&b"keep"[..]);
        let err = Field::Class.encode(&mut dst, FloatOrder::BigEndian).unwrap_err();
        assert!(matches!(err, ProtocolError::Unimplemented(TypeCode::Class)));
        assert_eq!(&dst[..], b"keep");
    }

    #[test]
    fn test_failed_nested_encode_truncates() {
        let mut obj = SFSObject::new();
        obj.put_int("ok", 1);
        obj.put("bad", Field::Class);
        let mut dst = BytesMut::new();
        assert!(Field::Object(obj).encode(&mut dst, FloatOrder::BigEndian).is_err());
        assert!(dst.is_empty());
    }

    #[test]
    fn test_encoded_len_matches_output() {
        let mut inner = SFSObject::new();
        inner.put_short("short", -20).put_double_array("d", vec![1.0, 2.0]);
        let mut arr = SFSArray::new();
        arr.add_bool(true).add_utf_string("x").add_sfs_object(inner);
        let field = Field::Array(arr);
        assert_eq!(field.to_bytes().unwrap().len(), field.encoded_len());
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Field::from(None::<i32>), Field::Null);
        assert_eq!(Field::from(Some(5i64)), Field::Long(5));
    }

    #[test]
    fn test_byte_array_is_unsigned_on_read() {
        // A signed peer writes [-1, -128, 5].
        let wire = [0x0A, 0x00, 0x03, 0xFF, 0x80, 0x05];
        let field = crate::core::decode(&mut crate::core::Buffer::new(&wire)).unwrap();
        assert_eq!(field, Field::ByteArray(vec![255, 128, 5]));
        assert_eq!(&field.to_bytes().unwrap()[..], &wire);

        let Field::ByteArray(bytes) = field else { unreachable!() };
        let signed: Vec<i8> = bytes.iter().map(|b| *b as i8).collect();
        assert_eq!(signed, vec![-1, -128, 5]);
    }
}
