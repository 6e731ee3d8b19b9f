//! Payload decoders for the built-in kinds.
//!
//! Each decoder consumes exactly the payload its encoder wrote; the type code
//! in front of it has already been read by the dispatcher.

use crate::core::array::SFSArray;
use crate::core::buffer::Buffer;
use crate::core::field::Field;
use crate::core::object::SFSObject;
use crate::core::registry::{DecodeContext, DecodeFn};
use crate::core::scalar::{get_array, Scalar};
use crate::core::type_code::TypeCode;
use crate::error::{ProtocolError, Result};

/// Smallest possible encoded object entry: empty key + Null child.
const MIN_ENTRY_LEN: usize = 3;

/// Decoder for a built-in kind.
pub(crate) fn builtin(code: TypeCode) -> DecodeFn {
    match code {
        TypeCode::Null => decode_null,
        TypeCode::Bool => decode_bool,
        TypeCode::Byte => decode_byte,
        TypeCode::Short => decode_short,
        TypeCode::Int => decode_int,
        TypeCode::Long => decode_long,
        TypeCode::Float => decode_float,
        TypeCode::Double => decode_double,
        TypeCode::UtfString => decode_utf_string,
        TypeCode::Text => decode_text,
        TypeCode::BoolArray => decode_bool_array,
        TypeCode::ByteArray => decode_byte_array,
        TypeCode::ShortArray => decode_short_array,
        TypeCode::IntArray => decode_int_array,
        TypeCode::LongArray => decode_long_array,
        TypeCode::FloatArray => decode_float_array,
        TypeCode::DoubleArray => decode_double_array,
        TypeCode::UtfStringArray => decode_utf_string_array,
        TypeCode::SfsArray => decode_sfs_array,
        TypeCode::SfsObject => decode_sfs_object,
        TypeCode::Class => decode_class,
    }
}

fn decode_null(_buf: &mut Buffer<'_>, _ctx: &mut DecodeContext<'_>) -> Result<Field> {
    Ok(Field::Null)
}

fn decode_bool(buf: &mut Buffer<'_>, ctx: &mut DecodeContext<'_>) -> Result<Field> {
    bool::get(buf, ctx.float_order()).map(Field::Bool)
}

fn decode_byte(buf: &mut Buffer<'_>, _ctx: &mut DecodeContext<'_>) -> Result<Field> {
    buf.read_i8().map(Field::Byte)
}

fn decode_short(buf: &mut Buffer<'_>, _ctx: &mut DecodeContext<'_>) -> Result<Field> {
    buf.read_i16().map(Field::Short)
}

fn decode_int(buf: &mut Buffer<'_>, _ctx: &mut DecodeContext<'_>) -> Result<Field> {
    buf.read_i32().map(Field::Int)
}

fn decode_long(buf: &mut Buffer<'_>, _ctx: &mut DecodeContext<'_>) -> Result<Field> {
    buf.read_i64().map(Field::Long)
}

fn decode_float(buf: &mut Buffer<'_>, ctx: &mut DecodeContext<'_>) -> Result<Field> {
    buf.read_f32(ctx.float_order()).map(Field::Float)
}

fn decode_double(buf: &mut Buffer<'_>, ctx: &mut DecodeContext<'_>) -> Result<Field> {
    buf.read_f64(ctx.float_order()).map(Field::Double)
}

fn decode_utf_string(buf: &mut Buffer<'_>, _ctx: &mut DecodeContext<'_>) -> Result<Field> {
    let s = buf.read_str16("utf_string")?;
    Ok(Field::UtfString(s.to_owned()))
}

fn decode_text(buf: &mut Buffer<'_>, _ctx: &mut DecodeContext<'_>) -> Result<Field> {
    let s = buf.read_str32("text")?;
    Ok(Field::Text(s.to_owned()))
}

fn decode_bool_array(buf: &mut Buffer<'_>, ctx: &mut DecodeContext<'_>) -> Result<Field> {
    get_array(buf, ctx.float_order()).map(Field::BoolArray)
}

fn decode_byte_array(buf: &mut Buffer<'_>, _ctx: &mut DecodeContext<'_>) -> Result<Field> {
    let len = buf.read_u16()? as usize;
    let bytes = buf.read(len)?;
    Ok(Field::ByteArray(bytes.to_vec()))
}

fn decode_short_array(buf: &mut Buffer<'_>, ctx: &mut DecodeContext<'_>) -> Result<Field> {
    get_array(buf, ctx.float_order()).map(Field::ShortArray)
}

fn decode_int_array(buf: &mut Buffer<'_>, ctx: &mut DecodeContext<'_>) -> Result<Field> {
    get_array(buf, ctx.float_order()).map(Field::IntArray)
}

fn decode_long_array(buf: &mut Buffer<'_>, ctx: &mut DecodeContext<'_>) -> Result<Field> {
    get_array(buf, ctx.float_order()).map(Field::LongArray)
}

fn decode_float_array(buf: &mut Buffer<'_>, ctx: &mut DecodeContext<'_>) -> Result<Field> {
    get_array(buf, ctx.float_order()).map(Field::FloatArray)
}

fn decode_double_array(buf: &mut Buffer<'_>, ctx: &mut DecodeContext<'_>) -> Result<Field> {
    get_array(buf, ctx.float_order()).map(Field::DoubleArray)
}

fn decode_utf_string_array(buf: &mut Buffer<'_>, _ctx: &mut DecodeContext<'_>) -> Result<Field> {
    let count = buf.read_u16()? as usize;
    // Every element carries at least its 2-byte length.
    let mut out = Vec::with_capacity(count.min(buf.remaining() / 2));
    for _ in 0..count {
        out.push(buf.read_str16("utf_string_array")?.to_owned());
    }
    Ok(Field::UtfStringArray(out))
}

fn decode_sfs_array(buf: &mut Buffer<'_>, ctx: &mut DecodeContext<'_>) -> Result<Field> {
    let count = buf.read_u16()? as usize;
    ctx.nested(|ctx| {
        let mut arr = SFSArray::with_capacity(count.min(buf.remaining()));
        for _ in 0..count {
            arr.add(ctx.decode(buf)?);
        }
        Ok(Field::Array(arr))
    })
}

fn decode_sfs_object(buf: &mut Buffer<'_>, ctx: &mut DecodeContext<'_>) -> Result<Field> {
    let count = buf.read_u16()? as usize;
    ctx.nested(|ctx| {
        let mut obj = SFSObject::with_capacity(count.min(buf.remaining() / MIN_ENTRY_LEN));
        for _ in 0..count {
            let key = buf.read_str16("key")?.to_owned();
            let child = ctx.decode(buf)?;
            obj.put(key, child);
        }
        Ok(Field::Object(obj))
    })
}

fn decode_class(_buf: &mut Buffer<'_>, _ctx: &mut DecodeContext<'_>) -> Result<Field> {
    Err(ProtocolError::Unimplemented(TypeCode::Class))
}

/// Decodes one field with the global registry.
pub fn decode(buf: &mut Buffer<'_>) -> Result<Field> {
    crate::core::registry::Registry::global().decode(buf)
}
