//! Heterogeneous ordered sequence of fields.

use std::ops::Index;

use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::core::convert::FromField;
use crate::core::field::Field;
use crate::core::object::SFSObject;
use crate::error::{ProtocolError, Result};

/// Ordered list of fields of any kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SFSArray {
    items: Vec<Field>,
}

macro_rules! typed_accessors {
    ($($add:ident, $get:ident: $ty:ty => $out:ty;)*) => {
        $(
            pub fn $add(&mut self, value: $ty) -> &mut Self {
                self.add(value)
            }

            pub fn $get(&self, index: usize) -> Result<$out> {
                self.get(index)
            }
        )*
    };
}

impl SFSArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends `value` and returns `self` for chaining.
    pub fn add(&mut self, value: impl Into<Field>) -> &mut Self {
        self.items.push(value.into());
        self
    }

    pub fn get_field(&self, index: usize) -> Option<&Field> {
        self.items.get(index)
    }

    /// Typed read that fails when out of range or on a kind mismatch.
    pub fn get<'a, T: FromField<'a>>(&'a self, index: usize) -> Result<T> {
        let field = self.items.get(index).ok_or(ProtocolError::IndexOutOfRange {
            index,
            len: self.items.len(),
        })?;
        T::extract(field)
    }

    pub fn remove(&mut self, index: usize) -> Result<Field> {
        if index >= self.items.len() {
            return Err(ProtocolError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    pub fn add_null(&mut self) -> &mut Self {
        self.add(Field::Null)
    }

    pub fn add_utf_string(&mut self, value: impl Into<String>) -> &mut Self {
        self.add(Field::UtfString(value.into()))
    }

    pub fn get_utf_string(&self, index: usize) -> Result<&str> {
        self.get(index)
    }

    pub fn add_text(&mut self, value: impl Into<String>) -> &mut Self {
        self.add(Field::Text(value.into()))
    }

    pub fn get_text(&self, index: usize) -> Result<&str> {
        self.get(index)
    }

    typed_accessors! {
        add_bool, get_bool: bool => bool;
        add_byte, get_byte: i8 => i8;
        add_short, get_short: i16 => i16;
        add_int, get_int: i32 => i32;
        add_long, get_long: i64 => i64;
        add_float, get_float: f32 => f32;
        add_double, get_double: f64 => f64;
        add_bool_array, get_bool_array: Vec<bool> => &[bool];
        add_byte_array, get_byte_array: Vec<u8> => &[u8];
        add_short_array, get_short_array: Vec<i16> => &[i16];
        add_int_array, get_int_array: Vec<i32> => &[i32];
        add_long_array, get_long_array: Vec<i64> => &[i64];
        add_float_array, get_float_array: Vec<f32> => &[f32];
        add_double_array, get_double_array: Vec<f64> => &[f64];
        add_utf_string_array, get_utf_string_array: Vec<String> => &[String];
        add_sfs_array, get_sfs_array: SFSArray => &SFSArray;
        add_sfs_object, get_sfs_object: SFSObject => &SFSObject;
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Field] {
        &self.items
    }
}

impl Index<usize> for SFSArray {
    type Output = Field;

    fn index(&self, index: usize) -> &Field {
        &self.items[index]
    }
}

impl<V: Into<Field>> FromIterator<V> for SFSArray {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<V: Into<Field>> Extend<V> for SFSArray {
    fn extend<I: IntoIterator<Item = V>>(&mut self, iter: I) {
        self.items.extend(iter.into_iter().map(Into::into));
    }
}

impl From<Vec<Field>> for SFSArray {
    fn from(items: Vec<Field>) -> Self {
        Self { items }
    }
}

impl IntoIterator for SFSArray {
    type Item = Field;
    type IntoIter = std::vec::IntoIter<Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a SFSArray {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Serialize for SFSArray {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.items.len()))?;
        for item in &self.items {
            seq.serialize_element(item)?;
        }
        seq.end()
    }
}
