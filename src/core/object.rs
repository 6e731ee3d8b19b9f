//! # SFSObject
//!
//! String-keyed container of fields.
//!
//! Keys are unique. Writing an existing key replaces its value in place, so the
//! key keeps the position of its first insertion. Iteration and encoding both
//! follow that insertion order, which makes encoding deterministic.
//!
//! ```rust
//! use sfs_protocol::core::{Field, SFSObject};
//!
//! let mut obj = SFSObject::new();
//! obj.put_int("id", 7).put_utf_string("name", "lobby");
//!
//! assert_eq!(obj.get_int("id").unwrap(), 7);
//! assert_eq!(obj.get::<&str>("name").unwrap(), "lobby");
//! assert!(obj.get_int("missing").is_err());
//! ```

use std::ops::Index;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::core::array::SFSArray;
use crate::core::convert::FromField;
use crate::core::field::Field;
use crate::error::{ProtocolError, Result};

/// Ordered map from key to field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SFSObject {
    entries: IndexMap<String, Field>,
}

macro_rules! typed_accessors {
    ($($put:ident, $get:ident: $ty:ty => $out:ty;)*) => {
        $(
            pub fn $put(&mut self, key: impl Into<String>, value: $ty) -> &mut Self {
                self.put(key, value)
            }

            pub fn $get(&self, key: &str) -> Result<$out> {
                self.get(key)
            }
        )*
    };
}

impl SFSObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Stores `value` under `key` and returns `self` for chaining.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Field>) -> &mut Self {
        self.insert(key, value);
        self
    }

    /// Stores `value` under `key`, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Field>) -> Option<Field> {
        self.entries.insert(key.into(), value.into())
    }

    /// Removes `key`, keeping the relative order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Field> {
        self.entries.shift_remove(key)
    }

    pub fn get_field(&self, key: &str) -> Option<&Field> {
        self.entries.get(key)
    }

    pub fn get_field_mut(&mut self, key: &str) -> Option<&mut Field> {
        self.entries.get_mut(key)
    }

    /// Typed read that fails on a missing key or a kind mismatch.
    pub fn get<'a, T: FromField<'a>>(&'a self, key: &str) -> Result<T> {
        let field = self
            .entries
            .get(key)
            .ok_or_else(|| ProtocolError::MissingKey(key.to_owned()))?;
        T::extract(field)
    }

    /// Typed read that falls back to `default` only when the key is absent.
    ///
    /// A present key holding another kind is still an error.
    pub fn get_or<'a, T: FromField<'a>>(&'a self, key: &str, default: T) -> Result<T> {
        match self.entries.get(key) {
            Some(field) => T::extract(field),
            None => Ok(default),
        }
    }

    pub fn put_null(&mut self, key: impl Into<String>) -> &mut Self {
        self.put(key, Field::Null)
    }

    pub fn is_null(&self, key: &str) -> bool {
        matches!(self.entries.get(key), Some(Field::Null))
    }

    pub fn put_utf_string(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.put(key, Field::UtfString(value.into()))
    }

    pub fn get_utf_string(&self, key: &str) -> Result<&str> {
        self.get(key)
    }

    pub fn put_text(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.put(key, Field::Text(value.into()))
    }

    pub fn get_text(&self, key: &str) -> Result<&str> {
        self.get(key)
    }

    typed_accessors! {
        put_bool, get_bool: bool => bool;
        put_byte, get_byte: i8 => i8;
        put_short, get_short: i16 => i16;
        put_int, get_int: i32 => i32;
        put_long, get_long: i64 => i64;
        put_float, get_float: f32 => f32;
        put_double, get_double: f64 => f64;
        put_bool_array, get_bool_array: Vec<bool> => &[bool];
        put_byte_array, get_byte_array: Vec<u8> => &[u8];
        put_short_array, get_short_array: Vec<i16> => &[i16];
        put_int_array, get_int_array: Vec<i32> => &[i32];
        put_long_array, get_long_array: Vec<i64> => &[i64];
        put_float_array, get_float_array: Vec<f32> => &[f32];
        put_double_array, get_double_array: Vec<f64> => &[f64];
        put_utf_string_array, get_utf_string_array: Vec<String> => &[String];
        put_sfs_array, get_sfs_array: SFSArray => &SFSArray;
        put_sfs_object, get_sfs_object: SFSObject => &SFSObject;
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Field> + '_ {
        self.entries.values()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Index<&str> for SFSObject {
    type Output = Field;

    /// Panics if `key` is absent; use [`SFSObject::get_field`] otherwise.
    fn index(&self, key: &str) -> &Field {
        &self.entries[key]
    }
}

impl<K: Into<String>, V: Into<Field>> FromIterator<(K, V)> for SFSObject {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut obj = SFSObject::new();
        for (k, v) in iter {
            obj.insert(k, v);
        }
        obj
    }
}

impl<K: Into<String>, V: Into<Field>> Extend<(K, V)> for SFSObject {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl IntoIterator for SFSObject {
    type Item = (String, Field);
    type IntoIter = indexmap::map::IntoIter<String, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for SFSObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
