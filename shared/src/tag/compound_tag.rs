use std::collections::{btree_map, BTreeMap};

use serde::{Deserialize, Serialize};

use super::{error::TagError, Tag};

/// String-keyed map of tags, ordered by key so documents serialize
/// deterministically
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompoundTag {
    entries: BTreeMap<String, Tag>,
}

macro_rules! typed_getter {
    ($get:ident, $get_or:ident, $variant:ident, $ty:ty) => {
        pub fn $get(&self, key: &str) -> Result<$ty, TagError> {
            match self.require(key)? {
                Tag::$variant(value) => Ok(*value),
                other => Err(Self::mismatch(key, stringify!($variant), other)),
            }
        }

        /// Like the plain getter, but a missing key yields `default`
        pub fn $get_or(&self, key: &str, default: $ty) -> Result<$ty, TagError> {
            if !self.contains_key(key) {
                return Ok(default);
            }
            self.$get(key)
        }
    };
}

impl CompoundTag {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
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

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Tag> {
        self.entries.iter()
    }

    pub fn get(&self, key: &str) -> Option<&Tag> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Tag> {
        self.entries.remove(key)
    }

    /// Inserts a tag, returning whatever was stored under `key` before
    pub fn put(&mut self, key: impl Into<String>, tag: impl Into<Tag>) -> Option<Tag> {
        self.entries.insert(key.into(), tag.into())
    }

    pub fn put_bool(&mut self, key: impl Into<String>, value: bool) {
        self.put(key, value);
    }

    pub fn put_int(&mut self, key: impl Into<String>, value: i32) {
        self.put(key, value);
    }

    pub fn put_long(&mut self, key: impl Into<String>, value: i64) {
        self.put(key, value);
    }

    pub fn put_double(&mut self, key: impl Into<String>, value: f64) {
        self.put(key, value);
    }

    pub fn put_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.put(key, Tag::String(value.into()));
    }

    pub fn put_compound(&mut self, key: impl Into<String>, value: CompoundTag) {
        self.put(key, value);
    }

    pub fn put_list(&mut self, key: impl Into<String>, value: Vec<Tag>) {
        self.put(key, value);
    }

    // Typed getters

    typed_getter!(get_byte, get_byte_or, Byte, i8);
    typed_getter!(get_short, get_short_or, Short, i16);
    typed_getter!(get_int, get_int_or, Int, i32);
    typed_getter!(get_long, get_long_or, Long, i64);
    typed_getter!(get_float, get_float_or, Float, f32);
    typed_getter!(get_double, get_double_or, Double, f64);

    pub fn get_bool(&self, key: &str) -> Result<bool, TagError> {
        Ok(self.get_byte(key)? != 0)
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> Result<bool, TagError> {
        Ok(self.get_byte_or(key, default as i8)? != 0)
    }

    pub fn get_string(&self, key: &str) -> Result<&str, TagError> {
        match self.require(key)? {
            Tag::String(value) => Ok(value),
            other => Err(Self::mismatch(key, "String", other)),
        }
    }

    pub fn get_compound(&self, key: &str) -> Result<&CompoundTag, TagError> {
        match self.require(key)? {
            Tag::Compound(value) => Ok(value),
            other => Err(Self::mismatch(key, "Compound", other)),
        }
    }

    pub fn get_list(&self, key: &str) -> Result<&[Tag], TagError> {
        match self.require(key)? {
            Tag::List(value) => Ok(value),
            other => Err(Self::mismatch(key, "List", other)),
        }
    }

    /// Reads a list whose elements must all be compounds
    pub fn get_compound_list(&self, key: &str) -> Result<Vec<&CompoundTag>, TagError> {
        self.get_list(key)?
            .iter()
            .enumerate()
            .map(|(index, tag)| {
                tag.as_compound().ok_or(TagError::ListElementMismatch {
                    key: key.to_string(),
                    index,
                    expected: "Compound",
                    found: tag.type_name(),
                })
            })
            .collect()
    }

    fn require(&self, key: &str) -> Result<&Tag, TagError> {
        self.entries.get(key).ok_or_else(|| TagError::MissingKey {
            key: key.to_string(),
        })
    }

    fn mismatch(key: &str, expected: &'static str, found: &Tag) -> TagError {
        TagError::TypeMismatch {
            key: key.to_string(),
            expected,
            found: found.type_name(),
        }
    }
}

impl<'a> IntoIterator for &'a CompoundTag {
    type Item = (&'a String, &'a Tag);
    type IntoIter = btree_map::Iter<'a, String, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
