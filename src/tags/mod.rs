//! Interned feature tags.
//!
//! The map-data layer hands features to the style engine as vectors of
//! `(key, value)` pairs where the key is an interned id. Filters resolve
//! their keys through a [`TagDictionary`] when the theme is compiled, so
//! matching at render time is a plain integer comparison.

use std::collections::HashMap;

/// Interned tag key.
pub type KeyId = u32;

/// A single feature attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: KeyId,
    pub value: String,
}

impl Tag {
    pub fn new(key: KeyId, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

/// Kind of map element a feature was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Node,
    Way,
}

/// Key lookup provided by the map data the theme is compiled against.
pub trait TagDictionary {
    /// Id of `key`, or `None` when the map data never uses it.
    fn key_id(&self, key: &str) -> Option<KeyId>;
}

/// Simple growable key interner.
#[derive(Debug, Default, Clone)]
pub struct TagTable {
    ids: HashMap<String, KeyId>,
    names: Vec<String>,
}

impl TagTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `key`, returning its id. Ids start at 1.
    pub fn intern(&mut self, key: &str) -> KeyId {
        if let Some(id) = self.ids.get(key) {
            return *id;
        }
        self.names.push(key.to_string());
        let id = self.names.len() as KeyId;
        self.ids.insert(key.to_string(), id);
        id
    }

    /// Reverse lookup of an interned id.
    pub fn name(&self, id: KeyId) -> Option<&str> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.names.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Intern every key of `pairs` and build the tag vector.
    pub fn tags<'a, I>(&mut self, pairs: I) -> Vec<Tag>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        pairs
            .into_iter()
            .map(|(k, v)| Tag::new(self.intern(k), v))
            .collect()
    }

    /// Value of `key` in `tags`, if present.
    pub fn value<'t>(&self, tags: &'t [Tag], key: &str) -> Option<&'t str> {
        let id = self.key_id(key)?;
        tags.iter()
            .find(|tag| tag.key == id)
            .map(|tag| tag.value.as_str())
    }
}

impl TagDictionary for TagTable {
    fn key_id(&self, key: &str) -> Option<KeyId> {
        self.ids.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable() {
        let mut table = TagTable::new();
        let highway = table.intern("highway");
        let name = table.intern("name");

        assert_eq!(table.intern("highway"), highway);
        assert_ne!(highway, name);
        assert_eq!(table.name(name), Some("name"));
        assert_eq!(table.key_id("railway"), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn builds_tag_vectors() {
        let mut table = TagTable::new();
        let tags = table.tags([("highway", "primary"), ("name", "Main Street")]);

        assert_eq!(tags.len(), 2);
        assert_eq!(table.value(&tags, "name"), Some("Main Street"));
        assert_eq!(table.value(&tags, "ref"), None);
    }

    #[test]
    fn id_zero_is_never_issued() {
        let mut table = TagTable::new();
        assert_eq!(table.intern("a"), 1);
        assert_eq!(table.name(0), None);
    }
}
