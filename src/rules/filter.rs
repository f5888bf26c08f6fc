//! Key/value tag predicates.

use crate::tags::{KeyId, Tag, TagDictionary};

/// Wildcard token in `k`/`v` lists.
const WILDCARD: &str = "*";
/// Negation token in `v` lists ("key absent, or one of the listed values").
const NEGATION: &str = "~";

/// A candidate key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPattern {
    Any,
    Key(KeyId),
}

/// A candidate value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValuePattern {
    Any,
    Exact(String),
}

/// A single `k=v` predicate over a feature's tags.
///
/// Keys and values are checked independently: the key half succeeds when any
/// candidate key occurs among the tags, the value half when any candidate
/// value does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    keys: Vec<KeyPattern>,
    values: Vec<ValuePattern>,
    negated: bool,
}

impl Filter {
    pub fn new(keys: Vec<KeyPattern>, values: Vec<ValuePattern>, negated: bool) -> Self {
        Self {
            keys,
            values,
            negated,
        }
    }

    /// Build a filter from `|` separated key and value lists.
    ///
    /// Keys the dictionary does not know are dropped, they can never occur in
    /// the map data.
    pub fn parse(dictionary: &dyn TagDictionary, keys: &str, values: &str) -> Self {
        let keys = keys
            .split('|')
            .filter_map(|key| match key {
                WILDCARD => Some(KeyPattern::Any),
                key => {
                    let id = dictionary.key_id(key).map(KeyPattern::Key);
                    if id.is_none() {
                        tracing::debug!("Filter: key '{}' not present in map data", key);
                    }
                    id
                }
            })
            .collect();

        let mut negated = false;
        let values = values
            .split('|')
            .filter_map(|value| match value {
                NEGATION => {
                    negated = true;
                    None
                }
                WILDCARD => Some(ValuePattern::Any),
                value => Some(ValuePattern::Exact(value.to_string())),
            })
            .collect();

        Self {
            keys,
            values,
            negated,
        }
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn keys(&self) -> &[KeyPattern] {
        &self.keys
    }

    pub fn values(&self) -> &[ValuePattern] {
        &self.values
    }

    /// True when the filter accepts every tag vector.
    pub fn is_tautology(&self) -> bool {
        !self.negated
            && self.keys.contains(&KeyPattern::Any)
            && self.values.contains(&ValuePattern::Any)
    }

    pub fn matches(&self, tags: &[Tag]) -> bool {
        if self.negated {
            !self.key_matches(tags) || self.value_matches(tags)
        } else {
            self.key_matches(tags) && self.value_matches(tags)
        }
    }

    fn key_matches(&self, tags: &[Tag]) -> bool {
        self.keys.iter().any(|pattern| match pattern {
            KeyPattern::Any => true,
            KeyPattern::Key(id) => tags.iter().any(|tag| tag.key == *id),
        })
    }

    fn value_matches(&self, tags: &[Tag]) -> bool {
        self.values.iter().any(|pattern| match pattern {
            ValuePattern::Any => true,
            ValuePattern::Exact(value) => tags.iter().any(|tag| tag.value == *value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::TagTable;

    fn table() -> TagTable {
        let mut table = TagTable::new();
        for key in ["highway", "name", "tunnel", "area"] {
            table.intern(key);
        }
        table
    }

    #[test]
    fn test_exact_match() {
        let mut table = table();
        let filter = Filter::parse(&table, "highway", "primary|secondary");

        assert!(filter.matches(&table.tags([("highway", "primary")])));
        assert!(filter.matches(&table.tags([("highway", "secondary")])));
        assert!(!filter.matches(&table.tags([("highway", "tertiary")])));
        assert!(!filter.matches(&table.tags([("name", "primary")])));
    }

    #[test]
    fn test_key_and_value_are_independent() {
        let mut table = table();
        let filter = Filter::parse(&table, "highway", "primary");

        // key from one tag, value from another
        let tags = table.tags([("highway", "service"), ("name", "primary")]);
        assert!(filter.matches(&tags));
    }

    #[test]
    fn test_wildcards() {
        let mut table = table();
        let any_value = Filter::parse(&table, "name", "*");
        assert!(any_value.matches(&table.tags([("name", "Foo")])));
        assert!(!any_value.matches(&table.tags([("highway", "primary")])));

        let any_key = Filter::parse(&table, "*", "yes");
        assert!(any_key.matches(&table.tags([("tunnel", "yes")])));
        assert!(!any_key.matches(&table.tags([("tunnel", "no")])));
    }

    #[test]
    fn test_tautology() {
        let mut table = table();
        let filter = Filter::parse(&table, "*", "*");

        assert!(filter.is_tautology());
        assert!(filter.matches(&[]));
        assert!(filter.matches(&table.tags([("highway", "primary")])));
        assert!(!Filter::parse(&table, "*", "~|*").is_tautology());
        assert!(!Filter::parse(&table, "highway", "*").is_tautology());
    }

    #[test]
    fn test_negated_absent_key() {
        let mut table = table();
        let filter = Filter::parse(&table, "tunnel", "~|no");

        assert!(filter.is_negated());
        assert!(filter.matches(&table.tags([("highway", "primary")])));
        assert!(filter.matches(&[]));
    }

    #[test]
    fn test_negated_present_key() {
        let mut table = table();
        let filter = Filter::parse(&table, "tunnel", "~|no");

        // key present with a listed value
        assert!(filter.matches(&table.tags([("tunnel", "no")])));
        // key present, no listed value: the filter fails
        assert!(!filter.matches(&table.tags([("tunnel", "yes")])));
    }

    #[test]
    fn test_unknown_keys_are_dropped() {
        let mut table = table();
        let filter = Filter::parse(&table, "railway", "rail");

        assert!(filter.keys().is_empty());
        assert!(!filter.matches(&table.tags([("railway", "rail")])));

        let negated = Filter::parse(&table, "railway", "~");
        assert!(negated.matches(&table.tags([("highway", "primary")])));
    }
}
