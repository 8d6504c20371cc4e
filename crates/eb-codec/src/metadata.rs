use std::collections::BTreeMap;
use std::collections::btree_map;

/// Ordered-unimportant `key -> value` mapping representing message headers.
///
/// Both keys and values are non-empty strings. Keys are case-preserving;
/// the core compares them case-sensitively. Internally backed by a
/// `BTreeMap` so iteration is always in ascending byte order of the key,
/// which is exactly the order `encode_metadata` requires for deterministic
/// output — no separate sort step needed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageMetadata {
    entries: BTreeMap<String, String>,
}

impl MessageMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.entries.iter()
    }

    /// Shallow-merge `other` on top of `self`, last-writer-wins (`other` wins).
    pub fn merge(&mut self, other: &MessageMetadata) {
        for (k, v) in other.iter() {
            self.entries.insert(k.clone(), v.clone());
        }
    }

    /// Overlay `local` on top of `source`, returning a new map with `local`'s
    /// entries taking precedence. Used by `RunnerMessage::get_metadata`.
    pub fn overlaid(source: Option<&MessageMetadata>, local: Option<&MessageMetadata>) -> Option<MessageMetadata> {
        match (source, local) {
            (None, None) => None,
            (Some(s), None) => Some(s.clone()),
            (None, Some(l)) => Some(l.clone()),
            (Some(s), Some(l)) => {
                let mut merged = s.clone();
                merged.merge(l);
                Some(merged)
            }
        }
    }
}

impl FromIterator<(String, String)> for MessageMetadata {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for MessageMetadata {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a MessageMetadata {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_prefers_local_over_source() {
        let mut source = MessageMetadata::new();
        source.insert("k", "u");
        let mut local = MessageMetadata::new();
        local.insert("k", "v");

        let merged = MessageMetadata::overlaid(Some(&source), Some(&local)).unwrap();
        assert_eq!(merged.get("k"), Some("v"));
    }

    #[test]
    fn overlay_of_two_nones_is_none() {
        assert!(MessageMetadata::overlaid(None, None).is_none());
    }
}
