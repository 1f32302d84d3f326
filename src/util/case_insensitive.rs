//! A string-keyed map with case-insensitive lookups.

use std::collections::BTreeMap;

/// Map whose keys compare case-insensitively but keep the case they were
/// inserted with.
///
/// ```rust
/// use watchbot::util::CaseInsensitiveMap;
///
/// let mut map = CaseInsensitiveMap::new();
/// map.insert("activityTimeout", 1);
/// assert_eq!(map.get("ACTIVITYTIMEOUT"), Some(&1));
/// assert_eq!(map.keys().collect::<Vec<_>>(), vec!["activityTimeout"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseInsensitiveMap<V> {
    entries: BTreeMap<String, (String, V)>,
}

impl<V> Default for CaseInsensitiveMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CaseInsensitiveMap<V> {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Inserts a value, returning the previous value stored under any casing
    /// of `key`. The new casing replaces the old one.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        self.entries
            .insert(key.to_lowercase(), (key, value))
            .map(|(_, old)| old)
    }

    /// Looks up `key` ignoring case.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(&key.to_lowercase()).map(|(_, value)| value)
    }

    /// Looks up `key` ignoring case, mutably.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.entries
            .get_mut(&key.to_lowercase())
            .map(|(_, value)| value)
    }

    /// Returns `true` if some casing of `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&key.to_lowercase())
    }

    /// Removes `key` ignoring case.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries.remove(&key.to_lowercase()).map(|(_, value)| value)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in their inserted casing, ordered case-insensitively.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|(key, _)| key.as_str())
    }

    /// Entries in their inserted casing, ordered case-insensitively.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.values().map(|(key, value)| (key.as_str(), value))
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for CaseInsensitiveMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case() {
        let map: CaseInsensitiveMap<u8> = [("Add", 1), ("delete", 2)].into_iter().collect();
        assert_eq!(map.get("add"), Some(&1));
        assert_eq!(map.get("ADD"), Some(&1));
        assert_eq!(map.get("Delete"), Some(&2));
        assert!(map.get("remove").is_none());
        assert!(map.contains_key("dElEtE"));
    }

    #[test]
    fn test_insert_replaces_other_casing() {
        let mut map = CaseInsensitiveMap::new();
        assert_eq!(map.insert("on", 1), None);
        assert_eq!(map.insert("ON", 2), Some(1));
        assert_eq!(map.len(), 1);
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![("ON", &2)]);
    }

    #[test]
    fn test_remove_and_get_mut() {
        let mut map = CaseInsensitiveMap::new();
        map.insert("suppress", 1);
        *map.get_mut("SUPPRESS").unwrap() += 1;
        assert_eq!(map.remove("Suppress"), Some(2));
        assert!(map.is_empty());
    }
}
