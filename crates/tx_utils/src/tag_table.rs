use core::fmt;

use crate::hash::{FixedHashState, HashMap, HashSet};

// -----------------------------------------------------------------------------
// TagLookup

/// The result of [`TagTable::lookup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagLookup<'a, V> {
    /// Exactly one entry was registered under the tag.
    Found(&'a V),
    /// The tag was registered more than once and cannot be resolved.
    Ambiguous,
    /// Nothing was registered under the tag.
    Missing,
}

// -----------------------------------------------------------------------------
// TagTable

/// A table from `'static` string tags to values.
///
/// A tag inserted twice is not overwritten: it is removed from the
/// table and remembered as ambiguous, so lookups can report the
/// conflict instead of silently choosing one entry.
///
/// # Examples
///
/// ```
/// use tx_utils::{TagLookup, TagTable};
///
/// let mut table = TagTable::new();
/// assert!(table.insert("Real", 0_usize));
/// assert!(table.insert("Integer", 1));
/// assert!(!table.insert("Real", 2));
///
/// assert_eq!(table.lookup("Integer"), TagLookup::Found(&1));
/// assert_eq!(table.lookup("Real"), TagLookup::Ambiguous);
/// assert_eq!(table.lookup("Missing"), TagLookup::Missing);
/// ```
pub struct TagTable<V> {
    entries: HashMap<&'static str, V>,
    ambiguous: HashSet<&'static str>,
}

impl<V> Default for TagTable<V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<V> TagTable<V> {
    /// Creates an empty table.
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: HashMap::with_hasher(FixedHashState),
            ambiguous: HashSet::with_hasher(FixedHashState),
        }
    }

    /// Inserts `value` under `tag`.
    ///
    /// Returns `false` if the tag was already known, in which case the
    /// tag becomes ambiguous and neither value remains reachable.
    pub fn insert(&mut self, tag: &'static str, value: V) -> bool {
        if self.ambiguous.contains(tag) {
            return false;
        }
        if self.entries.remove(tag).is_some() {
            self.ambiguous.insert(tag);
            return false;
        }
        self.entries.insert(tag, value);
        true
    }

    /// Resolves a tag.
    pub fn lookup(&self, tag: &str) -> TagLookup<'_, V> {
        match self.entries.get(tag) {
            Some(value) => TagLookup::Found(value),
            None if self.ambiguous.contains(tag) => TagLookup::Ambiguous,
            None => TagLookup::Missing,
        }
    }

    /// Returns `true` if `tag` was inserted more than once.
    #[inline]
    pub fn is_ambiguous(&self, tag: &str) -> bool {
        self.ambiguous.contains(tag)
    }

    /// Returns the resolvable tags, in no particular order.
    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Returns the number of resolvable tags.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no tag is resolvable.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: fmt::Debug> fmt::Debug for TagTable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagTable")
            .field("entries", &self.entries)
            .field("ambiguous", &self.ambiguous)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{TagLookup, TagTable};

    #[test]
    fn third_insert_stays_ambiguous() {
        let mut table = TagTable::new();
        assert!(table.insert("a", 1));
        assert!(!table.insert("a", 2));
        assert!(!table.insert("a", 3));
        assert!(table.is_ambiguous("a"));
        assert_eq!(table.lookup("a"), TagLookup::Ambiguous);
        assert!(table.is_empty());
    }

    #[test]
    fn tags_skip_ambiguous_entries() {
        let mut table = TagTable::new();
        table.insert("x", ());
        table.insert("y", ());
        table.insert("y", ());

        let tags: alloc::vec::Vec<_> = table.tags().collect();
        assert_eq!(tags, ["x"]);
        assert_eq!(table.len(), 1);
    }
}
