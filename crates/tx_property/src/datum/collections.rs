use alloc::vec::Vec;
use core::fmt;

use tx_utils::hash::HashTable;

use super::Datum;
use super::hash::datum_hash;

// -----------------------------------------------------------------------------
// DatumSet

/// An insertion-ordered set of [`Datum`]s.
///
/// Members are indexed by a structural hash and compared by equality, so
/// floats and objects can be members too. Equality between two sets
/// ignores order.
///
/// # Examples
///
/// ```
/// use tx_property::{Datum, DatumSet};
///
/// let set: DatumSet = [Datum::Int(2), Datum::Int(1), Datum::Int(2)].into_iter().collect();
/// assert_eq!(set.len(), 2);
///
/// let other: DatumSet = [Datum::Int(1), Datum::Int(2)].into_iter().collect();
/// assert_eq!(set, other);
/// ```
#[derive(Clone, Default)]
pub struct DatumSet {
    items: Vec<Datum>,
    // (hash, index into `items`)
    index: HashTable<(u64, usize)>,
}

impl DatumSet {
    /// Creates an empty set.
    #[inline]
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            index: HashTable::new(),
        }
    }

    fn find(&self, hash: u64, value: &Datum) -> Option<usize> {
        self.index
            .find(hash, |&(_, i)| self.items[i] == *value)
            .map(|&(_, i)| i)
    }

    /// Adds a value, returning `false` if an equal value was present.
    pub fn insert(&mut self, value: Datum) -> bool {
        let hash = datum_hash(&value);
        if self.find(hash, &value).is_some() {
            return false;
        }
        self.index
            .insert_unique(hash, (hash, self.items.len()), |&(h, _)| h);
        self.items.push(value);
        true
    }

    #[inline]
    pub fn contains(&self, value: &Datum) -> bool {
        self.find(datum_hash(value), value).is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the members in insertion order.
    #[inline]
    pub fn as_slice(&self) -> &[Datum] {
        &self.items
    }

    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, Datum> {
        self.items.iter()
    }

    #[inline]
    pub fn into_vec(self) -> Vec<Datum> {
        self.items
    }
}

impl fmt::Debug for DatumSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(&self.items).finish()
    }
}

impl PartialEq for DatumSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.items.iter().all(|item| other.contains(item))
    }
}

impl FromIterator<Datum> for DatumSet {
    fn from_iter<I: IntoIterator<Item = Datum>>(iter: I) -> Self {
        let mut set = Self::new();
        for item in iter {
            set.insert(item);
        }
        set
    }
}

impl IntoIterator for DatumSet {
    type Item = Datum;
    type IntoIter = alloc::vec::IntoIter<Datum>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

// -----------------------------------------------------------------------------
// DatumMap

/// An insertion-ordered map between [`Datum`]s.
///
/// Keys are indexed like [`DatumSet`] members; inserting an existing key
/// replaces its value in place. Equality between two maps ignores order.
#[derive(Clone, Default)]
pub struct DatumMap {
    entries: Vec<(Datum, Datum)>,
    // (hash of the key, index into `entries`)
    index: HashTable<(u64, usize)>,
}

impl DatumMap {
    /// Creates an empty map.
    #[inline]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashTable::new(),
        }
    }

    fn find(&self, hash: u64, key: &Datum) -> Option<usize> {
        self.index
            .find(hash, |&(_, i)| self.entries[i].0 == *key)
            .map(|&(_, i)| i)
    }

    /// Inserts an entry, returning the previous value of `key`.
    pub fn insert(&mut self, key: Datum, value: Datum) -> Option<Datum> {
        let hash = datum_hash(&key);
        if let Some(i) = self.find(hash, &key) {
            return Some(core::mem::replace(&mut self.entries[i].1, value));
        }
        self.index
            .insert_unique(hash, (hash, self.entries.len()), |&(h, _)| h);
        self.entries.push((key, value));
        None
    }

    pub fn get(&self, key: &Datum) -> Option<&Datum> {
        self.find(datum_hash(key), key).map(|i| &self.entries[i].1)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&Datum, &Datum)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    #[inline]
    pub fn into_entries(self) -> Vec<(Datum, Datum)> {
        self.entries
    }
}

impl fmt::Debug for DatumMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl PartialEq for DatumMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.entries.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl FromIterator<(Datum, Datum)> for DatumMap {
    fn from_iter<I: IntoIterator<Item = (Datum, Datum)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for DatumMap {
    type Item = (Datum, Datum);
    type IntoIter = alloc::vec::IntoIter<(Datum, Datum)>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::{Datum, DatumMap, DatumSet};

    #[test]
    fn map_replaces_in_place() {
        let mut map = DatumMap::new();
        map.insert(Datum::Int(1), Datum::Str("a".into()));
        map.insert(Datum::Int(2), Datum::Str("b".into()));
        let old = map.insert(Datum::Int(1), Datum::Str("c".into()));

        assert_eq!(old, Some(Datum::Str("a".into())));
        assert_eq!(map.len(), 2);
        let first = map.iter().next().unwrap();
        assert_eq!(first, (&Datum::Int(1), &Datum::Str("c".into())));
    }

    #[test]
    fn float_members_dedupe_across_signed_zero() {
        let set: DatumSet = [Datum::Float(0.0), Datum::Float(-0.0), Datum::Float(1.5)]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&Datum::Float(-0.0)));
    }

    #[test]
    fn large_collections_keep_insertion_order() {
        let set: DatumSet = (0..50_000_i64).rev().map(Datum::Int).collect();
        assert_eq!(set.len(), 50_000);
        assert_eq!(set.as_slice()[0], Datum::Int(49_999));
        assert!(set.contains(&Datum::Int(0)));

        let map: DatumMap = (0..50_000_i64)
            .map(|i| (Datum::Str(i.to_string()), Datum::Int(i)))
            .collect();
        assert_eq!(map.len(), 50_000);
        assert_eq!(map.get(&Datum::Str("123".into())), Some(&Datum::Int(123)));
        assert_eq!(map.iter().last().unwrap().1, &Datum::Int(49_999));
    }
}
