//! Case-insensitive, insertion-ordered header map.
//!
//! # Design
//! Entries are stored in an `IndexMap` keyed by the *fold key* of the header
//! name, with the display name kept alongside the value. The fold key is what
//! makes two names "the same header":
//!
//! ```text
//! NFD -> case-fold -> NFD -> case-fold -> NFKD
//! ```
//!
//! Full case folding can produce characters that decompose further or that
//! need canonical reordering against combining marks already present (U+0345
//! folds to a spacing iota, for example), so a single fold is not stable. The
//! second round settles it, and the final NFKD merges compatibility variants.
//!
//! This is stricter than RFC 9110, which only asks for ASCII
//! case-insensitivity: `"Straße"` and `"STRASSE"` name the same entry here.
//! Do not rely on it for header-based authorization decisions without a
//! conformance check against the Unicode case-folding test data.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;
use std::ops::Index;

use caseless::Caseless;
use indexmap::map::Entry as MapEntry;
use indexmap::IndexMap;
use unicode_normalization::UnicodeNormalization;

/// Compute the normalized comparison form of a header name.
pub fn fold_key(key: &str) -> String {
    key.chars()
        .nfd()
        .default_case_fold()
        .nfd()
        .default_case_fold()
        .nfkd()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    name: String,
    value: String,
}

/// An ordered map of header names to values with Unicode-aware,
/// case-insensitive keys.
///
/// Iteration yields `(name, value)` pairs in the order each fold key was
/// first inserted, using the name as it was first spelled.
#[derive(Clone, Default)]
pub struct HeaderMap {
    entries: IndexMap<String, Entry>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a header.
    ///
    /// When an equivalent name is already present its value is replaced in
    /// place; the original spelling and position are kept. Returns the
    /// previous value, if any.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        match self.entries.entry(fold_key(&name)) {
            MapEntry::Occupied(mut slot) => {
                Some(std::mem::replace(&mut slot.get_mut().value, value))
            }
            MapEntry::Vacant(slot) => {
                slot.insert(Entry { name, value });
                None
            }
        }
    }

    /// Insert a header only if no equivalent name is present.
    ///
    /// Returns `false`, leaving the map untouched, when the name collides.
    pub(crate) fn insert_new(&mut self, name: String, value: String) -> bool {
        match self.entries.entry(fold_key(&name)) {
            MapEntry::Occupied(_) => false,
            MapEntry::Vacant(slot) => {
                slot.insert(Entry { name, value });
                true
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(&fold_key(name)).map(|e| e.value.as_str())
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(&fold_key(name))
    }

    /// Remove a header, returning its value. Later entries keep their
    /// relative order.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries
            .shift_remove(&fold_key(name))
            .map(|e| e.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.entries.values(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter().map(|(name, _)| name)
    }

    pub fn values(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter().map(|(_, value)| value)
    }

    /// Render the map as `Name: value\r\n` lines, without a status line or
    /// the terminating blank line.
    pub fn to_header_block(&self) -> String {
        let mut block = String::new();
        for (name, value) in self {
            block.push_str(name);
            block.push_str(": ");
            block.push_str(value);
            block.push_str("\r\n");
        }
        block
    }

    /// True when `other` has the same length and every one of its pairs is
    /// found here under an equivalent name with an equal value.
    fn matches_pairs<'a, I>(&self, len: usize, pairs: I) -> bool
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        len == self.len()
            && pairs
                .into_iter()
                .all(|(name, value)| self.get(name) == Some(value))
    }
}

impl fmt::Debug for HeaderMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Direct indexed access.
///
/// # Panics
/// Panics when no equivalent header is present; use [`HeaderMap::get`] to
/// query for optional headers.
impl Index<&str> for HeaderMap {
    type Output = str;

    fn index(&self, name: &str) -> &str {
        match self.get(name) {
            Some(value) => value,
            None => panic!("no header named {name:?}"),
        }
    }
}

impl PartialEq for HeaderMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && other
                .entries
                .iter()
                .all(|(key, e)| self.entries.get(key).map(|mine| &mine.value) == Some(&e.value))
    }
}

impl Eq for HeaderMap {}

// Comparisons against plain string-keyed maps fold the foreign keys with this
// map's fold. They are symmetric only while the foreign map has no two keys
// that fold together (`{"a", "A"}` has two entries there and one here).

impl<K, V, S> PartialEq<HashMap<K, V, S>> for HeaderMap
where
    K: Borrow<str>,
    V: Borrow<str>,
    S: BuildHasher,
{
    fn eq(&self, other: &HashMap<K, V, S>) -> bool {
        self.matches_pairs(
            other.len(),
            other.iter().map(|(k, v)| (Borrow::<str>::borrow(k), Borrow::<str>::borrow(v))),
        )
    }
}

impl<K, V, S> PartialEq<HeaderMap> for HashMap<K, V, S>
where
    K: Borrow<str>,
    V: Borrow<str>,
    S: BuildHasher,
{
    fn eq(&self, other: &HeaderMap) -> bool {
        other == self
    }
}

impl<K, V> PartialEq<BTreeMap<K, V>> for HeaderMap
where
    K: Borrow<str>,
    V: Borrow<str>,
{
    fn eq(&self, other: &BTreeMap<K, V>) -> bool {
        self.matches_pairs(
            other.len(),
            other.iter().map(|(k, v)| (Borrow::<str>::borrow(k), Borrow::<str>::borrow(v))),
        )
    }
}

impl<K, V> PartialEq<HeaderMap> for BTreeMap<K, V>
where
    K: Borrow<str>,
    V: Borrow<str>,
{
    fn eq(&self, other: &HeaderMap) -> bool {
        other == self
    }
}

impl<K, V> FromIterator<(K, V)> for HeaderMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = HeaderMap::new();
        map.extend(iter);
        map
    }
}

impl<K, V> Extend<(K, V)> for HeaderMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.set(name, value);
        }
    }
}

/// Iterator over `(name, value)` pairs of a [`HeaderMap`].
#[derive(Clone)]
pub struct Iter<'a> {
    inner: indexmap::map::Values<'a, String, Entry>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|e| (e.name.as_str(), e.value.as_str()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a HeaderMap {
    type Item = (&'a str, &'a str);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}
