//! Ancestor key derivation.
//!
//! An ancestor is every prefix of a full key that ends right before a
//! [`KEY_SEPARATOR`]. Boundaries inside the parameter-type list produce ancestors too,
//! and invalidation call sites may rely on any of them.

use std::str::MatchIndices;

use serde::Serialize;

use super::keys::KEY_SEPARATOR;

/// Lazily yields the ancestors of a key, coarsest first.
#[derive(Debug, Clone)]
pub struct AncestorKeys<'a> {
    key: &'a str,
    boundaries: MatchIndices<'a, char>,
}

impl<'a> Iterator for AncestorKeys<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.boundaries.next().map(|(index, _)| &self.key[..index])
    }
}

/// Scan `key` for separators and yield the prefix before each one.
///
/// A key without separators has no ancestors.
pub fn ancestor_keys(key: &str) -> AncestorKeys<'_> {
    AncestorKeys {
        key,
        boundaries: key.match_indices(KEY_SEPARATOR),
    }
}

/// A full key together with on-demand access to its ancestors.
///
/// An empty value means the call opted out of caching: there is nothing to get, put
/// or invalidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyAndAncestors {
    key: Option<String>,
}

impl KeyAndAncestors {
    pub fn new(key: String) -> Self {
        Self { key: Some(key) }
    }

    /// The outcome for a call whose arguments could not be encoded.
    pub fn opted_out() -> Self {
        Self::default()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn into_key(self) -> Option<String> {
        self.key
    }

    pub fn is_cacheable(&self) -> bool {
        self.key.is_some()
    }

    /// Ancestors of the full key, recomputed on every call.
    pub fn ancestors(&self) -> AncestorKeys<'_> {
        ancestor_keys(self.key.as_deref().unwrap_or_default())
    }
}

impl From<Option<String>> for KeyAndAncestors {
    fn from(key: Option<String>) -> Self {
        Self { key }
    }
}
