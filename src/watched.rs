//! Watched flags
//!
//! The overlay remembers, per source identifier, whether an ad was already
//! played to this viewer so that its quiz is only ever shown once. The flags
//! are read before an entry plays and written on its first play; the overlay
//! never clears them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Trait for the key-value capability backing the watched flags
///
/// Browser hosts typically implement this over origin-scoped storage so the
/// flags survive reloads.
pub trait WatchedStore {
    /// Reads the flag for a source, `None` if it was never written
    fn get(&self, source: &str) -> Option<bool>;

    /// Writes the flag for a source
    fn set(&mut self, source: &str, watched: bool);

    /// Whether the source was already watched
    fn is_watched(&self, source: &str) -> bool {
        self.get(source).unwrap_or(false)
    }
}

/// In-memory watched flags
///
/// Serializes as a plain JSON object so a host can persist and restore it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryStore {
    flags: HashMap<String, bool>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sources with a flag
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Whether no flag was written yet
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for MemoryStore {
    /// Creates a store with every given source marked as watched
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            flags: iter.into_iter().map(|source| (source.into(), true)).collect(),
        }
    }
}

impl WatchedStore for MemoryStore {
    fn get(&self, source: &str) -> Option<bool> {
        self.flags.get(source).copied()
    }

    fn set(&mut self, source: &str, watched: bool) {
        self.flags.insert(source.to_string(), watched);
    }
}

impl<W: WatchedStore + ?Sized> WatchedStore for &mut W {
    fn get(&self, source: &str) -> Option<bool> {
        (**self).get(source)
    }

    fn set(&mut self, source: &str, watched: bool) {
        (**self).set(source, watched);
    }
}
