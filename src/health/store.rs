// src/health/store.rs
use dashmap::DashMap;

use super::status::{CheckClass, StatusEntry};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatusKey {
    pub name: String,
    pub class: CheckClass,
}

impl StatusKey {
    pub fn new(name: impl Into<String>, class: CheckClass) -> Self {
        Self {
            name: name.into(),
            class,
        }
    }
}

/// Latest status of every `(name, class)` pair.
///
/// Entries are created on the first check of a name and overwritten in place
/// afterwards; nothing is ever removed.
#[derive(Debug, Default)]
pub struct StatusStore {
    entries: DashMap<StatusKey, StatusEntry>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&self, name: &str, class: CheckClass, entry: StatusEntry) {
        self.entries.insert(StatusKey::new(name, class), entry);
    }

    pub fn get(&self, name: &str, class: CheckClass) -> Option<StatusEntry> {
        self.entries
            .get(&StatusKey::new(name, class))
            .map(|e| e.value().clone())
    }

    /// Full scan; order of the returned entries is unspecified.
    pub fn get_by_class(&self, class: CheckClass) -> Vec<StatusEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.key().class == class)
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
