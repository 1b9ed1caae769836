//! Tag key → subject name lookup.

use std::collections::BTreeMap;

use crate::config::SubjectEntry;

/// Name used for samples that cannot be attributed to a registered animal.
pub const UNKNOWN_SUBJECT: &str = "unknown";

/// Registered animals keyed by their uppercase tag key.
#[derive(Debug, Clone, Default)]
pub struct SubjectRegistry {
    by_tag: BTreeMap<String, String>,
}

impl SubjectRegistry {
    pub fn from_entries(entries: &[SubjectEntry]) -> Self {
        let mut registry = Self::default();
        for entry in entries {
            registry.register(&entry.tag_key, &entry.name);
        }
        registry
    }

    /// Add or replace a mapping. Keys are matched case-insensitively.
    pub fn register(&mut self, tag_key: &str, name: &str) {
        self.by_tag
            .insert(tag_key.to_ascii_uppercase(), name.to_string());
    }

    /// Subject for `tag_key`; no tag or an unregistered tag is `"unknown"`.
    pub fn name_for(&self, tag_key: Option<&str>) -> &str {
        tag_key
            .and_then(|key| {
                self.by_tag
                    .get(key)
                    .or_else(|| self.by_tag.get(&key.to_ascii_uppercase()))
            })
            .map_or(UNKNOWN_SUBJECT, String::as_str)
    }

    /// Registered names, in tag-key order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_tag.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}
