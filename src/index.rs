//! Candidate indexes over the loaded tag catalog.
//!
//! Two lookup structures are maintained, both fed only by tags in a
//! categorized (non-otherlike) namespace:
//!
//! | Index | Key | Value |
//! |-------|-----|-------|
//! | translations | `(namespace, normalized translation)` | [`TranslationSlot`] |
//! | candidates | normalized name or translation | set of tag ids |
//!
//! Otherlike tags never enter either index, so they can only ever be merge
//! sources. Inserting is infallible and can happen while pages are still
//! being loaded.

use std::collections::{BTreeSet, HashMap};

use crate::models::Tag;
use crate::normalize::normalize_key;

/// State of a translation key within one namespace.
///
/// A key that was never seen is simply absent from the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationSlot {
    /// Exactly one tag claims this translation.
    Resolved(i64),
    /// Two or more distinct tags claim it. Never a merge target.
    Ambiguous,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagIndex {
    translations: HashMap<(String, String), TranslationSlot>,
    candidates: HashMap<String, BTreeSet<i64>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index over a full tag list.
    pub fn build(tags: &[Tag]) -> Self {
        let mut index = Self::new();
        for tag in tags {
            index.insert(tag);
        }
        index
    }

    /// Add one tag. Otherlike tags are ignored.
    pub fn insert(&mut self, tag: &Tag) {
        if tag.is_otherlike() {
            return;
        }

        self.add_candidate(normalize_key(&tag.name), tag.id);

        let Some(translation) = tag.translation_text.as_deref() else {
            return;
        };
        let key = normalize_key(translation);
        if key.is_empty() {
            return;
        }
        self.add_candidate(key.clone(), tag.id);

        // Ambiguity is sticky: once two ids collide the key stays poisoned.
        self.translations
            .entry((tag.namespace.clone(), key))
            .and_modify(|slot| {
                if *slot != TranslationSlot::Resolved(tag.id) {
                    *slot = TranslationSlot::Ambiguous;
                }
            })
            .or_insert(TranslationSlot::Resolved(tag.id));
    }

    fn add_candidate(&mut self, key: String, id: i64) {
        self.candidates.entry(key).or_default().insert(id);
    }

    pub fn translation(&self, namespace: &str, key: &str) -> Option<TranslationSlot> {
        self.translations
            .get(&(namespace.to_string(), key.to_string()))
            .copied()
    }

    pub fn candidates(&self, key: &str) -> Option<&BTreeSet<i64>> {
        self.candidates.get(key)
    }

    /// Number of distinct translation keys, ambiguous ones included.
    pub fn translation_count(&self) -> usize {
        self.translations.len()
    }

    pub fn ambiguous_count(&self) -> usize {
        self.translations
            .values()
            .filter(|slot| **slot == TranslationSlot::Ambiguous)
            .count()
    }
}
