use serde::{Deserialize, Serialize};

/// A single term with its translation, e.g. `la mano` / `ręka`.
///
/// Uniqueness is not enforced: duplicated entries are tolerated and only
/// narrow the pool of distractors offered by multiple-choice questions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VocabularyPair {
    pub term: String,
    pub translation: String,
}

impl VocabularyPair {
    #[must_use]
    pub fn new(term: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            translation: translation.into(),
        }
    }

    /// Returns true if `term` / `translation` is exactly this pair.
    #[must_use]
    pub fn matches(&self, term: &str, translation: &str) -> bool {
        self.term == term && self.translation == translation
    }
}

/// A titled list of pairs, as browsed in flashcard mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularySet {
    pub title: String,
    pub words: Vec<VocabularyPair>,
}

impl VocabularySet {
    #[must_use]
    pub fn new(title: impl Into<String>, words: Vec<VocabularyPair>) -> Self {
        Self {
            title: title.into(),
            words,
        }
    }
}
