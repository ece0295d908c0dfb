//! Card-by-card browsing of vocabulary sets.

use crate::model::{VocabularyPair, VocabularySet};

/// Which face of the current card is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardFace {
    Term,
    Translation,
}

/// Flashcard browser over a list of vocabulary sets.
///
/// Navigation wraps around at both ends and always turns the card back to its
/// term side.
#[derive(Debug, Clone)]
pub struct FlashcardDeck {
    sets: Vec<VocabularySet>,
    set_index: usize,
    card_index: usize,
    flipped: bool,
}

impl FlashcardDeck {
    #[must_use]
    pub fn new(sets: Vec<VocabularySet>) -> Self {
        Self {
            sets,
            set_index: 0,
            card_index: 0,
            flipped: false,
        }
    }

    #[must_use]
    pub fn sets(&self) -> &[VocabularySet] {
        &self.sets
    }

    #[must_use]
    pub fn current_set(&self) -> Option<&VocabularySet> {
        self.sets.get(self.set_index)
    }

    /// The card under the cursor, or `None` if the current set is empty.
    #[must_use]
    pub fn current_card(&self) -> Option<&VocabularyPair> {
        self.current_set()?.words.get(self.card_index)
    }

    /// Text on the visible face of the current card.
    #[must_use]
    pub fn visible_text(&self) -> Option<&str> {
        let card = self.current_card()?;
        Some(match self.face() {
            CardFace::Term => card.term.as_str(),
            CardFace::Translation => card.translation.as_str(),
        })
    }

    #[must_use]
    pub fn face(&self) -> CardFace {
        if self.flipped {
            CardFace::Translation
        } else {
            CardFace::Term
        }
    }

    /// One-based position and card count of the current set, e.g. `(3, 16)`.
    #[must_use]
    pub fn position(&self) -> (usize, usize) {
        let total = self.card_count();
        if total == 0 {
            (0, 0)
        } else {
            (self.card_index + 1, total)
        }
    }

    pub fn flip(&mut self) {
        self.flipped = !self.flipped;
    }

    pub fn next(&mut self) {
        let total = self.card_count();
        if total > 0 {
            self.card_index = (self.card_index + 1) % total;
        }
        self.flipped = false;
    }

    pub fn previous(&mut self) {
        let total = self.card_count();
        if total > 0 {
            self.card_index = self.card_index.checked_sub(1).unwrap_or(total - 1);
        }
        self.flipped = false;
    }

    /// Switch to another set, starting at its first card.
    ///
    /// Returns false, leaving the deck untouched, if `index` is out of range.
    pub fn select_set(&mut self, index: usize) -> bool {
        if index >= self.sets.len() {
            return false;
        }
        self.set_index = index;
        self.card_index = 0;
        self.flipped = false;
        true
    }

    fn card_count(&self) -> usize {
        self.current_set().map_or(0, |set| set.words.len())
    }
}
