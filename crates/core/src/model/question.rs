use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;
use crate::model::vocabulary::VocabularyPair;

/// Number of pairs in every matching block.
pub const MATCHING_ARITY: usize = 4;

/// Which side of a pair the learner is shown, and which side they must produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Shown the term, answer with the translation.
    TermToTranslation,
    /// Shown the translation, answer with the term.
    TranslationToTerm,
}

/// Column of a matching block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSide {
    Term,
    Translation,
}

impl MatchSide {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            MatchSide::Term => MatchSide::Translation,
            MatchSide::Translation => MatchSide::Term,
        }
    }
}

/// Four pairs to be matched, plus the order in which each column is displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingSet {
    pub pairs: [VocabularyPair; MATCHING_ARITY],
    pub term_order: Vec<String>,
    pub translation_order: Vec<String>,
}

impl MatchingSet {
    /// Build a set whose columns are displayed in pair order.
    #[must_use]
    pub fn new(pairs: [VocabularyPair; MATCHING_ARITY]) -> Self {
        let term_order = pairs.iter().map(|p| p.term.clone()).collect();
        let translation_order = pairs.iter().map(|p| p.translation.clone()).collect();
        Self {
            pairs,
            term_order,
            translation_order,
        }
    }

    /// Translation expected for `term`, if the term belongs to this set.
    #[must_use]
    pub fn translation_of(&self, term: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|p| p.term == term)
            .map(|p| p.translation.as_str())
    }

    #[must_use]
    pub fn contains(&self, side: MatchSide, value: &str) -> bool {
        self.pairs.iter().any(|p| match side {
            MatchSide::Term => p.term == value,
            MatchSide::Translation => p.translation == value,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice {
        direction: Direction,
        options: Vec<String>,
        correct: String,
    },
    TextInput {
        direction: Direction,
        /// Already normalized for `direction`.
        answer: String,
    },
    Matching(MatchingSet),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub kind: QuestionKind,
}

impl Question {
    #[must_use]
    pub fn is_matching(&self) -> bool {
        matches!(self.kind, QuestionKind::Matching(_))
    }

    #[must_use]
    pub fn matching_set(&self) -> Option<&MatchingSet> {
        match &self.kind {
            QuestionKind::Matching(set) => Some(set),
            _ => None,
        }
    }

    /// Human-readable expected answer, used in result reports.
    #[must_use]
    pub fn expected_answer(&self) -> String {
        match &self.kind {
            QuestionKind::MultipleChoice { correct, .. } => correct.clone(),
            QuestionKind::TextInput { answer, .. } => answer.clone(),
            QuestionKind::Matching(set) => set
                .pairs
                .iter()
                .map(|p| format!("{} = {}", p.term, p.translation))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}
