//! Answer checking for all question kinds.

use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;

use crate::model::{Direction, MatchingSet, Question, QuestionKind, VocabularyPair};

/// Leading articles dropped from term-side answers before comparison.
const TERM_ARTICLES: [&str; 4] = ["el", "la", "los", "las"];

/// What the learner submitted for a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// A chosen option or typed text.
    Text(String),
    /// The full set of pairs built up in a matching block.
    Matches(Vec<VocabularyPair>),
}

impl From<&str> for Response {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Response {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Decide whether `response` answers `question` correctly.
///
/// A response of the wrong shape for the question (text for a matching block,
/// pairs for anything else) is simply incorrect.
#[must_use]
pub fn evaluate(question: &Question, response: &Response) -> bool {
    match (&question.kind, response) {
        (QuestionKind::MultipleChoice { correct, .. }, Response::Text(choice)) => choice == correct,
        (QuestionKind::TextInput { direction, answer }, Response::Text(typed)) => {
            normalize_answer(typed, *direction) == *answer
        }
        (QuestionKind::Matching(set), Response::Matches(submitted)) => {
            evaluate_matches(set, submitted)
        }
        _ => false,
    }
}

/// Judge one pairing attempt inside a matching block.
#[must_use]
pub fn evaluate_pair(set: &MatchingSet, term: &str, translation: &str) -> bool {
    set.pairs.iter().any(|p| p.matches(term, translation))
}

/// A matching block is solved once every expected pair has been submitted and
/// nothing else has.
#[must_use]
pub fn evaluate_matches(set: &MatchingSet, submitted: &[VocabularyPair]) -> bool {
    if submitted.len() != set.pairs.len() {
        return false;
    }
    let mut seen_terms = HashSet::new();
    submitted
        .iter()
        .all(|p| evaluate_pair(set, &p.term, &p.translation) && seen_terms.insert(p.term.as_str()))
}

/// Normalize an answer for the side of the pair it names.
///
/// Term-side answers (`TranslationToTerm`) are lower-cased, lose a leading
/// article and their diacritics. Translation-side answers are only lower-cased,
/// since the translation language keeps its accents and has no articles.
#[must_use]
pub fn normalize_answer(text: &str, direction: Direction) -> String {
    match direction {
        Direction::TranslationToTerm => normalize_term(text),
        Direction::TermToTranslation => normalize_translation(text),
    }
}

/// Lower-case, collapse whitespace, strip a leading article and diacritics.
#[must_use]
pub fn normalize_term(text: &str) -> String {
    let lowered = collapse_whitespace(&text.to_lowercase());
    let without_article = match lowered.split_once(' ') {
        Some((first, rest)) if TERM_ARTICLES.contains(&first) => rest,
        _ => lowered.as_str(),
    };
    remove_accents(without_article)
}

/// Lower-case and collapse whitespace.
#[must_use]
pub fn normalize_translation(text: &str) -> String {
    collapse_whitespace(&text.to_lowercase())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn remove_accents(s: &str) -> String {
    s.nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect()
}
