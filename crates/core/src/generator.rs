//! Builds a quiz deck from a vocabulary list.
//!
//! The structure of a deck is fully determined by the vocabulary; only the
//! order of options, matching columns and questions is random. Randomness is
//! injected so callers can seed it.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::evaluator::normalize_answer;
use crate::model::{
    Direction, MATCHING_ARITY, MatchingSet, Question, QuestionId, QuestionKind, VocabularyPair,
};

/// Distractors offered next to the correct option, at most.
pub const DISTRACTOR_COUNT: usize = 3;

const MATCHING_PROMPT: &str = "Match the words to their meanings";

/// Reshuffles of the translation column before settling for a rotation.
const MATCHING_SHUFFLE_ATTEMPTS: usize = 16;

/// Generate the full, shuffled deck for a vocabulary list.
///
/// For every pair: a multiple-choice question in each direction and a
/// text-input question in each direction. Every complete group of four
/// consecutive pairs adds a matching block; a shorter tail group is dropped.
pub fn generate_questions<R: Rng + ?Sized>(
    vocabulary: &[VocabularyPair],
    rng: &mut R,
) -> Vec<Question> {
    let mut ids = IdSequence::default();
    let mut questions = Vec::with_capacity(vocabulary.len() * 4 + vocabulary.len() / MATCHING_ARITY);

    for direction in [Direction::TermToTranslation, Direction::TranslationToTerm] {
        for (index, pair) in vocabulary.iter().enumerate() {
            questions.push(multiple_choice(ids.next(), vocabulary, index, pair, direction, rng));
        }
    }

    for pair in vocabulary {
        questions.push(text_input(ids.next(), pair, Direction::TranslationToTerm));
        questions.push(text_input(ids.next(), pair, Direction::TermToTranslation));
    }

    for chunk in vocabulary.chunks_exact(MATCHING_ARITY) {
        let pairs: [VocabularyPair; MATCHING_ARITY] = std::array::from_fn(|i| chunk[i].clone());
        questions.push(matching(ids.next(), pairs, rng));
    }

    questions.shuffle(rng);
    questions
}

#[derive(Default)]
struct IdSequence(u32);

impl IdSequence {
    fn next(&mut self) -> QuestionId {
        let id = QuestionId::new(self.0);
        self.0 = self.0.saturating_add(1);
        id
    }
}

fn multiple_choice<R: Rng + ?Sized>(
    id: QuestionId,
    vocabulary: &[VocabularyPair],
    index: usize,
    pair: &VocabularyPair,
    direction: Direction,
    rng: &mut R,
) -> Question {
    let answer_side = |p: &VocabularyPair| match direction {
        Direction::TermToTranslation => p.translation.clone(),
        Direction::TranslationToTerm => p.term.clone(),
    };
    let correct = answer_side(pair);

    let mut candidates: Vec<String> = Vec::new();
    for (other_index, other) in vocabulary.iter().enumerate() {
        let candidate = answer_side(other);
        if other_index != index && candidate != correct && !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates.shuffle(rng);
    candidates.truncate(DISTRACTOR_COUNT);

    let mut options = Vec::with_capacity(candidates.len() + 1);
    options.push(correct.clone());
    options.extend(candidates);
    options.shuffle(rng);

    let (prompt, explanation) = match direction {
        Direction::TermToTranslation => (
            format!("What does \"{}\" mean?", pair.term),
            format!("\"{}\" means \"{}\"", pair.term, pair.translation),
        ),
        Direction::TranslationToTerm => (
            format!("How do you say \"{}\"?", pair.translation),
            format!("\"{}\" is \"{}\"", pair.translation, pair.term),
        ),
    };

    Question {
        id,
        prompt,
        explanation: Some(explanation),
        kind: QuestionKind::MultipleChoice {
            direction,
            options,
            correct,
        },
    }
}

fn text_input(id: QuestionId, pair: &VocabularyPair, direction: Direction) -> Question {
    let (prompt, raw_answer, explanation) = match direction {
        Direction::TranslationToTerm => (
            format!("Type the word for \"{}\"", pair.translation),
            &pair.term,
            format!("\"{}\" is \"{}\"", pair.translation, pair.term),
        ),
        Direction::TermToTranslation => (
            format!("Type the translation of \"{}\"", pair.term),
            &pair.translation,
            format!("\"{}\" means \"{}\"", pair.term, pair.translation),
        ),
    };

    Question {
        id,
        prompt,
        explanation: Some(explanation),
        kind: QuestionKind::TextInput {
            direction,
            answer: normalize_answer(raw_answer, direction),
        },
    }
}

fn matching<R: Rng + ?Sized>(
    id: QuestionId,
    pairs: [VocabularyPair; MATCHING_ARITY],
    rng: &mut R,
) -> Question {
    let mut set = MatchingSet::new(pairs);
    set.term_order.shuffle(rng);
    set.translation_order.shuffle(rng);

    // No term may sit on the same row as its own translation. Shared
    // translations can make that impossible, so the attempts are bounded.
    for _ in 0..MATCHING_SHUFFLE_ATTEMPTS {
        if !has_aligned_row(&set) {
            break;
        }
        set.translation_order.shuffle(rng);
    }
    if has_aligned_row(&set) {
        set.translation_order = set
            .term_order
            .iter()
            .cycle()
            .skip(1)
            .take(set.term_order.len())
            .map(|term| set.translation_of(term).unwrap_or_default().to_owned())
            .collect();
    }

    Question {
        id,
        prompt: MATCHING_PROMPT.to_owned(),
        explanation: None,
        kind: QuestionKind::Matching(set),
    }
}

fn has_aligned_row(set: &MatchingSet) -> bool {
    set.term_order
        .iter()
        .zip(&set.translation_order)
        .any(|(term, translation)| set.translation_of(term) == Some(translation.as_str()))
}
