//! Parser for plain-text vocabulary lists.
//!
//! # Format
//! ```text
//! la cabeza - głowa
//! la nariz - nos
//! once: jedenaście
//! ```
//!
//! One pair per line. `" - "` is used as the delimiter when the line contains
//! it, `":"` otherwise. Blank lines and lines that do not split into exactly two
//! non-empty parts are skipped.

use crate::model::VocabularyPair;

const DASH_DELIMITER: &str = " - ";
const COLON_DELIMITER: char = ':';

/// Parse vocabulary text into pairs, preserving line order.
#[must_use]
pub fn parse_vocabulary(content: &str) -> Vec<VocabularyPair> {
    content.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<VocabularyPair> {
    if line.trim().is_empty() {
        return None;
    }

    let parts: Vec<&str> = if line.contains(DASH_DELIMITER) {
        line.split(DASH_DELIMITER).collect()
    } else {
        line.split(COLON_DELIMITER).collect()
    };

    let [term, translation] = parts.as_slice() else {
        return None;
    };
    let (term, translation) = (term.trim(), translation.trim());
    if term.is_empty() || translation.is_empty() {
        return None;
    }

    Some(VocabularyPair::new(term, translation))
}
