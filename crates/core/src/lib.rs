//! Domain core of the vocabulary quiz: model types, vocabulary parsing,
//! deck generation, answer checking, built-in content and statistics.

pub mod content;
pub mod evaluator;
pub mod flashcards;
pub mod generator;
pub mod model;
pub mod parser;
pub mod stats;
pub mod time;

pub use time::Clock;
