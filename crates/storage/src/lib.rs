//! Persistence for the quiz: a key-value contract, its in-memory and `SQLite`
//! backings, and the typed repositories built on top of them.

pub mod repository;
pub mod sqlite;
