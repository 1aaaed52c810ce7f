//! # Testing Utilities
//!
//! Helpers for checking automata built by this crate.
//!
//! [`oracle_tokenize`] tokenizes text by simulating every definition's NFA
//! separately, which is slow but independent of subset construction,
//! minimization and priority filtering. Property tests compare it against
//! [`Tokenizer`](crate::Tokenizer) on generated input from [`TextGenerator`].

pub mod generators;
pub mod oracle;

pub use generators::{GeneratorConfig, TextGenerator};
pub use oracle::{longest_match, oracle_tokenize};
