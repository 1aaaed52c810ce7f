//! # Lexer Module
//!
//! Running a compiled automaton over text.
//!
//! [`CompiledDfa`] is the immutable product of the compiler. Any number of
//! [`Tokenizer`]s can borrow one; each reads characters lazily from an
//! [`std::io::Read`] source and hands out [`Token`]s with their line and column.
//!
//! ## Matching rules
//!
//! - The longest prefix recognised by the automaton becomes the next token.
//! - Among matches of that length the token with the highest id wins, so
//!   later definitions take precedence over earlier ones.
//! - A character that begins no token is returned as a one-character token with
//!   id [`UNKNOWN_TOKEN`](crate::code_set::UNKNOWN_TOKEN).
//!
//! ## Error Handling
//!
//! Every failing method call returns a
//! [`TokenizerError`](crate::error::TokenizerError) without consuming anything,
//! so the caller may retry with a different expectation. Iterating a
//! [`Tokenizer`] is the exception: it yields a rejected unknown token as an
//! error and then moves past it.

pub mod dfa;
mod source;
pub mod token;
pub mod tokenizer;

pub use dfa::{CompiledDfa, UNKNOWN_NAME};
pub use token::{Token, TokenSelector};
pub use tokenizer::{Tokenizer, TokenizerConfig};
