//! # dfalex
//!
//! Compiles a list of named regular expressions into one minimal deterministic
//! automaton and uses it to split text into tokens.
//!
//! ## Overview
//!
//! - **Regular expressions**: alternation, grouping, `* + ?`, character classes,
//!   `\d \w` shorthands, hex and unicode escapes, `$NAME` references to earlier
//!   definitions and `^(...)` complement
//! - **One automaton for all tokens**: definitions are merged into a single NFA,
//!   then determinized and minimized by double reversal
//! - **Longest match**: the longest prefix wins, equal-length ties go to the
//!   later definition
//! - **Streaming tokenizer**: lazy reads from any [`std::io::Read`], bounded
//!   history for `unread`, line and column tracking
//! - **Serialization**: compiled automata round-trip through JSON (`serialize`
//!   feature, on by default)
//!
//! ## Quick Start
//!
//! ```rust
//! use dfalex::{CompiledDfa, Tokenizer, TokenizerConfig};
//!
//! let dfa = CompiledDfa::from_script(
//!     r"
//!     ## blanks between tokens
//!     WS:     [\s\n\t]+
//!     _DIGIT: \d
//!     NUM:    $DIGIT+
//!     ID:     [a-zA-Z_] \w*
//!     IF:     if
//!     OP:     [+\-*/=]
//!     ",
//! )?;
//!
//! let config = TokenizerConfig::default().skip("WS");
//! let mut tokens = Tokenizer::from_text(&dfa, "if x = 42", config)?;
//! let names: Vec<&str> = tokens
//!     .by_ref()
//!     .map(|token| token.map(|t| dfa.token_name(t.id).unwrap_or_default()))
//!     .collect::<Result<_, _>>()?;
//! assert_eq!(names, ["IF", "ID", "OP", "NUM"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Modules
//!
//! - [`code_set`]: interval sets over characters, epsilon and token markers
//! - [`graph`]: arena-backed state graphs shared by NFAs and DFAs
//! - [`compiler`]: regex parsing, subset construction, minimization, priorities
//! - [`lexer`]: the compiled automaton and the tokenizer
//! - [`testing`]: a reference tokenizer and input generators for tests

pub mod code_set;
pub mod compiler;
pub mod error;
pub mod graph;
pub mod lexer;
pub mod testing;

// Re-export commonly used types
pub use code_set::{CodeSet, EPSILON, UNKNOWN_TOKEN};
pub use compiler::{BuildConfig, LexerBuilder, PriorityMode, TokenDefinition};
pub use error::{BuildError, CompileError, ParseError, ParseErrorKind, RangeError, TokenizerError};
pub use graph::{StateGraph, StateId};
pub use lexer::{CompiledDfa, Token, TokenSelector, Tokenizer, TokenizerConfig};

#[cfg(feature = "serialize")]
pub use error::DfaDecodeError;
