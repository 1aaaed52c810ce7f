//! # Error Types
//!
//! Every fallible operation in the crate returns one of the types below.
//!
//! - [`RangeError`]: an empty or inverted interval passed to a [`CodeSet`](crate::CodeSet) mutator
//! - [`ParseError`]: a malformed regular expression or token script
//! - [`BuildError`]: a definition list that cannot become a valid automaton
//! - [`CompileError`]: either of the two above, returned by the script entry points
//! - [`TokenizerError`]: runtime scanning failures
//! - [`DfaDecodeError`]: a serialized automaton that fails validation
//!
//! Compilation errors abort the whole build; no partial automaton is ever returned.
//! Tokenizer errors are per call and leave the tokenizer usable.
//!
//! ## Diagnostics Support
//!
//! When the `diagnostics` feature is enabled, errors integrate with [`miette`]
//! and carry stable diagnostic codes.

use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

/// An interval `[lower, upper)` with `lower >= upper`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
#[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::range)))]
#[error("Illegal range [{lower}, {upper})")]
pub struct RangeError {
    pub lower: i32,
    pub upper: i32,
}

impl RangeError {
    #[must_use]
    pub const fn new(lower: i32, upper: i32) -> Self {
        Self { lower, upper }
    }
}

/// Regular expression or script error with location information
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
#[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::parse)))]
#[error("{kind}: {excerpt}{}", line_suffix(.line))]
pub struct ParseError {
    #[source]
    pub kind: ParseErrorKind,
    /// Source text around the failure point, with ` !!! ` marking the position
    pub excerpt: String,
    /// 1-based script line, when the expression came from a script
    pub line: Option<usize>,
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|n| format!(", line {n}")).unwrap_or_default()
}

impl ParseError {
    #[must_use]
    pub fn new(kind: ParseErrorKind, excerpt: impl Into<String>) -> Self {
        Self {
            kind,
            excerpt: excerpt.into(),
            line: None,
        }
    }

    /// Attach a script line number, keeping any number already present
    #[must_use]
    pub fn at_line(mut self, line: usize) -> Self {
        self.line.get_or_insert(line);
        self
    }
}

/// Types of regular expression and script errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum ParseErrorKind {
    #[error("Unexpected end of input")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::parse::unexpected_end)))]
    UnexpectedEnd,

    #[error("Unexpected character '{found}'")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::parse::unexpected_char)))]
    UnexpectedChar { found: char },

    #[error("Expected '{expected}'")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::parse::expected)))]
    Expected { expected: char },

    #[error("Illegal control character {code:#x}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::parse::control_char)))]
    IllegalControlChar { code: u32 },

    #[error("Unsupported escape sequence '\\{found}'")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::parse::unsupported_escape)))]
    UnsupportedEscape { found: char },

    #[error("Missing hex digit")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::parse::hex_digit)))]
    MissingHexDigit,

    #[error("Illegal character within [ ]")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::parse::bracket_char)))]
    IllegalBracketChar,

    #[error("Illegal bracket argument")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::parse::bracket_argument)))]
    IllegalBracketArgument,

    #[error("Illegal range {lower}..{upper}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::parse::descending_range)))]
    DescendingRange { lower: i32, upper: i32 },

    #[error("Empty character range")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::parse::empty_class)))]
    EmptyClass,

    #[error("Bad token name '{name}'")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::parse::bad_name)))]
    BadTokenName { name: String },

    #[error("Undefined token '{name}'")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::parse::undefined_token)))]
    UndefinedToken { name: String },

    #[error("Syntax error")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::parse::syntax)))]
    MalformedLine,

    #[error("Incomplete final line")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::parse::incomplete_line)))]
    IncompleteFinalLine,
}

impl ParseErrorKind {
    /// Create an unexpected character error
    #[must_use]
    pub const fn unexpected_char(found: char) -> Self {
        Self::UnexpectedChar { found }
    }

    /// Create a descending range error
    #[must_use]
    pub const fn descending_range(lower: i32, upper: i32) -> Self {
        Self::DescendingRange { lower, upper }
    }

    /// Create an undefined reference error
    #[must_use]
    pub fn undefined_token(name: impl Into<String>) -> Self {
        Self::UndefinedToken { name: name.into() }
    }
}

impl From<RangeError> for ParseErrorKind {
    fn from(err: RangeError) -> Self {
        Self::DescendingRange {
            lower: err.lower,
            upper: err.upper,
        }
    }
}

/// Errors raised while turning token definitions into a DFA
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum BuildError {
    #[error("No token definitions")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::build::empty)))]
    NoTokens,

    #[error("Duplicate token name '{name}'")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::build::duplicate_token)))]
    DuplicateToken { name: String },

    #[error("Token '{name}' has id {id}, expected {expected}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::build::token_id)))]
    InvalidTokenId { name: String, id: i32, expected: i32 },

    #[error("Token '{name}' can match a zero-length string")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(
            code(dfalex::build::zero_length),
            help("make the expression consume at least one character, e.g. use '+' instead of '*'")
        )
    )]
    ZeroLengthToken { name: String },

    #[error("Redundant token '{name}' is never recognized")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::build::redundant_token)))]
    RedundantToken { name: String },

    #[error("Malformed automaton: {reason}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::build::malformed)))]
    MalformedAutomaton { reason: String },
}

impl BuildError {
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedAutomaton {
            reason: reason.into(),
        }
    }
}

/// Result of compiling a script or a builder's definitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum CompileError {
    #[error(transparent)]
    #[cfg_attr(feature = "diagnostics", diagnostic(transparent))]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[cfg_attr(feature = "diagnostics", diagnostic(transparent))]
    Build(#[from] BuildError),
}

/// Runtime tokenizer errors
#[derive(Debug, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum TokenizerError {
    #[error("No more tokens")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::tokenizer::exhausted)))]
    NoMoreTokens,

    #[error("Unknown token '{text}' at line {line}, column {column}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::tokenizer::unknown)))]
    UnknownToken {
        text: String,
        line: usize,
        column: usize,
    },

    #[error("Unexpected token {found} at line {line}, column {column}; expected {expected}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::tokenizer::unexpected)))]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
        column: usize,
    },

    #[error("Token unavailable: cannot unread {requested}, only {available} retained")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::tokenizer::unavailable)))]
    TokenUnavailable { requested: usize, available: usize },

    #[error("No token named '{name}' to skip")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::tokenizer::skip)))]
    UnknownSkipToken { name: String },

    #[error("Input is not valid UTF-8 near byte {offset}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::tokenizer::utf8)))]
    InvalidUtf8 { offset: usize },

    #[error(transparent)]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::tokenizer::io)))]
    Io(#[from] std::io::Error),
}

/// A serialized DFA that could not be loaded
#[cfg(feature = "serialize")]
#[derive(Debug, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum DfaDecodeError {
    #[error(transparent)]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::decode::json)))]
    Json(#[from] serde_json::Error),

    #[error("Unsupported DFA version {version}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::decode::version)))]
    UnsupportedVersion { version: f64 },

    #[error("DFA has no states")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::decode::empty)))]
    NoStates,

    #[error("Malformed edge label in state {state}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::decode::label)))]
    MalformedLabel { state: usize },

    #[error("Edge from state {state} targets missing state {dest}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::decode::destination)))]
    DestinationOutOfRange { state: usize, dest: usize },

    #[error("Final edge in state {state} names unknown token {id}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(dfalex::decode::token)))]
    UnknownToken { state: usize, id: i32 },

    #[error(transparent)]
    #[cfg_attr(feature = "diagnostics", diagnostic(transparent))]
    Automaton(#[from] BuildError),
}
