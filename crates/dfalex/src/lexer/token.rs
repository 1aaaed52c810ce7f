use crate::code_set::UNKNOWN_TOKEN;
use crate::lexer::CompiledDfa;
use compact_str::CompactString;
use std::fmt;

/// A token read from the input
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    /// Token id, or [`UNKNOWN_TOKEN`] for a character no token starts with
    pub id: i32,
    pub text: CompactString,
    /// 1-based line of the first character
    pub line: usize,
    /// 1-based column of the first character
    pub column: usize,
}

impl Token {
    #[must_use]
    pub fn new(id: i32, text: impl Into<CompactString>, line: usize, column: usize) -> Self {
        Self {
            id,
            text: text.into(),
            line,
            column,
        }
    }

    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        self.id == UNKNOWN_TOKEN
    }

    /// Length in characters
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {:?} {}:{})", self.id, self.text, self.line, self.column)
    }
}

/// What a read expects to find
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenSelector {
    ByName(CompactString),
    ById(i32),
    /// Any token
    Wildcard,
}

impl TokenSelector {
    /// Parse a space separated selector list; `_` is the wildcard
    ///
    /// ```rust
    /// use dfalex::lexer::TokenSelector;
    ///
    /// let pattern = TokenSelector::sequence("ID _ NUM");
    /// assert_eq!(pattern[1], TokenSelector::Wildcard);
    /// ```
    #[must_use]
    pub fn sequence(pattern: &str) -> Vec<Self> {
        pattern.split_whitespace().map(Self::from).collect()
    }

    #[must_use]
    pub fn matches(&self, token: &Token, dfa: &CompiledDfa) -> bool {
        match self {
            Self::Wildcard => true,
            Self::ById(id) => token.id == *id,
            Self::ByName(name) => dfa.token_name(token.id) == Some(name.as_str()),
        }
    }
}

impl From<&str> for TokenSelector {
    fn from(name: &str) -> Self {
        if name == "_" {
            Self::Wildcard
        } else {
            Self::ByName(name.into())
        }
    }
}

impl From<i32> for TokenSelector {
    fn from(id: i32) -> Self {
        Self::ById(id)
    }
}

impl fmt::Display for TokenSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByName(name) => f.write_str(name),
            Self::ById(id) => write!(f, "#{id}"),
            Self::Wildcard => f.write_str("_"),
        }
    }
}
