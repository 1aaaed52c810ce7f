//! Longest-match tokenization over a [`CompiledDfa`].

use crate::code_set::UNKNOWN_TOKEN;
use crate::error::TokenizerError;
use crate::lexer::source::CharSource;
use crate::lexer::{CompiledDfa, Token, TokenSelector};
use compact_str::CompactString;
use std::io::Read;

/// Tokenizer settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizerConfig {
    /// Name of a token that is consumed silently, typically whitespace
    pub skip: Option<CompactString>,
    /// Number of already read tokens kept for [`Tokenizer::unread`]
    pub history_capacity: usize,
    /// Let [`Tokenizer::read`] return unknown tokens instead of failing
    pub accept_unknown: bool,
    /// Bytes requested from the reader at a time
    pub read_chunk: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            skip: None,
            history_capacity: 32,
            accept_unknown: false,
            read_chunk: 4096,
        }
    }
}

impl TokenizerConfig {
    #[must_use]
    pub fn skip(mut self, name: impl Into<CompactString>) -> Self {
        self.skip = Some(name.into());
        self
    }
}

/// Splits a character stream into tokens
///
/// At each position the longest prefix recognised by the DFA becomes the next
/// token; among matches of the same length the token with the highest id wins.
/// A character that starts no token at all becomes a one-character unknown
/// token. Tokens are scanned lazily and kept in a bounded history so that a
/// parser can step back with [`unread`](Self::unread).
///
/// ```rust
/// use dfalex::{CompiledDfa, Tokenizer, TokenizerConfig};
///
/// let dfa = CompiledDfa::from_script("WS: \\s+\nNUM: \\d+\nID: [a-z]+").unwrap();
/// let config = TokenizerConfig::default().skip("WS");
/// let mut tokens = Tokenizer::from_text(&dfa, "x 42", config).unwrap();
/// assert_eq!(tokens.read_expect("ID").unwrap().text, "x");
/// assert_eq!(tokens.read().unwrap().text, "42");
/// assert!(!tokens.has_next().unwrap());
/// ```
pub struct Tokenizer<'d, R> {
    dfa: &'d CompiledDfa,
    source: CharSource<R>,
    config: TokenizerConfig,
    skip_id: Option<i32>,
    /// Absolute character offset where the next scan starts
    scan_pos: usize,
    scan_line: usize,
    scan_column: usize,
    history: Vec<Token>,
    /// Index in `history` of the next token to read
    cursor: usize,
    /// Set while a transactional read may still roll back
    pinned: bool,
}

impl<'d> Tokenizer<'d, &'d [u8]> {
    /// Tokenize an in-memory string
    pub fn from_text(
        dfa: &'d CompiledDfa,
        text: &'d str,
        config: TokenizerConfig,
    ) -> Result<Self, TokenizerError> {
        Self::new(dfa, text.as_bytes(), config)
    }
}

impl<'d, R: Read> Tokenizer<'d, R> {
    pub fn new(dfa: &'d CompiledDfa, reader: R, config: TokenizerConfig) -> Result<Self, TokenizerError> {
        let skip_id = match &config.skip {
            Some(name) => Some(dfa.token_id(name).ok_or_else(|| {
                TokenizerError::UnknownSkipToken {
                    name: name.to_string(),
                }
            })?),
            None => None,
        };
        Ok(Self {
            dfa,
            source: CharSource::new(reader, config.read_chunk),
            config,
            skip_id,
            scan_pos: 0,
            scan_line: 1,
            scan_column: 1,
            history: Vec::new(),
            cursor: 0,
            pinned: false,
        })
    }

    #[must_use]
    pub const fn dfa(&self) -> &'d CompiledDfa {
        self.dfa
    }

    /// Name of a token's id, `<UNKNOWN>` for unknown tokens
    #[must_use]
    pub fn name_of(&self, token: &Token) -> &'d str {
        self.dfa.token_name(token.id).unwrap_or_default()
    }

    /// 1-based line and column where the next unread token starts, or where
    /// scanning resumes if none has been scanned yet
    #[must_use]
    pub fn position(&self) -> (usize, usize) {
        self.history
            .get(self.cursor)
            .map_or((self.scan_line, self.scan_column), |token| {
                (token.line, token.column)
            })
    }

    /// The next token without consuming it; `None` at end of input
    pub fn peek(&mut self) -> Result<Option<&Token>, TokenizerError> {
        self.fill()?;
        Ok(self.history.get(self.cursor))
    }

    pub fn has_next(&mut self) -> Result<bool, TokenizerError> {
        self.fill()
    }

    /// Consume the next token
    ///
    /// Fails at end of input, and on an unknown token unless
    /// `accept_unknown` is set.
    pub fn read(&mut self) -> Result<Token, TokenizerError> {
        self.read_matching(&TokenSelector::Wildcard)
    }

    /// Consume the next token, failing if it does not match `expected`
    pub fn read_expect(&mut self, expected: impl Into<TokenSelector>) -> Result<Token, TokenizerError> {
        self.read_matching(&expected.into())
    }

    /// Consume the next token only if it matches `expected`
    pub fn read_if(&mut self, expected: impl Into<TokenSelector>) -> Result<Option<Token>, TokenizerError> {
        let selector = expected.into();
        if self.next_matches(&selector)? {
            self.read_matching(&selector).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Consume tokens matching each selector in turn
    ///
    /// Tokens consumed before a failure stay consumed.
    pub fn read_sequence(&mut self, pattern: &[TokenSelector]) -> Result<Vec<Token>, TokenizerError> {
        pattern
            .iter()
            .map(|selector| self.read_matching(selector))
            .collect()
    }

    /// Consume the whole sequence if every token matches, otherwise nothing
    pub fn read_sequence_if(
        &mut self,
        pattern: &[TokenSelector],
    ) -> Result<Option<Vec<Token>>, TokenizerError> {
        self.pinned = true;
        let result = self.read_sequence_pinned(pattern);
        self.pinned = false;
        result
    }

    fn read_sequence_pinned(
        &mut self,
        pattern: &[TokenSelector],
    ) -> Result<Option<Vec<Token>>, TokenizerError> {
        let mut tokens = Vec::with_capacity(pattern.len());
        for selector in pattern {
            let matched = match self.next_matches(selector) {
                Ok(true) => self.read_matching(selector),
                Ok(false) => break,
                Err(err) => Err(err),
            };
            match matched {
                Ok(token) => tokens.push(token),
                Err(err) => {
                    self.cursor -= tokens.len();
                    return Err(err);
                }
            }
        }
        if tokens.len() == pattern.len() {
            Ok(Some(tokens))
        } else {
            self.cursor -= tokens.len();
            Ok(None)
        }
    }

    /// Step back over the last `count` read tokens
    pub fn unread(&mut self, count: usize) -> Result<(), TokenizerError> {
        if count > self.cursor {
            return Err(TokenizerError::TokenUnavailable {
                requested: count,
                available: self.cursor,
            });
        }
        self.cursor -= count;
        Ok(())
    }

    fn next_matches(&mut self, selector: &TokenSelector) -> Result<bool, TokenizerError> {
        let dfa = self.dfa;
        Ok(self
            .peek()?
            .is_some_and(|token| selector.matches(token, dfa)))
    }

    fn read_matching(&mut self, selector: &TokenSelector) -> Result<Token, TokenizerError> {
        if !self.fill()? {
            return Err(TokenizerError::NoMoreTokens);
        }
        let token = &self.history[self.cursor];
        if token.is_unknown() && !self.config.accept_unknown {
            return Err(TokenizerError::UnknownToken {
                text: token.text.to_string(),
                line: token.line,
                column: token.column,
            });
        }
        if !selector.matches(token, self.dfa) {
            return Err(TokenizerError::UnexpectedToken {
                expected: selector.to_string(),
                found: self.name_of(token).to_string(),
                line: token.line,
                column: token.column,
            });
        }
        let token = token.clone();
        self.cursor += 1;
        Ok(token)
    }

    /// Make sure a token is available at the cursor; `false` at end of input
    fn fill(&mut self) -> Result<bool, TokenizerError> {
        while self.cursor == self.history.len() {
            if self.source.get(self.scan_pos)?.is_none() {
                return Ok(false);
            }
            let (id, length) = match self.scan()? {
                (UNKNOWN_TOKEN, _) => (UNKNOWN_TOKEN, 1),
                found => found,
            };
            let text = self.source.text(self.scan_pos, length);
            let token = Token {
                id,
                text,
                line: self.scan_line,
                column: self.scan_column,
            };
            self.advance(&token.text, length);
            if self.skip_id == Some(id) {
                log::trace!("skipping {token}");
                continue;
            }
            log::trace!("scanned {token}");
            self.history.push(token);
            self.compact_history();
        }
        Ok(true)
    }

    /// Longest match starting at the scan position as `(token id, length)`
    fn scan(&mut self) -> Result<(i32, usize), TokenizerError> {
        let mut state = self.dfa.start();
        let mut best = (UNKNOWN_TOKEN, 0);
        let mut offset = 0;
        loop {
            if let Some(id) = self.dfa.accepting(state)
                && (best.1 < offset || id > best.0)
            {
                best = (id, offset);
            }
            let Some(c) = self.source.get(self.scan_pos + offset)? else {
                break;
            };
            let Some(next) = self.dfa.step(state, c) else {
                break;
            };
            state = next;
            offset += 1;
        }
        Ok(best)
    }

    fn advance(&mut self, text: &str, length: usize) {
        let bytes = text.as_bytes();
        let newlines = memchr::memchr_iter(b'\n', bytes).count();
        if let Some(last) = memchr::memrchr(b'\n', bytes) {
            self.scan_line += newlines;
            self.scan_column = text[last + 1..].chars().count() + 1;
        } else {
            self.scan_column += length;
        }
        self.scan_pos += length;
        self.source.release(self.scan_pos);
    }

    /// Drop history entries that can no longer be unread
    fn compact_history(&mut self) {
        let limit = self.config.history_capacity.saturating_mul(2).max(1);
        if self.pinned || self.history.len() <= limit {
            return;
        }
        let excess = self.cursor.saturating_sub(self.config.history_capacity);
        self.history.drain(..excess);
        self.cursor -= excess;
    }
}

impl<R: Read> Iterator for Tokenizer<'_, R> {
    type Item = Result<Token, TokenizerError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.has_next() {
            Ok(true) => {
                let result = self.read();
                // Step past a rejected unknown token so iteration makes progress.
                if let Err(TokenizerError::UnknownToken { .. }) = result {
                    self.cursor += 1;
                }
                Some(result)
            }
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}
