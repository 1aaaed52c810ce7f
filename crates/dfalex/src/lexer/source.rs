//! Lazy UTF-8 decoding of a byte stream into a sliding character window.

use crate::error::TokenizerError;
use compact_str::CompactString;
use std::io::{ErrorKind, Read};

/// Characters before the scan position are only dropped once this many pile up
const RELEASE_THRESHOLD: usize = 4096;

pub(crate) struct CharSource<R> {
    /// `None` once the reader reported end of input
    reader: Option<R>,
    chunk: Vec<u8>,
    /// Bytes of an incomplete trailing code point
    pending: Vec<u8>,
    chars: Vec<char>,
    /// Absolute character offset of `chars[0]`
    base: usize,
    /// Absolute byte offset of `pending[0]`
    decoded_bytes: usize,
    /// Byte offset of the first invalid sequence, reported on every later fill
    invalid_at: Option<usize>,
}

impl<R: Read> CharSource<R> {
    pub(crate) fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader: Some(reader),
            chunk: vec![0; chunk_size.max(4)],
            pending: Vec::new(),
            chars: Vec::new(),
            base: 0,
            decoded_bytes: 0,
            invalid_at: None,
        }
    }

    /// Character at absolute offset `pos`, reading ahead as needed
    pub(crate) fn get(&mut self, pos: usize) -> Result<Option<char>, TokenizerError> {
        debug_assert!(pos >= self.base, "character {pos} was already released");
        while pos >= self.base + self.chars.len() {
            if !self.fill()? {
                return Ok(None);
            }
        }
        Ok(self.chars.get(pos - self.base).copied())
    }

    /// `len` characters starting at `pos`; they must already have been read
    pub(crate) fn text(&self, pos: usize, len: usize) -> CompactString {
        let start = pos - self.base;
        self.chars[start..start + len].iter().collect()
    }

    /// Forget characters before `pos`
    pub(crate) fn release(&mut self, pos: usize) {
        let consumed = pos.saturating_sub(self.base).min(self.chars.len());
        if consumed >= RELEASE_THRESHOLD {
            self.chars.drain(..consumed);
            self.base += consumed;
        }
    }

    /// Decode at least one more character; `false` at end of input
    fn fill(&mut self) -> Result<bool, TokenizerError> {
        if let Some(offset) = self.invalid_at {
            return Err(TokenizerError::InvalidUtf8 { offset });
        }
        loop {
            let Some(reader) = self.reader.as_mut() else {
                return Ok(false);
            };
            let read = match reader.read(&mut self.chunk) {
                Ok(read) => read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            if read == 0 {
                self.reader = None;
                if self.pending.is_empty() {
                    return Ok(false);
                }
                return Err(self.invalid(self.decoded_bytes));
            }

            self.pending.extend_from_slice(&self.chunk[..read]);
            let valid = match std::str::from_utf8(&self.pending) {
                Ok(text) => text.len(),
                Err(err) if err.error_len().is_some() => {
                    return Err(self.invalid(self.decoded_bytes + err.valid_up_to()));
                }
                Err(err) => err.valid_up_to(),
            };
            if valid == 0 {
                continue;
            }
            let text = std::str::from_utf8(&self.pending[..valid]).map_err(|err| {
                TokenizerError::InvalidUtf8 {
                    offset: self.decoded_bytes + err.valid_up_to(),
                }
            })?;
            self.chars.extend(text.chars());
            self.pending.drain(..valid);
            self.decoded_bytes += valid;
            return Ok(true);
        }
    }
}

impl<R> CharSource<R> {
    fn invalid(&mut self, offset: usize) -> TokenizerError {
        self.invalid_at = Some(offset);
        TokenizerError::InvalidUtf8 { offset }
    }
}
