//! Regular expression to NFA compilation.
//!
//! Grammar (spaces and tabs are ignored unless escaped):
//!
//! ```text
//! E -> J ('|' E)?
//! J -> Q J?
//! Q -> P ('*' | '+' | '?')?
//! P -> '(' E ')' | '{' NAME '}' | '$' NAME | '^' P | '[' CLASS ']' | CODE
//!
//! CLASS -> MEMBER+ | MEMBER* '^' MEMBER+
//! MEMBER -> CODE ('-' CODE)?
//! CODE -> any printable character except the operators above
//!       | \xhh | \0xhh | \uhhhh | \f | \n | \r | \t | \s (space)
//!       | \d | \w | \c for any other non-alphanumeric c
//! ```
//!
//! Every production yields a Thompson-construction fragment whose end state is
//! never final. `^P` is the complement of `P` with respect to prefixes: it
//! matches strings that leave `P`'s automaton before `P` has been matched.

use super::builder::minimize;
use crate::code_set::CodeSet;
use crate::error::{ParseError, ParseErrorKind};
use crate::graph::{Fragment, StateGraph, StateId};
use ahash::RandomState;
use compact_str::CompactString;
use hashbrown::HashMap;
use std::sync::OnceLock;

/// Previously compiled expressions, by name, for `{name}` and `$name` references
pub type FragmentTable = HashMap<CompactString, Fragment, RandomState>;

/// `\d`
pub fn digit_set() -> &'static CodeSet {
    static DIGITS: OnceLock<CodeSet> = OnceLock::new();
    DIGITS.get_or_init(|| {
        CodeSet::from_elements(vec!['0' as i32, '9' as i32 + 1]).unwrap_or_default()
    })
}

/// `\w`
pub fn word_set() -> &'static CodeSet {
    static WORD: OnceLock<CodeSet> = OnceLock::new();
    WORD.get_or_init(|| {
        let mut set = digit_set().clone();
        set.add_value('_' as i32);
        for (lower, upper) in [('a', 'z'), ('A', 'Z')] {
            let _ = set.add(lower as i32, upper as i32 + 1);
        }
        set
    })
}

/// Whether `name` is a legal token name, `[_A-Za-z][_A-Za-z0-9]*`
#[must_use]
pub fn is_token_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Compiles regular expressions against a table of named fragments
#[derive(Debug, Clone, Copy)]
pub struct RegexCompiler<'a> {
    table: &'a FragmentTable,
}

impl<'a> RegexCompiler<'a> {
    #[must_use]
    pub const fn new(table: &'a FragmentTable) -> Self {
        Self { table }
    }

    /// Compile one expression into a fragment
    pub fn compile(&self, pattern: &str) -> Result<Fragment, ParseError> {
        let mut parser = Parser {
            chars: strip_whitespace(pattern),
            pos: 0,
            graph: StateGraph::new(),
            table: self.table,
        };
        let (start, end) = parser.parse_alternation()?;
        if let Some(c) = parser.bump() {
            return Err(parser.fail(ParseErrorKind::unexpected_char(c)));
        }

        // Drop states orphaned by complements and references.
        let mut graph = StateGraph::new();
        let [start, end] = parser.graph.duplicate_into([start, end], &mut graph);
        Ok(Fragment { graph, start, end })
    }
}

/// Compile an expression that references no named fragments
pub fn compile_regex(pattern: &str) -> Result<Fragment, ParseError> {
    RegexCompiler::new(&FragmentTable::default()).compile(pattern)
}

/// Remove spaces and tabs that are not escaped by an odd run of backslashes
fn strip_whitespace(pattern: &str) -> Vec<char> {
    let mut out = Vec::with_capacity(pattern.len());
    let mut escaped = false;
    for c in pattern.chars() {
        match c {
            ' ' | '\t' if !escaped => continue,
            '\\' => escaped = !escaped,
            _ => escaped = false,
        }
        out.push(c);
    }
    out
}

type Ends = (StateId, StateId);

struct Parser<'a> {
    chars: Vec<char>,
    pos: usize,
    graph: StateGraph,
    table: &'a FragmentTable,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        let found = self.peek() == Some(expected);
        if found {
            self.pos += 1;
        }
        found
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(_) => Err(self.fail(ParseErrorKind::Expected { expected })),
            None => Err(self.fail(ParseErrorKind::UnexpectedEnd)),
        }
    }

    fn next_or_end(&mut self) -> Result<char, ParseError> {
        self.bump()
            .ok_or_else(|| self.fail(ParseErrorKind::UnexpectedEnd))
    }

    /// Error positioned just before the most recently consumed character
    fn fail(&self, kind: ParseErrorKind) -> ParseError {
        let i = self.pos.saturating_sub(1);
        let mut excerpt = String::new();
        if i > 4 {
            excerpt.push_str("...");
        }
        excerpt.extend(&self.chars[i.saturating_sub(3)..i]);
        excerpt.push_str(" !!! ");
        excerpt.extend(&self.chars[i..(i + 3).min(self.chars.len())]);
        if i + 3 < self.chars.len() {
            excerpt.push_str("...");
        }
        ParseError::new(kind, excerpt)
    }

    fn edge_fragment(&mut self, label: CodeSet) -> Ends {
        let start = self.graph.add_state(false);
        let end = self.graph.add_state(false);
        self.graph.add_edge(start, label, end);
        (start, end)
    }

    fn parse_alternation(&mut self) -> Result<Ends, ParseError> {
        let first = self.parse_sequence()?;
        if !self.eat('|') {
            return Ok(first);
        }
        let second = self.parse_alternation()?;
        let start = self.graph.add_state(false);
        let end = self.graph.add_state(false);
        self.graph.add_epsilon(start, first.0);
        self.graph.add_epsilon(start, second.0);
        self.graph.add_epsilon(first.1, end);
        self.graph.add_epsilon(second.1, end);
        Ok((start, end))
    }

    fn parse_sequence(&mut self) -> Result<Ends, ParseError> {
        let (start, mut end) = self.parse_quantified()?;
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            let next = self.parse_quantified()?;
            self.graph.add_epsilon(end, next.0);
            end = next.1;
        }
        Ok((start, end))
    }

    fn parse_quantified(&mut self) -> Result<Ends, ParseError> {
        let (start, end) = self.parse_atom()?;
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                self.graph.add_epsilon(start, end);
                self.graph.add_epsilon(end, start);
            }
            Some('+') => {
                self.pos += 1;
                self.graph.add_epsilon(end, start);
            }
            Some('?') => {
                self.pos += 1;
                self.graph.add_epsilon(start, end);
            }
            _ => {}
        }

        // An end state with outgoing edges gets a fresh successor, so later
        // concatenation never reuses a state inside a loop.
        if self.graph.state(end).edges().is_empty() {
            Ok((start, end))
        } else {
            let fresh = self.graph.add_state(false);
            self.graph.add_epsilon(end, fresh);
            Ok((start, fresh))
        }
    }

    fn parse_atom(&mut self) -> Result<Ends, ParseError> {
        match self.peek() {
            None => Err(self.fail(ParseErrorKind::UnexpectedEnd)),
            Some('(') => {
                self.pos += 1;
                let inner = self.parse_alternation()?;
                self.expect(')')?;
                Ok(inner)
            }
            Some('^') => {
                self.pos += 1;
                let inner = self.parse_atom()?;
                Ok(self.complement(inner))
            }
            Some('{' | '$') => self.parse_reference(),
            Some('[') => self.parse_class(),
            Some(c @ ('*' | '+' | '?' | ')' | '|')) => {
                self.pos += 1;
                Err(self.fail(ParseErrorKind::unexpected_char(c)))
            }
            Some(_) => {
                let label = self.parse_code(false)?;
                Ok(self.edge_fragment(label))
            }
        }
    }

    /// One literal or escape sequence
    fn parse_code(&mut self, in_class: bool) -> Result<CodeSet, ParseError> {
        let c = self.next_or_end()?;
        if c != '\\' {
            if in_class && c == '^' {
                return Err(self.fail(ParseErrorKind::IllegalBracketChar));
            }
            if c.is_control() {
                return Err(self.fail(ParseErrorKind::IllegalControlChar { code: c as u32 }));
            }
            return Ok(CodeSet::single(c as i32));
        }

        let escape = self.next_or_end()?;
        let value = match escape {
            'd' => return Ok(digit_set().clone()),
            'w' => return Ok(word_set().clone()),
            '0' => match self.next_or_end()? {
                'x' | 'X' => self.read_hex(2)?,
                other => return Err(self.fail(ParseErrorKind::UnsupportedEscape { found: other })),
            },
            'x' | 'X' => self.read_hex(2)?,
            'u' | 'U' => self.read_hex(4)?,
            'f' => 0x0c,
            'n' => '\n' as i32,
            'r' => '\r' as i32,
            't' => '\t' as i32,
            's' => ' ' as i32,
            other if other.is_ascii_alphanumeric() => {
                return Err(self.fail(ParseErrorKind::UnsupportedEscape { found: other }));
            }
            other => other as i32,
        };
        Ok(CodeSet::single(value))
    }

    fn read_hex(&mut self, digits: usize) -> Result<i32, ParseError> {
        let mut value = 0;
        for _ in 0..digits {
            let c = self.next_or_end()?;
            let digit = c
                .to_digit(16)
                .ok_or_else(|| self.fail(ParseErrorKind::MissingHexDigit))?;
            value = (value << 4) | digit as i32;
        }
        Ok(value)
    }

    fn parse_class(&mut self) -> Result<Ends, ParseError> {
        self.pos += 1;
        let mut set = CodeSet::new();
        let mut expecting_member = true;
        let mut negated = false;
        let mut had_initial = false;

        loop {
            if !negated && self.eat('^') {
                negated = true;
                expecting_member = true;
            }
            if !expecting_member && self.eat(']') {
                break;
            }
            let member = self.parse_class_member()?;
            expecting_member = false;
            if negated && had_initial {
                set.remove_set(&member);
            } else {
                set.add_set(&member);
                had_initial |= !negated;
            }
        }
        if negated && !had_initial {
            set.negate_chars();
        }
        if set.is_empty() {
            return Err(self.fail(ParseErrorKind::EmptyClass));
        }
        Ok(self.edge_fragment(set))
    }

    fn parse_class_member(&mut self) -> Result<CodeSet, ParseError> {
        let first = self.parse_code(true)?;
        if !self.eat('-') {
            return Ok(first);
        }
        let lower = first
            .single_value()
            .ok_or_else(|| self.fail(ParseErrorKind::IllegalBracketArgument))?;
        let upper = self
            .parse_code(true)?
            .single_value()
            .ok_or_else(|| self.fail(ParseErrorKind::IllegalBracketArgument))?;
        if upper < lower {
            return Err(self.fail(ParseErrorKind::descending_range(lower, upper)));
        }
        CodeSet::with_range(lower, upper + 1).map_err(|err| self.fail(err.into()))
    }

    fn parse_reference(&mut self) -> Result<Ends, ParseError> {
        let braced = self.bump() == Some('{');
        let mut name = String::new();
        if braced {
            loop {
                match self.next_or_end()? {
                    '}' => break,
                    c => name.push(c),
                }
            }
        } else {
            while let Some(c) = self.peek().filter(|c| *c == '_' || c.is_ascii_alphanumeric()) {
                name.push(c);
                self.pos += 1;
            }
        }
        if !is_token_name(&name) {
            return Err(self.fail(ParseErrorKind::BadTokenName { name }));
        }

        // The leading underscore of an anonymous definition may be omitted.
        let table = self.table;
        let fragment = table
            .get(name.as_str())
            .or_else(|| table.get(format!("_{name}").as_str()))
            .ok_or_else(|| self.fail(ParseErrorKind::undefined_token(name.as_str())))?;
        Ok(fragment.splice_into(&mut self.graph))
    }

    /// Replace `inner` with its prefix complement
    ///
    /// The inner fragment is made deterministic with its end as the only final
    /// state. Final states lose their flag; every other state gets an edge on the
    /// characters it has no transition for, plus an epsilon edge, both to one new
    /// end state.
    fn complement(&mut self, (start, end): Ends) -> Ends {
        let mut inner = StateGraph::new();
        let [start, end] = self.graph.duplicate_into([start, end], &mut inner);
        inner.set_final(end, true);

        let mut dfa = minimize(&inner, start);
        let dfa_start = StateId(0);
        let states = dfa.reachable(dfa_start);
        let sink = dfa.add_state(false);
        for id in states {
            if dfa.state(id).is_final() {
                dfa.set_final(id, false);
                continue;
            }
            let mut missing = CodeSet::all_chars();
            for edge in dfa.state(id).edges() {
                missing.remove_set(&edge.label);
            }
            if !missing.is_empty() {
                dfa.add_edge(id, missing, sink);
            }
            dfa.add_epsilon(id, sink);
        }

        let [start, end] = dfa.duplicate_into([dfa_start, sink], &mut self.graph);
        (start, end)
    }
}
