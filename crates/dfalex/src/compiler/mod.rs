//! # Compiler
//!
//! Turns token definitions into a [`CompiledDfa`].
//!
//! ```text
//! script / builder --> TokenDefinition list --> combined NFA --> minimal DFA
//!                       (regex::RegexCompiler)   (compile)       (builder::DfaBuilder)
//! ```
//!
//! The combined NFA has one start state with an epsilon edge to a copy of every
//! named definition's fragment. Each copy's end state gets an edge labelled with
//! the definition's token marker ([`token_label`]) into a fresh final state, so
//! the final DFA reports which token was recognised by the marker on the edge
//! taken into its single final state.
//!
//! ## Example
//!
//! ```rust
//! use dfalex::compiler::LexerBuilder;
//!
//! let dfa = LexerBuilder::new()
//!     .token("WS", "[\\s\\n]+")
//!     .token("IDENT", "[a-z]+")
//!     .token("RUN", "run")
//!     .build()
//!     .unwrap();
//! assert_eq!(dfa.token_id("RUN"), Some(2));
//! ```

pub mod builder;
pub mod filter;
pub mod partition;
pub mod regex;
pub mod script;

pub use builder::DfaBuilder;
pub use filter::PriorityFilter;
pub use partition::RangePartition;
pub use regex::{FragmentTable, RegexCompiler, compile_regex};
pub use script::{ScriptEntry, parse_script};

use crate::code_set::{CodeSet, MAX_TOKEN_ID, is_token_label, label_token, token_label};
use crate::error::{BuildError, CompileError};
use crate::graph::{Fragment, StateGraph, StateId};
use crate::lexer::CompiledDfa;
use ahash::RandomState;
use compact_str::CompactString;
use hashbrown::HashSet;

/// How competing token matches are resolved inside the automaton
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PriorityMode {
    /// Keep every transition; only zero-length tokens are rejected
    Off,
    /// The longest match wins; among equal-length matches the highest id wins
    #[default]
    LongestMatch,
    /// Once a token has been recognised, longer matches of lower-id tokens
    /// reachable from it are discarded
    DeclarationOrder,
}

/// Compilation settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Priority resolution strategy
    pub priority: PriorityMode,
    /// Fail when a named token can never be recognised
    pub reject_redundant: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            priority: PriorityMode::LongestMatch,
            reject_redundant: true,
        }
    }
}

/// A named, compiled regular expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDefinition {
    pub name: CompactString,
    /// Token id, or `None` for an anonymous definition
    pub id: Option<i32>,
    pub fragment: Fragment,
}

impl TokenDefinition {
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.id.is_none()
    }
}

/// Check names and ids, returning the token-name table indexed by id
fn token_table(definitions: &[TokenDefinition]) -> Result<Vec<CompactString>, BuildError> {
    let mut seen: HashSet<&str, RandomState> = HashSet::default();
    let mut names = Vec::new();
    for definition in definitions {
        if !seen.insert(definition.name.as_str()) {
            return Err(BuildError::DuplicateToken {
                name: definition.name.to_string(),
            });
        }
        let Some(id) = definition.id else { continue };
        let expected = i32::try_from(names.len()).unwrap_or(i32::MAX);
        if id != expected || id > MAX_TOKEN_ID {
            return Err(BuildError::InvalidTokenId {
                name: definition.name.to_string(),
                id,
                expected,
            });
        }
        names.push(definition.name.clone());
    }
    if names.is_empty() {
        return Err(BuildError::NoTokens);
    }
    Ok(names)
}

/// Merge every named definition into one NFA rooted at `StateId(0)`
#[must_use]
pub fn combine(definitions: &[TokenDefinition]) -> (StateGraph, StateId) {
    let mut graph = StateGraph::new();
    let start = graph.add_state(false);
    for definition in definitions {
        let Some(id) = definition.id else { continue };
        let (entry, exit) = definition.fragment.splice_into(&mut graph);
        let accept = graph.add_state(true);
        graph.add_edge(exit, CodeSet::single(token_label(id)), accept);
        graph.add_epsilon(start, entry);
    }
    (graph, start)
}

/// Build the tokenizer DFA for `definitions`
///
/// Named definitions must carry ids `0, 1, 2, ...` in declaration order.
pub fn compile(
    definitions: &[TokenDefinition],
    config: &BuildConfig,
) -> Result<CompiledDfa, BuildError> {
    let token_names = token_table(definitions)?;
    let (nfa, start) = combine(definitions);
    log::debug!(
        "combined NFA for {} tokens has {} states",
        token_names.len(),
        nfa.len()
    );

    let graph = DfaBuilder::new(config.priority).build(&nfa, start, &token_names)?;

    if config.reject_redundant
        && let Some(id) = unrecognised_token(&graph, token_names.len())
    {
        return Err(BuildError::RedundantToken {
            name: token_names[id].to_string(),
        });
    }
    CompiledDfa::new(graph, token_names)
}

/// Lowest token id that labels no edge into a final state
fn unrecognised_token(graph: &StateGraph, token_count: usize) -> Option<usize> {
    let mut recognised = vec![false; token_count];
    for (_, state) in graph.states() {
        for edge in state.edges() {
            if !graph.state(edge.dest).is_final() {
                continue;
            }
            for (lower, upper) in edge.label.ranges() {
                for code in (lower..upper).filter(|&code| is_token_label(code)) {
                    if let Some(slot) = usize::try_from(label_token(code))
                        .ok()
                        .and_then(|id| recognised.get_mut(id))
                    {
                        *slot = true;
                    }
                }
            }
        }
    }
    recognised.iter().position(|seen| !seen)
}

/// Fluent construction of a [`CompiledDfa`]
///
/// Tokens are numbered in the order they are added; names starting with `_`
/// are anonymous and may only be referenced from later expressions.
#[derive(Debug, Clone, Default)]
pub struct LexerBuilder {
    entries: Vec<ScriptEntry>,
    config: BuildConfig,
}

impl LexerBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the definitions of a token script
    pub fn from_script(script: &str) -> Result<Self, CompileError> {
        Ok(Self {
            entries: script::script_entries(script)?,
            config: BuildConfig::default(),
        })
    }

    /// Add a definition
    #[must_use]
    pub fn token(mut self, name: impl Into<CompactString>, pattern: impl Into<String>) -> Self {
        self.entries.push(ScriptEntry {
            name: name.into(),
            pattern: pattern.into(),
            line: None,
        });
        self
    }

    #[must_use]
    pub fn config(mut self, config: BuildConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub const fn priority(mut self, priority: PriorityMode) -> Self {
        self.config.priority = priority;
        self
    }

    /// Compile every expression without building the DFA
    pub fn definitions(&self) -> Result<Vec<TokenDefinition>, CompileError> {
        script::compile_entries(&self.entries)
    }

    pub fn build(&self) -> Result<CompiledDfa, CompileError> {
        let definitions = self.definitions()?;
        Ok(compile(&definitions, &self.config)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(name: &str, id: Option<i32>, pattern: &str) -> TokenDefinition {
        TokenDefinition {
            name: name.into(),
            id,
            fragment: compile_regex(pattern).unwrap(),
        }
    }

    #[test]
    fn test_combine_adds_marker_edges() {
        let defs = [
            definition("A", Some(0), "a"),
            definition("_B", None, "b"),
            definition("C", Some(1), "c"),
        ];
        let (graph, start) = combine(&defs);
        assert_eq!(start, StateId(0));
        assert_eq!(graph.state(start).edges().len(), 2);
        let finals = graph.states().filter(|(_, s)| s.is_final()).count();
        assert_eq!(finals, 2);
    }

    #[test]
    fn test_ids_must_follow_declaration_order() {
        let defs = [definition("A", Some(1), "a")];
        assert_eq!(
            compile(&defs, &BuildConfig::default()).unwrap_err(),
            BuildError::InvalidTokenId {
                name: "A".to_string(),
                id: 1,
                expected: 0
            }
        );
    }

    #[test]
    fn test_no_named_tokens() {
        let defs = [definition("_A", None, "a")];
        assert_eq!(
            compile(&defs, &BuildConfig::default()).unwrap_err(),
            BuildError::NoTokens
        );
    }

    #[test]
    fn test_equal_length_duplicate_is_redundant() {
        let err = LexerBuilder::new()
            .token("WORD", "[a-z]+")
            .token("FIRST", "abc")
            .token("SECOND", "abc")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            CompileError::Build(BuildError::RedundantToken {
                name: "FIRST".to_string()
            })
        );
    }

    #[test]
    fn test_redundant_check_can_be_disabled() {
        let config = BuildConfig {
            reject_redundant: false,
            ..BuildConfig::default()
        };
        let dfa = LexerBuilder::new()
            .token("FIRST", "abc")
            .token("SECOND", "abc")
            .config(config)
            .build()
            .unwrap();
        assert_eq!(dfa.token_names().len(), 2);
    }

    #[test]
    fn test_zero_length_token_names_culprit() {
        let err = LexerBuilder::new()
            .token("A", "a")
            .token("MAYBE", "b*")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            CompileError::Build(BuildError::ZeroLengthToken {
                name: "MAYBE".to_string()
            })
        );
    }
}
