//! The compiled tokenizer automaton.

use crate::code_set::{CodeSet, EPSILON, UNKNOWN_TOKEN, is_token_label, label_token};
use crate::error::BuildError;
#[cfg(feature = "serialize")]
use crate::error::DfaDecodeError;
use crate::graph::{State, StateGraph, StateId};
use ahash::RandomState;
use compact_str::CompactString;
use hashbrown::HashMap;

/// Name reported for [`UNKNOWN_TOKEN`]
pub const UNKNOWN_NAME: &str = "<UNKNOWN>";

/// Serialization format version; readers accept any version with the same major number
#[cfg(feature = "serialize")]
pub const FORMAT_VERSION: f64 = 2.0;

/// Character transition `[lower, upper) -> target`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Transition {
    lower: i32,
    upper: i32,
    target: StateId,
}

/// A minimal DFA plus the token-name table indexed by token id
///
/// The start state is always `StateId(0)` and state ids are contiguous. The
/// automaton is immutable and can be shared by any number of tokenizers.
#[derive(Debug, Clone)]
pub struct CompiledDfa {
    graph: StateGraph,
    token_names: Vec<CompactString>,
    token_ids: HashMap<CompactString, i32, RandomState>,
    /// Per state, character transitions sorted by `lower` for binary search
    transitions: Vec<Vec<Transition>>,
    /// Per state, the token recognised on reaching it, or `UNKNOWN_TOKEN`
    accepting: Vec<i32>,
}

impl PartialEq for CompiledDfa {
    fn eq(&self, other: &Self) -> bool {
        self.graph == other.graph && self.token_names == other.token_names
    }
}

impl Eq for CompiledDfa {}

impl CompiledDfa {
    /// Wrap a DFA whose start state is `StateId(0)`
    ///
    /// Fails if the graph is empty, the start state is final, an edge reaches a
    /// missing state, or an edge into a final state carries anything but token
    /// markers for ids in `token_names`.
    pub fn new(graph: StateGraph, token_names: Vec<CompactString>) -> Result<Self, BuildError> {
        if graph.is_empty() {
            return Err(BuildError::malformed("automaton has no states"));
        }
        if graph.state(StateId(0)).is_final() {
            return Err(BuildError::malformed("start state is final"));
        }

        let mut transitions = Vec::with_capacity(graph.len());
        let mut accepting = Vec::with_capacity(graph.len());
        for (id, state) in graph.states() {
            let (moves, token) = scan_entry(&graph, id, state, token_names.len())
                .map_err(BuildError::malformed)?;
            transitions.push(moves);
            accepting.push(token);
        }

        let token_ids = token_names
            .iter()
            .enumerate()
            .map(|(id, name)| (name.clone(), i32::try_from(id).unwrap_or(i32::MAX)))
            .collect();
        Ok(Self {
            graph,
            token_names,
            token_ids,
            transitions,
            accepting,
        })
    }

    /// Compile a token definition script with the default settings
    pub fn from_script(script: &str) -> Result<Self, crate::error::CompileError> {
        crate::compiler::LexerBuilder::from_script(script)?.build()
    }

    #[must_use]
    pub const fn start(&self) -> StateId {
        StateId(0)
    }

    #[must_use]
    pub fn state_count(&self) -> usize {
        self.graph.len()
    }

    #[must_use]
    pub fn state(&self, id: StateId) -> Option<&State> {
        self.graph.get(id)
    }

    #[must_use]
    pub const fn graph(&self) -> &StateGraph {
        &self.graph
    }

    #[must_use]
    pub fn token_names(&self) -> &[CompactString] {
        &self.token_names
    }

    /// Name of a token id; [`UNKNOWN_TOKEN`] is named `<UNKNOWN>`
    #[must_use]
    pub fn token_name(&self, id: i32) -> Option<&str> {
        if id == UNKNOWN_TOKEN {
            return Some(UNKNOWN_NAME);
        }
        usize::try_from(id)
            .ok()
            .and_then(|index| self.token_names.get(index))
            .map(CompactString::as_str)
    }

    #[must_use]
    pub fn token_id(&self, name: &str) -> Option<i32> {
        self.token_ids.get(name).copied()
    }

    /// State reached from `state` on character `c`
    #[inline]
    #[must_use]
    pub fn step(&self, state: StateId, c: char) -> Option<StateId> {
        let code = c as i32;
        let moves = self.transitions.get(state.index())?;
        let index = moves.partition_point(|t| t.lower <= code).checked_sub(1)?;
        let transition = moves[index];
        (code < transition.upper).then_some(transition.target)
    }

    /// Token recognised by the input consumed to reach `state`
    #[inline]
    #[must_use]
    pub fn accepting(&self, state: StateId) -> Option<i32> {
        self.accepting
            .get(state.index())
            .copied()
            .filter(|&id| id != UNKNOWN_TOKEN)
    }

    /// Human-readable state listing
    #[must_use]
    pub fn describe(&self) -> String {
        self.graph.describe(self.start())
    }
}

/// Split one state's edges into character transitions and its recognised token
fn scan_entry(
    graph: &StateGraph,
    id: StateId,
    state: &State,
    token_count: usize,
) -> Result<(Vec<Transition>, i32), String> {
    let mut moves = Vec::new();
    let mut token = UNKNOWN_TOKEN;
    for edge in state.edges() {
        let target = graph
            .get(edge.dest)
            .ok_or_else(|| format!("edge from {id} targets missing state {}", edge.dest))?;
        if target.is_final() {
            let Some(code) = edge.label.first().filter(|&code| is_token_label(code)) else {
                return Err(format!("edge {id} -> {} has no token marker", edge.dest));
            };
            if edge.label.elements().iter().any(|&b| b > EPSILON) {
                return Err(format!("edge {id} -> {} mixes markers and input", edge.dest));
            }
            let marked = label_token(code);
            if usize::try_from(marked).map_or(true, |index| index >= token_count) {
                return Err(format!("edge {id} -> {} names unknown token {marked}", edge.dest));
            }
            token = token.max(marked);
            continue;
        }
        for (lower, upper) in edge.label.ranges() {
            if lower < 0 {
                return Err(format!("edge {id} -> {} consumes no input", edge.dest));
            }
            moves.push(Transition {
                lower,
                upper,
                target: edge.dest,
            });
        }
    }
    moves.sort_unstable_by_key(|t| t.lower);
    if moves.windows(2).any(|pair| pair[0].upper > pair[1].lower) {
        return Err(format!("state {id} is not deterministic"));
    }
    Ok((moves, token))
}

#[cfg(feature = "serialize")]
mod json {
    use super::*;
    use serde::{Deserialize, Serialize};

    type WireEdge = (Vec<i32>, usize);

    #[derive(Serialize, Deserialize)]
    struct WireDfa {
        version: f64,
        tokens: Vec<CompactString>,
        states: Vec<(bool, Vec<WireEdge>)>,
    }

    impl CompiledDfa {
        /// Serialize as `{"version": 2.0, "tokens": [...], "states": [[final, [[label, dest], ...]], ...]}`
        pub fn to_json(&self) -> Result<String, DfaDecodeError> {
            let states = self
                .graph
                .states()
                .map(|(_, state)| {
                    let edges = state
                        .edges()
                        .iter()
                        .map(|edge| (edge.label.elements().to_vec(), edge.dest.index()))
                        .collect();
                    (state.is_final(), edges)
                })
                .collect();
            let wire = WireDfa {
                version: FORMAT_VERSION,
                tokens: self.token_names.clone(),
                states,
            };
            Ok(serde_json::to_string(&wire)?)
        }

        /// Load a DFA written by [`to_json`](Self::to_json)
        pub fn from_json(json: &str) -> Result<Self, DfaDecodeError> {
            let wire: WireDfa = serde_json::from_str(json)?;
            if wire.version.floor() != FORMAT_VERSION.floor() {
                return Err(DfaDecodeError::UnsupportedVersion {
                    version: wire.version,
                });
            }
            if wire.states.is_empty() {
                return Err(DfaDecodeError::NoStates);
            }

            let mut graph = StateGraph::with_capacity(wire.states.len());
            for (is_final, _) in &wire.states {
                graph.add_state(*is_final);
            }
            let count = wire.states.len();
            for (index, (_, edges)) in wire.states.into_iter().enumerate() {
                for (elements, dest) in edges {
                    if dest >= count {
                        return Err(DfaDecodeError::DestinationOutOfRange { state: index, dest });
                    }
                    let label = CodeSet::from_elements(elements)
                        .filter(|label| !label.is_empty())
                        .ok_or(DfaDecodeError::MalformedLabel { state: index })?;
                    graph.add_edge(StateId::from_index(index), label, StateId::from_index(dest));
                }
            }

            for (id, state) in graph.states() {
                for edge in state.edges() {
                    let Some(code) = edge.label.first() else { continue };
                    if graph.state(edge.dest).is_final()
                        && (!is_token_label(code)
                            || usize::try_from(label_token(code))
                                .map_or(true, |token| token >= wire.tokens.len()))
                    {
                        return Err(DfaDecodeError::UnknownToken {
                            state: id.index(),
                            id: label_token(code),
                        });
                    }
                }
            }

            Ok(Self::new(graph, wire.tokens)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::LexerBuilder;

    fn sample() -> CompiledDfa {
        LexerBuilder::new()
            .token("WS", "\\s+")
            .token("ID", "[a-z]+")
            .token("NUM", "\\d+")
            .build()
            .unwrap()
    }

    #[test]
    fn test_token_names() {
        let dfa = sample();
        assert_eq!(dfa.token_id("NUM"), Some(2));
        assert_eq!(dfa.token_id("nope"), None);
        assert_eq!(dfa.token_name(1), Some("ID"));
        assert_eq!(dfa.token_name(UNKNOWN_TOKEN), Some(UNKNOWN_NAME));
        assert_eq!(dfa.token_name(3), None);
    }

    #[test]
    fn test_step_and_accepting() {
        let dfa = sample();
        let start = dfa.start();
        assert_eq!(dfa.accepting(start), None);
        let s = dfa.step(start, 'q').unwrap();
        assert_eq!(dfa.accepting(s), Some(1));
        assert_eq!(dfa.step(s, 'r').map(|t| dfa.accepting(t)), Some(Some(1)));
        assert_eq!(dfa.step(s, '1'), None);
        assert_eq!(dfa.step(start, '#'), None);
    }

    #[test]
    fn test_rejects_final_start() {
        let mut graph = StateGraph::new();
        graph.add_state(true);
        assert!(matches!(
            CompiledDfa::new(graph, vec!["A".into()]),
            Err(BuildError::MalformedAutomaton { .. })
        ));
    }

    #[cfg(feature = "serialize")]
    #[test]
    fn test_json_round_trip() {
        let dfa = sample();
        let json = dfa.to_json().unwrap();
        assert!(json.starts_with("{\"version\":2.0,\"tokens\":[\"WS\",\"ID\",\"NUM\"]"));
        assert_eq!(CompiledDfa::from_json(&json).unwrap(), dfa);
    }

    #[cfg(feature = "serialize")]
    #[test]
    fn test_json_validation() {
        let bad_version = r#"{"version":1.0,"tokens":["A"],"states":[[false,[]]]}"#;
        assert!(matches!(
            CompiledDfa::from_json(bad_version),
            Err(DfaDecodeError::UnsupportedVersion { .. })
        ));
        let bad_dest = r#"{"version":2.0,"tokens":["A"],"states":[[false,[[[97,98],5]]]]}"#;
        assert!(matches!(
            CompiledDfa::from_json(bad_dest),
            Err(DfaDecodeError::DestinationOutOfRange { state: 0, dest: 5 })
        ));
        let bad_label = r#"{"version":2.0,"tokens":["A"],"states":[[false,[[[98,97],0]]]]}"#;
        assert!(matches!(
            CompiledDfa::from_json(bad_label),
            Err(DfaDecodeError::MalformedLabel { state: 0 })
        ));
        let bad_token = r#"{"version":2.0,"tokens":["A"],"states":[[false,[[[97,98],1]]],[false,[[[-4,-3],2]]],[true,[]]]}"#;
        assert!(matches!(
            CompiledDfa::from_json(bad_token),
            Err(DfaDecodeError::UnknownToken { state: 1, id: 2 })
        ));
        assert!(matches!(
            CompiledDfa::from_json("{"),
            Err(DfaDecodeError::Json(_))
        ));
    }
}
