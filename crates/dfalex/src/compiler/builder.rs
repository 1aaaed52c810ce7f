//! NFA to minimal DFA conversion.
//!
//! [`DfaBuilder`] runs the whole pipeline over a combined token NFA:
//!
//! 1. refine every edge label into atomic pieces with a [`RangePartition`]
//! 2. minimize by double reversal: reverse, subset-construct, reverse,
//!    subset-construct, then normalize every state
//! 3. resolve token priorities with the [`PriorityFilter`] and minimize again
//!    if it changed anything
//! 4. reject automata that accept a zero-length token
//!
//! The resulting graph always has its start at id 0 and contiguous ids.

use super::PriorityMode;
use super::filter::{PriorityFilter, zero_length_token};
use super::partition::RangePartition;
use crate::code_set::{CodeSet, EPSILON};
use crate::error::BuildError;
use crate::graph::{Edge, StateGraph, StateId};
use ahash::RandomState;
use compact_str::CompactString;
use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

/// Sorted ids of the NFA states making up one DFA state
type NfaKey = SmallVec<[u32; 8]>;

/// Converts NFAs into minimal DFAs
#[derive(Debug, Clone, Copy, Default)]
pub struct DfaBuilder {
    priority: PriorityMode,
}

impl DfaBuilder {
    #[must_use]
    pub const fn new(priority: PriorityMode) -> Self {
        Self { priority }
    }

    /// Build the minimal DFA of the NFA rooted at `start`
    ///
    /// `token_names` is indexed by token id and only used for error messages.
    /// The returned graph's start state is `StateId(0)`.
    pub fn build(
        &self,
        nfa: &StateGraph,
        start: StateId,
        token_names: &[CompactString],
    ) -> Result<StateGraph, BuildError> {
        let mut dfa = minimize(nfa, start);
        log::debug!("minimized DFA has {} states", dfa.len());

        let report = PriorityFilter::new(self.priority).apply(&mut dfa, StateId(0))?;
        if report.modified() {
            log::debug!(
                "priority filter removed {} edges and trimmed {} labels",
                report.removed_edges,
                report.trimmed_labels
            );
            dfa = minimize(&dfa, StateId(0));
            log::debug!("re-minimized DFA has {} states", dfa.len());
        }

        if let Some(id) = zero_length_token(&dfa, StateId(0)) {
            let name = usize::try_from(id)
                .ok()
                .and_then(|index| token_names.get(index))
                .map_or_else(|| format!("#{id}"), ToString::to_string);
            return Err(BuildError::ZeroLengthToken { name });
        }
        Ok(dfa)
    }
}

/// Minimal DFA of the automaton rooted at `start`, with no priority resolution
///
/// Final flags are kept as they are: a DFA state is final if any of its NFA
/// states is.
#[must_use]
pub fn minimize(graph: &StateGraph, start: StateId) -> StateGraph {
    let (mut work, root) = graph.duplicate(start);
    partition_edges(&mut work, root);

    let (reversed, root) = work.reverse(root);
    let (dfa, root) = subset_construction(&reversed, root);
    let (reversed, root) = dfa.reverse(root);
    let (mut dfa, root) = subset_construction(&reversed, root);
    dfa.normalize_reachable(root);
    dfa
}

/// Replace every edge with one edge per atomic piece of its label
pub fn partition_edges(graph: &mut StateGraph, root: StateId) {
    let reachable = graph.reachable(root);
    let partition = RangePartition::new(
        reachable
            .iter()
            .flat_map(|&id| graph.state(id).edges())
            .map(|edge| &edge.label),
    );
    log::trace!("edge partition has {} pieces", partition.leaf_count());

    for id in reachable {
        let edges = graph.clear_edges(id);
        let mut split = Vec::with_capacity(edges.len());
        for edge in edges {
            for piece in partition.apply(&edge.label) {
                split.push(Edge::new(piece, edge.dest));
            }
        }
        graph.set_edges(id, split);
    }
}

/// Subset construction over an NFA whose labels are atomic pieces
///
/// DFA ids are assigned in creation order, so the start is `StateId(0)` and every
/// state is reachable.
#[must_use]
pub fn subset_construction(nfa: &StateGraph, start: StateId) -> (StateGraph, StateId) {
    let mut subsets = Subsets::new(nfa);
    let (dfa_start, _) = subsets.state_for(epsilon_closure(nfa, [start.0]));
    let mut unmarked = vec![dfa_start];

    while let Some(current) = unmarked.pop() {
        // Grouped by identical label, in first-seen order.
        let mut moves: Vec<(&CodeSet, Vec<u32>)> = Vec::new();
        let mut slots: HashMap<&CodeSet, usize, RandomState> = HashMap::default();
        for &nfa_id in &subsets.keys[current.index()] {
            for edge in nfa.state(StateId(nfa_id)).edges() {
                if edge.label.first() == Some(EPSILON) {
                    continue;
                }
                let slot = *slots.entry(&edge.label).or_insert_with(|| {
                    moves.push((&edge.label, Vec::new()));
                    moves.len() - 1
                });
                moves[slot].1.push(edge.dest.0);
            }
        }

        for (label, dests) in moves {
            let (dest, is_new) = subsets.state_for(epsilon_closure(nfa, dests));
            if is_new {
                unmarked.push(dest);
            }
            subsets.dfa.add_edge(current, label.clone(), dest);
        }
    }

    (subsets.dfa, dfa_start)
}

struct Subsets<'a> {
    nfa: &'a StateGraph,
    dfa: StateGraph,
    keys: Vec<NfaKey>,
    index: HashMap<NfaKey, StateId, RandomState>,
}

impl<'a> Subsets<'a> {
    fn new(nfa: &'a StateGraph) -> Self {
        Self {
            nfa,
            dfa: StateGraph::new(),
            keys: Vec::new(),
            index: HashMap::default(),
        }
    }

    /// DFA state for a sorted NFA id list, creating it if needed
    fn state_for(&mut self, key: NfaKey) -> (StateId, bool) {
        if let Some(&id) = self.index.get(&key) {
            return (id, false);
        }
        let is_final = key
            .iter()
            .any(|&nfa_id| self.nfa.state(StateId(nfa_id)).is_final());
        let id = self.dfa.add_state(is_final);
        self.keys.push(key.clone());
        self.index.insert(key, id);
        (id, true)
    }
}

/// Sorted ids of every state reachable from `seeds` through epsilon edges
fn epsilon_closure(nfa: &StateGraph, seeds: impl IntoIterator<Item = u32>) -> NfaKey {
    let mut seen: HashSet<u32, RandomState> = HashSet::default();
    let mut stack: Vec<u32> = Vec::new();
    for seed in seeds {
        if seen.insert(seed) {
            stack.push(seed);
        }
    }
    while let Some(id) = stack.pop() {
        for edge in nfa.state(StateId(id)).edges() {
            if edge.label.contains(EPSILON) && seen.insert(edge.dest.0) {
                stack.push(edge.dest.0);
            }
        }
    }
    let mut key: NfaKey = seen.into_iter().collect();
    key.sort_unstable();
    key
}
