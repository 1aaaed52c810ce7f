//! # State Graphs
//!
//! Automata are stored as an arena of [`State`]s addressed by [`StateId`]. Edges
//! are `(CodeSet, StateId)` pairs, so cycles introduced by quantifiers are plain
//! indices and copying a subgraph is an array copy with relabelled ids.
//!
//! The same structure holds NFAs (overlapping labels, epsilon edges) and DFAs
//! (disjoint labels, no epsilon). Token ends are edges labelled with a token
//! marker code leading to a final state.

mod topo;

pub use topo::topological_sort;

use crate::code_set::CodeSet;
use std::fmt::{self, Write};

/// State ID within one [`StateGraph`]
///
/// Uses u32 which is sufficient for all practical automaton sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub u32);

impl StateId {
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        // Graphs never approach u32::MAX states.
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// A labelled transition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub label: CodeSet,
    pub dest: StateId,
}

impl Edge {
    #[must_use]
    pub const fn new(label: CodeSet, dest: StateId) -> Self {
        Self { label, dest }
    }
}

/// A node with its final flag and ordered outgoing edges
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    final_state: bool,
    edges: Vec<Edge>,
}

impl State {
    #[must_use]
    pub const fn is_final(&self) -> bool {
        self.final_state
    }

    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }
}

/// Arena of states
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateGraph {
    states: Vec<State>,
}

impl StateGraph {
    #[must_use]
    pub const fn new() -> Self {
        Self { states: Vec::new() }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            states: Vec::with_capacity(capacity),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Append a state with no edges
    pub fn add_state(&mut self, final_state: bool) -> StateId {
        let id = StateId::from_index(self.states.len());
        self.states.push(State {
            final_state,
            edges: Vec::new(),
        });
        id
    }

    /// Get a state by id
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this graph.
    #[must_use]
    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }

    #[must_use]
    pub fn get(&self, id: StateId) -> Option<&State> {
        self.states.get(id.index())
    }

    /// Iterate over `(id, state)` pairs in id order
    pub fn states(&self) -> impl Iterator<Item = (StateId, &State)> {
        self.states
            .iter()
            .enumerate()
            .map(|(index, state)| (StateId::from_index(index), state))
    }

    pub fn set_final(&mut self, id: StateId, final_state: bool) {
        self.states[id.index()].final_state = final_state;
    }

    pub fn add_edge(&mut self, from: StateId, label: CodeSet, dest: StateId) {
        self.states[from.index()].edges.push(Edge::new(label, dest));
    }

    pub fn add_epsilon(&mut self, from: StateId, dest: StateId) {
        self.add_edge(from, CodeSet::epsilon(), dest);
    }

    /// Remove every outgoing edge of `id`, returning them
    pub fn clear_edges(&mut self, id: StateId) -> Vec<Edge> {
        std::mem::take(&mut self.states[id.index()].edges)
    }

    /// Replace the outgoing edges of `id`
    pub fn set_edges(&mut self, id: StateId, edges: Vec<Edge>) {
        self.states[id.index()].edges = edges;
    }

    pub(crate) fn edges_mut(&mut self, id: StateId) -> &mut Vec<Edge> {
        &mut self.states[id.index()].edges
    }

    /// Canonicalize one state's edges
    ///
    /// Edges are sorted by destination, edges sharing a destination are merged
    /// by label union, and empty labels are dropped.
    pub fn normalize(&mut self, id: StateId) {
        let mut edges = self.clear_edges(id);
        edges.sort_by_key(|edge| edge.dest);
        let mut merged: Vec<Edge> = Vec::with_capacity(edges.len());
        for edge in edges {
            if edge.label.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(last) if last.dest == edge.dest => last.label.add_set(&edge.label),
                _ => merged.push(edge),
            }
        }
        self.set_edges(id, merged);
    }

    /// Normalize every state reachable from `root`
    pub fn normalize_reachable(&mut self, root: StateId) {
        for id in self.reachable(root) {
            self.normalize(id);
        }
    }

    /// States reachable from `root`, in depth-first discovery order
    #[must_use]
    pub fn reachable(&self, root: StateId) -> Vec<StateId> {
        self.reachable_from(&[root])
    }

    /// States reachable from any of `roots`, in depth-first discovery order
    #[must_use]
    pub fn reachable_from(&self, roots: &[StateId]) -> Vec<StateId> {
        let mut seen = vec![false; self.states.len()];
        let mut order = Vec::new();
        let mut stack: Vec<StateId> = roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut seen[id.index()], true) {
                continue;
            }
            order.push(id);
            // Reverse so the first edge is explored first.
            stack.extend(
                self.state(id)
                    .edges
                    .iter()
                    .rev()
                    .map(|edge| edge.dest)
                    .filter(|dest| !seen[dest.index()]),
            );
        }
        order
    }

    /// Copy the subgraph reachable from `roots` into `target`
    ///
    /// The copies receive a fresh contiguous id range starting at `target.len()`,
    /// in discovery order; final flags and edge order are preserved. Returns the
    /// new ids of `roots`.
    pub fn duplicate_into<const N: usize>(
        &self,
        roots: [StateId; N],
        target: &mut StateGraph,
    ) -> [StateId; N] {
        let order = self.reachable_from(&roots);
        let base = target.len();
        let mut map = vec![StateId(u32::MAX); self.states.len()];
        for (offset, id) in order.iter().enumerate() {
            map[id.index()] = StateId::from_index(base + offset);
        }
        target.states.reserve(order.len());
        for id in &order {
            let source = self.state(*id);
            target.states.push(State {
                final_state: source.final_state,
                edges: source
                    .edges
                    .iter()
                    .map(|edge| Edge::new(edge.label.clone(), map[edge.dest.index()]))
                    .collect(),
            });
        }
        roots.map(|root| map[root.index()])
    }

    /// Copy the subgraph reachable from `root` into a fresh graph whose ids start at 0
    #[must_use]
    pub fn duplicate(&self, root: StateId) -> (StateGraph, StateId) {
        let mut graph = StateGraph::new();
        let [start] = self.duplicate_into([root], &mut graph);
        (graph, start)
    }

    /// Build the reversed automaton of the subgraph reachable from `root`
    ///
    /// Every edge is inverted and `root` becomes the only final state. A synthetic
    /// start state (id `self.len()`) has epsilon edges to every formerly final state.
    #[must_use]
    pub fn reverse(&self, root: StateId) -> (StateGraph, StateId) {
        let reachable = self.reachable(root);
        let mut reversed = StateGraph::with_capacity(self.states.len() + 1);
        for _ in 0..self.states.len() {
            reversed.add_state(false);
        }
        let start = reversed.add_state(false);
        reversed.set_final(root, true);
        for &id in &reachable {
            let state = self.state(id);
            if state.final_state {
                reversed.add_epsilon(start, id);
            }
            for edge in &state.edges {
                reversed.add_edge(edge.dest, edge.label.clone(), id);
            }
        }
        (reversed, start)
    }

    /// Human-readable listing of the states reachable from `root`, sorted by id
    #[must_use]
    pub fn describe(&self, root: StateId) -> String {
        let mut ids = self.reachable(root);
        ids.sort_unstable();
        let mut out = String::new();
        for id in ids {
            let state = self.state(id);
            let _ = write!(out, "{id}{}:", if state.final_state { "*" } else { "" });
            for edge in &state.edges {
                let _ = write!(out, " {}({})", edge.dest, edge.label);
            }
            out.push('\n');
        }
        out
    }
}

/// A sub-automaton with one entry and one exit
///
/// Produced by the regex compiler; `end` is never marked final.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub graph: StateGraph,
    pub start: StateId,
    pub end: StateId,
}

impl Fragment {
    /// Copy this fragment into `target`, returning the new `(start, end)`
    pub fn splice_into(&self, target: &mut StateGraph) -> (StateId, StateId) {
        let [start, end] = self.graph.duplicate_into([self.start, self.end], target);
        (start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code_set::token_label;

    fn chain(graph: &mut StateGraph, text: &str) -> (StateId, StateId) {
        let start = graph.add_state(false);
        let mut current = start;
        for c in text.chars() {
            let next = graph.add_state(false);
            graph.add_edge(current, CodeSet::single(c as i32), next);
            current = next;
        }
        (start, current)
    }

    #[test]
    fn test_normalize_merges_by_destination() {
        let mut graph = StateGraph::new();
        let a = graph.add_state(false);
        let b = graph.add_state(false);
        let c = graph.add_state(false);
        graph.add_edge(a, CodeSet::single(5), c);
        graph.add_edge(a, CodeSet::single(1), b);
        graph.add_edge(a, CodeSet::new(), b);
        graph.add_edge(a, CodeSet::single(6), c);
        graph.normalize(a);

        let edges = graph.state(a).edges();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].dest, b);
        assert_eq!(edges[1].dest, c);
        assert_eq!(edges[1].label.elements(), &[5, 7]);
    }

    #[test]
    fn test_reachable_ignores_disconnected() {
        let mut graph = StateGraph::new();
        let (start, end) = chain(&mut graph, "ab");
        let island = graph.add_state(true);
        graph.add_edge(end, CodeSet::single(0), start);
        let reachable = graph.reachable(start);
        assert_eq!(reachable.len(), 3);
        assert!(!reachable.contains(&island));
    }

    #[test]
    fn test_duplicate_relabels_contiguously() {
        let mut graph = StateGraph::new();
        graph.add_state(false);
        let (start, end) = chain(&mut graph, "xyz");
        graph.add_edge(end, CodeSet::single('q' as i32), start);
        graph.set_final(end, true);

        let mut target = StateGraph::new();
        target.add_state(false);
        target.add_state(false);
        let [new_start, new_end] = graph.duplicate_into([start, end], &mut target);
        assert_eq!(target.len(), 6);
        assert_eq!(new_start, StateId(2));
        assert!(target.state(new_end).is_final());
        assert_eq!(target.state(new_end).edges()[0].dest, new_start);
        let x = target.state(new_start).edges();
        assert_eq!(x.len(), 1);
        assert_eq!(x[0].dest, StateId(3));
        assert_eq!(x[0].label.single_value(), Some('x' as i32));
        assert_eq!(target.reachable(new_start).len(), 4);
    }

    #[test]
    fn test_reverse() {
        let mut graph = StateGraph::new();
        let (start, end) = chain(&mut graph, "ab");
        let fin = graph.add_state(true);
        graph.add_edge(end, CodeSet::single(token_label(0)), fin);

        let (reversed, rstart) = graph.reverse(start);
        assert_eq!(rstart, StateId(4));
        assert!(reversed.state(start).is_final());
        assert!(!reversed.state(fin).is_final());
        assert_eq!(reversed.state(rstart).edges(), &[Edge::new(CodeSet::epsilon(), fin)]);
        assert_eq!(reversed.state(fin).edges()[0].dest, end);
        assert!(reversed.state(start).edges().is_empty());
    }
}
