//! Token priority resolution on a minimized DFA.
//!
//! After token NFAs are merged, an edge into the final state may carry the
//! markers of several tokens that match exactly the same text. Only the highest
//! id can ever be reported, so the label is trimmed to that single marker.
//!
//! In [`PriorityMode::DeclarationOrder`] the filter also computes, for every
//! state, the smallest over all paths from the start of the largest token id
//! recognised along the path ("distance"). An edge into a state whose own token
//! id is below the source's distance is removed: a higher-id token has already
//! been recognised on every way here, and it takes precedence over longer
//! matches of lower-id tokens.

use super::PriorityMode;
use crate::code_set::{CODE_MAX, CodeSet, EPSILON, is_token_label, label_token};
use crate::error::BuildError;
use crate::graph::{StateGraph, StateId, topological_sort};

const INF_DISTANCE: i32 = CODE_MAX;

/// What a filter pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterReport {
    pub removed_edges: usize,
    pub trimmed_labels: usize,
}

impl FilterReport {
    #[must_use]
    pub const fn modified(&self) -> bool {
        self.removed_edges > 0 || self.trimmed_labels > 0
    }
}

/// Removes transitions that cannot affect the recognized tokens
#[derive(Debug, Clone, Copy)]
pub struct PriorityFilter {
    mode: PriorityMode,
}

impl PriorityFilter {
    #[must_use]
    pub const fn new(mode: PriorityMode) -> Self {
        Self { mode }
    }

    /// Filter the DFA rooted at `start` in place
    pub fn apply(&self, graph: &mut StateGraph, start: StateId) -> Result<FilterReport, BuildError> {
        let mut report = FilterReport::default();
        if self.mode == PriorityMode::Off {
            return Ok(report);
        }

        let order = topological_sort(graph, start);
        let values = token_values(graph, &order)?;

        if self.mode == PriorityMode::DeclarationOrder {
            let distances = relax_distances(graph, &order, &values, start);
            report.removed_edges = remove_shadowed_edges(graph, &order, &values, &distances);
        }
        report.trimmed_labels = trim_token_bands(graph, &order);
        Ok(report)
    }
}

/// Highest token id on each state's final-bound edge, or -1
fn token_values(graph: &StateGraph, order: &[StateId]) -> Result<Vec<i32>, BuildError> {
    let mut values = vec![-1; graph.len()];
    for &id in order {
        for edge in graph.state(id).edges() {
            if !graph.state(edge.dest).is_final() {
                continue;
            }
            match edge.label.first() {
                Some(code) if is_token_label(code) => values[id.index()] = label_token(code),
                _ => {
                    return Err(BuildError::malformed(format!(
                        "edge {id} -> {} reaches a final state without a token marker",
                        edge.dest
                    )));
                }
            }
        }
    }
    Ok(values)
}

/// Repeat relaxation in topological order until no distance changes
fn relax_distances(
    graph: &StateGraph,
    order: &[StateId],
    values: &[i32],
    start: StateId,
) -> Vec<i32> {
    let mut distances = vec![INF_DISTANCE; graph.len()];
    distances[start.index()] = values[start.index()];
    let mut passes = 0;
    loop {
        passes += 1;
        let mut changed = false;
        for &u in order {
            let distance_u = distances[u.index()];
            for edge in graph.state(u).edges() {
                let v = edge.dest;
                if graph.state(v).is_final() {
                    continue;
                }
                let relaxed = distance_u.max(values[v.index()]);
                if relaxed < distances[v.index()] {
                    log::trace!("distance of {v} relaxed to {relaxed} via {u}");
                    distances[v.index()] = relaxed;
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
    log::trace!("distances settled after {passes} passes");
    distances
}

fn remove_shadowed_edges(
    graph: &mut StateGraph,
    order: &[StateId],
    values: &[i32],
    distances: &[i32],
) -> usize {
    let mut removed = 0;
    for &u in order {
        let distance_u = distances[u.index()];
        let finals: Vec<bool> = graph
            .state(u)
            .edges()
            .iter()
            .map(|edge| graph.state(edge.dest).is_final())
            .collect();
        let edges = graph.edges_mut(u);
        let before = edges.len();
        let mut index = 0;
        edges.retain(|edge| {
            let is_final = finals[index];
            index += 1;
            let value_v = values[edge.dest.index()];
            let shadowed = !is_final && value_v >= 0 && value_v < distance_u;
            if shadowed {
                log::trace!(
                    "removing edge {u} -> {}: token {value_v} below distance {distance_u}",
                    edge.dest
                );
            }
            !shadowed
        });
        removed += before - edges.len();
    }
    removed
}

/// Reduce every final-bound label to its highest token id
fn trim_token_bands(graph: &mut StateGraph, order: &[StateId]) -> usize {
    let mut trimmed = 0;
    for &u in order {
        let finals: Vec<bool> = graph
            .state(u)
            .edges()
            .iter()
            .map(|edge| graph.state(edge.dest).is_final())
            .collect();
        for (edge, is_final) in graph.edges_mut(u).iter_mut().zip(finals) {
            let Some(prime) = edge.label.first().filter(|_| is_final) else {
                continue;
            };
            if edge.label.single_value() == Some(prime) {
                continue;
            }
            log::trace!("trimming token label {} on {u}", edge.label);
            edge.label = CodeSet::single(prime);
            trimmed += 1;
        }
    }
    trimmed
}

/// Token id recognised by an edge from `start` straight into a final state
///
/// Such a token matches the empty string. Returns the highest id on that edge.
#[must_use]
pub fn zero_length_token(graph: &StateGraph, start: StateId) -> Option<i32> {
    graph
        .state(start)
        .edges()
        .iter()
        .find(|edge| graph.state(edge.dest).is_final())
        .map(|edge| match edge.label.first() {
            Some(code) if code < EPSILON => label_token(code),
            _ => -1,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code_set::token_label;

    fn ch(c: char) -> CodeSet {
        CodeSet::single(c as i32)
    }

    fn markers(ids: &[i32]) -> CodeSet {
        let mut set = CodeSet::new();
        for &id in ids {
            set.add_value(token_label(id));
        }
        set
    }

    /// DFA for `ALPHA: abc+` (0) and `BETA: ab` (1): 0 -a-> 1 -b-> 2 -c-> 3 (loop c)
    fn shadow_dfa() -> (StateGraph, StateId) {
        let mut graph = StateGraph::new();
        let s: Vec<StateId> = (0..4).map(|_| graph.add_state(false)).collect();
        let fin = graph.add_state(true);
        graph.add_edge(s[0], ch('a'), s[1]);
        graph.add_edge(s[1], ch('b'), s[2]);
        graph.add_edge(s[2], ch('c'), s[3]);
        graph.add_edge(s[3], ch('c'), s[3]);
        graph.add_edge(s[2], markers(&[1]), fin);
        graph.add_edge(s[3], markers(&[0]), fin);
        (graph, s[0])
    }

    #[test]
    fn test_longest_match_keeps_transitions() {
        let (mut graph, start) = shadow_dfa();
        let report = PriorityFilter::new(PriorityMode::LongestMatch)
            .apply(&mut graph, start)
            .unwrap();
        assert!(!report.modified());
        assert_eq!(graph.state(StateId(2)).edges().len(), 2);
    }

    #[test]
    fn test_declaration_order_removes_shadowed_edge() {
        let (mut graph, start) = shadow_dfa();
        let report = PriorityFilter::new(PriorityMode::DeclarationOrder)
            .apply(&mut graph, start)
            .unwrap();
        // s2 -> s3 and the loop on s3
        assert_eq!(report.removed_edges, 2);
        let edges = graph.state(StateId(2)).edges();
        assert_eq!(edges.len(), 1);
        assert!(graph.state(edges[0].dest).is_final());
    }

    #[test]
    fn test_trims_to_highest_token() {
        let mut graph = StateGraph::new();
        let start = graph.add_state(false);
        let mid = graph.add_state(false);
        let fin = graph.add_state(true);
        graph.add_edge(start, ch('x'), mid);
        graph.add_edge(mid, markers(&[0, 1, 2]), fin);

        let report = PriorityFilter::new(PriorityMode::LongestMatch)
            .apply(&mut graph, start)
            .unwrap();
        assert_eq!(report.trimmed_labels, 1);
        assert_eq!(graph.state(mid).edges()[0].label, markers(&[2]));
    }

    #[test]
    fn test_final_edge_without_marker_is_malformed() {
        let mut graph = StateGraph::new();
        let start = graph.add_state(false);
        let fin = graph.add_state(true);
        graph.add_edge(start, ch('x'), fin);
        let err = PriorityFilter::new(PriorityMode::LongestMatch)
            .apply(&mut graph, start)
            .unwrap_err();
        assert!(matches!(err, BuildError::MalformedAutomaton { .. }));
    }

    #[test]
    fn test_zero_length_token() {
        let mut graph = StateGraph::new();
        let start = graph.add_state(false);
        let fin = graph.add_state(true);
        graph.add_edge(start, markers(&[3, 4]), fin);
        assert_eq!(zero_length_token(&graph, start), Some(4));
        let (graph, start) = shadow_dfa();
        assert_eq!(zero_length_token(&graph, start), None);
    }
}
