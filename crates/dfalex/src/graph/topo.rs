//! Depth-first topological ordering that tolerates cycles.

use super::{StateGraph, StateId};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Order the states reachable from `root` so that, ignoring back edges, every
/// state precedes the states it has edges to
///
/// States marked in progress or done are never revisited, so an edge closing a
/// cycle is simply skipped. The result is the reverse post-order of a depth-first
/// walk that explores edges in their stored order.
#[must_use]
pub fn topological_sort(graph: &StateGraph, root: StateId) -> Vec<StateId> {
    let mut marks = vec![Mark::Unvisited; graph.len()];
    let mut post_order = Vec::new();
    // (state, index of next edge to explore)
    let mut stack: Vec<(StateId, usize)> = vec![(root, 0)];
    marks[root.index()] = Mark::InProgress;

    while let Some(top) = stack.last_mut() {
        let id = top.0;
        if let Some(edge) = graph.state(id).edges().get(top.1) {
            top.1 += 1;
            let dest = edge.dest;
            if marks[dest.index()] == Mark::Unvisited {
                marks[dest.index()] = Mark::InProgress;
                stack.push((dest, 0));
            }
        } else {
            marks[id.index()] = Mark::Done;
            post_order.push(id);
            stack.pop();
        }
    }

    post_order.reverse();
    post_order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code_set::CodeSet;

    #[test]
    fn test_dag_order() {
        let mut graph = StateGraph::new();
        let a = graph.add_state(false);
        let b = graph.add_state(false);
        let c = graph.add_state(false);
        let d = graph.add_state(true);
        graph.add_edge(a, CodeSet::single(1), c);
        graph.add_edge(a, CodeSet::single(2), b);
        graph.add_edge(b, CodeSet::single(3), c);
        graph.add_edge(c, CodeSet::single(4), d);

        let order = topological_sort(&graph, a);
        let position = |id: StateId| order.iter().position(|&x| x == id).unwrap();
        assert_eq!(order.len(), 4);
        assert_eq!(order[0], a);
        assert!(position(b) < position(c));
        assert!(position(c) < position(d));
    }

    #[test]
    fn test_cycles_terminate() {
        let mut graph = StateGraph::new();
        let a = graph.add_state(false);
        let b = graph.add_state(false);
        let c = graph.add_state(true);
        graph.add_edge(a, CodeSet::single(1), b);
        graph.add_edge(b, CodeSet::single(1), b);
        graph.add_edge(b, CodeSet::single(2), a);
        graph.add_edge(b, CodeSet::single(3), c);

        assert_eq!(topological_sort(&graph, a), vec![a, b, c]);
    }
}
