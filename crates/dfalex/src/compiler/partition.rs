//! Alphabet partitioning for subset construction.
//!
//! Subset construction must group NFA transitions by the input they consume, but
//! iterating over individual code points is out of the question with a domain
//! of a million characters. [`RangePartition`] refines every edge label of an
//! automaton into a set of disjoint atomic pieces so each piece can be treated as
//! a single symbol.

use crate::code_set::CodeSet;
use ahash::RandomState;
use hashbrown::HashSet;

#[derive(Debug, Clone)]
struct Node {
    set: CodeSet,
    /// `[set - added, added]` once the node has been split
    children: Option<[usize; 2]>,
}

/// Binary refinement tree over the whole code domain
///
/// Each internal node's children partition its set into two nonempty parts; the
/// leaves are the atomic pieces. [`EPSILON`](crate::code_set::EPSILON) always forms its own leaf.
#[derive(Debug, Clone)]
pub struct RangePartition {
    nodes: Vec<Node>,
}

impl RangePartition {
    /// Build a partition refined by every set in `sets`
    ///
    /// Duplicates are ignored and sets are inserted largest first, which keeps the
    /// tree shallow.
    pub fn new<'a>(sets: impl IntoIterator<Item = &'a CodeSet>) -> Self {
        let mut partition = Self {
            nodes: vec![Node {
                set: CodeSet::domain(),
                children: None,
            }],
        };

        let epsilon = CodeSet::epsilon();
        let mut unique: HashSet<&CodeSet, RandomState> = HashSet::default();
        let mut ordered: Vec<&CodeSet> = Vec::new();
        for set in sets {
            if !set.is_empty() && *set != epsilon && unique.insert(set) {
                ordered.push(set);
            }
        }
        ordered.sort_by(|a, b| {
            b.cardinality()
                .cmp(&a.cardinality())
                .then_with(|| a.cmp(b))
        });

        partition.insert(&epsilon);
        for set in ordered {
            partition.insert(set);
        }
        partition
    }

    fn insert(&mut self, set: &CodeSet) {
        let clipped = set.intersect(&self.nodes[0].set);
        if clipped.is_empty() {
            return;
        }
        let mut work = vec![(0usize, clipped)];
        while let Some((index, set)) = work.pop() {
            if self.nodes[index].set == set {
                continue;
            }
            match self.nodes[index].children {
                None => {
                    let rest = self.nodes[index].set.difference(&set);
                    let first = self.push_node(rest);
                    let second = self.push_node(set);
                    self.nodes[index].children = Some([first, second]);
                }
                Some(children) => {
                    for child in children {
                        let part = self.nodes[child].set.intersect(&set);
                        if !part.is_empty() {
                            work.push((child, part));
                        }
                    }
                }
            }
        }
    }

    fn push_node(&mut self, set: CodeSet) -> usize {
        self.nodes.push(Node {
            set,
            children: None,
        });
        self.nodes.len() - 1
    }

    /// Split `query` into atomic pieces
    ///
    /// The pieces are disjoint, their union equals `query`, and they are sorted by
    /// their first element.
    #[must_use]
    pub fn apply(&self, query: &CodeSet) -> Vec<CodeSet> {
        let mut pieces = Vec::new();
        let mut work = vec![(0usize, query.intersect(&self.nodes[0].set))];
        while let Some((index, mut remaining)) = work.pop() {
            if remaining.is_empty() {
                continue;
            }
            let Some(children) = self.nodes[index].children else {
                pieces.push(remaining);
                continue;
            };
            for child in children {
                let child_set = &self.nodes[child].set;
                let part = remaining.intersect(child_set);
                if part.is_empty() {
                    continue;
                }
                remaining = remaining.difference(child_set);
                work.push((child, part));
                if remaining.is_empty() {
                    break;
                }
            }
        }
        pieces.sort_unstable();
        pieces
    }

    /// Number of atomic pieces
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.children.is_none()).count()
    }

    /// Every atomic piece, sorted
    #[must_use]
    pub fn leaves(&self) -> Vec<CodeSet> {
        let mut leaves: Vec<CodeSet> = self
            .nodes
            .iter()
            .filter(|node| node.children.is_none())
            .map(|node| node.set.clone())
            .collect();
        leaves.sort_unstable();
        leaves
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(lower: i32, upper: i32) -> CodeSet {
        CodeSet::with_range(lower, upper).unwrap()
    }

    fn flatten(pieces: &[CodeSet]) -> Vec<i32> {
        pieces.iter().flat_map(|p| p.elements().to_vec()).collect()
    }

    #[test]
    fn test_apply_splits_overlaps() {
        let sets = [range(20, 30), range(25, 33), range(37, 38), range(40, 50)];
        let partition = RangePartition::new(&sets);

        assert_eq!(flatten(&partition.apply(&range(25, 33))), [25, 30, 30, 33]);
        assert_eq!(flatten(&partition.apply(&range(37, 38))), [37, 38]);
        assert_eq!(flatten(&partition.apply(&range(40, 50))), [40, 50]);
        assert_eq!(
            flatten(&partition.apply(&range(20, 33))),
            [20, 25, 25, 30, 30, 33]
        );
    }

    #[test]
    fn test_epsilon_isolated() {
        let partition = RangePartition::new(&[range(-5, 5)]);
        let pieces = partition.apply(&range(-5, 5));
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].elements(), &[-5, -1, 0, 5]);
        assert_eq!(pieces[1], CodeSet::epsilon());
    }

    #[test]
    fn test_leaves_cover_domain() {
        let sets = [range(0, 10), range(5, 15), range(100, 200)];
        let partition = RangePartition::new(&sets);
        let mut union = CodeSet::new();
        let leaves = partition.leaves();
        for (i, leaf) in leaves.iter().enumerate() {
            for other in &leaves[i + 1..] {
                assert!(leaf.intersect(other).is_empty());
            }
            union.add_set(leaf);
        }
        assert_eq!(union, CodeSet::domain());
        assert_eq!(leaves.len(), partition.leaf_count());
    }
}
