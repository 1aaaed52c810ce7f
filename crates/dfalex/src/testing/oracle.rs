//! Reference tokenization by direct NFA simulation.

use crate::code_set::{EPSILON, UNKNOWN_TOKEN};
use crate::compiler::TokenDefinition;
use crate::graph::{Fragment, StateId};
use ahash::RandomState;
use hashbrown::HashSet;

type StateSet = HashSet<StateId, RandomState>;

fn close(fragment: &Fragment, states: &mut StateSet) {
    let mut stack: Vec<StateId> = states.iter().copied().collect();
    while let Some(id) = stack.pop() {
        for edge in fragment.graph.state(id).edges() {
            if edge.label.contains(EPSILON) && states.insert(edge.dest) {
                stack.push(edge.dest);
            }
        }
    }
}

/// Length of the longest non-empty prefix of `input` matched by `fragment`
#[must_use]
pub fn longest_match(fragment: &Fragment, input: &[char]) -> Option<usize> {
    let mut current = StateSet::default();
    current.insert(fragment.start);
    close(fragment, &mut current);

    let mut best = None;
    for (offset, &c) in input.iter().enumerate() {
        let mut next = StateSet::default();
        for &id in &current {
            for edge in fragment.graph.state(id).edges() {
                if edge.label.contains(c as i32) {
                    next.insert(edge.dest);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        close(fragment, &mut next);
        if next.contains(&fragment.end) {
            best = Some(offset + 1);
        }
        current = next;
    }
    best
}

/// Tokenize `text` the way a longest-match tokenizer built from `definitions`
/// should, as `(token id, text)` pairs
///
/// Tokens with id `skip` are dropped from the output.
#[must_use]
pub fn oracle_tokenize(
    definitions: &[TokenDefinition],
    text: &str,
    skip: Option<i32>,
) -> Vec<(i32, String)> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < chars.len() {
        let mut best = (UNKNOWN_TOKEN, 1);
        let mut best_len = 0;
        for definition in definitions {
            let Some(id) = definition.id else { continue };
            let Some(len) = longest_match(&definition.fragment, &chars[pos..]) else {
                continue;
            };
            if len > best_len || (len == best_len && id > best.0) {
                best = (id, len);
                best_len = len;
            }
        }
        let (id, len) = best;
        if skip != Some(id) {
            tokens.push((id, chars[pos..pos + len].iter().collect()));
        }
        pos += len;
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::parse_script;

    #[test]
    fn test_longest_match() {
        let fragment = crate::compiler::compile_regex("a(bc)*").unwrap();
        let input: Vec<char> = "abcbcb".chars().collect();
        assert_eq!(longest_match(&fragment, &input), Some(5));
        assert_eq!(longest_match(&fragment, &['x']), None);
    }

    #[test]
    fn test_oracle_prefers_later_definitions_on_ties() {
        let definitions = parse_script("ID: [a-z]+\nIF: if\nWS: \\s+").unwrap();
        assert_eq!(
            oracle_tokenize(&definitions, "if iffy ?", Some(2)),
            vec![
                (1, "if".to_string()),
                (0, "iffy".to_string()),
                (UNKNOWN_TOKEN, "?".to_string()),
            ]
        );
    }
}
