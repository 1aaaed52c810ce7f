//! Automaton visualization
//!
//! Renders a [`CompiledDfa`] in DOT/Graphviz format. Edges into the final state
//! are labelled with token names instead of marker codes.

use dfalex::code_set::{is_token_label, label_token};
use dfalex::{CodeSet, CompiledDfa};
use std::fmt::Write;

/// Generate a DOT/Graphviz representation of an automaton
///
/// # Example
///
/// ```rust
/// use dfalex::CompiledDfa;
/// use dfalex_tools::visualize::generate_dot;
///
/// let dfa = CompiledDfa::from_script("NUM: [0-9]+").unwrap();
/// let dot = generate_dot(&dfa, "tokens");
/// assert!(dot.starts_with("digraph tokens {"));
/// ```
#[must_use]
pub fn generate_dot(dfa: &CompiledDfa, name: &str) -> String {
    let mut output = String::new();
    let _ = write_dot(&mut output, dfa, name);
    output
}

fn write_dot(output: &mut String, dfa: &CompiledDfa, name: &str) -> std::fmt::Result {
    writeln!(output, "digraph {name} {{")?;
    writeln!(output, "  rankdir=LR;")?;
    writeln!(output, "  node [shape=circle];")?;
    writeln!(output)?;

    for (id, state) in dfa.graph().states() {
        let shape = if state.is_final() { "doublecircle" } else { "circle" };
        writeln!(output, "  \"{id}\" [label=\"{id}\", shape={shape}];")?;
    }
    writeln!(output)?;

    for (id, state) in dfa.graph().states() {
        for edge in state.edges() {
            writeln!(
                output,
                "  \"{id}\" -> \"{}\" [label=\"{}\"];",
                edge.dest,
                escape(&edge_label(dfa, &edge.label))
            )?;
        }
    }
    writeln!(output, "}}")
}

fn edge_label(dfa: &CompiledDfa, label: &CodeSet) -> String {
    match label.first() {
        Some(code) if is_token_label(code) => label
            .ranges()
            .flat_map(|(lower, upper)| lower..upper)
            .filter_map(|code| dfa.token_name(label_token(code)))
            .collect::<Vec<_>>()
            .join(" "),
        _ => label.to_string(),
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
