#![no_main]
use dfalex::compiler::{LexerBuilder, compile_regex};
use libfuzzer_sys::fuzz_target;

// Arbitrary patterns must either fail to parse or compile into a valid automaton.
fuzz_target!(|data: &[u8]| {
    let Ok(pattern) = std::str::from_utf8(data) else {
        return;
    };
    if pattern.len() > 64 || compile_regex(pattern).is_err() {
        return;
    }
    if let Ok(dfa) = LexerBuilder::new().token("T", pattern).build() {
        assert!(!dfa.state(dfa.start()).is_some_and(|s| s.is_final()));
        for (_, state) in dfa.graph().states() {
            let edges = state.edges();
            for (i, first) in edges.iter().enumerate() {
                for second in &edges[i + 1..] {
                    assert!(first.label.intersect(&second.label).is_empty());
                }
            }
        }
    }
});
