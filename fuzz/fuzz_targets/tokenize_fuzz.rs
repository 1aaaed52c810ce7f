#![no_main]
use dfalex::compiler::{BuildConfig, LexerBuilder};
use dfalex::testing::oracle_tokenize;
use dfalex::{CompiledDfa, Tokenizer, TokenizerConfig};
use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;

const SCRIPT: &str = r"
WS:    [\s\n\t]+
ID:    [a-z_] \w*
INT:   \d+
DBL:   \d* \. \d+
IF:    if
RUN:   run
OP:    [+\-*/=<>!]=?
";

fn builder() -> &'static LexerBuilder {
    static BUILDER: OnceLock<LexerBuilder> = OnceLock::new();
    BUILDER.get_or_init(|| {
        LexerBuilder::from_script(SCRIPT)
            .unwrap()
            .config(BuildConfig::default())
    })
}

fn dfa() -> &'static CompiledDfa {
    static DFA: OnceLock<CompiledDfa> = OnceLock::new();
    DFA.get_or_init(|| builder().build().unwrap())
}

// The tokenizer must agree with NFA simulation of each definition, and
// unreading everything must replay the same tokens.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let dfa = dfa();
    let config = TokenizerConfig {
        accept_unknown: true,
        history_capacity: 1024,
        ..TokenizerConfig::default()
    };
    let mut tokenizer = Tokenizer::from_text(dfa, text, config).unwrap();
    let tokens: Vec<_> = tokenizer.by_ref().collect::<Result<_, _>>().unwrap();

    let pairs: Vec<(i32, String)> = tokens
        .iter()
        .map(|t| (t.id, t.text.to_string()))
        .collect();
    let definitions = builder().definitions().unwrap();
    assert_eq!(pairs, oracle_tokenize(&definitions, text, None));

    if tokens.len() <= 1024 {
        tokenizer.unread(tokens.len()).unwrap();
        for token in &tokens {
            assert_eq!(&tokenizer.read().unwrap(), token);
        }
    }
});
