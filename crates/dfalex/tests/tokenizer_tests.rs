//! Tests for tokenizing text with compiled automata

use dfalex::{
    BuildConfig, BuildError, CompileError, CompiledDfa, LexerBuilder, Token, TokenSelector,
    Tokenizer, TokenizerConfig, TokenizerError,
};
use std::io::Read;

const PAIR_SCRIPT: &str = r"
    sep:  \s
    tku:  a(a|b)*
    tkv:  b(aa|b*)
    tkw:  bbb
";

/// Route `log` output to the test harness; run with `RUST_LOG=dfalex=trace` to see it
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn names(dfa: &CompiledDfa, text: &str, skip: &str) -> Vec<(String, String)> {
    let config = TokenizerConfig::default().skip(skip);
    Tokenizer::from_text(dfa, text, config)
        .unwrap()
        .map(|token| {
            let token = token.unwrap();
            (
                dfa.token_name(token.id).unwrap().to_string(),
                token.text.to_string(),
            )
        })
        .collect()
}

fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
    expected
        .iter()
        .map(|(name, text)| ((*name).to_string(), (*text).to_string()))
        .collect()
}

#[test]
fn test_longer_match_beats_higher_id() {
    let dfa = LexerBuilder::new()
        .token("IDENTIFIER", "[a-z]+")
        .token("COMMAND", "run")
        .token("WS", "\\s+")
        .build()
        .unwrap();
    assert_eq!(
        names(&dfa, "run runner", "WS"),
        pairs(&[("COMMAND", "run"), ("IDENTIFIER", "runner")])
    );
}

#[test]
fn test_equal_length_goes_to_higher_id() {
    let dfa = LexerBuilder::new()
        .token("GENERAL", "[a-z]+")
        .token("SPECIFIC", "abc")
        .token("WS", "\\s+")
        .build()
        .unwrap();
    assert_eq!(names(&dfa, "abc ", "WS"), pairs(&[("SPECIFIC", "abc")]));
}

#[test]
fn test_priority_mixtures() {
    let dfa = CompiledDfa::from_script(
        r"
        WS: \0x20+
        IDENTIFIER: [a-z]+
        COMMAND: run
        ",
    )
    .unwrap();
    assert_eq!(
        names(&dfa, "runabc abcrun run abc", "WS"),
        pairs(&[
            ("IDENTIFIER", "runabc"),
            ("IDENTIFIER", "abcrun"),
            ("COMMAND", "run"),
            ("IDENTIFIER", "abc"),
        ])
    );

    let dfa = CompiledDfa::from_script("WS: \\0x20+\nGENERAL: ab[a-z]\nSPECIFIC: abc").unwrap();
    assert_eq!(
        names(&dfa, "abc abd", "WS"),
        pairs(&[("SPECIFIC", "abc"), ("GENERAL", "abd")])
    );
}

/// `^(...)` accepts the empty prefix, so NONSPECIAL also covers every whitespace
/// run WS does, at the same length and with a higher id.
const COMPLEMENT_SCRIPT: &str = r"
    WS: (\n|\r|\t|\s)+
    _TX: [^\n\r\t\s]+
    _KEYWORD: abc
    NONSPECIAL: ^($TX $KEYWORD $TX) $WS
    SPECIAL: $TX $KEYWORD $TX $WS
";

#[test]
fn test_complement_shadows_whitespace() {
    let err = CompiledDfa::from_script(COMPLEMENT_SCRIPT).unwrap_err();
    assert_eq!(
        err,
        CompileError::Build(BuildError::RedundantToken {
            name: "WS".to_string()
        })
    );
}

#[test]
fn test_complemented_tokens() {
    init_logging();
    let dfa = LexerBuilder::from_script(COMPLEMENT_SCRIPT)
        .unwrap()
        .config(BuildConfig {
            reject_redundant: false,
            ..BuildConfig::default()
        })
        .build()
        .unwrap();
    assert_eq!(
        names(&dfa, "xyz abc 123abcdef 789ab012\n", "WS"),
        pairs(&[
            ("NONSPECIAL", "xyz "),
            ("NONSPECIAL", "abc "),
            ("SPECIAL", "123abcdef "),
            ("NONSPECIAL", "789ab012\n"),
        ])
    );
    assert_eq!(names(&dfa, "  \t", "WS"), pairs(&[("NONSPECIAL", "  \t")]));
}

#[test]
fn test_unknown_input() {
    let dfa = CompiledDfa::from_script(PAIR_SCRIPT).unwrap();
    let mut tokens = Tokenizer::from_text(&dfa, "ddd", TokenizerConfig::default()).unwrap();
    let err = tokens.read().unwrap_err();
    assert!(err.to_string().starts_with("Unknown token"));
    assert!(matches!(err, TokenizerError::UnknownToken { line: 1, column: 1, .. }));
}

/// Reader that returns at most three bytes per call
struct Chunked<'a>(&'a [u8]);

impl Read for Chunked<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = buf.len().min(3).min(self.0.len());
        buf[..n].copy_from_slice(&self.0[..n]);
        self.0 = &self.0[n..];
        Ok(n)
    }
}

#[test]
fn test_read_from_stream() {
    init_logging();
    let dfa = CompiledDfa::from_script(PAIR_SCRIPT).unwrap();
    let text = "aa baa bbb ".repeat(1000);
    let config = TokenizerConfig {
        history_capacity: 50,
        read_chunk: 7,
        ..TokenizerConfig::default().skip("sep")
    };
    let mut tokens = Tokenizer::new(&dfa, Chunked(text.as_bytes()), config).unwrap();
    for _ in 0..1000 {
        tokens.read_expect("tku").unwrap();
        tokens.read_expect("tkv").unwrap();
        tokens.read_expect("tkw").unwrap();
    }
    assert!(tokens.peek().unwrap().is_none());
    assert_eq!(tokens.position(), (1, 11_001));
}

#[test]
fn test_unread_within_history() {
    let dfa = CompiledDfa::from_script(PAIR_SCRIPT).unwrap();
    let text = "aa baa bbb ".repeat(1000);
    let config = TokenizerConfig {
        history_capacity: 8,
        ..TokenizerConfig::default().skip("sep")
    };
    let mut tokens = Tokenizer::from_text(&dfa, &text, config).unwrap();
    let mut read = Vec::new();
    for _ in 0..500 {
        read.push(tokens.read().unwrap());
    }
    tokens.unread(8).unwrap();
    for expected in &read[492..] {
        assert_eq!(&tokens.read().unwrap(), expected);
    }
    let rest = tokens.by_ref().count();
    assert_eq!(rest, 3000 - 500);

    let err = tokens.unread(8 + 110).unwrap_err();
    assert!(err.to_string().starts_with("Token unavailable"));
}

#[test]
fn test_replay_by_name() {
    let dfa = CompiledDfa::from_script(PAIR_SCRIPT).unwrap();
    let config = TokenizerConfig {
        history_capacity: 100,
        ..TokenizerConfig::default()
    };
    let mut tokens = Tokenizer::from_text(&dfa, "aa baa bbb ab", config).unwrap();
    let read: Vec<Token> = tokens.by_ref().collect::<Result<_, _>>().unwrap();
    assert_eq!(read.len(), 7);
    assert!(matches!(tokens.read(), Err(TokenizerError::NoMoreTokens)));

    tokens.unread(read.len()).unwrap();
    for token in &read {
        let name = tokens.name_of(token);
        assert_eq!(&tokens.read_expect(name).unwrap(), token);
    }
}

#[test]
fn test_sequences() {
    let dfa = CompiledDfa::from_script(PAIR_SCRIPT).unwrap();
    let config = TokenizerConfig::default().skip("sep");
    let mut tokens = Tokenizer::from_text(&dfa, "aa baa bbb aa", config).unwrap();

    assert_eq!(
        tokens
            .read_sequence_if(&TokenSelector::sequence("tku tkv tku"))
            .unwrap(),
        None
    );
    let found = tokens
        .read_sequence_if(&[TokenSelector::ById(1), TokenSelector::ById(2), TokenSelector::Wildcard])
        .unwrap()
        .unwrap();
    assert_eq!(
        found.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
        ["aa", "baa", "bbb"]
    );

    let err = tokens
        .read_sequence(&TokenSelector::sequence("tku tku"))
        .unwrap_err();
    assert!(matches!(err, TokenizerError::NoMoreTokens));
    // the first element was consumed before the failure
    assert!(!tokens.has_next().unwrap());
}

#[test]
fn test_positions_across_lines() {
    let dfa = CompiledDfa::from_script("WS: [\\s\\n]+\nID: [a-z]+").unwrap();
    let config = TokenizerConfig::default().skip("WS");
    let tokens: Vec<Token> = Tokenizer::from_text(&dfa, "ab\n  cd ef\n\ng", config)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    let positions: Vec<(usize, usize)> = tokens.iter().map(|t| (t.line, t.column)).collect();
    assert_eq!(positions, [(1, 1), (2, 3), (2, 6), (4, 1)]);
}

#[test]
fn test_shared_automaton() {
    let dfa = CompiledDfa::from_script(PAIR_SCRIPT).unwrap();
    let ids: Vec<i32> = std::thread::scope(|scope| {
        let workers: Vec<_> = ["aa", "bbb", "b"]
            .into_iter()
            .map(|text| {
                let dfa = &dfa;
                scope.spawn(move || {
                    let mut tokens =
                        Tokenizer::from_text(dfa, text, TokenizerConfig::default()).unwrap();
                    tokens.read().unwrap().id
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });
    assert_eq!(ids, [1, 3, 2]);
}

#[cfg(feature = "serialize")]
#[test]
fn test_tokenize_with_reloaded_automaton() {
    let dfa = CompiledDfa::from_script(PAIR_SCRIPT).unwrap();
    let reloaded = CompiledDfa::from_json(&dfa.to_json().unwrap()).unwrap();
    assert_eq!(
        names(&reloaded, "aa baa bbb", "sep"),
        names(&dfa, "aa baa bbb", "sep")
    );
}
