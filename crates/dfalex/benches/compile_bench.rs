//! Benchmarks for script compilation and tokenization throughput

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use dfalex::compiler::{PriorityMode, parse_script};
use dfalex::{CompiledDfa, LexerBuilder, Tokenizer, TokenizerConfig};
use std::time::Duration;

const SCRIPT: &str = r#"
_LETTER: [a-zA-Z_]
_DIG:    [0-9]
WS:      ( [\f\r\s\t\n]+ ) | ( \# [^\n]* \n )
ID:      $LETTER ($LETTER | $DIG)*
INT:     \-? $DIG+
DBL:     \-? ( $DIG+ \. $DIG* | \. $DIG+ )
ASSIGN:  =
EQUIV:   ==
IF:      if
DO:      do
WHILE:   while
RETURN:  return
BROP:    \{
BRCL:    \}
PAROP:   \(
PARCL:   \)
STRING:  \" ( [^\"\n] | \\\" )* \"
"#;

fn sample_text(repeat: usize) -> String {
    "while (x == -12) { # loop\n  y = \"text\" 3.25 do return if_x }\n".repeat(repeat)
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("parse_script", |b| {
        b.iter(|| parse_script(black_box(SCRIPT)).unwrap());
    });

    for priority in [PriorityMode::LongestMatch, PriorityMode::DeclarationOrder] {
        group.bench_with_input(
            BenchmarkId::new("build", format!("{priority:?}")),
            &priority,
            |b, &priority| {
                let builder = LexerBuilder::from_script(SCRIPT).unwrap().priority(priority);
                b.iter(|| builder.build().unwrap());
            },
        );
    }
    group.finish();
}

fn bench_tokenize(c: &mut Criterion) {
    let dfa = CompiledDfa::from_script(SCRIPT).unwrap();
    let mut group = c.benchmark_group("tokenize");

    for repeat in [10, 100, 1000] {
        let text = sample_text(repeat);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(repeat), &text, |b, text| {
            b.iter(|| {
                let config = TokenizerConfig::default().skip("WS");
                let tokens = Tokenizer::from_text(&dfa, black_box(text), config).unwrap();
                tokens.map(Result::unwrap).count()
            });
        });
    }
    group.finish();
}

#[cfg(feature = "serialize")]
fn bench_json(c: &mut Criterion) {
    let dfa = CompiledDfa::from_script(SCRIPT).unwrap();
    let json = dfa.to_json().unwrap();
    c.bench_function("from_json", |b| {
        b.iter(|| CompiledDfa::from_json(black_box(&json)).unwrap());
    });
}

#[cfg(not(feature = "serialize"))]
fn bench_json(_c: &mut Criterion) {}

criterion_group!(benches, bench_compile, bench_tokenize, bench_json);
criterion_main!(benches);
