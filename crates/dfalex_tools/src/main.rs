//! dfalex CLI
//!
//! Command-line tools for compiling token scripts and running tokenizers.

use clap::Parser;
use dfalex::{Tokenizer, TokenizerConfig};
use dfalex_tools::cli::{Cli, Commands, OutputFormat};
use dfalex_tools::{format_token, generate_dot, load_automaton, token_json};
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

fn write_output(output: Option<PathBuf>, content: &str) -> Result<()> {
    if let Some(path) = output {
        fs::write(&path, content).into_diagnostic()?;
        log::info!("wrote {}", path.display());
    } else {
        print!("{content}");
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            input,
            output,
            format,
            build,
        } => {
            let dfa = load_automaton(&input, &build.config())?;
            let content = match format {
                OutputFormat::Json => dfa.to_json()? + "\n",
                OutputFormat::Text => dfa.describe(),
                OutputFormat::Dot => generate_dot(&dfa, "dfa"),
            };
            write_output(output, &content)?;
        }
        Commands::Tokenize {
            automaton,
            input,
            skip,
            accept_unknown,
            format,
            build,
        } => {
            let dfa = load_automaton(&automaton, &build.config())?;
            let config = TokenizerConfig {
                skip: skip.map(Into::into),
                accept_unknown,
                ..TokenizerConfig::default()
            };
            let reader: Box<dyn Read> = match input {
                Some(path) => Box::new(fs::File::open(path).into_diagnostic()?),
                None => Box::new(io::stdin().lock()),
            };
            let mut tokenizer = Tokenizer::new(&dfa, io::BufReader::new(reader), config)?;
            let stdout = io::stdout();
            let mut out = stdout.lock();
            let mut json = Vec::new();
            while tokenizer.has_next()? {
                let token = tokenizer.read()?;
                match format {
                    OutputFormat::Json => json.push(token_json(&tokenizer, &token)),
                    _ => writeln!(out, "{}", format_token(&tokenizer, &token)).into_diagnostic()?,
                }
            }
            if format == OutputFormat::Json {
                let text = serde_json::to_string_pretty(&json).into_diagnostic()?;
                writeln!(out, "{text}").into_diagnostic()?;
            }
        }
        Commands::Dot {
            automaton,
            output,
            build,
        } => {
            let dfa = load_automaton(&automaton, &build.config())?;
            write_output(output, &generate_dot(&dfa, "dfa"))?;
        }
    }

    Ok(())
}
