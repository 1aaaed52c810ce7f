//! dfalex Tools - command-line utilities for token scripts
//!
//! This crate backs the `dfalex` binary: compiling scripts to JSON, tokenizing
//! files and rendering automata for Graphviz.

pub mod cli;
pub mod visualize;

pub use visualize::*;

use dfalex::{BuildConfig, CompiledDfa, LexerBuilder, Token, Tokenizer};
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::Path;

/// Load a compiled DFA (`.json`) or compile a token script
pub fn load_automaton(path: &Path, config: &BuildConfig) -> Result<CompiledDfa> {
    let text = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading {}", path.display()))?;
    if path.extension().is_some_and(|ext| ext == "json") {
        log::debug!("loading compiled DFA from {}", path.display());
        return Ok(CompiledDfa::from_json(&text)?);
    }
    log::debug!("compiling token script {}", path.display());
    let dfa = LexerBuilder::from_script(&text)?
        .config(config.clone())
        .build()?;
    log::info!(
        "compiled {} tokens into {} states",
        dfa.token_names().len(),
        dfa.state_count()
    );
    Ok(dfa)
}

/// One output line for a token: `NAME 'text' line:column`
#[must_use]
pub fn format_token<R: std::io::Read>(tokenizer: &Tokenizer<'_, R>, token: &Token) -> String {
    format!(
        "{:<12} {:?} {}:{}",
        tokenizer.name_of(token),
        token.text.as_str(),
        token.line,
        token.column
    )
}

/// JSON object for a token, including its name
#[must_use]
pub fn token_json<R: std::io::Read>(tokenizer: &Tokenizer<'_, R>, token: &Token) -> serde_json::Value {
    serde_json::json!({
        "name": tokenizer.name_of(token),
        "id": token.id,
        "text": token.text.as_str(),
        "line": token.line,
        "column": token.column,
    })
}
