//! CLI interface for dfalex_tools

use clap::{Parser, Subcommand};
use dfalex::PriorityMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dfalex")]
#[command(about = "Compile token scripts into DFAs and tokenize text with them")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a token script
    Compile {
        /// Token script
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,

        #[command(flatten)]
        build: BuildArgs,
    },
    /// Tokenize a file, printing one token per line
    Tokenize {
        /// Token script, or a compiled DFA with a `.json` extension
        automaton: PathBuf,

        /// Text to tokenize (default: stdin)
        input: Option<PathBuf>,

        /// Token to drop from the output, typically whitespace
        #[arg(short, long)]
        skip: Option<String>,

        /// Report unrecognised characters instead of stopping at them
        #[arg(long)]
        accept_unknown: bool,

        /// Output format (text or json)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        #[command(flatten)]
        build: BuildArgs,
    },
    /// Render an automaton as a Graphviz digraph
    Dot {
        /// Token script, or a compiled DFA with a `.json` extension
        automaton: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        build: BuildArgs,
    },
}

/// Options for compiling token scripts
#[derive(clap::Args, Clone, Debug)]
pub struct BuildArgs {
    /// Priority resolution: longest, declaration or off
    #[arg(long, default_value = "longest")]
    pub priority: PriorityArg,

    /// Accept tokens that can never be recognised
    #[arg(long)]
    pub allow_redundant: bool,
}

impl BuildArgs {
    #[must_use]
    pub fn config(&self) -> dfalex::BuildConfig {
        dfalex::BuildConfig {
            priority: self.priority.0,
            reject_redundant: !self.allow_redundant,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriorityArg(pub PriorityMode);

impl std::str::FromStr for PriorityArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "longest" | "longest-match" => Ok(Self(PriorityMode::LongestMatch)),
            "declaration" | "declaration-order" => Ok(Self(PriorityMode::DeclarationOrder)),
            "off" | "none" => Ok(Self(PriorityMode::Off)),
            _ => Err(format!(
                "Unknown priority mode: {s}. Supported: longest, declaration, off"
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Text,
    Dot,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "txt" => Ok(Self::Text),
            "dot" | "graphviz" => Ok(Self::Dot),
            _ => Err(format!("Unknown format: {s}. Supported: json, text, dot")),
        }
    }
}
