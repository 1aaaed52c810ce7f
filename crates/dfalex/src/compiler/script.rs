//! Token definition scripts.
//!
//! ```text
//! # comment
//! _DIGIT:  [0-9]
//! INT:     \-? $DIGIT+
//! DBL:     \-? ({DIGIT}+ . {DIGIT}* | . {DIGIT}+)
//! WS:      ( [\f\r\s\t\n]+ \
//!          | \# [^\n]* \n )
//! ```
//!
//! Each definition is `NAME: regex` on one line; a line ending in an odd number
//! of backslashes continues on the next one. Blank lines and lines whose first
//! non-blank character is `#` are ignored. Names starting with `_` are
//! anonymous: they can be referenced by later expressions but never produce
//! tokens.

use super::TokenDefinition;
use super::regex::{FragmentTable, RegexCompiler, is_token_name};
use crate::error::{BuildError, CompileError, ParseError, ParseErrorKind};
use compact_str::CompactString;

/// One `NAME: regex` definition before its expression is compiled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptEntry {
    pub name: CompactString,
    pub pattern: String,
    /// 1-based line of the definition's first physical line
    pub line: Option<usize>,
}

impl ScriptEntry {
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.name.starts_with('_')
    }
}

/// Split a script into definitions, handling comments and continuations
pub fn script_entries(script: &str) -> Result<Vec<ScriptEntry>, ParseError> {
    let mut entries = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (index, raw) in script.lines().enumerate() {
        let trailing = raw.bytes().rev().take_while(|&b| b == b'\\').count();
        let (first_line, mut text) = pending.take().unwrap_or((index + 1, String::new()));
        if trailing % 2 == 1 {
            text.push_str(&raw[..raw.len() - 1]);
            pending = Some((first_line, text));
            continue;
        }
        text.push_str(raw);

        let line = text.trim_start();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        entries.push(split_definition(line, first_line)?);
    }

    if let Some((first_line, text)) = pending {
        return Err(ParseError::new(ParseErrorKind::IncompleteFinalLine, text).at_line(first_line));
    }
    Ok(entries)
}

fn split_definition(line: &str, number: usize) -> Result<ScriptEntry, ParseError> {
    let malformed = || ParseError::new(ParseErrorKind::MalformedLine, line).at_line(number);
    let (name, pattern) = line.split_once(':').ok_or_else(malformed)?;
    let name = name.trim_end();
    if !is_token_name(name) {
        return Err(malformed());
    }
    Ok(ScriptEntry {
        name: name.into(),
        pattern: pattern.to_string(),
        line: Some(number),
    })
}

/// Compile entries in order, giving named tokens ids `0, 1, 2, ...`
///
/// Every expression may reference any entry defined before it.
pub fn compile_entries(entries: &[ScriptEntry]) -> Result<Vec<TokenDefinition>, CompileError> {
    let mut table = FragmentTable::default();
    let mut definitions = Vec::with_capacity(entries.len());
    let mut next_id = 0;

    for entry in entries {
        let at_line = |err: ParseError| match entry.line {
            Some(line) => err.at_line(line),
            None => err,
        };
        if !is_token_name(&entry.name) {
            let kind = ParseErrorKind::BadTokenName {
                name: entry.name.to_string(),
            };
            return Err(at_line(ParseError::new(kind, entry.name.as_str())).into());
        }
        if table.contains_key(&entry.name) {
            return Err(BuildError::DuplicateToken {
                name: entry.name.to_string(),
            }
            .into());
        }

        let fragment = RegexCompiler::new(&table)
            .compile(&entry.pattern)
            .map_err(at_line)?;
        log::trace!(
            "compiled '{}' into {} NFA states",
            entry.name,
            fragment.graph.len()
        );

        let id = (!entry.is_anonymous()).then(|| {
            next_id += 1;
            next_id - 1
        });
        table.insert(entry.name.clone(), fragment.clone());
        definitions.push(TokenDefinition {
            name: entry.name.clone(),
            id,
            fragment,
        });
    }
    Ok(definitions)
}

/// Parse and compile every definition of a script
pub fn parse_script(script: &str) -> Result<Vec<TokenDefinition>, CompileError> {
    compile_entries(&script_entries(script)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comments_blank_lines_and_continuations() {
        let script = "\
# leading comment
   # indented comment

A: a\\
   b \\
   c
B: x\\\\
";
        let entries = script_entries(script).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "A");
        assert_eq!(entries[0].pattern, " a   b    c");
        assert_eq!(entries[0].line, Some(4));
        assert_eq!(entries[1].pattern, " x\\\\");
        assert_eq!(entries[1].line, Some(7));
    }

    #[test]
    fn test_incomplete_final_line() {
        let err = script_entries("A: a\nB: b\\").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::IncompleteFinalLine);
        assert_eq!(err.line, Some(2));
    }

    #[test]
    fn test_malformed_lines() {
        for script in ["just text", "9A: a", "A B: a", ": a"] {
            let err = script_entries(script).unwrap_err();
            assert_eq!(err.kind, ParseErrorKind::MalformedLine, "{script}");
            assert_eq!(err.line, Some(1));
        }
    }

    #[test]
    fn test_ids_skip_anonymous_definitions() {
        let defs = parse_script("_D: [0-9]\nINT: $D+\n_X: x\nHEX: 0 $X {D}+").unwrap();
        let ids: Vec<_> = defs.iter().map(|d| (d.name.as_str(), d.id)).collect();
        assert_eq!(
            ids,
            [("_D", None), ("INT", Some(0)), ("_X", None), ("HEX", Some(1))]
        );
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        let err = parse_script("A: a\n\nB: [z-a]").unwrap_err();
        let CompileError::Parse(err) = err else {
            panic!("expected a parse error, got {err:?}");
        };
        assert_eq!(err.line, Some(3));
        assert!(err.to_string().ends_with(", line 3"));
    }

    #[test]
    fn test_duplicate_names() {
        let err = parse_script("A: a\nA: b").unwrap_err();
        assert_eq!(
            err,
            CompileError::Build(BuildError::DuplicateToken {
                name: "A".to_string()
            })
        );
    }

    #[test]
    fn test_forward_reference_is_undefined() {
        let err = parse_script("A: $B\nB: b").unwrap_err();
        assert!(matches!(
            err,
            CompileError::Parse(ParseError {
                kind: ParseErrorKind::UndefinedToken { .. },
                line: Some(1),
                ..
            })
        ));
    }
}
