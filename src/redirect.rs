//! Extraction of redirection operators from a token sequence.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use thiserror::Error;

/// Resolved file routing for one command's standard streams.
///
/// At most one input source and one output sink per command; `append` is
/// meaningful only when `output_path` is set. A directive lives for a single
/// dispatch and the files it opens are closed before the next line is read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectionDirective {
    pub input_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub append: bool,
}

impl RedirectionDirective {
    /// Open the input source, when one is set.
    pub fn open_source(&self) -> Result<Option<File>> {
        let Some(path) = &self.input_path else {
            return Ok(None);
        };
        let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
        Ok(Some(file))
    }

    /// Open the output sink, truncating or appending per the directive.
    /// Returns `None` when output is not redirected.
    pub fn open_sink(&self) -> Result<Option<File>> {
        let Some(path) = &self.output_path else {
            return Ok(None);
        };
        let mut options = OpenOptions::new();
        if self.append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        let file = options
            .create(true)
            .open(path)
            .with_context(|| format!("cannot open {}", path.display()))?;
        Ok(Some(file))
    }
}

/// A redirection operator with nothing after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("syntax error: expected a path after `{0}`")]
pub struct MissingOperand(pub &'static str);

/// Scan `tokens` for `>`, `>>` and `<` and split them out.
///
/// Operators are checked in that fixed order and only the first occurrence
/// of each is taken. The token after the operator is its path; both tokens
/// are removed from the returned argument list. When `>` and `>>` both
/// appear, each is applied in checking order, so `>>` wins the output slot
/// over an earlier `>`.
pub fn extract_redirections(
    mut tokens: Vec<String>,
) -> Result<(Vec<String>, RedirectionDirective), MissingOperand> {
    let mut directive = RedirectionDirective::default();

    if let Some(at) = tokens.iter().position(|t| t == ">") {
        directive.output_path = Some(take_operand(&mut tokens, at, ">")?);
        directive.append = false;
    }
    if let Some(at) = tokens.iter().position(|t| t == ">>") {
        directive.output_path = Some(take_operand(&mut tokens, at, ">>")?);
        directive.append = true;
    }
    if let Some(at) = tokens.iter().position(|t| t == "<") {
        directive.input_path = Some(take_operand(&mut tokens, at, "<")?);
    }

    Ok((tokens, directive))
}

fn take_operand(
    tokens: &mut Vec<String>,
    at: usize,
    op: &'static str,
) -> Result<PathBuf, MissingOperand> {
    if at + 1 >= tokens.len() {
        return Err(MissingOperand(op));
    }
    let path = PathBuf::from(tokens.remove(at + 1));
    tokens.remove(at);
    Ok(path)
}
