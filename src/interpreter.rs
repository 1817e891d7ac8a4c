//! Dispatch of parsed command lines and the interactive read loop.

use crate::builtin::Builtin;
use crate::env::Environment;
use crate::external;
use crate::lexer;
use crate::redirect::{self, RedirectionDirective};
use crate::ExitCode;
use anyhow::{Context, Result};
use argh::EarlyExit;
use log::debug;
use rustyline::completion::FilenameCompleter;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Completer, Editor, Helper, Highlighter, Hinter, Validator};
use std::io::{self, Write};

/// One interactive shell session.
///
/// Owns the session [`Environment`] and runs command lines against it, one
/// line at a time: tokenize, split out redirections, then either execute a
/// builtin against the wired output stream or hand the cleaned arguments to
/// the external process executor. A command always runs to completion before
/// the next line is read.
pub struct Interpreter {
    env: Environment,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    /// The session state; tests inspect it between lines.
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Execute one raw input line to completion.
    ///
    /// A blank line is a successful no-op. Any failure comes back as a
    /// single error for the caller to print; no error here ends the session.
    pub fn run_line(&mut self, line: &str) -> Result<ExitCode> {
        let tokens = lexer::split_into_tokens(line)?;
        if tokens.is_empty() {
            return Ok(0);
        }
        debug!("tokens: {:?}", tokens);

        let (args, directive) = redirect::extract_redirections(tokens)?;
        if args.is_empty() {
            // The line held nothing but redirections.
            return Ok(0);
        }
        debug!("dispatching {:?} with {:?}", args, directive);

        let arg_refs: Vec<&str> = args.iter().skip(1).map(String::as_str).collect();
        match Builtin::lookup(&args[0], &arg_refs) {
            Some(Ok(builtin)) => self.run_builtin(builtin, &args[0], &directive),
            Some(Err(early)) => Ok(report_usage(&args[0], early)),
            None => external::run(&args, &directive, &self.env),
        }
    }

    /// Wire the builtin's output per the directive and run it.
    ///
    /// Builtins never see redirection themselves: they get either the opened
    /// sink file or the shell's own stdout. The sink handle closes when this
    /// returns, on success and failure alike.
    fn run_builtin(
        &mut self,
        builtin: Builtin,
        name: &str,
        directive: &RedirectionDirective,
    ) -> Result<ExitCode> {
        match directive.open_sink().with_context(|| name.to_string())? {
            Some(mut sink) => builtin.execute(&mut sink, &mut self.env),
            None => {
                let mut stdout = io::stdout();
                let code = builtin.execute(&mut stdout, &mut self.env)?;
                stdout.flush()?;
                Ok(code)
            }
        }
    }

    /// Interactive read-eval loop; returns when the session ends.
    ///
    /// Every command error is printed as one line and the loop keeps going;
    /// only `exit`, end of input, or a broken terminal stop it.
    pub fn repl(&mut self) -> rustyline::Result<()> {
        let mut rl: Editor<PromptHelper, DefaultHistory> = Editor::new()?;
        rl.set_helper(Some(PromptHelper {
            completer: FilenameCompleter::new(),
        }));

        loop {
            let prompt = format!("oxsh:{}$ ", self.env.current_dir.display());
            match rl.readline(&prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    if let Err(err) = self.run_line(&line) {
                        eprintln!("{err:#}");
                    }
                    if self.env.should_exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("Use 'exit' to leave the shell.");
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    log::error!("read error: {err}");
                    break;
                }
            }
        }

        Ok(())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Print argh's usage output for a builtin whose arguments did not parse.
/// Help requests go to stdout; actual usage errors go to stderr, prefixed
/// with the command name.
fn report_usage(name: &str, early: EarlyExit) -> ExitCode {
    match early.status {
        Ok(()) => {
            print!("{}", early.output);
            0
        }
        Err(()) => {
            eprintln!("{}: {}", name, early.output.trim_end());
            1
        }
    }
}

/// Tab completion of file names for the line editor.
#[derive(Completer, Helper, Highlighter, Hinter, Validator)]
struct PromptHelper {
    #[rustyline(Completer)]
    completer: FilenameCompleter,
}
