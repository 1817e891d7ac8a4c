//! Locating and running external programs.

use crate::env::Environment;
use crate::redirect::RedirectionDirective;
use crate::ExitCode;
use anyhow::{Context, Result};
use log::debug;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

/// The program name did not resolve to anything executable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("command not found: {0}")]
pub struct CommandNotFound(pub String);

/// Spawn an external program and route its streams per the directive.
///
/// The input file, when redirected, is opened before the process is spawned,
/// so an unreadable source aborts the command without side effects. Standard
/// output is captured and written to the sink file or the shell's stdout;
/// standard error is always forwarded to the shell's stderr as-is. The call
/// blocks until the child terminates; nothing else runs in the meantime.
pub fn run(args: &[String], directive: &RedirectionDirective, env: &Environment) -> Result<ExitCode> {
    let name = &args[0];
    let search_paths = env.get_var("PATH").unwrap_or("");
    let program = find_command_path(OsStr::new(search_paths), Path::new(name))
        .ok_or_else(|| CommandNotFound(name.clone()))?;
    debug!("resolved {} -> {}", name, program.display());

    let stdin = match directive.open_source().with_context(|| name.clone())? {
        Some(file) => Stdio::from(file),
        None => Stdio::inherit(),
    };

    let child = Command::new(program.as_ref())
        .args(&args[1..])
        .stdin(stdin)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .current_dir(&env.current_dir)
        .spawn();
    let child = match child {
        Ok(child) => child,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(CommandNotFound(name.clone()).into());
        }
        Err(err) => return Err(err).with_context(|| format!("{}: failed to start", name)),
    };

    let output = child
        .wait_with_output()
        .with_context(|| format!("{}: failed to wait for completion", name))?;

    match directive.open_sink().with_context(|| name.clone())? {
        Some(mut sink) => sink
            .write_all(&output.stdout)
            .with_context(|| name.clone())?,
        None => io::stdout().write_all(&output.stdout)?,
    }
    io::stderr().write_all(&output.stderr)?;

    Ok(exit_code(output.status))
}

fn exit_code(status: ExitStatus) -> ExitCode {
    match status.code() {
        Some(code) => code,
        None => terminated_by_signal(status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(signal) => 128 + signal,
        None => -1,
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_status: ExitStatus) -> ExitCode {
    -1
}

/// Resolve a program name the way a shell would.
///
/// Absolute paths and paths with a directory component are checked as given
/// (relative ones against the process working directory); a bare name is
/// searched through each entry of `search_paths`. Returns `None` when
/// nothing exists at any candidate location.
pub fn find_command_path<'a>(search_paths: &OsStr, program: &'a Path) -> Option<Cow<'a, Path>> {
    if program.as_os_str().is_empty() {
        return None;
    }
    if program.is_absolute() || program.components().count() > 1 {
        return program.exists().then_some(Cow::Borrowed(program));
    }
    for dir in std::env::split_paths(search_paths) {
        let candidate = dir.join(program);
        if candidate.exists() {
            return Some(Cow::Owned(candidate));
        }
    }
    None
}
