//! A small interactive command-line shell.
//!
//! One input line at a time is tokenized with shell-style quoting, scanned
//! for `>`/`>>`/`<` redirections, and dispatched: names from the closed
//! builtin set run in-process, anything else is resolved on `PATH` and
//! spawned as a child process with its streams routed per the redirections.
//! The working directory is the only state that survives from one command
//! to the next.
//!
//! [`Interpreter`] is the entry point: feed it lines with
//! [`Interpreter::run_line`], or hand it the terminal with
//! [`Interpreter::repl`].

pub mod builtin;
pub mod env;
pub mod external;
pub mod interpreter;
pub mod lexer;
pub mod redirect;

pub use interpreter::Interpreter;

/// Conventional process exit code, as commands report it.
///
/// A value of 0 indicates success; any non-zero value indicates failure,
/// mirroring the convention of POSIX shells.
pub type ExitCode = i32;

#[cfg(test)]
pub(crate) mod testutil {
    use std::fs;
    use std::path::PathBuf;
    use std::sync::{Mutex, MutexGuard, OnceLock};
    use std::time::{SystemTime, UNIX_EPOCH};

    /// Serializes tests that touch the process-wide working directory.
    pub fn lock_current_dir() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fresh directory under the system temp dir, unique per test run.
    pub fn make_unique_temp_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("oxsh_{}_{}_{}", tag, std::process::id(), nanos));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }
}
