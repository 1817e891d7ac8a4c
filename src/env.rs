use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Session state threaded through the dispatcher and executor.
///
/// One `Environment` describes one shell session: the variables exported to
/// spawned processes, the working directory shown in the prompt and applied
/// to child processes, and the flag the read loop checks to know when `exit`
/// was requested. Commands receive it by mutable reference; tests construct
/// independent sessions directly.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Variables passed to spawned processes; `PATH` lookups read from here.
    pub vars: HashMap<String, String>,
    /// Working directory for command execution. `cd` is its only writer.
    pub current_dir: PathBuf,
    /// Set by the `exit` builtin; the read loop stops once it is true.
    pub should_exit: bool,
}

impl Environment {
    /// Capture the current process state into a fresh session.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            should_exit: false,
        }
    }

    /// Look up a variable in the session snapshot.
    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Set or override a variable for the rest of the session.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
