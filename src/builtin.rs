//! Built-in commands executed in-process.
//!
//! Every builtin is an [`argh`]-parsed struct, so a bad or missing operand
//! surfaces as a usage message naming the command instead of a crash. The
//! [`Builtin`] enum is the complete set the shell implements itself; the
//! dispatcher maps the first token into it and anything unmapped is treated
//! as an external program.

use crate::env::Environment;
use crate::ExitCode;
use anyhow::{bail, Context, Result};
use argh::{EarlyExit, FromArgs};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// The closed set of commands implemented by the shell itself.
pub enum Builtin {
    Cd(Cd),
    Exit(Exit),
    Ls(Ls),
    Pwd(Pwd),
    Mkdir(Mkdir),
    Rmdir(Rmdir),
    Rm(Rm),
    Cat(Cat),
    Echo(Echo),
    Clear(Clear),
    Touch(Touch),
    Mv(Mv),
    Cp(Cp),
    Head(Head),
    Tail(Tail),
    Find(Find),
}

impl Builtin {
    /// Map a command name to its builtin and parse `args` for it.
    ///
    /// `None` means the name is not a builtin. `Some(Err(_))` carries argh's
    /// usage output for arguments that did not parse.
    pub fn lookup(name: &str, args: &[&str]) -> Option<Result<Builtin, EarlyExit>> {
        let cmd = &[name];
        Some(match name {
            "cd" => Cd::from_args(cmd, args).map(Builtin::Cd),
            "exit" => Exit::from_args(cmd, args).map(Builtin::Exit),
            "ls" => Ls::from_args(cmd, args).map(Builtin::Ls),
            "pwd" => Pwd::from_args(cmd, args).map(Builtin::Pwd),
            "mkdir" => Mkdir::from_args(cmd, args).map(Builtin::Mkdir),
            "rmdir" => Rmdir::from_args(cmd, args).map(Builtin::Rmdir),
            "rm" => Rm::from_args(cmd, args).map(Builtin::Rm),
            "cat" => Cat::from_args(cmd, args).map(Builtin::Cat),
            "echo" => Echo::from_args(cmd, args).map(Builtin::Echo),
            "clear" => Clear::from_args(cmd, args).map(Builtin::Clear),
            "touch" => Touch::from_args(cmd, args).map(Builtin::Touch),
            "mv" => Mv::from_args(cmd, args).map(Builtin::Mv),
            "cp" => Cp::from_args(cmd, args).map(Builtin::Cp),
            "head" => Head::from_args(cmd, args).map(Builtin::Head),
            "tail" => Tail::from_args(cmd, args).map(Builtin::Tail),
            "find" => Find::from_args(cmd, args).map(Builtin::Find),
            _ => return None,
        })
    }

    /// Run the builtin against the wired output stream and session.
    pub fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        match self {
            Builtin::Cd(cmd) => cmd.run(stdout, env),
            Builtin::Exit(cmd) => cmd.run(stdout, env),
            Builtin::Ls(cmd) => cmd.run(stdout, env),
            Builtin::Pwd(cmd) => cmd.run(stdout, env),
            Builtin::Mkdir(cmd) => cmd.run(stdout, env),
            Builtin::Rmdir(cmd) => cmd.run(stdout, env),
            Builtin::Rm(cmd) => cmd.run(stdout, env),
            Builtin::Cat(cmd) => cmd.run(stdout, env),
            Builtin::Echo(cmd) => cmd.run(stdout, env),
            Builtin::Clear(cmd) => cmd.run(stdout, env),
            Builtin::Touch(cmd) => cmd.run(stdout, env),
            Builtin::Mv(cmd) => cmd.run(stdout, env),
            Builtin::Cp(cmd) => cmd.run(stdout, env),
            Builtin::Head(cmd) => cmd.run(stdout, env),
            Builtin::Tail(cmd) => cmd.run(stdout, env),
            Builtin::Find(cmd) => cmd.run(stdout, env),
        }
    }
}

#[derive(FromArgs)]
/// Change the shell's working directory.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to, absolute or relative to the current one.
    pub target: String,
}

impl Cd {
    fn run(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let target = PathBuf::from(&self.target);
        let new_dir = if target.is_absolute() {
            target
        } else {
            env.current_dir.join(target)
        };

        let canonical =
            fs::canonicalize(&new_dir).with_context(|| format!("cd: {}", self.target))?;
        if !canonical.is_dir() {
            bail!("cd: {}: Not a directory", self.target);
        }
        std::env::set_current_dir(&canonical).with_context(|| format!("cd: {}", self.target))?;
        env.current_dir = canonical;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Leave the shell.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored; a full shell would accept an exit status here.
    pub _args: Vec<String>,
}

impl Exit {
    fn run(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "Exiting oxsh.")?;
        env.should_exit = true;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// List the entries of a directory.
pub struct Ls {
    #[argh(positional)]
    /// directory to list; defaults to the current directory.
    pub path: Option<String>,
}

impl Ls {
    fn run(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        let path = self.path.as_deref().unwrap_or(".");
        let entries =
            fs::read_dir(path).with_context(|| format!("ls: cannot access '{}'", path))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("ls: cannot access '{}'", path))?;
            writeln!(stdout, "{}", entry.file_name().to_string_lossy())?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print the working directory.
pub struct Pwd {}

impl Pwd {
    fn run(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "{}", env.current_dir.display())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Create a directory.
pub struct Mkdir {
    #[argh(positional)]
    /// directory to create.
    pub dir: String,
}

impl Mkdir {
    fn run(self, _stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        fs::create_dir(&self.dir)
            .with_context(|| format!("mkdir: cannot create directory '{}'", self.dir))?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Remove an empty directory.
pub struct Rmdir {
    #[argh(positional)]
    /// directory to remove.
    pub dir: String,
}

impl Rmdir {
    fn run(self, _stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        fs::remove_dir(&self.dir)
            .with_context(|| format!("rmdir: failed to remove '{}'", self.dir))?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Remove a file.
pub struct Rm {
    #[argh(positional)]
    /// file to remove.
    pub file: String,
}

impl Rm {
    fn run(self, _stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        fs::remove_file(&self.file)
            .with_context(|| format!("rm: cannot remove '{}'", self.file))?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print a file to standard output.
pub struct Cat {
    #[argh(positional)]
    /// file to print.
    pub file: String,
}

impl Cat {
    fn run(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        let mut file =
            fs::File::open(&self.file).with_context(|| format!("cat: {}", self.file))?;
        std::io::copy(&mut file, stdout).with_context(|| format!("cat: {}", self.file))?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Write the arguments to standard output, separated by spaces.
pub struct Echo {
    #[argh(switch, short = 'n')]
    /// do not print the trailing newline.
    pub no_newline: bool,

    #[argh(positional, greedy)]
    /// values to print as-is, separated by spaces.
    pub args: Vec<String>,
}

impl Echo {
    fn run(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        let text = self.args.join(" ");
        if self.no_newline {
            write!(stdout, "{}", text)?;
        } else {
            writeln!(stdout, "{}", text)?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Clear the terminal screen.
pub struct Clear {}

impl Clear {
    fn run(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        // ANSI: erase display, then home the cursor.
        write!(stdout, "\x1b[2J\x1b[1;1H")?;
        stdout.flush()?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Create a file or refresh its modification time.
pub struct Touch {
    #[argh(positional)]
    /// file to create or update.
    pub file: String,
}

impl Touch {
    fn run(self, _stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        let file = fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.file)
            .with_context(|| format!("touch: cannot touch '{}'", self.file))?;
        file.set_modified(SystemTime::now())
            .with_context(|| format!("touch: cannot touch '{}'", self.file))?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Move or rename a file.
pub struct Mv {
    #[argh(positional)]
    /// source path.
    pub src: String,

    #[argh(positional)]
    /// destination path.
    pub dst: String,
}

impl Mv {
    fn run(self, _stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        fs::rename(&self.src, &self.dst)
            .with_context(|| format!("mv: cannot move '{}'", self.src))?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Copy a file.
pub struct Cp {
    #[argh(positional)]
    /// source path.
    pub src: String,

    #[argh(positional)]
    /// destination path.
    pub dst: String,
}

impl Cp {
    fn run(self, _stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        fs::copy(&self.src, &self.dst)
            .with_context(|| format!("cp: cannot copy '{}'", self.src))?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print the first ten lines of a file.
pub struct Head {
    #[argh(positional)]
    /// file to read.
    pub file: String,
}

impl Head {
    fn run(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        let file =
            fs::File::open(&self.file).with_context(|| format!("head: cannot open '{}'", self.file))?;
        for line in BufReader::new(file).lines().take(10) {
            let line = line.with_context(|| format!("head: cannot open '{}'", self.file))?;
            writeln!(stdout, "{}", line)?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print the last ten lines of a file.
pub struct Tail {
    #[argh(positional)]
    /// file to read.
    pub file: String,
}

impl Tail {
    fn run(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        let text = fs::read_to_string(&self.file)
            .with_context(|| format!("tail: cannot open '{}'", self.file))?;
        let lines: Vec<&str> = text.lines().collect();
        let skip = lines.len().saturating_sub(10);
        for line in &lines[skip..] {
            writeln!(stdout, "{}", line)?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Recursively search file names under the current directory.
pub struct Find {
    #[argh(positional)]
    /// substring to look for in file names.
    pub pattern: String,
}

impl Find {
    fn run(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        walk(Path::new("."), &self.pattern, stdout)?;
        Ok(0)
    }
}

/// Depth-first walk printing files whose name contains `pattern`.
/// Unreadable subtrees are skipped, not reported.
fn walk(dir: &Path, pattern: &str, out: &mut dyn Write) -> Result<()> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Ok(());
    };
    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            walk(&entry.path(), pattern, out)?;
        } else if entry.file_name().to_string_lossy().contains(pattern) {
            writeln!(out, "{}", entry.path().display())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{lock_current_dir, make_unique_temp_dir};
    use std::env as stdenv;

    fn test_env() -> Environment {
        Environment::new()
    }

    fn path_str(path: &Path) -> String {
        path.to_string_lossy().to_string()
    }

    #[test]
    fn lookup_maps_names_to_variants() {
        assert!(matches!(Builtin::lookup("pwd", &[]), Some(Ok(Builtin::Pwd(_)))));
        assert!(matches!(
            Builtin::lookup("echo", &["hi"]),
            Some(Ok(Builtin::Echo(_)))
        ));
        assert!(Builtin::lookup("not-a-builtin", &[]).is_none());
    }

    #[test]
    fn lookup_reports_missing_operand_as_usage_error() {
        let Some(Err(early)) = Builtin::lookup("mkdir", &[]) else {
            panic!("expected a usage error");
        };
        assert!(early.status.is_err());
        // argh lists the missing positional by its name.
        assert!(early.output.contains("dir"));
    }

    #[test]
    fn pwd_prints_session_dir() {
        let mut env = test_env();
        env.current_dir = PathBuf::from("/some/where");

        let mut out = Vec::new();
        let code = Pwd {}.run(&mut out, &mut env).unwrap();

        assert_eq!(code, 0);
        assert_eq!(String::from_utf8(out).unwrap(), "/some/where\n");
    }

    #[test]
    fn echo_with_and_without_newline() {
        let mut env = test_env();

        let mut out = Vec::new();
        let echo = Echo {
            no_newline: false,
            args: vec!["hello".into(), "world".into()],
        };
        echo.run(&mut out, &mut env).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "hello world\n");

        let mut out = Vec::new();
        let echo = Echo {
            no_newline: true,
            args: vec!["foo".into(), "bar".into()],
        };
        echo.run(&mut out, &mut env).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "foo bar");
    }

    #[test]
    fn exit_prints_farewell_and_flags_session() {
        let mut env = test_env();
        let mut out = Vec::new();

        let code = Exit { _args: Vec::new() }.run(&mut out, &mut env).unwrap();

        assert_eq!(code, 0);
        assert!(env.should_exit);
        assert_eq!(String::from_utf8(out).unwrap(), "Exiting oxsh.\n");
    }

    #[test]
    fn cd_to_absolute_path_updates_session_and_process() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir("cd_abs");
        let canonical = fs::canonicalize(&temp).unwrap();
        let orig = stdenv::current_dir().unwrap();

        let mut env = test_env();
        let cd = Cd {
            target: path_str(&canonical),
        };
        let res = cd.run(&mut std::io::sink(), &mut env);

        assert!(res.is_ok());
        assert_eq!(env.current_dir, canonical);
        assert_eq!(fs::canonicalize(stdenv::current_dir().unwrap()).unwrap(), canonical);

        stdenv::set_current_dir(orig).unwrap();
        let _ = fs::remove_dir_all(temp);
    }

    #[test]
    fn cd_to_missing_dir_errors_and_leaves_cwd() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();

        let mut env = test_env();
        let target = format!("missing_dir_{}", std::process::id());
        let err = Cd {
            target: target.clone(),
        }
        .run(&mut std::io::sink(), &mut env)
        .unwrap_err();

        assert!(format!("{:#}", err).contains(&target));
        assert_eq!(stdenv::current_dir().unwrap(), orig);
        assert_eq!(env.current_dir, orig);
    }

    #[test]
    fn cd_to_file_reports_not_a_directory() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir("cd_file");
        let file = temp.join("plain.txt");
        fs::write(&file, "x").unwrap();

        let mut env = test_env();
        let err = Cd {
            target: path_str(&file),
        }
        .run(&mut std::io::sink(), &mut env)
        .unwrap_err();

        assert!(format!("{:#}", err).contains("Not a directory"));
        let _ = fs::remove_dir_all(temp);
    }

    #[test]
    fn ls_lists_entries_of_given_dir() {
        let temp = make_unique_temp_dir("ls");
        fs::write(temp.join("alpha.txt"), "").unwrap();
        fs::write(temp.join("beta.txt"), "").unwrap();

        let mut out = Vec::new();
        let ls = Ls {
            path: Some(path_str(&temp)),
        };
        ls.run(&mut out, &mut test_env()).unwrap();

        let listing = String::from_utf8(out).unwrap();
        assert!(listing.contains("alpha.txt"));
        assert!(listing.contains("beta.txt"));

        let _ = fs::remove_dir_all(temp);
    }

    #[test]
    fn ls_on_missing_dir_errors() {
        let mut out = Vec::new();
        let err = Ls {
            path: Some("definitely_missing_dir_12345".into()),
        }
        .run(&mut out, &mut test_env())
        .unwrap_err();
        assert!(format!("{:#}", err).contains("ls: cannot access"));
    }

    #[test]
    fn mkdir_rmdir_roundtrip() {
        let temp = make_unique_temp_dir("mkdir");
        let dir = temp.join("sub");

        Mkdir {
            dir: path_str(&dir),
        }
        .run(&mut std::io::sink(), &mut test_env())
        .unwrap();
        assert!(dir.is_dir());

        Rmdir {
            dir: path_str(&dir),
        }
        .run(&mut std::io::sink(), &mut test_env())
        .unwrap();
        assert!(!dir.exists());

        let _ = fs::remove_dir_all(temp);
    }

    #[test]
    fn mkdir_existing_dir_errors() {
        let temp = make_unique_temp_dir("mkdir_dup");
        let err = Mkdir {
            dir: path_str(&temp),
        }
        .run(&mut std::io::sink(), &mut test_env())
        .unwrap_err();
        assert!(format!("{:#}", err).contains("mkdir: cannot create directory"));
        let _ = fs::remove_dir_all(temp);
    }

    #[test]
    fn touch_creates_and_rm_removes() {
        let temp = make_unique_temp_dir("touch");
        let file = temp.join("new.txt");

        Touch {
            file: path_str(&file),
        }
        .run(&mut std::io::sink(), &mut test_env())
        .unwrap();
        assert!(file.is_file());

        Rm {
            file: path_str(&file),
        }
        .run(&mut std::io::sink(), &mut test_env())
        .unwrap();
        assert!(!file.exists());

        let _ = fs::remove_dir_all(temp);
    }

    #[test]
    fn rm_missing_file_errors() {
        let err = Rm {
            file: "definitely_missing_file_12345".into(),
        }
        .run(&mut std::io::sink(), &mut test_env())
        .unwrap_err();
        assert!(format!("{:#}", err).contains("rm: cannot remove"));
    }

    #[test]
    fn cat_prints_file_contents() {
        let temp = make_unique_temp_dir("cat");
        let file = temp.join("data.txt");
        fs::write(&file, "hello\nworld\n").unwrap();

        let mut out = Vec::new();
        Cat {
            file: path_str(&file),
        }
        .run(&mut out, &mut test_env())
        .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "hello\nworld\n");
        let _ = fs::remove_dir_all(temp);
    }

    #[test]
    fn mv_and_cp_move_contents() {
        let temp = make_unique_temp_dir("mv_cp");
        let a = temp.join("a.txt");
        let b = temp.join("b.txt");
        let c = temp.join("c.txt");
        fs::write(&a, "payload").unwrap();

        Cp {
            src: path_str(&a),
            dst: path_str(&b),
        }
        .run(&mut std::io::sink(), &mut test_env())
        .unwrap();
        assert_eq!(fs::read_to_string(&b).unwrap(), "payload");
        assert!(a.exists());

        Mv {
            src: path_str(&b),
            dst: path_str(&c),
        }
        .run(&mut std::io::sink(), &mut test_env())
        .unwrap();
        assert!(!b.exists());
        assert_eq!(fs::read_to_string(&c).unwrap(), "payload");

        let _ = fs::remove_dir_all(temp);
    }

    #[test]
    fn head_and_tail_window_ten_lines() {
        let temp = make_unique_temp_dir("head_tail");
        let file = temp.join("lines.txt");
        let text: String = (1..=15).map(|i| format!("line {}\n", i)).collect();
        fs::write(&file, text).unwrap();

        let mut out = Vec::new();
        Head {
            file: path_str(&file),
        }
        .run(&mut out, &mut test_env())
        .unwrap();
        let head = String::from_utf8(out).unwrap();
        assert_eq!(head.lines().count(), 10);
        assert!(head.starts_with("line 1\n"));
        assert!(head.ends_with("line 10\n"));

        let mut out = Vec::new();
        Tail {
            file: path_str(&file),
        }
        .run(&mut out, &mut test_env())
        .unwrap();
        let tail = String::from_utf8(out).unwrap();
        assert_eq!(tail.lines().count(), 10);
        assert!(tail.starts_with("line 6\n"));
        assert!(tail.ends_with("line 15\n"));

        let _ = fs::remove_dir_all(temp);
    }

    #[test]
    fn head_short_file_prints_everything() {
        let temp = make_unique_temp_dir("head_short");
        let file = temp.join("short.txt");
        fs::write(&file, "only\ntwo\n").unwrap();

        let mut out = Vec::new();
        Head {
            file: path_str(&file),
        }
        .run(&mut out, &mut test_env())
        .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "only\ntwo\n");

        let _ = fs::remove_dir_all(temp);
    }

    #[test]
    fn find_walks_subdirectories_for_matching_names() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir("find");
        fs::create_dir_all(temp.join("nested/deeper")).unwrap();
        fs::write(temp.join("notes_report.txt"), "").unwrap();
        fs::write(temp.join("nested/deeper/annual_report.md"), "").unwrap();
        fs::write(temp.join("nested/unrelated.txt"), "").unwrap();

        let orig = stdenv::current_dir().unwrap();
        stdenv::set_current_dir(&temp).unwrap();
        let mut out = Vec::new();
        let res = Find {
            pattern: "report".into(),
        }
        .run(&mut out, &mut test_env());
        stdenv::set_current_dir(orig).unwrap();
        res.unwrap();

        let found = String::from_utf8(out).unwrap();
        assert!(found.contains("notes_report.txt"));
        assert!(found.contains("annual_report.md"));
        assert!(!found.contains("unrelated"));

        let _ = fs::remove_dir_all(temp);
    }
}
