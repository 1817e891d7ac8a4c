use argh::FromArgs;
use log::error;
use oxsh::Interpreter;

#[derive(FromArgs)]
/// oxsh — a small interactive shell.
struct Options {
    #[argh(option, short = 'c')]
    /// run a single command line and exit.
    command: Option<String>,

    #[argh(positional)]
    /// script file to execute line by line instead of reading the terminal.
    script: Option<String>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let options: Options = argh::from_env();
    let mut shell = Interpreter::new();

    if let Some(line) = options.command {
        match shell.run_line(&line) {
            Ok(code) => std::process::exit(code),
            Err(err) => {
                eprintln!("{err:#}");
                std::process::exit(1);
            }
        }
    }

    if let Some(script) = options.script {
        run_script(&mut shell, &script);
        return;
    }

    if let Err(err) = shell.repl() {
        error!("{err}");
        std::process::exit(1);
    }
}

fn run_script(shell: &mut Interpreter, path: &str) {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("oxsh: {}: {}", path, err);
            std::process::exit(1);
        }
    };
    for line in text.lines() {
        if let Err(err) = shell.run_line(line) {
            eprintln!("{err:#}");
        }
        if shell.env().should_exit {
            break;
        }
    }
}
