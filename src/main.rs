//! lineshell: a line-oriented command shell.
//!
//! Reads statements from stdin and dispatches them to built-in commands
//! (`help`, `exit`, `stub`). Prompts are shown when stdin is a terminal.
//!
//! Flags:
//!   --dump-config   print the merged configuration as TOML and exit
//!   --tokenize      print each statement read from stdin as a JSON array
//!   --verbose       log at debug level to stderr

use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::Arc;

use lineshell::config::Config;
use lineshell::parse::{Grammar, Parser};
use lineshell::shell::{Shell, StubCommand};

const FLAGS: &[&str] = &["--dump-config", "--tokenize", "--verbose"];

/// Print every statement on stdin as a JSON array, one per line.
fn tokenize_stdin(config: &Config) -> Result<(), String> {
    let grammar = Grammar::from_syntax(&config.syntax).map_err(|e| e.to_string())?;
    let mut parser = Parser::with_grammar(Arc::new(grammar)).map_err(|e| e.to_string())?;
    let mut out = io::stdout().lock();

    for line in io::stdin().lock().lines() {
        let line = line.map_err(|e| format!("failed to read stdin: {e}"))?;
        parser.send_line(&line);
        for statement in parser.drain() {
            let statement = statement.map_err(|e| format!("parse error: {e}"))?;
            let json = serde_json::to_string(statement.words()).map_err(|e| e.to_string())?;
            writeln!(out, "{json}").map_err(|e| e.to_string())?;
        }
    }
    if parser.needs_more_input() {
        log::warn!("unfinished statement at end of input (depth {})", parser.depth());
    }
    Ok(())
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Some(unknown) = args.iter().find(|a| !FLAGS.contains(&a.as_str())) {
        eprintln!("lineshell: unknown option: {unknown}");
        eprintln!("usage: lineshell [{}]", FLAGS.join("] ["));
        std::process::exit(2);
    }
    let has_flag = |flag: &str| args.iter().any(|a| a == flag);

    let config = Config::load();

    if has_flag("--dump-config") {
        match config.to_toml() {
            Ok(text) => print!("{text}"),
            Err(e) => {
                eprintln!("lineshell: failed to render config: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    lineshell::logging::init(&config.logging, has_flag("--verbose"));

    if has_flag("--tokenize") {
        if let Err(e) = tokenize_stdin(&config) {
            eprintln!("lineshell: {e}");
            std::process::exit(1);
        }
        return;
    }

    let mut shell = match Shell::from_config(&config) {
        Ok(shell) => shell,
        Err(e) => {
            eprintln!("lineshell: invalid syntax configuration: {e}");
            std::process::exit(1);
        }
    };
    shell.registry_mut().register(StubCommand);

    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    match shell.run(stdin.lock(), io::stdout().lock(), interactive) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("lineshell: {e}");
            std::process::exit(1);
        }
    }
}
