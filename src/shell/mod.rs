//! Line-oriented front end: reads lines, feeds the parser, dispatches statements.
//!
//! The shell reads from any `BufRead`, so the same loop serves a terminal,
//! a pipe, or a test buffer.

/// Declared command arguments and the shared argument parser.
pub mod args;
/// Command trait, registry and built-in commands.
pub mod command;
/// Variable store used for prompt formatting.
pub mod environment;
/// Prompting line reader.
pub mod stream;

pub use args::{Arg, Matches, UsageError};
pub use command::{
    Command, CommandRegistry, ExitCommand, HelpCommand, Invocation, Outcome, StubCommand,
    render_help,
};
pub use environment::Environment;
pub use stream::InputStream;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use crate::config::Config;
use crate::parse::{self, Grammar, Parser, Syntax};

/// One shell session.
pub struct Shell {
    parser: Parser,
    registry: CommandRegistry,
    env: Environment,
}

impl Shell {
    pub fn new(parser: Parser, registry: CommandRegistry, env: Environment) -> Self {
        Self {
            parser,
            registry,
            env,
        }
    }

    /// A shell with the built-in commands, the configured prompts and syntax.
    pub fn from_config(config: &Config) -> Result<Self, parse::Error> {
        let parser = if config.syntax == Syntax::default() {
            Parser::new()
        } else {
            Parser::with_grammar(Arc::new(Grammar::from_syntax(&config.syntax)?))?
        };
        Ok(Self::new(
            parser,
            CommandRegistry::with_builtins(),
            Environment::with_prompts(&config.prompt),
        ))
    }

    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    /// The formatted `prompt2` while input is unfinished, else `prompt`.
    pub fn prompt(&self) -> String {
        let key = if self.parser.needs_more_input() {
            "prompt2"
        } else {
            "prompt"
        };
        let template = self.env.get(key).unwrap_or_default();
        self.env.format(&template)
    }

    /// Feed one line and run every statement it completes.
    ///
    /// Returns the exit status once a command asks to exit. A parse error
    /// is reported and the unfinished statement is abandoned.
    pub fn send_line(&mut self, line: &str, out: &mut dyn Write) -> io::Result<Option<i32>> {
        self.parser.send_line(line);
        let mut failed = false;
        for result in self.parser.drain() {
            match result {
                Ok(statement) => {
                    if let Outcome::Exit(code) = self.registry.dispatch(&statement, &mut self.env, out)? {
                        return Ok(Some(code));
                    }
                }
                Err(err) => {
                    log::error!("parse error: {err}");
                    writeln!(out, "parse error: {err}")?;
                    failed = true;
                }
            }
        }
        if failed {
            self.parser.reset();
        }
        Ok(None)
    }

    /// Run until end of input or an `exit`; returns the exit status.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W, interactive: bool) -> io::Result<i32> {
        let mut stream = InputStream::new(input, interactive);
        loop {
            let prompt = self.prompt();
            let Some(line) = stream.read_line(&prompt, &mut output)? else {
                break;
            };
            if let Some(code) = self.send_line(line, &mut output)? {
                output.flush()?;
                return Ok(code);
            }
        }

        if self.parser.needs_more_input() {
            log::warn!(
                "discarding unfinished input at end of stream (depth {})",
                self.parser.depth()
            );
            self.parser.reset();
        }
        if stream.is_interactive() {
            writeln!(output, "exit")?;
        }
        output.flush()?;
        Ok(0)
    }
}
