//! Command dispatch: a registry of named commands keyed by a statement's first word.

use std::collections::HashMap;
use std::io::{self, Write};

use super::Environment;
use super::args::{self, Arg, Matches};
use crate::parse::Statement;

/// What the shell loop does after a command returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    /// Stop the shell with this status.
    Exit(i32),
}

/// Everything a command may touch while it runs.
pub struct Invocation<'a> {
    /// The registry the command was dispatched from (used by `help`).
    pub registry: &'a CommandRegistry,
    pub env: &'a mut Environment,
    pub out: &'a mut dyn Write,
}

/// Trait for shell commands.
///
/// A command declares its positional arguments; the registry binds the
/// statement's words to them and reports usage errors before `run` is called.
pub trait Command: Send + Sync {
    /// The name the command is dispatched by.
    fn name(&self) -> &str;
    /// Description shown by `help <name>` under the usage line.
    fn help(&self) -> &str;
    /// Declared arguments. The default accepts any words as `arg`.
    fn args(&self) -> Vec<Arg> {
        vec![Arg::variadic("arg")]
    }
    /// Run with the words after the command name, bound to [`args`](Self::args).
    fn run(&self, args: &Matches, inv: &mut Invocation<'_>) -> io::Result<Outcome>;
}

/// Usage line, description and argument help for `command`.
pub fn render_help(command: &dyn Command) -> String {
    args::describe(command.name(), command.help(), &command.args())
}

type Handler = dyn Fn(&Matches, &mut Invocation<'_>) -> io::Result<Outcome> + Send + Sync;

/// A command backed by a closure.
struct FnCommand {
    name: String,
    help: String,
    handler: Box<Handler>,
}

impl Command for FnCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn help(&self) -> &str {
        &self.help
    }

    fn run(&self, args: &Matches, inv: &mut Invocation<'_>) -> io::Result<Outcome> {
        (self.handler)(args, inv)
    }
}

/// Registry of commands, keyed by name.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn Command>>,
}

impl CommandRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding `help` and `exit`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(HelpCommand);
        registry.register(ExitCommand);
        registry
    }

    /// Add a command, replacing any command of the same name.
    pub fn register(&mut self, command: impl Command + 'static) {
        self.commands
            .insert(command.name().to_string(), Box::new(command));
    }

    /// Add a closure as a command. Its words are bound to a variadic `arg`.
    pub fn register_fn<F>(&mut self, name: &str, help: &str, handler: F)
    where
        F: Fn(&Matches, &mut Invocation<'_>) -> io::Result<Outcome> + Send + Sync + 'static,
    {
        self.register(FnCommand {
            name: name.to_string(),
            help: help.to_string(),
            handler: Box::new(handler),
        });
    }

    /// Look up a command by exact name.
    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|b| b.as_ref())
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Run the command named by the statement's first word.
    ///
    /// Unknown commands and usage errors print a message and the shell continues.
    pub fn dispatch(
        &self,
        statement: &Statement,
        env: &mut Environment,
        out: &mut dyn Write,
    ) -> io::Result<Outcome> {
        let name = statement.command();
        let Some(command) = self.get(name) else {
            log::info!("unknown command: {name}");
            writeln!(out, "No such command: '{name}'")?;
            return Ok(Outcome::Continue);
        };
        log::debug!("dispatch: {}", statement.to_shell_string());
        let spec = command.args();
        let matches = match args::parse(&spec, statement.args()) {
            Ok(matches) => matches,
            Err(err) => {
                log::info!("{name}: {err}");
                writeln!(out, "{}", args::usage(name, &spec))?;
                writeln!(out, "{name}: error: {err}")?;
                return Ok(Outcome::Continue);
            }
        };
        let mut inv = Invocation {
            registry: self,
            env,
            out,
        };
        command.run(&matches, &mut inv)
    }
}

/// `help [command]`: list commands, or show one command's help.
pub struct HelpCommand;

impl Command for HelpCommand {
    fn name(&self) -> &str {
        "help"
    }

    fn help(&self) -> &str {
        "List the available commands, or describe one."
    }

    fn args(&self) -> Vec<Arg> {
        vec![Arg::optional("command").help("The command to describe")]
    }

    fn run(&self, args: &Matches, inv: &mut Invocation<'_>) -> io::Result<Outcome> {
        match args.value("command") {
            None => {
                for name in inv.registry.names() {
                    writeln!(inv.out, "{name}")?;
                }
            }
            Some(name) => match inv.registry.get(name) {
                Some(command) => writeln!(inv.out, "{}", render_help(command))?,
                None => writeln!(inv.out, "No help available for unknown command '{name}'")?,
            },
        }
        Ok(Outcome::Continue)
    }
}

/// `exit [status]`: stop the shell. The status defaults to 0.
pub struct ExitCommand;

impl Command for ExitCommand {
    fn name(&self) -> &str {
        "exit"
    }

    fn help(&self) -> &str {
        "Terminate the shell process."
    }

    fn args(&self) -> Vec<Arg> {
        vec![
            Arg::optional("status")
                .integer()
                .default_value("0")
                .help("The return code of the process. Default is 0"),
        ]
    }

    fn run(&self, args: &Matches, _inv: &mut Invocation<'_>) -> io::Result<Outcome> {
        Ok(Outcome::Exit(args.integer("status").unwrap_or(0)))
    }
}

/// `stub [arg ...]`: print the arguments as a JSON array.
pub struct StubCommand;

impl Command for StubCommand {
    fn name(&self) -> &str {
        "stub"
    }

    fn help(&self) -> &str {
        "Print the arguments as a JSON array."
    }

    fn args(&self) -> Vec<Arg> {
        vec![Arg::variadic("arg")]
    }

    fn run(&self, args: &Matches, inv: &mut Invocation<'_>) -> io::Result<Outcome> {
        let rendered = serde_json::to_string(args.values("arg")).map_err(io::Error::other)?;
        writeln!(inv.out, "{rendered}")?;
        Ok(Outcome::Continue)
    }
}
