//! Declared positional arguments and the parser every command shares.
//!
//! A command lists its [`Arg`]s once. The registry matches a statement's
//! words against that list before the command runs, so usage errors and
//! `help <command>` output look the same for every command.

use std::collections::HashMap;
use std::fmt::Write as _;

/// How many words an argument takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly one word.
    Required,
    /// Zero or one word.
    Optional,
    /// Any number of words, including none.
    Variadic,
}

/// What each word of an argument must parse as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Integer,
}

/// One positional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    name: String,
    arity: Arity,
    kind: ValueKind,
    default: Option<String>,
    help: Option<String>,
}

impl Arg {
    fn new(name: impl Into<String>, arity: Arity) -> Self {
        Self {
            name: name.into(),
            arity,
            kind: ValueKind::Text,
            default: None,
            help: None,
        }
    }

    pub fn required(name: impl Into<String>) -> Self {
        Self::new(name, Arity::Required)
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self::new(name, Arity::Optional)
    }

    pub fn variadic(name: impl Into<String>) -> Self {
        Self::new(name, Arity::Variadic)
    }

    /// Require every word to be a decimal `i32`.
    pub fn integer(mut self) -> Self {
        self.kind = ValueKind::Integer;
        self
    }

    /// Value reported when an optional argument is absent.
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help = Some(text.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// How the argument appears in a usage line.
    fn synopsis(&self) -> String {
        match self.arity {
            Arity::Required => self.name.clone(),
            Arity::Optional => format!("[{}]", self.name),
            Arity::Variadic => format!("[{} ...]", self.name),
        }
    }
}

/// Words that do not fit a command's declared arguments.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("the following arguments are required: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("unrecognized arguments: {}", .0.join(" "))]
    Unrecognized(Vec<String>),

    #[error("argument {name}: invalid integer value: '{value}'")]
    InvalidInteger { name: String, value: String },
}

/// Words bound to argument names by [`parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matches {
    values: HashMap<String, Vec<String>>,
}

impl Matches {
    /// First word bound to `name`, or its default.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values(name).first().map(String::as_str)
    }

    /// Every word bound to `name`.
    pub fn values(&self, name: &str) -> &[String] {
        self.values.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `name` as an integer. Declared integer arguments were checked by
    /// [`parse`], so this is only `None` when the argument is absent.
    pub fn integer(&self, name: &str) -> Option<i32> {
        self.value(name)?.parse().ok()
    }
}

/// Bind `words` to `spec` left to right.
///
/// Optional and variadic arguments only take words that are not needed
/// by required arguments declared after them.
pub fn parse(spec: &[Arg], words: &[String]) -> Result<Matches, UsageError> {
    let mut matches = Matches::default();
    let mut missing = Vec::new();
    let mut rest = words;

    for (index, arg) in spec.iter().enumerate() {
        let needed_after = spec[index + 1..]
            .iter()
            .filter(|a| a.arity == Arity::Required)
            .count();
        let spare = rest.len().saturating_sub(needed_after);
        let take = match arg.arity {
            Arity::Required => {
                if rest.is_empty() {
                    missing.push(arg.name.clone());
                    continue;
                }
                1
            }
            Arity::Optional => spare.min(1),
            Arity::Variadic => spare,
        };
        let (taken, remaining) = rest.split_at(take);
        rest = remaining;

        if arg.kind == ValueKind::Integer
            && let Some(bad) = taken.iter().find(|w| w.parse::<i32>().is_err())
        {
            return Err(UsageError::InvalidInteger {
                name: arg.name.clone(),
                value: bad.clone(),
            });
        }
        let bound = if taken.is_empty() {
            arg.default.iter().cloned().collect()
        } else {
            taken.to_vec()
        };
        if !bound.is_empty() {
            matches.values.insert(arg.name.clone(), bound);
        }
    }

    if !missing.is_empty() {
        return Err(UsageError::Missing(missing));
    }
    if !rest.is_empty() {
        return Err(UsageError::Unrecognized(rest.to_vec()));
    }
    Ok(matches)
}

/// `usage: <command> <synopsis...>`
pub fn usage(command: &str, spec: &[Arg]) -> String {
    let mut line = format!("usage: {command}");
    for arg in spec {
        line.push(' ');
        line.push_str(&arg.synopsis());
    }
    line
}

/// Full help text: usage line, description, then one line per argument.
pub fn describe(command: &str, description: &str, spec: &[Arg]) -> String {
    let mut text = usage(command, spec);
    if !description.is_empty() {
        let _ = write!(text, "\n\n{description}");
    }
    if !spec.is_empty() {
        text.push_str("\n\narguments:");
        let width = spec.iter().map(|a| a.name.len()).max().unwrap_or(0);
        for arg in spec {
            match &arg.help {
                Some(help) => {
                    let _ = write!(text, "\n  {:<width$}  {help}", arg.name);
                }
                None => {
                    let _ = write!(text, "\n  {}", arg.name);
                }
            }
        }
    }
    text
}
