//! Types shared by the grammar tables and the parser loop.

/// Boundary reported to the driving loop when a character ends a word or a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// The pending token (if any) is complete.
    EndToken,
    /// The pending token and statement (if any) are complete and every
    /// queued statement is released to the caller.
    EmitStatements,
}

impl Boundary {
    /// Short name used in log lines and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Boundary::EndToken => "end-token",
            Boundary::EmitStatements => "emit-statements",
        }
    }
}

/// One atomic action taken for one character in one context.
///
/// A context maps each character to an ordered list of directives which
/// the parser applies in sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Append fixed text to the pending token. An empty string discards the character.
    Literal(String),
    /// Append the triggering character itself.
    Include,
    /// Enter a new lexical mode.
    PushContext(super::ContextId),
    /// Leave the current lexical mode.
    PopContext,
    /// Dispatch the same character again against the context that is now current.
    Revisit,
    /// Reject the character with the given message.
    Fail(String),
    /// Stop processing this character and report a boundary.
    Boundary(Boundary),
}

impl Directive {
    /// `Literal` from anything string-like.
    pub fn literal(text: impl Into<String>) -> Self {
        Directive::Literal(text.into())
    }

    /// True for directives after which nothing else in the list may run.
    pub(crate) fn is_terminal(&self) -> bool {
        matches!(
            self,
            Directive::Revisit | Directive::Fail(_) | Directive::Boundary(_)
        )
    }
}

/// A complete statement: one or more words, the first conventionally the command name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    words: Vec<String>,
}

impl Statement {
    /// Wrap a non-empty word list.
    pub(crate) fn new(words: Vec<String>) -> Self {
        debug_assert!(!words.is_empty(), "statements are never empty");
        Self { words }
    }

    /// The command name (first word).
    pub fn command(&self) -> &str {
        &self.words[0]
    }

    /// Words after the command name.
    pub fn args(&self) -> &[String] {
        &self.words[1..]
    }

    /// All words, command name included.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn into_words(self) -> Vec<String> {
        self.words
    }

    /// Render the statement as shell-quoted text, for logs and diagnostics.
    pub fn to_shell_string(&self) -> String {
        shlex::try_join(self.words.iter().map(String::as_str))
            .unwrap_or_else(|_| self.words.join(" "))
    }
}
