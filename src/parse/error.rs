/// Errors raised while building a grammar or scanning input.
///
/// Unterminated quotes, escapes and comments are not errors: they leave
/// the parser waiting for more input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A character was assigned to two character classes.
    #[error("character {character:?} is configured as both {first} and {second}")]
    ConflictingSyntax {
        character: char,
        first: &'static str,
        second: &'static str,
    },

    /// The mode tables failed structural verification.
    #[error("invalid grammar in context '{context}': {reason}")]
    InvalidGrammar { context: String, reason: String },

    /// A boundary was reported while inside a nested context.
    #[error("boundary reported in context '{context}' at depth {depth}")]
    BoundaryOutsideBase { context: String, depth: usize },

    /// A context pop was attempted with only the base context on the stack.
    #[error("cannot leave the base context (character {character:?})")]
    PopBase { character: char },

    /// A `Fail` directive rejected the input.
    ///
    /// `context` is the context on top of the stack when `Fail` ran, so a
    /// list that pops before failing names the context it returned to.
    #[error("{message} (character {character:?} in context '{context}')")]
    Rejected {
        character: char,
        context: String,
        message: String,
    },
}

impl Error {
    /// Structural errors point at defective mode tables rather than bad input.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Error::InvalidGrammar { .. } | Error::BoundaryOutsideBase { .. } | Error::PopBase { .. }
        )
    }
}
