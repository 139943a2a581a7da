//! Incremental statement parser.
//!
//! Callers append text with [`Parser::send_line`] and then pull whatever
//! statements are complete with [`Parser::drain`]. All scanning state
//! lives on the parser, so a quote or continuation left open by one line
//! is simply resumed by the next.

use std::collections::VecDeque;
use std::sync::Arc;

use super::grammar::{ContextId, Grammar};
use super::syntax::NEWLINE;
use super::types::{Boundary, Directive, Statement};
use super::Error;

/// Per-session tokenizer state.
#[derive(Debug, Clone)]
pub struct Parser {
    grammar: Arc<Grammar>,
    /// Text appended but not yet scanned.
    buffer: String,
    state: State,
}

/// Everything the character loop mutates.
#[derive(Debug, Clone)]
struct State {
    token: String,
    statement: Vec<String>,
    pending: VecDeque<Statement>,
    /// Never empty; the bottom entry is always the base context.
    stack: Vec<ContextId>,
}

impl State {
    fn new() -> Self {
        Self {
            token: String::new(),
            statement: Vec::new(),
            pending: VecDeque::new(),
            stack: vec![Grammar::BASE],
        }
    }

    fn current(&self) -> ContextId {
        self.stack.last().copied().unwrap_or(Grammar::BASE)
    }

    /// Run `character` through the current context's directive list.
    fn dispatch(&mut self, grammar: &Grammar, character: char) -> Result<Option<Boundary>, Error> {
        let context = grammar.context(self.current());
        for directive in context.directives(character) {
            match directive {
                Directive::Literal(text) => self.token.push_str(text),
                Directive::Include => self.token.push(character),
                Directive::PushContext(id) => {
                    log::trace!("enter {} on {character:?}", grammar.context(*id).name());
                    self.stack.push(*id);
                }
                Directive::PopContext => {
                    if self.stack.len() == 1 {
                        return Err(Error::PopBase { character });
                    }
                    let left = self.stack.pop().unwrap_or(Grammar::BASE);
                    log::trace!("leave {} on {character:?}", grammar.context(left).name());
                }
                // Verified grammars only revisit after a net pop, so this
                // recursion is bounded by the stack depth.
                Directive::Revisit => return self.dispatch(grammar, character),
                // Named after the context current at the failure, which
                // differs from the dispatching one after a pop in the same list.
                Directive::Fail(message) => {
                    return Err(Error::Rejected {
                        character,
                        context: grammar.context(self.current()).name().to_string(),
                        message: message.clone(),
                    });
                }
                Directive::Boundary(boundary) => return Ok(Some(*boundary)),
            }
        }
        Ok(None)
    }

    /// Scan one character and fold any boundary into token/statement/pending.
    fn step(&mut self, grammar: &Grammar, character: char) -> Result<(), Error> {
        let Some(boundary) = self.dispatch(grammar, character)? else {
            return Ok(());
        };
        if self.stack.len() != 1 {
            return Err(Error::BoundaryOutsideBase {
                context: grammar.context(self.current()).name().to_string(),
                depth: self.stack.len(),
            });
        }
        if !self.token.is_empty() {
            self.statement.push(std::mem::take(&mut self.token));
        }
        if boundary == Boundary::EmitStatements && !self.statement.is_empty() {
            let statement = Statement::new(std::mem::take(&mut self.statement));
            log::debug!("statement: {}", statement.to_shell_string());
            self.pending.push_back(statement);
        }
        Ok(())
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// A parser using the shared default grammar.
    pub fn new() -> Self {
        Self::with_verified(Grammar::shared())
    }

    /// A parser using a custom grammar, which is verified first.
    pub fn with_grammar(grammar: Arc<Grammar>) -> Result<Self, Error> {
        grammar.verify()?;
        Ok(Self::with_verified(grammar))
    }

    fn with_verified(grammar: Arc<Grammar>) -> Self {
        Self {
            grammar,
            buffer: String::new(),
            state: State::new(),
        }
    }

    /// Append one physical line. Trailing CR/LF are replaced by a single newline.
    pub fn send_line(&mut self, line: &str) {
        self.buffer.push_str(line.trim_end_matches(['\r', '\n']));
        self.buffer.push(NEWLINE);
    }

    /// Append raw text verbatim, without line normalization.
    pub fn push_str(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    /// True when no partial token, statement or unreleased statement is held.
    ///
    /// This does not look at the context stack: directly after an opening
    /// quote it still reports true. Use [`needs_more_input`](Self::needs_more_input)
    /// to decide whether a continuation line is required.
    pub fn is_complete(&self) -> bool {
        self.state.token.is_empty()
            && self.state.statement.is_empty()
            && self.state.pending.is_empty()
    }

    /// Number of contexts on the stack; 1 means the base context.
    pub fn depth(&self) -> usize {
        self.state.stack.len()
    }

    /// True while a statement is unfinished or a quote, escape or comment is open.
    pub fn needs_more_input(&self) -> bool {
        !self.is_complete() || self.depth() > 1
    }

    /// Text appended but not yet scanned.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Discard all buffered text and partial state, returning to the base context.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.state = State::new();
    }

    /// Lazily yield the statements completed by the buffered text.
    ///
    /// The iterator scans only as far as needed for the next statement.
    /// Dropping it removes exactly the scanned text from the buffer, and
    /// statements already released but not yet yielded are returned first
    /// by the next call. After an error the iterator yields nothing more.
    pub fn drain(&mut self) -> Drain<'_> {
        Drain {
            parser: self,
            scanned: 0,
            failed: false,
        }
    }

    /// Collect every statement currently available.
    pub fn statements(&mut self) -> Result<Vec<Statement>, Error> {
        self.drain().collect()
    }
}

/// Iterator returned by [`Parser::drain`].
#[derive(Debug)]
pub struct Drain<'a> {
    parser: &'a mut Parser,
    /// Byte length of the buffer prefix already scanned.
    scanned: usize,
    failed: bool,
}

impl Iterator for Drain<'_> {
    type Item = Result<Statement, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let parser = &mut *self.parser;
        loop {
            if let Some(statement) = parser.state.pending.pop_front() {
                return Some(Ok(statement));
            }
            if self.failed {
                return None;
            }
            let character = parser.buffer[self.scanned..].chars().next()?;
            self.scanned += character.len_utf8();
            if let Err(err) = parser.state.step(&parser.grammar, character) {
                self.failed = true;
                return Some(Err(err));
            }
        }
    }
}

impl Drop for Drain<'_> {
    fn drop(&mut self) {
        self.parser.buffer.replace_range(..self.scanned, "");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::grammar::Context;

    fn words(parser: &mut Parser) -> Vec<Vec<String>> {
        parser
            .statements()
            .unwrap()
            .into_iter()
            .map(Statement::into_words)
            .collect()
    }

    #[test]
    fn send_line_normalizes_line_endings() {
        let mut parser = Parser::new();
        parser.send_line("a\r\n");
        parser.send_line("b");
        parser.send_line("c\n\n");
        assert_eq!(parser.buffered(), "a\nb\nc\n");
    }

    #[test]
    fn drain_consumes_buffer() {
        let mut parser = Parser::new();
        parser.send_line("stub 1");
        assert_eq!(words(&mut parser), vec![vec!["stub", "1"]]);
        assert_eq!(parser.buffered(), "");
        assert!(parser.is_complete());
    }

    #[test]
    fn partial_statement_is_incomplete() {
        let mut parser = Parser::new();
        parser.push_str("stub 1");
        assert!(words(&mut parser).is_empty());
        assert!(!parser.is_complete());
        assert_eq!(parser.buffered(), "");
        parser.push_str("\n");
        assert_eq!(words(&mut parser), vec![vec!["stub", "1"]]);
    }

    #[test]
    fn open_quote_reports_complete_but_needs_input() {
        let mut parser = Parser::new();
        parser.push_str("\"");
        assert!(words(&mut parser).is_empty());
        assert!(parser.is_complete());
        assert_eq!(parser.depth(), 2);
        assert!(parser.needs_more_input());
    }

    #[test]
    fn continuation_leaves_partial_token() {
        let mut parser = Parser::new();
        parser.send_line("stub 1\\");
        assert!(words(&mut parser).is_empty());
        assert_eq!(parser.depth(), 1);
        assert!(parser.needs_more_input());
    }

    #[test]
    fn comment_depth_closes_at_newline() {
        let mut parser = Parser::new();
        parser.push_str("stub # note");
        assert!(words(&mut parser).is_empty());
        assert_eq!(parser.depth(), 2);
        parser.push_str("\n");
        assert_eq!(words(&mut parser), vec![vec!["stub"]]);
        assert_eq!(parser.depth(), 1);
    }

    #[test]
    fn drain_is_lazy() {
        let mut parser = Parser::new();
        parser.send_line("a; b; c");
        {
            let mut drain = parser.drain();
            let first = drain.next().unwrap().unwrap();
            assert_eq!(first.command(), "a");
        }
        assert_eq!(parser.buffered(), " b; c\n");
        assert_eq!(words(&mut parser), vec![vec!["b"], vec!["c"]]);
    }

    #[test]
    fn reset_discards_partial_state() {
        let mut parser = Parser::new();
        parser.send_line("stub \"open");
        assert!(words(&mut parser).is_empty());
        parser.reset();
        assert!(!parser.needs_more_input());
        parser.send_line("stub");
        assert_eq!(words(&mut parser), vec![vec!["stub"]]);
    }

    #[test]
    fn multibyte_characters_survive() {
        let mut parser = Parser::new();
        parser.send_line("echo héllo 'wörld ✓'");
        assert_eq!(words(&mut parser), vec![vec!["echo", "héllo", "wörld ✓"]]);
    }

    fn failing_grammar() -> Arc<Grammar> {
        let grammar = Grammar::new(
            Context::new("general")
                .on(' ', [Directive::Boundary(Boundary::EndToken)])
                .on('\n', [Directive::Boundary(Boundary::EmitStatements)])
                .on('$', [Directive::Fail("expansion is not supported".into())])
                .otherwise([Directive::Include]),
        );
        Arc::new(grammar)
    }

    #[test]
    fn fail_directive_surfaces_from_drain() {
        let mut parser = Parser::with_grammar(failing_grammar()).unwrap();
        parser.send_line("ok 1");
        parser.send_line("echo $HOME");
        let mut drain = parser.drain();
        assert_eq!(drain.next().unwrap().unwrap().into_words(), vec!["ok", "1"]);
        assert_eq!(
            drain.next().unwrap().unwrap_err(),
            Error::Rejected {
                character: '$',
                context: "general".into(),
                message: "expansion is not supported".into(),
            }
        );
        assert!(drain.next().is_none());
        drop(drain);
        assert_eq!(parser.buffered(), "HOME\n");
    }

    #[test]
    fn fail_after_pop_names_current_context() {
        let mut grammar = Grammar::new(Context::new("general").otherwise([Directive::Include]));
        let brace = grammar.add(
            Context::new("brace")
                .on('}', [Directive::PopContext])
                .on(
                    '\n',
                    [Directive::PopContext, Directive::Fail("unclosed brace".into())],
                )
                .otherwise([Directive::Include]),
        );
        let general = grammar.context_mut(Grammar::BASE);
        general.insert('{', [Directive::PushContext(brace)]);
        general.insert('\n', [Directive::Boundary(Boundary::EmitStatements)]);

        let mut parser = Parser::with_grammar(Arc::new(grammar)).unwrap();
        parser.send_line("{a");
        assert_eq!(
            parser.statements().unwrap_err(),
            Error::Rejected {
                character: '\n',
                context: "general".into(),
                message: "unclosed brace".into(),
            }
        );
        assert_eq!(parser.depth(), 1);
    }

    #[test]
    fn reentering_base_then_boundary_is_structural() {
        let grammar = Grammar::new(
            Context::new("general")
                .on('(', [Directive::PushContext(Grammar::BASE)])
                .on(' ', [Directive::Boundary(Boundary::EndToken)])
                .on('\n', [Directive::Boundary(Boundary::EmitStatements)])
                .otherwise([Directive::Include]),
        );
        let mut parser = Parser::with_grammar(Arc::new(grammar)).unwrap();
        parser.push_str("a( b");
        let mut drain = parser.drain();
        let err = drain.next().unwrap().unwrap_err();
        assert_eq!(
            err,
            Error::BoundaryOutsideBase {
                context: "general".into(),
                depth: 2,
            }
        );
        assert!(err.is_structural());
        assert!(drain.next().is_none());
    }

    #[test]
    fn unverifiable_grammar_rejected() {
        let mut grammar = Grammar::new(Context::new("general"));
        grammar.add(Context::new("bad").otherwise([Directive::Boundary(Boundary::EndToken)]));
        assert!(Parser::with_grammar(Arc::new(grammar)).is_err());
    }

    #[test]
    fn pop_at_base_is_structural_error() {
        let grammar = Grammar::new(Context::new("general").on(')', [Directive::PopContext]));
        let mut parser = Parser::with_grammar(Arc::new(grammar)).unwrap();
        parser.push_str(")");
        let err = parser.statements().unwrap_err();
        assert_eq!(err, Error::PopBase { character: ')' });
        assert!(err.is_structural());
    }

    #[test]
    fn custom_grammar_revisit_closes_nested_mode() {
        let mut grammar = Grammar::new(Context::new("general").otherwise([Directive::Include]));
        let bracket = grammar.add(
            Context::new("bracket")
                .on(']', [Directive::PopContext])
                .on(';', [Directive::PopContext, Directive::Revisit])
                .otherwise([Directive::Include]),
        );
        let general = grammar.context_mut(Grammar::BASE);
        general.insert('[', [Directive::PushContext(bracket)]);
        general.insert(';', [Directive::Boundary(Boundary::EmitStatements)]);
        general.insert(' ', [Directive::Boundary(Boundary::EndToken)]);

        let mut parser = Parser::with_grammar(Arc::new(grammar)).unwrap();
        parser.push_str("a [b c];x [y;");
        assert_eq!(words(&mut parser), vec![vec!["a", "b c"], vec!["x", "y"]]);
    }
}
