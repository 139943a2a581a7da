//! lineshell: an incremental shell-syntax tokenizer and a small command shell.
//!
//! Text is fed to a [`Parser`](parse::Parser) one physical line at a time
//! and drained as [`Statement`](parse::Statement)s: non-empty word lists
//! split on whitespace, with single and double quotes, backslash escapes,
//! `#` comments, line continuation, and `;`/newline statement separators.
//! Nothing is expanded or executed by the parser itself.
//!
//! # Architecture
//!
//! - **[`parse`]**: Tokenizer: lexical mode tables, the context-stack parser, statement types.
//! - **[`shell`]**: Front end: prompting line reader, command registry, environment.
//! - **[`config`]**: Configuration loading: embedded defaults + user overlay merge.
//! - **[`logging`]**: Logger setup for the binary.

/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Logger initialization.
pub mod logging;
/// Incremental tokenizer: grammar tables, parser, statement types.
pub mod parse;
/// Interactive and batch front end built on the parser.
pub mod shell;

use parse::{Error, Parser, Statement};

/// Tokenize complete text with the default syntax.
///
/// Each line of `text` is fed separately; a final line without a newline
/// is still terminated. Unfinished quotes at the end are dropped.
pub fn tokenize(text: &str) -> Result<Vec<Statement>, Error> {
    let mut parser = Parser::new();
    for line in text.lines() {
        parser.send_line(line);
    }
    parser.statements()
}
