//! Character classes recognised by the default grammar.

use serde::{Deserialize, Serialize};

use super::Error;

/// The newline always ends a statement and closes comments.
pub const NEWLINE: char = '\n';

/// Characters with special meaning to the default grammar.
///
/// Newline is implicit: it always separates statements and may not be
/// reassigned to another class.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Syntax {
    /// Characters that end a word.
    pub whitespace: String,
    /// Characters other than newline that end a statement.
    pub separators: String,
    pub escape: char,
    /// Opens and closes a quote where the escape character may escape the quote.
    pub double_quote: char,
    /// Opens and closes a quote with no escape processing.
    pub single_quote: char,
    /// Starts a comment running to the end of the line.
    pub comment: char,
}

impl Default for Syntax {
    fn default() -> Self {
        Self {
            whitespace: " \t\r".into(),
            separators: ";".into(),
            escape: '\\',
            double_quote: '"',
            single_quote: '\'',
            comment: '#',
        }
    }
}

impl Syntax {
    /// Every configured character paired with the name of its class.
    fn classes(&self) -> Vec<(char, &'static str)> {
        let mut classes: Vec<(char, &'static str)> = Vec::new();
        classes.extend(self.whitespace.chars().map(|c| (c, "whitespace")));
        classes.extend(self.separators.chars().map(|c| (c, "separator")));
        classes.push((self.escape, "escape"));
        classes.push((self.double_quote, "double quote"));
        classes.push((self.single_quote, "single quote"));
        classes.push((self.comment, "comment"));
        classes
    }

    /// Reject a character claimed by two classes, or a claim on newline.
    pub fn validate(&self) -> Result<(), Error> {
        let classes = self.classes();
        for (i, &(character, first)) in classes.iter().enumerate() {
            if character == NEWLINE {
                return Err(Error::ConflictingSyntax {
                    character,
                    first: "newline",
                    second: first,
                });
            }
            if let Some(&(_, second)) = classes[i + 1..].iter().find(|(c, _)| *c == character) {
                return Err(Error::ConflictingSyntax {
                    character,
                    first,
                    second,
                });
            }
        }
        Ok(())
    }
}
