pub mod error;
pub mod grammar;
pub mod parser;
pub mod syntax;
pub mod types;

pub use error::Error;
pub use grammar::{Context, ContextId, Grammar};
pub use parser::{Drain, Parser};
pub use syntax::{NEWLINE, Syntax};
pub use types::{Boundary, Directive, Statement};
