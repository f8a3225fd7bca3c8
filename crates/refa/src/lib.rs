// refa
// A linear-time regular expression engine: parser, Thompson compiler and
// Pike VM matcher with RE2-style syntax and leftmost-first semantics.

#[cfg(test)]
mod test;

pub mod captures;
pub mod compiler;
pub mod error;
pub mod escape;
pub mod limits;
pub mod options;
pub mod parser;
pub mod regex;
pub mod set;
pub mod unicode;
pub mod vm;

pub use captures::{Captures, Group, MatchResult, Span};
pub use error::{CompileError, CompileErrorKind, Error, ParseError, ParseErrorKind, Result};
pub use escape::escape;
pub use options::{Encoding, Options};
pub use regex::{Regex, SearchWindow, compile};
pub use set::{RegexSet, RegexSetBuilder};
pub use vm::{Anchor, Cache};
