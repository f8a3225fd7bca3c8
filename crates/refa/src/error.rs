// Error taxonomy for parsing, compiling and searching.
// Every failure is a value; nothing here aborts the process.

/// Why a pattern was rejected by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    UnbalancedParen,
    DanglingOperator,
    InvalidEscape,
    InvalidClass,
    DuplicateGroupName,
    TooComplex,
    InvalidRepeat,
    InvalidGroupName,
    InvalidFlag,
    InvalidUtf8,
}

impl ParseErrorKind {
    pub fn description(self) -> &'static str {
        match self {
            ParseErrorKind::UnbalancedParen => "unbalanced parenthesis",
            ParseErrorKind::DanglingOperator => "no argument for repetition operator",
            ParseErrorKind::InvalidEscape => "invalid escape sequence",
            ParseErrorKind::InvalidClass => "invalid character class",
            ParseErrorKind::DuplicateGroupName => "duplicate capture group name",
            ParseErrorKind::TooComplex => "pattern too complex",
            ParseErrorKind::InvalidRepeat => "bad repetition operator",
            ParseErrorKind::InvalidGroupName => "invalid capture group name",
            ParseErrorKind::InvalidFlag => "invalid or unsupported Perl syntax",
            ParseErrorKind::InvalidUtf8 => "invalid UTF-8",
        }
    }
}

/// A rejected pattern: what went wrong and the byte offset where it was seen.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {context} (at offset {offset})", .kind.description())]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub offset: usize,
    /// The pattern fragment the error refers to, e.g. `*` or `(`.
    pub context: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, offset: usize, context: impl Into<String>) -> Self {
        ParseError {
            kind,
            offset,
            context: context.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompileErrorKind {
    ProgramTooLarge,
    OutOfMemory,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("pattern too large: compiled program exceeds {limit} instructions")]
    ProgramTooLarge { limit: usize },

    #[error("out of memory while compiling pattern")]
    OutOfMemory,
}

impl CompileError {
    pub fn kind(&self) -> CompileErrorKind {
        match self {
            CompileError::ProgramTooLarge { .. } => CompileErrorKind::ProgramTooLarge,
            CompileError::OutOfMemory => CompileErrorKind::OutOfMemory,
        }
    }
}

/// Crate-level error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("invalid search window {start}..{end} for a buffer of {len} bytes")]
    InvalidWindow { start: usize, end: usize, len: usize },

    #[error("no such group: {0}")]
    NoSuchGroup(String),
}

impl Error {
    /// The parse error kind, if this is a parse error.
    pub fn parse_kind(&self) -> Option<ParseErrorKind> {
        match self {
            Error::Parse(e) => Some(e.kind),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new(ParseErrorKind::DanglingOperator, 0, "*");
        assert_eq!(
            err.to_string(),
            "no argument for repetition operator: * (at offset 0)"
        );
    }

    #[test]
    fn test_error_from_parse() {
        let err: Error = ParseError::new(ParseErrorKind::UnbalancedParen, 1, "(").into();
        assert_eq!(err.parse_kind(), Some(ParseErrorKind::UnbalancedParen));
        assert!(err.to_string().starts_with("unbalanced parenthesis"));
    }

    #[test]
    fn test_compile_error_kind() {
        let err = CompileError::ProgramTooLarge { limit: 10 };
        assert_eq!(err.kind(), CompileErrorKind::ProgramTooLarge);
        assert_eq!(
            err.to_string(),
            "pattern too large: compiled program exceeds 10 instructions"
        );
    }
}
