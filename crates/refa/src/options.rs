use crate::limits::{DEFAULT_MAX_NESTING_DEPTH, DEFAULT_MAX_PROGRAM_SIZE};

/// How the haystack and the pattern are decoded into units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Encoding {
    /// Units are UTF-8 encoded scalar values; invalid bytes match nothing.
    #[default]
    Utf8,
    /// Units are single bytes.
    Latin1,
}

/// Compile-time options for a `Regex`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Options {
    pub case_insensitive: bool,
    /// `^` and `$` also match at line boundaries.
    pub multi_line: bool,
    /// `.` also matches `\n`.
    pub dot_matches_new_line: bool,
    pub encoding: Encoding,
    /// Leftmost-longest instead of leftmost-first semantics.
    pub longest_match: bool,
    /// Interpret the pattern as a literal string.
    pub literal: bool,
    /// Parse every group as non-capturing.
    pub never_capture: bool,
    pub max_nesting_depth: usize,
    /// Upper bound on the compiled instruction count.
    pub max_program_size: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            case_insensitive: false,
            multi_line: false,
            dot_matches_new_line: false,
            encoding: Encoding::Utf8,
            longest_match: false,
            literal: false,
            never_capture: false,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            max_program_size: DEFAULT_MAX_PROGRAM_SIZE,
        }
    }
}

impl Options {
    pub fn case_insensitive(mut self, yes: bool) -> Self {
        self.case_insensitive = yes;
        self
    }

    pub fn multi_line(mut self, yes: bool) -> Self {
        self.multi_line = yes;
        self
    }

    pub fn dot_matches_new_line(mut self, yes: bool) -> Self {
        self.dot_matches_new_line = yes;
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn longest_match(mut self, yes: bool) -> Self {
        self.longest_match = yes;
        self
    }

    pub fn literal(mut self, yes: bool) -> Self {
        self.literal = yes;
        self
    }

    pub fn never_capture(mut self, yes: bool) -> Self {
        self.never_capture = yes;
        self
    }

    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub fn max_program_size(mut self, size: usize) -> Self {
        self.max_program_size = size;
        self
    }
}
