// Multi-pattern matching
// Patterns are collected by a builder, then compiled into one program whose
// start state forks to every pattern. A single pass reports all that match.

use tracing::{debug, trace};

use crate::compiler::{self, Program};
use crate::error::Result;
use crate::options::Options;
use crate::parser::{self, Ast};
use crate::regex::pattern_units;
use crate::vm::{self, Anchor, Cache, Input};

/// Collects patterns for a `RegexSet`.
#[derive(Debug, Clone)]
pub struct RegexSetBuilder {
    anchor: Anchor,
    options: Options,
    asts: Vec<Ast>,
}

impl RegexSetBuilder {
    pub fn new(anchor: Anchor) -> Self {
        RegexSetBuilder::with_options(anchor, Options::default())
    }

    pub fn with_options(anchor: Anchor, options: Options) -> Self {
        RegexSetBuilder {
            anchor,
            options,
            asts: Vec::new(),
        }
    }

    /// Parse and add a pattern; returns its index in the set.
    pub fn add(&mut self, pattern: &str) -> Result<usize> {
        self.add_bytes(&pattern_units(pattern, self.options.encoding))
    }

    /// Add a pattern given as raw bytes, read the way `Regex::from_bytes`
    /// reads it.
    pub fn add_bytes(&mut self, pattern: &[u8]) -> Result<usize> {
        let ast = parser::parse(pattern, &self.options)?;
        self.asts.push(ast);
        Ok(self.asts.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.asts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.asts.is_empty()
    }

    pub fn build(self) -> Result<RegexSet> {
        let program = compiler::compile_many(&self.asts, &self.options)?;
        debug!(
            patterns = self.asts.len(),
            insts = program.len(),
            "compiled regex set"
        );
        Ok(RegexSet {
            program,
            anchor: self.anchor,
            len: self.asts.len(),
        })
    }
}

/// A compiled set of patterns.
#[derive(Debug, Clone)]
pub struct RegexSet {
    program: Program,
    anchor: Anchor,
    len: usize,
}

impl RegexSet {
    /// Sorted indices of every pattern that matches `haystack`.
    pub fn matches<H: AsRef<[u8]> + ?Sized>(&self, haystack: &H) -> Vec<usize> {
        if self.len == 0 {
            return Vec::new();
        }
        let haystack = haystack.as_ref();
        trace!(len = haystack.len(), anchor = ?self.anchor, "set search");
        let input = Input::new(haystack).anchor(self.anchor);
        let mut cache = Cache::new(&self.program);
        vm::which_matches(&self.program, &input, &mut cache)
    }

    pub fn is_match<H: AsRef<[u8]> + ?Sized>(&self, haystack: &H) -> bool {
        if self.len == 0 {
            return false;
        }
        let input = Input::new(haystack.as_ref()).anchor(self.anchor);
        let mut cache = Cache::new(&self.program);
        vm::is_match(&self.program, &input, &mut cache)
    }

    /// Number of patterns.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_returns_index() {
        let mut builder = RegexSetBuilder::new(Anchor::Unanchored);
        assert_eq!(builder.add("a").unwrap(), 0);
        assert_eq!(builder.add("b").unwrap(), 1);
        assert!(builder.add("(").is_err());
        assert_eq!(builder.len(), 2);
    }

    #[test]
    fn test_add_bytes() {
        let options = Options::default().encoding(crate::options::Encoding::Latin1);
        let mut builder = RegexSetBuilder::with_options(Anchor::Unanchored, options);
        builder.add_bytes(b"\xFF\xFE").unwrap();
        builder.add("é").unwrap();
        let set = builder.build().unwrap();
        assert_eq!(set.matches(b"\xE9\xFF\xFE"), vec![0, 1]);
        assert_eq!(set.matches(b"\xFF"), Vec::<usize>::new());
    }

    #[test]
    fn test_empty_set() {
        let set = RegexSetBuilder::new(Anchor::Unanchored).build().unwrap();
        assert!(set.is_empty());
        assert!(set.matches("anything").is_empty());
        assert!(!set.is_match(""));
    }
}
