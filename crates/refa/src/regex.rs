// Compiled regex and its search operations
//
// A `Regex` is immutable after construction; clones share the program.
// Every search allocates its own matcher cache, so one `Regex` can be used
// from many threads at once.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use ahash::AHashMap;
use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::captures::{Captures, MatchResult};
use crate::compiler::{self, Program};
use crate::error::{Error, Result};
use crate::options::{Encoding, Options};
use crate::parser;
use crate::vm::{self, Anchor, Cache, Input};

/// A validated `[start, end)` window into a buffer of known length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchWindow {
    start: usize,
    end: usize,
}

impl SearchWindow {
    /// Fails unless `start <= end <= len`.
    pub fn new(start: usize, end: usize, len: usize) -> Result<Self> {
        if start > end || end > len {
            return Err(Error::InvalidWindow { start, end, len });
        }
        Ok(SearchWindow { start, end })
    }

    /// The whole buffer.
    pub fn full(len: usize) -> Self {
        SearchWindow { start: 0, end: len }
    }

    /// Clamp possibly out-of-range offsets into a valid window.
    /// Negative `start` becomes 0, `end < start` becomes `start`, and both
    /// are capped at `len`.
    pub fn clamped(start: isize, end: isize, len: usize) -> Self {
        let start = (start.max(0) as usize).min(len);
        let end = if end < start as isize {
            start
        } else {
            (end as usize).min(len)
        };
        SearchWindow { start, end }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }
}

#[derive(Debug)]
struct Meta {
    /// Display form; lossy when the pattern was given as bytes
    pattern: String,
    bytes: Vec<u8>,
    options: Options,
    group_count: usize,
    name_to_index: AHashMap<SmolStr, usize>,
    /// Indexed by group; entry 0 is always `None`
    group_names: Vec<Option<SmolStr>>,
}

/// A compiled regular expression.
#[derive(Clone)]
pub struct Regex {
    program: Arc<Program>,
    meta: Arc<Meta>,
}

/// Compile `pattern` under `options`.
pub fn compile(pattern: &str, options: Options) -> Result<Regex> {
    Regex::with_options(pattern, options)
}

impl Regex {
    /// Compile with default options.
    pub fn new(pattern: &str) -> Result<Regex> {
        Regex::with_options(pattern, Options::default())
    }

    pub fn with_options(pattern: &str, options: Options) -> Result<Regex> {
        let units = pattern_units(pattern, options.encoding);
        Regex::build(&units, pattern.as_bytes(), options)
    }

    /// Compile a pattern given as raw bytes. Under `Encoding::Latin1` every
    /// byte is one unit; under UTF-8 the bytes must be valid UTF-8.
    pub fn from_bytes(pattern: &[u8], options: Options) -> Result<Regex> {
        Regex::build(pattern, pattern, options)
    }

    fn build(units: &[u8], pattern: &[u8], options: Options) -> Result<Regex> {
        let ast = parser::parse(units, &options)?;
        let program = compiler::compile(&ast, &options)?;
        debug!(
            pattern_len = pattern.len(),
            classes = program.classes.len(),
            insts = program.len(),
            groups = ast.group_count,
            "compiled regex"
        );

        let name_to_index = ast
            .group_names
            .iter()
            .enumerate()
            .filter_map(|(index, name)| name.clone().map(|name| (name, index)))
            .collect();
        Ok(Regex {
            program: Arc::new(program),
            meta: Arc::new(Meta {
                pattern: String::from_utf8_lossy(pattern).into_owned(),
                bytes: pattern.to_vec(),
                options,
                group_count: ast.group_count,
                name_to_index,
                group_names: ast.group_names,
            }),
        })
    }

    // ===== Metadata =====

    pub fn as_str(&self) -> &str {
        &self.meta.pattern
    }

    /// The pattern exactly as it was given.
    pub fn as_bytes(&self) -> &[u8] {
        &self.meta.bytes
    }

    pub fn options(&self) -> &Options {
        &self.meta.options
    }

    /// Number of capturing groups, not counting group 0.
    pub fn group_count(&self) -> usize {
        self.meta.group_count
    }

    pub fn group_name_to_index(&self) -> &AHashMap<SmolStr, usize> {
        &self.meta.name_to_index
    }

    /// Named groups as `(name, index)` in declaration order.
    pub fn group_names(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.meta
            .group_names
            .iter()
            .enumerate()
            .filter_map(|(index, name)| name.as_deref().map(|name| (name, index)))
    }

    pub fn group_index(&self, name: &str) -> Option<usize> {
        self.meta.name_to_index.get(name).copied()
    }

    /// The compiled program, for inspection.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Fresh scratch space for `*_with_cache` calls.
    pub fn create_cache(&self) -> Cache {
        Cache::new(&self.program)
    }

    // ===== Whole buffer =====

    /// Leftmost match anywhere in `haystack`.
    pub fn search<H: AsRef<[u8]> + ?Sized>(&self, haystack: &H) -> Option<MatchResult> {
        let haystack = haystack.as_ref();
        self.run(haystack, SearchWindow::full(haystack.len()), Anchor::Unanchored)
    }

    /// Match that starts at offset 0.
    pub fn match_prefix<H: AsRef<[u8]> + ?Sized>(&self, haystack: &H) -> Option<MatchResult> {
        let haystack = haystack.as_ref();
        self.run(haystack, SearchWindow::full(haystack.len()), Anchor::AnchorStart)
    }

    /// Match spanning all of `haystack`.
    pub fn full_match<H: AsRef<[u8]> + ?Sized>(&self, haystack: &H) -> Option<MatchResult> {
        let haystack = haystack.as_ref();
        self.run(haystack, SearchWindow::full(haystack.len()), Anchor::AnchorBoth)
    }

    // ===== Clamped offsets =====

    pub fn search_at<H: AsRef<[u8]> + ?Sized>(
        &self,
        haystack: &H,
        start: isize,
        end: isize,
    ) -> Option<MatchResult> {
        let haystack = haystack.as_ref();
        let window = SearchWindow::clamped(start, end, haystack.len());
        self.run(haystack, window, Anchor::Unanchored)
    }

    pub fn match_prefix_at<H: AsRef<[u8]> + ?Sized>(
        &self,
        haystack: &H,
        start: isize,
        end: isize,
    ) -> Option<MatchResult> {
        let haystack = haystack.as_ref();
        let window = SearchWindow::clamped(start, end, haystack.len());
        self.run(haystack, window, Anchor::AnchorStart)
    }

    pub fn full_match_at<H: AsRef<[u8]> + ?Sized>(
        &self,
        haystack: &H,
        start: isize,
        end: isize,
    ) -> Option<MatchResult> {
        let haystack = haystack.as_ref();
        let window = SearchWindow::clamped(start, end, haystack.len());
        self.run(haystack, window, Anchor::AnchorBoth)
    }

    // ===== Explicit windows =====

    /// `window` must have been built for a buffer of this length.
    pub fn search_window<H: AsRef<[u8]> + ?Sized>(
        &self,
        haystack: &H,
        window: SearchWindow,
    ) -> Result<Option<MatchResult>> {
        let haystack = haystack.as_ref();
        Ok(self.run(haystack, checked(window, haystack)?, Anchor::Unanchored))
    }

    pub fn match_prefix_window<H: AsRef<[u8]> + ?Sized>(
        &self,
        haystack: &H,
        window: SearchWindow,
    ) -> Result<Option<MatchResult>> {
        let haystack = haystack.as_ref();
        Ok(self.run(haystack, checked(window, haystack)?, Anchor::AnchorStart))
    }

    pub fn full_match_window<H: AsRef<[u8]> + ?Sized>(
        &self,
        haystack: &H,
        window: SearchWindow,
    ) -> Result<Option<MatchResult>> {
        let haystack = haystack.as_ref();
        Ok(self.run(haystack, checked(window, haystack)?, Anchor::AnchorBoth))
    }

    // ===== Captures views =====

    pub fn captures<'h, H: AsRef<[u8]> + ?Sized>(&self, haystack: &'h H) -> Option<Captures<'_, 'h>> {
        let haystack = haystack.as_ref();
        self.search(haystack)
            .map(|result| Captures::new(self, haystack, result))
    }

    pub fn captures_at<'h, H: AsRef<[u8]> + ?Sized>(
        &self,
        haystack: &'h H,
        start: isize,
        end: isize,
    ) -> Option<Captures<'_, 'h>> {
        let haystack = haystack.as_ref();
        self.search_at(haystack, start, end)
            .map(|result| Captures::new(self, haystack, result))
    }

    /// Captures of a match anchored at the start of `haystack`.
    pub fn match_captures<'h, H: AsRef<[u8]> + ?Sized>(
        &self,
        haystack: &'h H,
    ) -> Option<Captures<'_, 'h>> {
        let haystack = haystack.as_ref();
        self.match_prefix(haystack)
            .map(|result| Captures::new(self, haystack, result))
    }

    // ===== Boolean tests =====

    pub fn is_match<H: AsRef<[u8]> + ?Sized>(&self, haystack: &H) -> bool {
        self.test_search(haystack)
    }

    pub fn test_search<H: AsRef<[u8]> + ?Sized>(&self, haystack: &H) -> bool {
        let haystack = haystack.as_ref();
        self.test(haystack, SearchWindow::full(haystack.len()), Anchor::Unanchored)
    }

    pub fn test_match<H: AsRef<[u8]> + ?Sized>(&self, haystack: &H) -> bool {
        let haystack = haystack.as_ref();
        self.test(haystack, SearchWindow::full(haystack.len()), Anchor::AnchorStart)
    }

    pub fn test_full_match<H: AsRef<[u8]> + ?Sized>(&self, haystack: &H) -> bool {
        let haystack = haystack.as_ref();
        self.test(haystack, SearchWindow::full(haystack.len()), Anchor::AnchorBoth)
    }

    /// `test_search` over a clamped window, like `search_at`.
    pub fn test_search_at<H: AsRef<[u8]> + ?Sized>(&self, haystack: &H, start: isize, end: isize) -> bool {
        let haystack = haystack.as_ref();
        let window = SearchWindow::clamped(start, end, haystack.len());
        self.test(haystack, window, Anchor::Unanchored)
    }

    pub fn test_match_at<H: AsRef<[u8]> + ?Sized>(&self, haystack: &H, start: isize, end: isize) -> bool {
        let haystack = haystack.as_ref();
        let window = SearchWindow::clamped(start, end, haystack.len());
        self.test(haystack, window, Anchor::AnchorStart)
    }

    pub fn test_full_match_at<H: AsRef<[u8]> + ?Sized>(
        &self,
        haystack: &H,
        start: isize,
        end: isize,
    ) -> bool {
        let haystack = haystack.as_ref();
        let window = SearchWindow::clamped(start, end, haystack.len());
        self.test(haystack, window, Anchor::AnchorBoth)
    }

    // ===== Cache reuse =====

    /// Like `search_window`, reusing caller-owned scratch space.
    pub fn search_with_cache(
        &self,
        cache: &mut Cache,
        haystack: &[u8],
        window: SearchWindow,
        anchor: Anchor,
    ) -> Result<Option<MatchResult>> {
        let window = checked(window, haystack)?;
        Ok(self.run_with(cache, haystack, window, anchor))
    }

    fn run(&self, haystack: &[u8], window: SearchWindow, anchor: Anchor) -> Option<MatchResult> {
        let mut cache = Cache::new(&self.program);
        self.run_with(&mut cache, haystack, window, anchor)
    }

    fn run_with(
        &self,
        cache: &mut Cache,
        haystack: &[u8],
        window: SearchWindow,
        anchor: Anchor,
    ) -> Option<MatchResult> {
        trace!(
            start = window.start,
            end = window.end,
            ?anchor,
            len = haystack.len(),
            "search"
        );
        let input = Input::new(haystack)
            .range(window.start, window.end)
            .anchor(anchor);
        let mut slots = vec![None; self.program.slot_count];
        let longest = self.meta.options.longest_match;
        if !vm::find(&self.program, &input, cache, longest, &mut slots) {
            return None;
        }
        MatchResult::new(slots, window.start, window.end)
    }

    fn test(&self, haystack: &[u8], window: SearchWindow, anchor: Anchor) -> bool {
        trace!(
            start = window.start,
            end = window.end,
            ?anchor,
            len = haystack.len(),
            "test"
        );
        let input = Input::new(haystack)
            .range(window.start, window.end)
            .anchor(anchor);
        let mut cache = Cache::new(&self.program);
        vm::is_match(&self.program, &input, &mut cache)
    }
}

impl fmt::Debug for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Regex").field(&self.meta.pattern).finish()
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.meta.pattern)
    }
}

impl std::str::FromStr for Regex {
    type Err = Error;

    fn from_str(pattern: &str) -> Result<Regex> {
        Regex::new(pattern)
    }
}

/// A window built for a different buffer is rejected rather than trusted.
fn checked(window: SearchWindow, haystack: &[u8]) -> Result<SearchWindow> {
    SearchWindow::new(window.start, window.end, haystack.len())
}

/// Pattern bytes in the units the parser decodes. Latin-1 patterns map each
/// char up to U+00FF to its single byte; anything wider stays UTF-8.
pub(crate) fn pattern_units(pattern: &str, encoding: Encoding) -> Cow<'_, [u8]> {
    if encoding == Encoding::Utf8 || pattern.is_ascii() {
        return Cow::Borrowed(pattern.as_bytes());
    }
    let mut out = Vec::with_capacity(pattern.len());
    let mut buf = [0; 4];
    for c in pattern.chars() {
        match u8::try_from(u32::from(c)) {
            Ok(byte) => out.push(byte),
            Err(_) => out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes()),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_new() {
        assert!(SearchWindow::new(0, 3, 3).is_ok());
        assert_eq!(
            SearchWindow::new(2, 1, 3),
            Err(Error::InvalidWindow {
                start: 2,
                end: 1,
                len: 3
            })
        );
        assert!(SearchWindow::new(0, 4, 3).is_err());
    }

    #[test]
    fn test_window_clamped() {
        let w = SearchWindow::clamped(-5, 10000, 4);
        assert_eq!((w.start(), w.end()), (0, 4));
        let w = SearchWindow::clamped(3, 1, 4);
        assert_eq!((w.start(), w.end()), (3, 3));
        let w = SearchWindow::clamped(9, -1, 4);
        assert_eq!((w.start(), w.end()), (4, 4));
    }

    #[test]
    fn test_pattern_units_latin1() {
        assert_eq!(&*pattern_units("é", Encoding::Latin1), &[0xE9]);
        assert_eq!(&*pattern_units("é", Encoding::Utf8), "é".as_bytes());
        assert_eq!(&*pattern_units("€", Encoding::Latin1), "€".as_bytes());
    }

    #[test]
    fn test_foreign_window_rejected() {
        let re = Regex::new("a").unwrap();
        let window = SearchWindow::new(0, 10, 10).unwrap();
        assert!(re.search_window("aaa", window).is_err());
    }

    #[test]
    fn test_from_bytes() {
        let latin1 = Options::default().encoding(Encoding::Latin1);
        let re = Regex::from_bytes(b"\xE9+[\xF0-\xFF]", latin1).unwrap();
        assert_eq!(re.as_bytes(), b"\xE9+[\xF0-\xFF]");
        let m = re.search(b"x\xE9\xE9\xFF").unwrap();
        assert_eq!((m.start(), m.end()), (1, 4));

        let re = Regex::from_bytes("é".as_bytes(), Options::default()).unwrap();
        assert_eq!(re.as_str(), "é");
        assert!(re.is_match("café"));

        let err = Regex::from_bytes(b"a\xE9", Options::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(ref e) if e.kind == crate::error::ParseErrorKind::InvalidUtf8
        ));
    }

    #[test]
    fn test_send_sync_clone() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<Regex>();
    }
}
