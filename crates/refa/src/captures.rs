// Match results
//
// `MatchResult` is the owned slot table a search hands back. `Captures` is a
// borrowed view over a result, its regex and the haystack that resolves groups
// by index or name and slices the haystack on demand.

use ahash::AHashMap;

use crate::error::{Error, Result};
use crate::regex::Regex;

/// A half-open byte range `[start, end)` into the searched buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

impl From<Span> for (usize, usize) {
    fn from(span: Span) -> Self {
        (span.start, span.end)
    }
}

/// Capture slots of one successful match.
///
/// Slot `2*i` and `2*i+1` hold the start and end of group `i`, or `None`
/// when the group did not participate. Group 0 is the whole match and is
/// always set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    slots: Vec<Option<usize>>,
    span: Span,
    pos: usize,
    endpos: usize,
}

impl MatchResult {
    /// `None` if group 0 is unset, which a finished search never produces.
    pub(crate) fn new(slots: Vec<Option<usize>>, pos: usize, endpos: usize) -> Option<Self> {
        let span = match (slots.first(), slots.get(1)) {
            (Some(&Some(start)), Some(&Some(end))) => Span::new(start, end),
            _ => return None,
        };
        Some(MatchResult {
            slots,
            span,
            pos,
            endpos,
        })
    }

    /// Span of the whole match.
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }

    /// Span of group `index`; `None` if unset or out of range.
    pub fn get(&self, index: usize) -> Option<Span> {
        let start = (*self.slots.get(index * 2)?)?;
        let end = (*self.slots.get(index * 2 + 1)?)?;
        Some(Span::new(start, end))
    }

    /// Number of groups including group 0.
    pub fn len(&self) -> usize {
        self.slots.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[Option<usize>] {
        &self.slots
    }

    /// Clamped start of the searched window.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Clamped end of the searched window.
    pub fn endpos(&self) -> usize {
        self.endpos
    }
}

/// A group reference: by index or by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group<'a> {
    Index(usize),
    Name(&'a str),
}

impl From<usize> for Group<'_> {
    fn from(index: usize) -> Self {
        Group::Index(index)
    }
}

impl<'a> From<&'a str> for Group<'a> {
    fn from(name: &'a str) -> Self {
        Group::Name(name)
    }
}

/// A match together with the regex and haystack it came from.
#[derive(Debug, Clone)]
pub struct Captures<'r, 'h> {
    regex: &'r Regex,
    haystack: &'h [u8],
    result: MatchResult,
}

impl<'r, 'h> Captures<'r, 'h> {
    pub(crate) fn new(regex: &'r Regex, haystack: &'h [u8], result: MatchResult) -> Self {
        Captures {
            regex,
            haystack,
            result,
        }
    }

    fn resolve(&self, group: Group<'_>) -> Result<usize> {
        match group {
            Group::Index(index) if index <= self.regex.group_count() => Ok(index),
            Group::Index(index) => Err(Error::NoSuchGroup(index.to_string())),
            Group::Name(name) => self
                .regex
                .group_index(name)
                .ok_or_else(|| Error::NoSuchGroup(name.to_string())),
        }
    }

    /// Text of a group, or `None` if it did not participate.
    pub fn group<'g>(&self, group: impl Into<Group<'g>>) -> Result<Option<&'h [u8]>> {
        let index = self.resolve(group.into())?;
        Ok(self.slice(index))
    }

    pub fn span<'g>(&self, group: impl Into<Group<'g>>) -> Result<Option<Span>> {
        let index = self.resolve(group.into())?;
        Ok(self.result.get(index))
    }

    /// Start offset of a group, `-1` if unset.
    pub fn start<'g>(&self, group: impl Into<Group<'g>>) -> Result<isize> {
        Ok(self
            .span(group)?
            .map_or(-1, |span| span.start as isize))
    }

    /// End offset of a group, `-1` if unset.
    pub fn end<'g>(&self, group: impl Into<Group<'g>>) -> Result<isize> {
        Ok(self.span(group)?.map_or(-1, |span| span.end as isize))
    }

    /// The whole match.
    pub fn as_bytes(&self) -> &'h [u8] {
        &self.haystack[self.result.span().range()]
    }

    /// Groups `1..=group_count` in order.
    pub fn groups(&self) -> Vec<Option<&'h [u8]>> {
        (1..=self.regex.group_count())
            .map(|index| self.slice(index))
            .collect()
    }

    /// Named groups mapped to their text.
    pub fn group_dict(&self) -> AHashMap<&'r str, Option<&'h [u8]>> {
        self.regex
            .group_names()
            .map(|(name, index)| (name, self.slice(index)))
            .collect()
    }

    pub fn pos(&self) -> usize {
        self.result.pos()
    }

    pub fn endpos(&self) -> usize {
        self.result.endpos()
    }

    pub fn haystack(&self) -> &'h [u8] {
        self.haystack
    }

    pub fn result(&self) -> &MatchResult {
        &self.result
    }

    pub fn into_result(self) -> MatchResult {
        self.result
    }

    fn slice(&self, index: usize) -> Option<&'h [u8]> {
        self.result
            .get(index)
            .map(|span| &self.haystack[span.range()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_result_accessors() {
        let result = MatchResult::new(vec![Some(1), Some(4), Some(2), Some(3), None, None], 0, 5)
            .unwrap();
        assert_eq!(result.span(), Span::new(1, 4));
        assert_eq!(result.get(1), Some(Span::new(2, 3)));
        assert_eq!(result.get(2), None);
        assert_eq!(result.get(3), None);
        assert_eq!(result.len(), 3);
        assert_eq!((result.pos(), result.endpos()), (0, 5));
    }

    #[test]
    fn test_match_result_requires_group_zero() {
        assert!(MatchResult::new(vec![None, None], 0, 0).is_none());
    }

    #[test]
    fn test_span() {
        let span = Span::new(2, 5);
        assert_eq!(span.len(), 3);
        assert!(!span.is_empty());
        assert_eq!(<(usize, usize)>::from(span), (2, 5));
    }
}
