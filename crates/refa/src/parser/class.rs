// Character class sets
// A sorted list of non-overlapping inclusive unit ranges, plus the builtin
// Perl (\d \s \w) and POSIX ([:alpha:]) classes.

use crate::options::Encoding;
use crate::unicode::{CASED_RANGES, simple_fold};

/// Inclusive range of units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClassRange {
    pub lo: u32,
    pub hi: u32,
}

impl ClassRange {
    pub fn new(lo: u32, hi: u32) -> Self {
        ClassRange { lo, hi }
    }
}

/// A set of units. Always kept canonical: sorted, merged, non-overlapping.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassSet {
    ranges: Vec<ClassRange>,
}

impl ClassSet {
    pub fn new() -> Self {
        ClassSet { ranges: Vec::new() }
    }

    pub fn single(c: u32) -> Self {
        ClassSet {
            ranges: vec![ClassRange::new(c, c)],
        }
    }

    pub fn from_ranges(ranges: &[(u32, u32)]) -> Self {
        let mut set = ClassSet::new();
        for &(lo, hi) in ranges {
            set.push(lo, hi);
        }
        set
    }

    pub fn ranges(&self) -> &[ClassRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The single unit this set contains, if it contains exactly one.
    pub fn as_single(&self) -> Option<u32> {
        match self.ranges.as_slice() {
            [r] if r.lo == r.hi => Some(r.lo),
            _ => None,
        }
    }

    pub fn push(&mut self, lo: u32, hi: u32) {
        self.ranges.push(ClassRange::new(lo, hi));
        self.canonicalize();
    }

    pub fn union(&mut self, other: &ClassSet) {
        self.ranges.extend_from_slice(&other.ranges);
        self.canonicalize();
    }

    #[inline]
    pub fn contains(&self, unit: u32) -> bool {
        // Binary search over sorted ranges; small sets are scanned linearly.
        if self.ranges.len() <= 4 {
            return self.ranges.iter().any(|r| r.lo <= unit && unit <= r.hi);
        }
        self.ranges
            .binary_search_by(|r| {
                if r.hi < unit {
                    std::cmp::Ordering::Less
                } else if r.lo > unit {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    /// Complement with respect to `[0, max]`.
    pub fn negate(&mut self, max: u32) {
        let mut out = Vec::with_capacity(self.ranges.len() + 1);
        let mut next = 0u32;
        for r in &self.ranges {
            if r.lo > max {
                break;
            }
            if r.lo > next {
                out.push(ClassRange::new(next, r.lo - 1));
            }
            let Some(n) = r.hi.checked_add(1) else {
                self.ranges = out;
                return;
            };
            next = n;
        }
        if next <= max {
            out.push(ClassRange::new(next, max));
        }
        self.ranges = out;
    }

    /// Add the simple case variants of every member. Only the parts of each
    /// range that overlap a cased block are walked.
    pub fn case_fold(&mut self, encoding: Encoding) {
        let mut extra = Vec::new();
        let mut folds = Vec::new();
        for r in &self.ranges {
            for &(lo, hi) in CASED_RANGES {
                for c in lo.max(r.lo)..=hi.min(r.hi) {
                    folds.clear();
                    simple_fold(c, encoding, &mut folds);
                    extra.extend(folds.iter().map(|&f| ClassRange::new(f, f)));
                }
            }
        }
        if !extra.is_empty() {
            self.ranges.extend(extra);
            self.canonicalize();
        }
    }

    fn canonicalize(&mut self) {
        if self.ranges.len() <= 1 {
            return;
        }
        self.ranges.sort_unstable();
        let mut merged: Vec<ClassRange> = Vec::with_capacity(self.ranges.len());
        for r in self.ranges.drain(..) {
            if let Some(last) = merged.last_mut() {
                if r.lo <= last.hi.saturating_add(1) {
                    last.hi = last.hi.max(r.hi);
                    continue;
                }
            }
            merged.push(r);
        }
        self.ranges = merged;
    }
}

/// Perl class letter (`d`, `s`, `w`), ASCII only as in RE2.
pub fn perl_class(letter: u8) -> Option<ClassSet> {
    let ranges: &[(u32, u32)] = match letter {
        b'd' => &[(0x30, 0x39)],
        b's' => &[(0x09, 0x0A), (0x0C, 0x0D), (0x20, 0x20)],
        b'w' => &[(0x30, 0x39), (0x41, 0x5A), (0x5F, 0x5F), (0x61, 0x7A)],
        _ => return None,
    };
    Some(ClassSet::from_ranges(ranges))
}

/// POSIX bracket class by name, e.g. `alpha` for `[:alpha:]`.
pub fn posix_class(name: &[u8]) -> Option<ClassSet> {
    let ranges: &[(u32, u32)] = match name {
        b"alnum" => &[(0x30, 0x39), (0x41, 0x5A), (0x61, 0x7A)],
        b"alpha" => &[(0x41, 0x5A), (0x61, 0x7A)],
        b"ascii" => &[(0x00, 0x7F)],
        b"blank" => &[(0x09, 0x09), (0x20, 0x20)],
        b"cntrl" => &[(0x00, 0x1F), (0x7F, 0x7F)],
        b"digit" => &[(0x30, 0x39)],
        b"graph" => &[(0x21, 0x7E)],
        b"lower" => &[(0x61, 0x7A)],
        b"print" => &[(0x20, 0x7E)],
        b"punct" => &[(0x21, 0x2F), (0x3A, 0x40), (0x5B, 0x60), (0x7B, 0x7E)],
        b"space" => &[(0x09, 0x0D), (0x20, 0x20)],
        b"upper" => &[(0x41, 0x5A)],
        b"word" => &[(0x30, 0x39), (0x41, 0x5A), (0x5F, 0x5F), (0x61, 0x7A)],
        b"xdigit" => &[(0x30, 0x39), (0x41, 0x46), (0x61, 0x66)],
        _ => return None,
    };
    Some(ClassSet::from_ranges(ranges))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_merges() {
        let set = ClassSet::from_ranges(&[(5, 9), (1, 3), (4, 4), (20, 22)]);
        assert_eq!(
            set.ranges(),
            &[ClassRange::new(1, 9), ClassRange::new(20, 22)]
        );
    }

    #[test]
    fn test_contains() {
        let set = perl_class(b'w').unwrap();
        assert!(set.contains('a' as u32));
        assert!(set.contains('_' as u32));
        assert!(!set.contains('-' as u32));
        assert!(!set.contains(0xE9));
    }

    #[test]
    fn test_negate() {
        let mut set = ClassSet::from_ranges(&[(0, 9), (20, 30)]);
        set.negate(100);
        assert_eq!(
            set.ranges(),
            &[ClassRange::new(10, 19), ClassRange::new(31, 100)]
        );

        let mut empty = ClassSet::new();
        empty.negate(0xFF);
        assert_eq!(empty.ranges(), &[ClassRange::new(0, 0xFF)]);
    }

    #[test]
    fn test_case_fold() {
        let mut set = ClassSet::from_ranges(&[('a' as u32, 'c' as u32)]);
        set.case_fold(Encoding::Utf8);
        assert!(set.contains('B' as u32));
        assert!(set.contains('b' as u32));
        assert!(!set.contains('D' as u32));
    }

    #[test]
    fn test_case_fold_wide_range() {
        let mut set = ClassSet::from_ranges(&[(0x100, 0x10FFFF)]);
        set.case_fold(Encoding::Utf8);
        // U+212A KELVIN SIGN and U+017F LONG S fold into ASCII
        assert!(set.contains('k' as u32));
        assert!(set.contains('K' as u32));
        assert!(set.contains('s' as u32));
        assert!(!set.contains('a' as u32));

        let mut latin1 = ClassSet::from_ranges(&[(0, 0xFF)]);
        latin1.case_fold(Encoding::Latin1);
        assert_eq!(latin1.ranges(), &[ClassRange::new(0, 0xFF)]);
    }

    #[test]
    fn test_as_single() {
        assert_eq!(ClassSet::single(7).as_single(), Some(7));
        assert_eq!(ClassSet::from_ranges(&[(1, 2)]).as_single(), None);
    }

    #[test]
    fn test_posix_class() {
        let set = posix_class(b"xdigit").unwrap();
        assert!(set.contains('F' as u32));
        assert!(!set.contains('g' as u32));
        assert!(posix_class(b"bogus").is_none());
    }
}
