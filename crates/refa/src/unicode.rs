// Input decoding and simple case folding.
//
// The matcher steps one *unit* at a time. In UTF-8 mode a unit is one
// encoded scalar value; in Latin-1 mode it is one byte. Offsets reported to
// callers are always byte offsets.

use std::sync::OnceLock;

use ahash::AHashMap;

use crate::limits::{INVALID_UNIT, MAX_LATIN1, MAX_UNICODE};
use crate::options::Encoding;

/// Decode the unit starting at `haystack[at]`.
/// Returns `(unit, byte_len)`; `byte_len` is always at least 1.
#[inline]
pub fn decode(haystack: &[u8], at: usize, encoding: Encoding) -> (u32, usize) {
    let b0 = haystack[at];
    match encoding {
        Encoding::Latin1 => (b0 as u32, 1),
        Encoding::Utf8 => {
            if b0 < 0x80 {
                return (b0 as u32, 1);
            }
            decode_utf8_slow(&haystack[at..])
        }
    }
}

fn decode_utf8_slow(bytes: &[u8]) -> (u32, usize) {
    let b0 = bytes[0];
    let (len, init) = match b0 {
        0xC2..=0xDF => (2, (b0 & 0x1F) as u32),
        0xE0..=0xEF => (3, (b0 & 0x0F) as u32),
        0xF0..=0xF4 => (4, (b0 & 0x07) as u32),
        _ => return (INVALID_UNIT, 1),
    };
    if bytes.len() < len {
        return (INVALID_UNIT, 1);
    }
    let mut cp = init;
    for &b in &bytes[1..len] {
        if b & 0xC0 != 0x80 {
            return (INVALID_UNIT, 1);
        }
        cp = (cp << 6) | (b & 0x3F) as u32;
    }
    // Reject overlong forms, surrogates and values past U+10FFFF.
    let valid = match len {
        3 => cp >= 0x800 && !(0xD800..=0xDFFF).contains(&cp),
        4 => (0x10000..=0x10FFFF).contains(&cp),
        _ => true,
    };
    if valid { (cp, len) } else { (INVALID_UNIT, 1) }
}

/// Blocks holding every code point with a simple case mapping. Case
/// folding only has to look inside these.
pub(crate) const CASED_RANGES: &[(u32, u32)] = &[
    (0x0041, 0x005A),
    (0x0061, 0x007A),
    (0x00B5, 0x00B5),
    (0x00C0, 0x058F),
    (0x10A0, 0x10FF),
    (0x13A0, 0x13FF),
    (0x1C80, 0x1CBF),
    (0x1D00, 0x1FFF),
    (0x2100, 0x218F),
    (0x24B6, 0x24E9),
    (0x2C00, 0x2D2F),
    (0xA640, 0xA7FF),
    (0xAB30, 0xABBF),
    (0xFB00, 0xFB06),
    (0xFF21, 0xFF5A),
    (0x10400, 0x104FF),
    (0x10570, 0x105BF),
    (0x10C80, 0x10CFF),
    (0x10D50, 0x10D8F),
    (0x118A0, 0x118DF),
    (0x16E40, 0x16E7F),
    (0x1E900, 0x1E94F),
];

/// Simple folds that no one-char lower/upper mapping connects.
const EXTRA_FOLDS: &[(u32, u32)] = &[(0x0390, 0x1FD3), (0x03B0, 0x1FE3), (0xFB05, 0xFB06)];

/// Turkic dotted and dotless i fold only to themselves.
const NO_FOLD: &[u32] = &[0x0130, 0x0131];

/// Case folding orbits: every code point that has a simple case variant,
/// mapped to the full set of its variants.
struct FoldTable {
    orbit_of: AHashMap<u32, usize>,
    orbits: Vec<Vec<u32>>,
}

impl FoldTable {
    fn get() -> &'static FoldTable {
        static TABLE: OnceLock<FoldTable> = OnceLock::new();
        TABLE.get_or_init(FoldTable::build)
    }

    /// Union every cased code point with its one-char lower and upper
    /// mappings, then collect the classes.
    fn build() -> FoldTable {
        let mut parent: AHashMap<u32, u32> = AHashMap::new();
        for &(lo, hi) in CASED_RANGES {
            for c in lo..=hi {
                let Some(ch) = char::from_u32(c) else {
                    continue;
                };
                if NO_FOLD.contains(&c) {
                    continue;
                }
                for m in [single(ch.to_lowercase()), single(ch.to_uppercase())].into_iter().flatten() {
                    let m = m as u32;
                    if m != c && !NO_FOLD.contains(&m) {
                        union(&mut parent, c, m);
                    }
                }
            }
        }
        for &(a, b) in EXTRA_FOLDS {
            union(&mut parent, a, b);
        }

        let mut members: Vec<u32> = parent.keys().copied().collect();
        members.sort_unstable();
        let mut orbit_of = AHashMap::with_capacity(members.len());
        let mut by_root: AHashMap<u32, usize> = AHashMap::new();
        let mut orbits: Vec<Vec<u32>> = Vec::new();
        for c in members {
            let root = find(&mut parent, c);
            let id = *by_root.entry(root).or_insert_with(|| {
                orbits.push(Vec::new());
                orbits.len() - 1
            });
            orbits[id].push(c);
            orbit_of.insert(c, id);
        }
        FoldTable { orbit_of, orbits }
    }

    fn orbit(&self, c: u32) -> &[u32] {
        match self.orbit_of.get(&c) {
            Some(&id) => &self.orbits[id][..],
            None => &[],
        }
    }
}

fn find(parent: &mut AHashMap<u32, u32>, mut c: u32) -> u32 {
    loop {
        let p = *parent.entry(c).or_insert(c);
        if p == c {
            return c;
        }
        let grand = *parent.entry(p).or_insert(p);
        parent.insert(c, grand);
        c = grand;
    }
}

fn union(parent: &mut AHashMap<u32, u32>, a: u32, b: u32) {
    let (ra, rb) = (find(parent, a), find(parent, b));
    if ra != rb {
        parent.insert(ra.max(rb), ra.min(rb));
    }
}

/// Push every simple case variant of `c` (excluding `c` itself) into `out`.
pub fn simple_fold(c: u32, encoding: Encoding, out: &mut Vec<u32>) {
    let max = match encoding {
        Encoding::Utf8 => MAX_UNICODE,
        Encoding::Latin1 => MAX_LATIN1,
    };
    for &v in FoldTable::get().orbit(c) {
        if v != c && v <= max && !out.contains(&v) {
            out.push(v);
        }
    }
}

/// The only element of a case mapping, if it maps to exactly one char.
fn single(mut it: impl Iterator<Item = char>) -> Option<char> {
    let first = it.next()?;
    if it.next().is_some() { None } else { Some(first) }
}

/// ASCII word byte, as used by `\b` and `\w`.
#[inline(always)]
pub fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
