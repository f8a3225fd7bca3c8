// Compiled program representation
// A Thompson NFA stored as a flat instruction list. Immutable once built.

use std::fmt;

use crate::options::Encoding;
use crate::parser::{AnchorKind, ClassSet};
use crate::unicode::is_word_byte;

/// Index of an instruction in `Program::insts`.
pub type InstPtr = usize;

/// Placeholder target for a not-yet-patched jump.
pub(crate) const HOLE: InstPtr = usize::MAX;

/// Zero-width assertion evaluated against the full haystack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Look {
    StartText,
    EndText,
    StartLine,
    EndLine,
    WordBoundary,
    NotWordBoundary,
}

impl From<AnchorKind> for Look {
    fn from(kind: AnchorKind) -> Self {
        match kind {
            AnchorKind::StartText => Look::StartText,
            AnchorKind::EndText => Look::EndText,
            AnchorKind::StartLine => Look::StartLine,
            AnchorKind::EndLine => Look::EndLine,
            AnchorKind::WordBoundary => Look::WordBoundary,
            AnchorKind::NotWordBoundary => Look::NotWordBoundary,
        }
    }
}

impl Look {
    /// Does the assertion hold at byte offset `at`?
    #[inline]
    pub fn matches(self, haystack: &[u8], at: usize) -> bool {
        match self {
            Look::StartText => at == 0,
            Look::EndText => at == haystack.len(),
            Look::StartLine => at == 0 || haystack[at - 1] == b'\n',
            Look::EndLine => at == haystack.len() || haystack[at] == b'\n',
            Look::WordBoundary => word_before(haystack, at) != word_after(haystack, at),
            Look::NotWordBoundary => word_before(haystack, at) == word_after(haystack, at),
        }
    }
}

#[inline(always)]
fn word_before(haystack: &[u8], at: usize) -> bool {
    at > 0 && is_word_byte(haystack[at - 1])
}

#[inline(always)]
fn word_after(haystack: &[u8], at: usize) -> bool {
    at < haystack.len() && is_word_byte(haystack[at])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inst {
    /// Consume one unit contained in `Program::classes[class]`
    Ranges { class: usize, next: InstPtr },
    /// Fork; `primary` has priority over `secondary`
    Split { primary: InstPtr, secondary: InstPtr },
    Jump(InstPtr),
    /// Record the current offset in capture slot `slot`
    Save { slot: usize, next: InstPtr },
    Assert { look: Look, next: InstPtr },
    /// Accept for pattern `id`
    Match(usize),
}

/// A compiled, immutable program.
#[derive(Debug, Clone)]
pub struct Program {
    pub insts: Vec<Inst>,
    /// Distinct character classes, shared by every `Ranges` copy of a literal
    pub classes: Vec<ClassSet>,
    pub start: InstPtr,
    /// `2 * (groups + 1)` for the pattern with the most groups
    pub slot_count: usize,
    pub pattern_count: usize,
    pub encoding: Encoding,
}

impl Program {
    pub fn len(&self) -> usize {
        self.insts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insts.is_empty()
    }

    /// Instructions plus stored class ranges; this is what
    /// `max_program_size` bounds.
    pub fn size(&self) -> usize {
        self.insts.len() + self.classes.iter().map(|c| c.ranges().len()).sum::<usize>()
    }

    /// Check that every target and slot is in range.
    pub fn is_well_formed(&self) -> bool {
        let valid = |pc: InstPtr| pc < self.insts.len();
        valid(self.start)
            && self.insts.iter().all(|inst| match *inst {
                Inst::Ranges { class, next } => class < self.classes.len() && valid(next),
                Inst::Assert { next, .. } | Inst::Jump(next) => valid(next),
                Inst::Split { primary, secondary } => valid(primary) && valid(secondary),
                Inst::Save { slot, next } => slot < self.slot_count && valid(next),
                Inst::Match(id) => id < self.pattern_count,
            })
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pc, inst) in self.insts.iter().enumerate() {
            let marker = if pc == self.start { ">" } else { " " };
            write!(f, "{}{:04} ", marker, pc)?;
            match inst {
                Inst::Ranges { class, next } => {
                    write!(f, "ranges")?;
                    for r in self.classes[*class].ranges() {
                        if r.lo == r.hi {
                            write!(f, " {:#x}", r.lo)?;
                        } else {
                            write!(f, " {:#x}-{:#x}", r.lo, r.hi)?;
                        }
                    }
                    writeln!(f, " -> {}", next)?;
                }
                Inst::Split { primary, secondary } => {
                    writeln!(f, "split {}, {}", primary, secondary)?
                }
                Inst::Jump(next) => writeln!(f, "jump {}", next)?,
                Inst::Save { slot, next } => writeln!(f, "save {} -> {}", slot, next)?,
                Inst::Assert { look, next } => writeln!(f, "assert {:?} -> {}", look, next)?,
                Inst::Match(id) => writeln!(f, "match {}", id)?,
            }
        }
        Ok(())
    }
}
