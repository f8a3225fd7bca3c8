// Pike VM matcher
//
// Simulates every NFA thread in lockstep, one input unit at a time. Thread
// lists are sparse sets keyed by instruction pointer, so two threads that
// reach the same state at the same position are merged and the one that got
// there first (the higher-priority one) wins. That bounds the work per unit
// by the program size and makes search time linear in the input.
//
// Each thread owns a snapshot of capture slots. The epsilon closure uses an
// explicit stack with "restore slot" frames, so forking never shares mutable
// slot state and nothing recurses.

mod sparse_set;

use sparse_set::SparseSet;

use crate::compiler::{Inst, InstPtr, Program};
use crate::limits::INVALID_UNIT;
use crate::unicode::decode;

/// Where a match may start and end within the search window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Anchor {
    /// Match anywhere in the window
    #[default]
    Unanchored,
    /// Match must start at the window start
    AnchorStart,
    /// Match must span the whole window
    AnchorBoth,
}

/// One search request.
#[derive(Debug, Clone, Copy)]
pub struct Input<'h> {
    pub haystack: &'h [u8],
    pub start: usize,
    pub end: usize,
    pub anchor: Anchor,
}

impl<'h> Input<'h> {
    pub fn new(haystack: &'h [u8]) -> Self {
        Input {
            haystack,
            start: 0,
            end: haystack.len(),
            anchor: Anchor::Unanchored,
        }
    }

    pub fn range(mut self, start: usize, end: usize) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }
}

/// Per-search scratch space. Never shared between concurrent searches;
/// may be reused across sequential searches.
#[derive(Debug, Clone)]
pub struct Cache {
    clist: Threads,
    nlist: Threads,
    stack: Vec<Frame>,
    scratch: Vec<Option<usize>>,
}

impl Cache {
    pub fn new(program: &Program) -> Self {
        Cache {
            clist: Threads::new(program.len(), program.slot_count),
            nlist: Threads::new(program.len(), program.slot_count),
            stack: Vec::new(),
            scratch: vec![None; program.slot_count],
        }
    }

    fn prepare(&mut self, program: &Program, width: usize) {
        self.clist.prepare(program.len(), width);
        self.nlist.prepare(program.len(), width);
        self.stack.clear();
        self.scratch.clear();
        self.scratch.resize(width, None);
    }
}

/// A thread list: the set of live states plus each state's slot snapshot.
#[derive(Debug, Clone)]
struct Threads {
    set: SparseSet,
    slots: Vec<Option<usize>>,
    width: usize,
}

impl Threads {
    fn new(capacity: usize, width: usize) -> Self {
        Threads {
            set: SparseSet::new(capacity),
            slots: vec![None; capacity * width],
            width,
        }
    }

    fn prepare(&mut self, capacity: usize, width: usize) {
        if self.set.capacity() != capacity || self.width != width {
            self.set.resize(capacity);
            self.slots.clear();
            self.slots.resize(capacity * width, None);
            self.width = width;
        }
        self.set.clear();
    }

    #[inline]
    fn slots(&self, pc: InstPtr) -> &[Option<usize>] {
        &self.slots[pc * self.width..(pc + 1) * self.width]
    }

    #[inline]
    fn slots_mut(&mut self, pc: InstPtr) -> &mut [Option<usize>] {
        &mut self.slots[pc * self.width..(pc + 1) * self.width]
    }
}

#[derive(Debug, Clone, Copy)]
enum Frame {
    Explore(InstPtr),
    RestoreCapture { slot: usize, offset: Option<usize> },
}

/// What the search is collecting.
enum Mode<'s> {
    /// Best match with capture slots
    Find {
        longest: bool,
        slots: &'s mut [Option<usize>],
    },
    /// Any match at all
    Test,
    /// Every pattern id that matches
    Set { matched: &'s mut [bool] },
}

/// Find the best match and fill `slots` (length `program.slot_count`).
/// Returns false, leaving `slots` unspecified, if there is no match.
pub fn find(
    program: &Program,
    input: &Input<'_>,
    cache: &mut Cache,
    longest: bool,
    slots: &mut [Option<usize>],
) -> bool {
    debug_assert_eq!(slots.len(), program.slot_count);
    run(program, input, cache, Mode::Find { longest, slots })
}

/// Report whether any match exists, without tracking captures.
pub fn is_match(program: &Program, input: &Input<'_>, cache: &mut Cache) -> bool {
    run(program, input, cache, Mode::Test)
}

/// Sorted ids of every pattern in a multi-pattern program that matches.
pub fn which_matches(program: &Program, input: &Input<'_>, cache: &mut Cache) -> Vec<usize> {
    let mut matched = vec![false; program.pattern_count];
    run(program, input, cache, Mode::Set { matched: &mut matched });
    matched
        .iter()
        .enumerate()
        .filter_map(|(id, &hit)| hit.then_some(id))
        .collect()
}

fn run(program: &Program, input: &Input<'_>, cache: &mut Cache, mut mode: Mode<'_>) -> bool {
    debug_assert!(input.start <= input.end && input.end <= input.haystack.len());

    let width = match mode {
        Mode::Find { .. } => program.slot_count,
        Mode::Test | Mode::Set { .. } => 0,
    };
    cache.prepare(program, width);
    let Cache {
        clist,
        nlist,
        stack,
        scratch,
    } = cache;

    let haystack = input.haystack;
    // A unit straddling the window end is cut off there.
    let window = &haystack[..input.end];
    let unanchored = input.anchor == Anchor::Unanchored;
    let mut found = false;
    let mut best_end = 0;
    let mut matched_count = 0;
    let mut at = input.start;

    loop {
        let keep_seeding = match mode {
            Mode::Set { .. } => true,
            _ => !found,
        };
        if keep_seeding && (unanchored || at == input.start) {
            scratch.fill(None);
            epsilon_closure(program, haystack, stack, clist, scratch, program.start, at);
        }
        if clist.set.is_empty() && (!keep_seeding || !unanchored || at >= input.end) {
            break;
        }

        let (unit, len) = if at < input.end {
            decode(window, at, program.encoding)
        } else {
            (INVALID_UNIT, 0)
        };

        for pc in clist.set.iter() {
            match &program.insts[pc] {
                Inst::Ranges { class, next } => {
                    if len > 0 && program.classes[*class].contains(unit) {
                        scratch.copy_from_slice(clist.slots(pc));
                        epsilon_closure(program, haystack, stack, nlist, scratch, *next, at + len);
                    }
                }
                Inst::Match(id) => {
                    if input.anchor == Anchor::AnchorBoth && at != input.end {
                        continue;
                    }
                    match &mut mode {
                        Mode::Test => return true,
                        Mode::Set { matched } => {
                            if !matched[*id] {
                                matched[*id] = true;
                                matched_count += 1;
                                if matched_count == matched.len() {
                                    return true;
                                }
                            }
                            found = true;
                        }
                        Mode::Find { longest: false, slots } => {
                            slots.copy_from_slice(clist.slots(pc));
                            found = true;
                            // Cut every lower-priority thread.
                            break;
                        }
                        Mode::Find { longest: true, slots } => {
                            let thread = clist.slots(pc);
                            let better = !found
                                || thread[0] < slots[0]
                                || (thread[0] == slots[0] && at > best_end);
                            if better {
                                slots.copy_from_slice(thread);
                                best_end = at;
                                found = true;
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        if at >= input.end {
            break;
        }
        at += len;
        std::mem::swap(clist, nlist);
        nlist.set.clear();
    }
    found
}

/// Add `start` and everything reachable from it through epsilon transitions
/// to `threads`, carrying `slots` along. `slots` is restored on return.
fn epsilon_closure(
    program: &Program,
    haystack: &[u8],
    stack: &mut Vec<Frame>,
    threads: &mut Threads,
    slots: &mut [Option<usize>],
    start: InstPtr,
    at: usize,
) {
    stack.push(Frame::Explore(start));
    while let Some(frame) = stack.pop() {
        match frame {
            Frame::RestoreCapture { slot, offset } => slots[slot] = offset,
            Frame::Explore(mut pc) => loop {
                if !threads.set.insert(pc) {
                    break;
                }
                match &program.insts[pc] {
                    Inst::Ranges { .. } | Inst::Match(_) => {
                        threads.slots_mut(pc).copy_from_slice(slots);
                        break;
                    }
                    Inst::Jump(next) => pc = *next,
                    Inst::Split { primary, secondary } => {
                        stack.push(Frame::Explore(*secondary));
                        pc = *primary;
                    }
                    Inst::Save { slot, next } => {
                        if *slot < slots.len() {
                            stack.push(Frame::RestoreCapture {
                                slot: *slot,
                                offset: slots[*slot],
                            });
                            slots[*slot] = Some(at);
                        }
                        pc = *next;
                    }
                    Inst::Assert { look, next } => {
                        if !look.matches(haystack, at) {
                            break;
                        }
                        pc = *next;
                    }
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{compile, compile_many};
    use crate::options::Options;
    use crate::parser::parse;

    fn program(pattern: &str) -> Program {
        let options = Options::default();
        compile(&parse(pattern.as_bytes(), &options).unwrap(), &options).unwrap()
    }

    fn find_slots(pattern: &str, haystack: &str, anchor: Anchor) -> Option<Vec<Option<usize>>> {
        let program = program(pattern);
        let mut cache = Cache::new(&program);
        let mut slots = vec![None; program.slot_count];
        let input = Input::new(haystack.as_bytes()).anchor(anchor);
        find(&program, &input, &mut cache, false, &mut slots).then_some(slots)
    }

    #[test]
    fn test_leftmost_first() {
        let slots = find_slots("a|ab", "ab", Anchor::Unanchored).unwrap();
        assert_eq!(slots, vec![Some(0), Some(1)]);
    }

    #[test]
    fn test_unanchored_finds_later_start() {
        let slots = find_slots("b+", "aabbbc", Anchor::Unanchored).unwrap();
        assert_eq!(slots, vec![Some(2), Some(5)]);
    }

    #[test]
    fn test_anchor_start() {
        assert!(find_slots("b", "ab", Anchor::AnchorStart).is_none());
        assert!(find_slots("a", "ab", Anchor::AnchorStart).is_some());
    }

    #[test]
    fn test_anchor_both_prefers_match_at_end() {
        // leftmost-first would stop at "a"; a full match must reach the end
        let slots = find_slots("a|ab", "ab", Anchor::AnchorBoth).unwrap();
        assert_eq!(slots, vec![Some(0), Some(2)]);
        assert!(find_slots("abc", "abcdef", Anchor::AnchorBoth).is_none());
    }

    #[test]
    fn test_unset_group() {
        let slots = find_slots("(a)(b)?", "a", Anchor::Unanchored).unwrap();
        assert_eq!(slots, vec![Some(0), Some(1), Some(0), Some(1), None, None]);
    }

    #[test]
    fn test_group_takes_last_iteration() {
        let slots = find_slots("(a|b)+", "abab", Anchor::Unanchored).unwrap();
        assert_eq!(&slots[2..], &[Some(3), Some(4)]);
    }

    #[test]
    fn test_lazy() {
        let slots = find_slots("a+?", "aaa", Anchor::Unanchored).unwrap();
        assert_eq!(slots, vec![Some(0), Some(1)]);
    }

    #[test]
    fn test_longest() {
        let program = program("a|ab");
        let mut cache = Cache::new(&program);
        let mut slots = vec![None; program.slot_count];
        let input = Input::new(b"ab");
        assert!(find(&program, &input, &mut cache, true, &mut slots));
        assert_eq!(slots, vec![Some(0), Some(2)]);
    }

    #[test]
    fn test_window_and_context() {
        let program = program("^b");
        let mut cache = Cache::new(&program);
        // `^` looks at the full haystack, so a window starting at 1 is not
        // the start of text
        let input = Input::new(b"ab").range(1, 2);
        assert!(!is_match(&program, &input, &mut cache));

        let program = self::program("b");
        let mut cache = Cache::new(&program);
        let input = Input::new(b"abc").range(0, 1);
        assert!(!is_match(&program, &input, &mut cache));
    }

    #[test]
    fn test_empty_window() {
        let program = program("");
        let mut cache = Cache::new(&program);
        let mut slots = vec![None; program.slot_count];
        let input = Input::new(b"xyz").range(3, 3);
        assert!(find(&program, &input, &mut cache, false, &mut slots));
        assert_eq!(slots, vec![Some(3), Some(3)]);
    }

    #[test]
    fn test_pathological_pattern_terminates() {
        let program = program("(a*)*b");
        let mut cache = Cache::new(&program);
        let haystack = vec![b'a'; 5000];
        assert!(!is_match(&program, &Input::new(&haystack), &mut cache));
    }

    #[test]
    fn test_which_matches() {
        let options = Options::default();
        let asts: Vec<_> = ["foo", "bar", "baz"]
            .iter()
            .map(|p| parse(p.as_bytes(), &options).unwrap())
            .collect();
        let program = compile_many(&asts, &options).unwrap();
        let mut cache = Cache::new(&program);
        assert_eq!(
            which_matches(&program, &Input::new(b"afoobaryo"), &mut cache),
            vec![0, 1]
        );
        assert!(which_matches(&program, &Input::new(b"ooba"), &mut cache).is_empty());
    }

    #[test]
    fn test_cache_reuse_across_programs() {
        let small = program("a");
        let large = program("(a)(b)(c)");
        let mut cache = Cache::new(&small);
        let mut slots = vec![None; large.slot_count];
        assert!(find(&large, &Input::new(b"abc"), &mut cache, false, &mut slots));
        assert_eq!(slots[6..], [Some(2), Some(3)]);
    }
}
