// Regex compiler - lowers an `Ast` into a `Program`
//
// Standard Thompson construction: every node becomes a fragment with one
// entry and a list of unpatched exits ("holes"). Fragments are spliced by
// patching holes, the way jump lists are back-patched in a bytecode
// compiler. Program size is checked before every emitted instruction.

mod inst;

pub use inst::{Inst, InstPtr, Look, Program};

use ahash::AHashMap;
use inst::HOLE;

use crate::error::CompileError;
use crate::options::Options;
use crate::parser::{Ast, ClassSet, Node};

/// Compile a single pattern.
pub fn compile(ast: &Ast, options: &Options) -> Result<Program, CompileError> {
    let mut c = Compiler::new(options);
    let start = c.compile_pattern(ast, 0)?;
    Ok(c.finish(start, ast.group_count, 1))
}

/// Compile several patterns into one program. The start state forks to each
/// pattern in order; pattern `i` ends in `Match(i)`.
pub fn compile_many(asts: &[Ast], options: &Options) -> Result<Program, CompileError> {
    let mut c = Compiler::new(options);
    let mut entries = Vec::with_capacity(asts.len());
    for (id, ast) in asts.iter().enumerate() {
        entries.push(c.compile_pattern(ast, id)?);
    }
    let max_groups = asts.iter().map(|a| a.group_count).max().unwrap_or(0);

    let start = match entries.split_last() {
        // no patterns: a program that can never match
        None => {
            let class = c.intern(&ClassSet::default())?;
            c.emit(Inst::Ranges { class, next: 0 })?
        }
        Some((&last, rest)) => {
            let mut next = last;
            for &entry in rest.iter().rev() {
                next = c.emit(Inst::Split {
                    primary: entry,
                    secondary: next,
                })?;
            }
            next
        }
    };
    Ok(c.finish(start, max_groups, asts.len().max(1)))
}

/// An unpatched exit of a fragment.
#[derive(Debug, Clone, Copy)]
enum Hole {
    Next(InstPtr),
    Primary(InstPtr),
    Secondary(InstPtr),
}

/// A compiled sub-program: where it starts and where it leaves.
struct Frag {
    entry: InstPtr,
    holes: Vec<Hole>,
}

struct Compiler<'a> {
    insts: Vec<Inst>,
    classes: Vec<ClassSet>,
    /// Class index by the address of its `Literal` node; every copy a
    /// counted repetition makes of that node reuses one entry.
    class_ids: AHashMap<*const ClassSet, usize>,
    /// Total ranges held in `classes`
    range_count: usize,
    options: &'a Options,
}

impl<'a> Compiler<'a> {
    fn new(options: &'a Options) -> Self {
        Compiler {
            insts: Vec::new(),
            classes: Vec::new(),
            class_ids: AHashMap::new(),
            range_count: 0,
            options,
        }
    }

    fn finish(self, start: InstPtr, groups: usize, pattern_count: usize) -> Program {
        let program = Program {
            insts: self.insts,
            classes: self.classes,
            start,
            slot_count: 2 * (groups + 1),
            pattern_count,
            encoding: self.options.encoding,
        };
        debug_assert!(program.is_well_formed());
        program
    }

    /// `save 0; body; save 1; match id`. Returns the entry.
    fn compile_pattern(&mut self, ast: &Ast, id: usize) -> Result<InstPtr, CompileError> {
        let open = self.emit(Inst::Save { slot: 0, next: HOLE })?;
        let body = self.compile_node(&ast.root)?;
        self.set_next(open, body.entry);
        let close = self.emit(Inst::Save { slot: 1, next: HOLE })?;
        self.patch(&body.holes, close);
        let accept = self.emit(Inst::Match(id))?;
        self.set_next(close, accept);
        Ok(open)
    }

    /// Instructions plus stored class ranges.
    fn size(&self) -> usize {
        self.insts.len() + self.range_count
    }

    /// Index of `set` in the class table, storing it on first use.
    fn intern(&mut self, set: &ClassSet) -> Result<usize, CompileError> {
        let key = set as *const ClassSet;
        if let Some(&id) = self.class_ids.get(&key) {
            return Ok(id);
        }
        let limit = self.options.max_program_size;
        let ranges = set.ranges().len();
        if self.size() + ranges > limit {
            return Err(CompileError::ProgramTooLarge { limit });
        }
        self.classes
            .try_reserve(1)
            .map_err(|_| CompileError::OutOfMemory)?;
        self.classes.push(set.clone());
        self.range_count += ranges;
        let id = self.classes.len() - 1;
        self.class_ids.insert(key, id);
        Ok(id)
    }

    /// Emit an instruction and return its position.
    fn emit(&mut self, inst: Inst) -> Result<InstPtr, CompileError> {
        let limit = self.options.max_program_size;
        if self.size() >= limit {
            return Err(CompileError::ProgramTooLarge { limit });
        }
        if self.insts.len() == self.insts.capacity() {
            let additional = self.insts.len().max(16).min(limit - self.size());
            self.insts
                .try_reserve(additional)
                .map_err(|_| CompileError::OutOfMemory)?;
        }
        self.insts.push(inst);
        Ok(self.insts.len() - 1)
    }

    fn compile_node(&mut self, node: &Node) -> Result<Frag, CompileError> {
        match node {
            Node::Empty => self.empty(),
            Node::Literal(set) => {
                let class = self.intern(set)?;
                let pc = self.emit(Inst::Ranges { class, next: HOLE })?;
                Ok(Frag {
                    entry: pc,
                    holes: vec![Hole::Next(pc)],
                })
            }
            Node::Anchor(kind) => {
                let pc = self.emit(Inst::Assert {
                    look: Look::from(*kind),
                    next: HOLE,
                })?;
                Ok(Frag {
                    entry: pc,
                    holes: vec![Hole::Next(pc)],
                })
            }
            Node::Concat(nodes) => self.concat(nodes.iter()),
            Node::Alternate(branches) => self.alternate(branches),
            Node::Repeat {
                child,
                min,
                max,
                greedy,
            } => self.repeat(child, *min, *max, *greedy),
            Node::Group { child, index, .. } => {
                let open = self.emit(Inst::Save {
                    slot: 2 * index,
                    next: HOLE,
                })?;
                let body = self.compile_node(child)?;
                self.set_next(open, body.entry);
                let close = self.emit(Inst::Save {
                    slot: 2 * index + 1,
                    next: HOLE,
                })?;
                self.patch(&body.holes, close);
                Ok(Frag {
                    entry: open,
                    holes: vec![Hole::Next(close)],
                })
            }
        }
    }

    fn empty(&mut self) -> Result<Frag, CompileError> {
        let pc = self.emit(Inst::Jump(HOLE))?;
        Ok(Frag {
            entry: pc,
            holes: vec![Hole::Next(pc)],
        })
    }

    fn concat<'n>(&mut self, nodes: impl Iterator<Item = &'n Node>) -> Result<Frag, CompileError> {
        let mut result: Option<Frag> = None;
        for node in nodes {
            let frag = self.compile_node(node)?;
            result = Some(match result {
                None => frag,
                Some(prev) => {
                    self.patch(&prev.holes, frag.entry);
                    Frag {
                        entry: prev.entry,
                        holes: frag.holes,
                    }
                }
            });
        }
        match result {
            Some(frag) => Ok(frag),
            None => self.empty(),
        }
    }

    /// `split b1, L2; L2: split b2, L3; ...; bn`
    fn alternate(&mut self, branches: &[Node]) -> Result<Frag, CompileError> {
        let mut entry = None;
        let mut holes = Vec::new();
        let mut prev_split: Option<InstPtr> = None;
        for (i, branch) in branches.iter().enumerate() {
            let split = if i + 1 < branches.len() {
                Some(self.emit(Inst::Split {
                    primary: HOLE,
                    secondary: HOLE,
                })?)
            } else {
                None
            };
            let frag = self.compile_node(branch)?;
            if let Some(s) = split {
                self.set_primary(s, frag.entry);
            }
            let this_entry = split.unwrap_or(frag.entry);
            match prev_split {
                Some(p) => self.set_secondary(p, this_entry),
                None => entry = Some(this_entry),
            }
            prev_split = split;
            holes.extend(frag.holes);
        }
        match entry {
            Some(entry) => Ok(Frag { entry, holes }),
            None => self.empty(),
        }
    }

    fn repeat(&mut self, child: &Node, min: u32, max: Option<u32>, greedy: bool) -> Result<Frag, CompileError> {
        match (min, max) {
            (0, None) => self.star(child, greedy),
            (1, None) => self.plus(child, greedy),
            (_, None) => {
                // x{n,} => x{n-1} x+
                let required = std::iter::repeat_n(child, (min - 1) as usize);
                let head = self.concat(required)?;
                let tail = self.plus(child, greedy)?;
                self.patch(&head.holes, tail.entry);
                Ok(Frag {
                    entry: head.entry,
                    holes: tail.holes,
                })
            }
            (_, Some(max)) => self.bounded(child, min, max, greedy),
        }
    }

    /// `L: split x, out; x -> L`
    fn star(&mut self, child: &Node, greedy: bool) -> Result<Frag, CompileError> {
        let split = self.emit(Inst::Split {
            primary: HOLE,
            secondary: HOLE,
        })?;
        let body = self.compile_node(child)?;
        self.patch(&body.holes, split);
        let out = self.link_split(split, body.entry, greedy);
        Ok(Frag {
            entry: split,
            holes: vec![out],
        })
    }

    /// `x; split x, out`
    fn plus(&mut self, child: &Node, greedy: bool) -> Result<Frag, CompileError> {
        let body = self.compile_node(child)?;
        let split = self.emit(Inst::Split {
            primary: HOLE,
            secondary: HOLE,
        })?;
        self.patch(&body.holes, split);
        let out = self.link_split(split, body.entry, greedy);
        Ok(Frag {
            entry: body.entry,
            holes: vec![out],
        })
    }

    /// `x{min,max}` => `min` copies, then `max - min` nested optional copies:
    /// `x{1,3}` is `x(x(x)?)?`.
    fn bounded(&mut self, child: &Node, min: u32, max: u32, greedy: bool) -> Result<Frag, CompileError> {
        if max == 0 {
            return self.empty();
        }
        let mut entry = None;
        let mut pending: Vec<Hole> = Vec::new();
        if min > 0 {
            let head = self.concat(std::iter::repeat_n(child, min as usize))?;
            entry = Some(head.entry);
            pending = head.holes;
        }

        let mut out = Vec::new();
        for _ in min..max {
            let split = self.emit(Inst::Split {
                primary: HOLE,
                secondary: HOLE,
            })?;
            match entry {
                None => entry = Some(split),
                Some(_) => self.patch(&pending, split),
            }
            let body = self.compile_node(child)?;
            out.push(self.link_split(split, body.entry, greedy));
            pending = body.holes;
        }
        out.extend(pending);

        Ok(Frag {
            entry: entry.unwrap_or(HOLE),
            holes: out,
        })
    }

    /// Point the preferred side of `split` at `body` and return the other side
    /// as a hole.
    fn link_split(&mut self, split: InstPtr, body: InstPtr, greedy: bool) -> Hole {
        if greedy {
            self.set_primary(split, body);
            Hole::Secondary(split)
        } else {
            self.set_secondary(split, body);
            Hole::Primary(split)
        }
    }

    // ===== Patching =====

    fn patch(&mut self, holes: &[Hole], target: InstPtr) {
        for hole in holes {
            match *hole {
                Hole::Next(pc) => self.set_next(pc, target),
                Hole::Primary(pc) => self.set_primary(pc, target),
                Hole::Secondary(pc) => self.set_secondary(pc, target),
            }
        }
    }

    fn set_next(&mut self, pc: InstPtr, target: InstPtr) {
        match &mut self.insts[pc] {
            Inst::Ranges { next, .. }
            | Inst::Save { next, .. }
            | Inst::Assert { next, .. }
            | Inst::Jump(next) => *next = target,
            Inst::Split { .. } | Inst::Match(_) => {}
        }
    }

    fn set_primary(&mut self, pc: InstPtr, target: InstPtr) {
        if let Inst::Split { primary, .. } = &mut self.insts[pc] {
            *primary = target;
        }
    }

    fn set_secondary(&mut self, pc: InstPtr, target: InstPtr) {
        if let Inst::Split { secondary, .. } = &mut self.insts[pc] {
            *secondary = target;
        }
    }
}
