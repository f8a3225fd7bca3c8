// Regex pattern parser
// Turns pattern bytes into an `Ast`.
//
// Precedence (low -> high): alternation `|`, concatenation, repetition
// (`*`, `+`, `?`, `{m,n}`), atoms. Open groups are kept on an explicit
// stack, so pattern nesting never consumes call stack; the stack is capped
// by `Options::max_nesting_depth`.

mod ast;
mod class;

pub use ast::{AnchorKind, Ast, Node};
pub use class::{ClassRange, ClassSet, perl_class, posix_class};

use std::mem::take;

use ahash::AHashSet;
use smol_str::SmolStr;

use crate::error::{ParseError, ParseErrorKind};
use crate::limits::{INVALID_UNIT, MAX_GROUP_NAME_LEN, MAX_GROUPS, MAX_LATIN1, MAX_REPEAT, MAX_UNICODE};
use crate::options::{Encoding, Options};
use crate::unicode::{decode, is_word_byte};

/// Parse `pattern` under `options`.
pub fn parse(pattern: &[u8], options: &Options) -> Result<Ast, ParseError> {
    Parser::new(pattern, options).parse()
}

/// Flags that inline `(?imsU)` groups can toggle.
#[derive(Debug, Clone, Copy, Default)]
struct Flags {
    case_insensitive: bool,
    multi_line: bool,
    dot_matches_new_line: bool,
    swap_greed: bool,
}

enum GroupKind {
    Capture { index: usize, name: Option<SmolStr> },
    NonCapture,
}

/// An open group waiting for its `)`.
struct Frame {
    kind: GroupKind,
    concat: Vec<Node>,   // enclosing sequence so far
    branches: Vec<Node>, // enclosing finished alternatives
    flags: Flags,        // flags to restore on close
}

/// Result of an escape sequence.
enum Escape {
    Unit(u32),
    Set(ClassSet),
}

/// What the parser saw most recently in the current concatenation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Last {
    Atom,
    /// A repetition operator; another one directly after is `InvalidRepeat`
    Repeat,
    /// A flags-only group, which leaves nothing to repeat
    Flags,
}

struct Parser<'a> {
    pattern: &'a [u8],
    pos: usize,
    options: &'a Options,
    flags: Flags,
    stack: Vec<Frame>,
    concat: Vec<Node>,
    branches: Vec<Node>,
    last: Last,
    group_names: Vec<Option<SmolStr>>,
    seen_names: AHashSet<SmolStr>,
}

impl<'a> Parser<'a> {
    fn new(pattern: &'a [u8], options: &'a Options) -> Self {
        Parser {
            pattern,
            pos: 0,
            options,
            flags: Flags {
                case_insensitive: options.case_insensitive,
                multi_line: options.multi_line,
                dot_matches_new_line: options.dot_matches_new_line,
                swap_greed: false,
            },
            stack: Vec::new(),
            concat: Vec::new(),
            branches: Vec::new(),
            last: Last::Atom,
            group_names: vec![None],
            seen_names: AHashSet::new(),
        }
    }

    fn parse(mut self) -> Result<Ast, ParseError> {
        if self.options.literal {
            return self.parse_literal();
        }

        while let Some(c) = self.peek() {
            match c {
                b'(' => self.open_group()?,
                b')' => self.close_group()?,
                b'|' => {
                    self.pos += 1;
                    let concat = take(&mut self.concat);
                    self.branches.push(Node::concat(concat));
                    self.last = Last::Atom;
                }
                b'*' | b'+' | b'?' => {
                    let offset = self.pos;
                    self.pos += 1;
                    let (min, max) = match c {
                        b'*' => (0, None),
                        b'+' => (1, None),
                        _ => (0, Some(1)),
                    };
                    self.apply_repeat(offset, min, max)?;
                }
                b'{' => {
                    if !self.try_counted_repeat()? {
                        // Not a valid counted repetition: literal '{'
                        self.pos += 1;
                        self.push_literal(b'{' as u32);
                    }
                }
                b'[' => {
                    let set = self.parse_class()?;
                    self.push_atom(Node::Literal(set));
                }
                b'.' => {
                    self.pos += 1;
                    let set = self.dot();
                    self.push_atom(Node::Literal(set));
                }
                b'^' => {
                    self.pos += 1;
                    let kind = if self.flags.multi_line {
                        AnchorKind::StartLine
                    } else {
                        AnchorKind::StartText
                    };
                    self.push_atom(Node::Anchor(kind));
                }
                b'$' => {
                    self.pos += 1;
                    let kind = if self.flags.multi_line {
                        AnchorKind::EndLine
                    } else {
                        AnchorKind::EndText
                    };
                    self.push_atom(Node::Anchor(kind));
                }
                b'\\' => self.parse_escape_atom()?,
                _ => {
                    let (unit, len) = self.decode_at(self.pos)?;
                    self.pos += len;
                    self.push_literal(unit);
                }
            }
        }

        if !self.stack.is_empty() {
            return Err(ParseError::new(
                ParseErrorKind::UnbalancedParen,
                self.pattern.len(),
                "missing )",
            ));
        }

        let root = self.finish_alternation();
        Ok(Ast {
            root,
            group_count: self.group_names.len() - 1,
            group_names: self.group_names,
        })
    }

    fn parse_literal(mut self) -> Result<Ast, ParseError> {
        while self.pos < self.pattern.len() {
            let (unit, len) = self.decode_at(self.pos)?;
            self.pos += len;
            self.push_literal(unit);
        }
        Ok(Ast {
            root: Node::concat(take(&mut self.concat)),
            group_count: 0,
            group_names: vec![None],
        })
    }

    // ===== Helpers =====

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.pattern.get(self.pos).copied()
    }

    #[inline]
    fn peek_at(&self, n: usize) -> Option<u8> {
        self.pattern.get(self.pos + n).copied()
    }

    /// The unit at `at`. A byte that is not valid UTF-8 cannot be written
    /// as a literal in a UTF-8 pattern.
    fn decode_at(&self, at: usize) -> Result<(u32, usize), ParseError> {
        match decode(self.pattern, at, self.options.encoding) {
            (INVALID_UNIT, _) => Err(self.error(ParseErrorKind::InvalidUtf8, at, at + 1)),
            decoded => Ok(decoded),
        }
    }

    fn max_unit(&self) -> u32 {
        match self.options.encoding {
            Encoding::Utf8 => MAX_UNICODE,
            Encoding::Latin1 => MAX_LATIN1,
        }
    }

    fn fragment(&self, from: usize, to: usize) -> String {
        let to = to.min(self.pattern.len());
        String::from_utf8_lossy(&self.pattern[from..to]).into_owned()
    }

    fn error(&self, kind: ParseErrorKind, offset: usize, to: usize) -> ParseError {
        ParseError::new(kind, offset, self.fragment(offset, to))
    }

    fn push_atom(&mut self, node: Node) {
        self.concat.push(node);
        self.last = Last::Atom;
    }

    fn push_literal(&mut self, unit: u32) {
        let mut set = ClassSet::single(unit);
        if self.flags.case_insensitive {
            set.case_fold(self.options.encoding);
        }
        self.push_atom(Node::Literal(set));
    }

    fn finish_alternation(&mut self) -> Node {
        let concat = take(&mut self.concat);
        let mut branches = take(&mut self.branches);
        branches.push(Node::concat(concat));
        Node::alternate(branches)
    }

    fn dot(&self) -> ClassSet {
        let max = self.max_unit();
        if self.flags.dot_matches_new_line {
            ClassSet::from_ranges(&[(0, max)])
        } else {
            ClassSet::from_ranges(&[(0, 0x09), (0x0B, max)])
        }
    }

    // ===== Repetition =====

    /// Wrap the last atom in a repetition. `self.pos` is just past the
    /// operator; an optional lazy `?` is consumed here.
    fn apply_repeat(&mut self, offset: usize, min: u32, max: Option<u32>) -> Result<(), ParseError> {
        match self.last {
            Last::Repeat => {
                return Err(self.error(ParseErrorKind::InvalidRepeat, offset, self.pos));
            }
            Last::Flags => {
                return Err(self.error(ParseErrorKind::DanglingOperator, offset, self.pos));
            }
            Last::Atom => {}
        }
        let Some(child) = self.concat.pop() else {
            return Err(self.error(ParseErrorKind::DanglingOperator, offset, self.pos));
        };
        let mut greedy = true;
        if self.peek() == Some(b'?') {
            self.pos += 1;
            greedy = false;
        }
        if self.flags.swap_greed {
            greedy = !greedy;
        }
        self.concat.push(Node::Repeat {
            child: Box::new(child),
            min,
            max,
            greedy,
        });
        self.last = Last::Repeat;
        Ok(())
    }

    /// Parse `{m}`, `{m,}` or `{m,n}` at `self.pos`.
    /// Returns `Ok(false)` (consuming nothing) if the text is not a counted
    /// repetition, in which case `{` is a literal.
    fn try_counted_repeat(&mut self) -> Result<bool, ParseError> {
        let start = self.pos;
        let mut i = start + 1;
        let Some(min) = self.digits(&mut i) else {
            return Ok(false);
        };
        let max = if self.pattern.get(i) == Some(&b',') {
            i += 1;
            if self.pattern.get(i) == Some(&b'}') {
                None
            } else {
                match self.digits(&mut i) {
                    Some(n) => Some(n),
                    None => return Ok(false),
                }
            }
        } else {
            Some(min)
        };
        if self.pattern.get(i) != Some(&b'}') {
            return Ok(false);
        }
        i += 1;
        self.pos = i;

        let out_of_range = min > MAX_REPEAT || max.is_some_and(|m| m > MAX_REPEAT || m < min);
        if out_of_range {
            return Err(self.error(ParseErrorKind::InvalidRepeat, start, i));
        }
        self.apply_repeat(start, min, max)?;
        Ok(true)
    }

    fn digits(&self, i: &mut usize) -> Option<u32> {
        let start = *i;
        let mut value: u32 = 0;
        while let Some(&b) = self.pattern.get(*i) {
            if !b.is_ascii_digit() {
                break;
            }
            value = value.saturating_mul(10).saturating_add((b - b'0') as u32);
            *i += 1;
        }
        if *i == start { None } else { Some(value) }
    }

    // ===== Groups =====

    fn open_group(&mut self) -> Result<(), ParseError> {
        let offset = self.pos;
        if self.stack.len() >= self.options.max_nesting_depth {
            return Err(ParseError::new(
                ParseErrorKind::TooComplex,
                offset,
                format!("nesting depth exceeds {}", self.options.max_nesting_depth),
            ));
        }
        self.pos += 1;

        let saved = self.flags;
        let kind = if self.peek() == Some(b'?') {
            match self.parse_group_prefix(offset)? {
                Some(kind) => kind,
                // flags-only group such as `(?i)`: applies to the rest of
                // the enclosing group
                None => {
                    self.last = Last::Flags;
                    return Ok(());
                }
            }
        } else if self.options.never_capture {
            GroupKind::NonCapture
        } else {
            self.new_capture(offset, None)?
        };

        self.stack.push(Frame {
            kind,
            concat: take(&mut self.concat),
            branches: take(&mut self.branches),
            flags: saved,
        });
        self.last = Last::Atom;
        Ok(())
    }

    fn close_group(&mut self) -> Result<(), ParseError> {
        let offset = self.pos;
        self.pos += 1;
        let Some(frame) = self.stack.pop() else {
            return Err(ParseError::new(
                ParseErrorKind::UnbalancedParen,
                offset,
                "unexpected )",
            ));
        };
        let body = self.finish_alternation();
        self.concat = frame.concat;
        self.branches = frame.branches;
        self.flags = frame.flags;

        let node = match frame.kind {
            GroupKind::Capture { index, name } => Node::Group {
                child: Box::new(body),
                index,
                name,
            },
            GroupKind::NonCapture => body,
        };
        self.push_atom(node);
        Ok(())
    }

    fn new_capture(&mut self, offset: usize, name: Option<SmolStr>) -> Result<GroupKind, ParseError> {
        let index = self.group_names.len();
        if index > MAX_GROUPS {
            return Err(ParseError::new(
                ParseErrorKind::TooComplex,
                offset,
                format!("more than {} capture groups", MAX_GROUPS),
            ));
        }
        if let Some(name) = &name {
            if !self.seen_names.insert(name.clone()) {
                return Err(ParseError::new(
                    ParseErrorKind::DuplicateGroupName,
                    offset,
                    name.as_str(),
                ));
            }
        }
        self.group_names.push(name.clone());
        Ok(GroupKind::Capture { index, name })
    }

    /// Parse what follows `(?`. `self.pos` points at the `?`.
    /// Returns `None` for a flags-only group.
    fn parse_group_prefix(&mut self, offset: usize) -> Result<Option<GroupKind>, ParseError> {
        self.pos += 1;
        match (self.peek(), self.peek_at(1)) {
            (Some(b'P'), Some(b'<')) => {
                self.pos += 2;
                self.parse_group_name(offset).map(Some)
            }
            (Some(b'<'), Some(b'=' | b'!')) => {
                // lookbehind is not supported
                Err(self.error(ParseErrorKind::InvalidFlag, offset, self.pos + 2))
            }
            (Some(b'<'), _) => {
                self.pos += 1;
                self.parse_group_name(offset).map(Some)
            }
            _ => self.parse_flags(offset),
        }
    }

    fn parse_group_name(&mut self, offset: usize) -> Result<GroupKind, ParseError> {
        let start = self.pos;
        let Some(len) = self.pattern[start..].iter().position(|&b| b == b'>') else {
            return Err(self.error(ParseErrorKind::InvalidGroupName, offset, self.pattern.len()));
        };
        let end = start + len;
        let name = &self.pattern[start..end];
        let valid = !name.is_empty()
            && name.len() <= MAX_GROUP_NAME_LEN
            && (name[0].is_ascii_alphabetic() || name[0] == b'_')
            && name.iter().all(|&b| is_word_byte(b));
        if !valid {
            return Err(self.error(ParseErrorKind::InvalidGroupName, offset, end + 1));
        }
        self.pos = end + 1;

        if self.options.never_capture {
            return Ok(GroupKind::NonCapture);
        }
        let name = SmolStr::new(String::from_utf8_lossy(name));
        self.new_capture(offset, Some(name))
    }

    fn parse_flags(&mut self, offset: usize) -> Result<Option<GroupKind>, ParseError> {
        let mut flags = self.flags;
        let mut negate = false;
        let mut any = false;
        let mut pending = false; // saw '-' with no flag after it yet
        loop {
            let Some(c) = self.peek() else {
                return Err(self.error(ParseErrorKind::InvalidFlag, offset, self.pos));
            };
            self.pos += 1;
            let value = !negate;
            match c {
                b'i' => flags.case_insensitive = value,
                b'm' => flags.multi_line = value,
                b's' => flags.dot_matches_new_line = value,
                b'U' => flags.swap_greed = value,
                b'-' if !negate => {
                    negate = true;
                    pending = true;
                    continue;
                }
                b':' | b')' => {
                    if pending || (c == b')' && !any) {
                        return Err(self.error(ParseErrorKind::InvalidFlag, offset, self.pos));
                    }
                    self.flags = flags;
                    return Ok(if c == b':' {
                        Some(GroupKind::NonCapture)
                    } else {
                        None
                    });
                }
                _ => return Err(self.error(ParseErrorKind::InvalidFlag, offset, self.pos)),
            }
            any = true;
            pending = false;
        }
    }

    // ===== Escapes =====

    fn parse_escape_atom(&mut self) -> Result<(), ParseError> {
        let anchor = match self.peek_at(1) {
            Some(b'A') => Some(AnchorKind::StartText),
            Some(b'z') => Some(AnchorKind::EndText),
            Some(b'b') => Some(AnchorKind::WordBoundary),
            Some(b'B') => Some(AnchorKind::NotWordBoundary),
            _ => None,
        };
        if let Some(kind) = anchor {
            self.pos += 2;
            self.push_atom(Node::Anchor(kind));
            return Ok(());
        }
        match self.parse_escape()? {
            Escape::Unit(unit) => self.push_literal(unit),
            Escape::Set(set) => self.push_atom(Node::Literal(set)),
        }
        Ok(())
    }

    /// Parse an escape sequence; `self.pos` points at the backslash.
    fn parse_escape(&mut self) -> Result<Escape, ParseError> {
        let offset = self.pos;
        let Some(c) = self.peek_at(1) else {
            return Err(self.error(ParseErrorKind::InvalidEscape, offset, self.pattern.len()));
        };
        self.pos += 2;
        let unit = match c {
            // a lone \1-\7 would be a backreference
            b'1'..=b'7' if !matches!(self.peek(), Some(b'0'..=b'7')) => {
                return Err(self.error(ParseErrorKind::InvalidEscape, offset, self.pos));
            }
            b'0'..=b'7' => {
                let mut value = (c - b'0') as u32;
                for _ in 0..2 {
                    match self.peek() {
                        Some(d @ b'0'..=b'7') => {
                            value = value * 8 + (d - b'0') as u32;
                            self.pos += 1;
                        }
                        _ => break,
                    }
                }
                value
            }
            b'x' => self.parse_hex(offset)?,
            b'a' => 0x07,
            b'f' => 0x0C,
            b't' => 0x09,
            b'n' => 0x0A,
            b'r' => 0x0D,
            b'v' => 0x0B,
            b'd' | b's' | b'w' => {
                return Ok(Escape::Set(perl_class(c).unwrap_or_default()));
            }
            b'D' | b'S' | b'W' => {
                let mut set = perl_class(c.to_ascii_lowercase()).unwrap_or_default();
                set.negate(self.max_unit());
                return Ok(Escape::Set(set));
            }
            c if c < 0x80 && !is_word_byte(c) => c as u32,
            _ => return Err(self.error(ParseErrorKind::InvalidEscape, offset, self.pos)),
        };
        Ok(Escape::Unit(unit))
    }

    /// `\xHH` or `\x{H...}`; `self.pos` is just past the `x`.
    fn parse_hex(&mut self, offset: usize) -> Result<u32, ParseError> {
        let hex = |b: u8| (b as char).to_digit(16);
        if self.peek() == Some(b'{') {
            self.pos += 1;
            let start = self.pos;
            let mut value: u32 = 0;
            while let Some(d) = self.peek().and_then(hex) {
                value = value.saturating_mul(16).saturating_add(d);
                self.pos += 1;
            }
            if self.pos == start || self.peek() != Some(b'}') || value > MAX_UNICODE {
                return Err(self.error(ParseErrorKind::InvalidEscape, offset, self.pos + 1));
            }
            self.pos += 1;
            return Ok(value);
        }
        match (self.peek().and_then(hex), self.peek_at(1).and_then(hex)) {
            (Some(hi), Some(lo)) => {
                self.pos += 2;
                Ok(hi * 16 + lo)
            }
            _ => Err(self.error(ParseErrorKind::InvalidEscape, offset, self.pos + 2)),
        }
    }

    // ===== Character classes =====

    fn parse_class(&mut self) -> Result<ClassSet, ParseError> {
        let open = self.pos;
        self.pos += 1;
        let negated = self.peek() == Some(b'^');
        if negated {
            self.pos += 1;
        }

        // Plain members get case folded; builtin classes are already closed
        // under ASCII case.
        let mut plain = ClassSet::new();
        let mut builtin = ClassSet::new();
        let mut first = true;
        loop {
            let Some(c) = self.peek() else {
                return Err(ParseError::new(ParseErrorKind::InvalidClass, open, "missing ]"));
            };
            if c == b']' && !first {
                self.pos += 1;
                break;
            }
            first = false;

            if c == b'[' && self.peek_at(1) == Some(b':') {
                if let Some(set) = self.try_posix_class()? {
                    builtin.union(&set);
                    continue;
                }
            }

            let item = self.pos;
            let lo = match self.class_atom()? {
                Escape::Set(set) => {
                    builtin.union(&set);
                    continue;
                }
                Escape::Unit(unit) => unit,
            };
            if self.peek() == Some(b'-') && self.peek_at(1).is_some_and(|b| b != b']') {
                self.pos += 1;
                let hi = match self.class_atom()? {
                    Escape::Unit(unit) => unit,
                    Escape::Set(_) => {
                        return Err(self.error(ParseErrorKind::InvalidClass, item, self.pos));
                    }
                };
                if hi < lo {
                    return Err(self.error(ParseErrorKind::InvalidClass, item, self.pos));
                }
                plain.push(lo, hi);
            } else {
                plain.push(lo, lo);
            }
        }

        if self.flags.case_insensitive {
            plain.case_fold(self.options.encoding);
        }
        plain.union(&builtin);
        if negated {
            plain.negate(self.max_unit());
        }
        Ok(plain)
    }

    fn class_atom(&mut self) -> Result<Escape, ParseError> {
        if self.peek() == Some(b'\\') {
            if matches!(self.peek_at(1), Some(b'A' | b'z' | b'b' | b'B')) {
                return Err(self.error(ParseErrorKind::InvalidEscape, self.pos, self.pos + 2));
            }
            return self.parse_escape();
        }
        let (unit, len) = self.decode_at(self.pos)?;
        self.pos += len;
        Ok(Escape::Unit(unit))
    }

    /// `[:name:]` or `[:^name:]` inside a bracket class; `self.pos` points at
    /// the inner `[`. Returns `None` if there is no closing `:]`.
    fn try_posix_class(&mut self) -> Result<Option<ClassSet>, ParseError> {
        let start = self.pos;
        let body = start + 2;
        let Some(len) = self.pattern[body..].windows(2).position(|w| w == b":]") else {
            return Ok(None);
        };
        let end = body + len;
        let mut name = &self.pattern[body..end];
        let negated = name.first() == Some(&b'^');
        if negated {
            name = &name[1..];
        }
        let Some(mut set) = posix_class(name) else {
            return Err(self.error(ParseErrorKind::InvalidClass, start, end + 2));
        };
        if self.flags.case_insensitive {
            set.case_fold(self.options.encoding);
        }
        if negated {
            set.negate(self.max_unit());
        }
        self.pos = end + 2;
        Ok(Some(set))
    }
}
