// Regex abstract syntax tree
// Built once per compile call, consumed by the compiler, then dropped.

use smol_str::SmolStr;

use super::class::ClassSet;

/// Zero-width assertion kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorKind {
    StartText, // \A, or ^ without multi-line
    EndText,   // \z, or $ without multi-line
    StartLine, // ^ in multi-line mode
    EndLine,   // $ in multi-line mode
    WordBoundary,    // \b
    NotWordBoundary, // \B
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Matches the empty string
    Empty,
    /// One unit from the set
    Literal(ClassSet),
    Concat(Vec<Node>),
    /// Branches in priority order
    Alternate(Vec<Node>),
    /// `max == None` means unbounded
    Repeat {
        child: Box<Node>,
        min: u32,
        max: Option<u32>,
        greedy: bool,
    },
    /// Capturing group
    Group {
        child: Box<Node>,
        index: usize,
        name: Option<SmolStr>,
    },
    Anchor(AnchorKind),
}

impl Node {
    /// Collapse a sequence into the smallest equivalent node.
    pub fn concat(mut nodes: Vec<Node>) -> Node {
        match nodes.len() {
            0 => Node::Empty,
            1 => nodes.pop().unwrap_or(Node::Empty),
            _ => Node::Concat(nodes),
        }
    }

    pub fn alternate(mut branches: Vec<Node>) -> Node {
        match branches.len() {
            0 => Node::Empty,
            1 => branches.pop().unwrap_or(Node::Empty),
            _ => Node::Alternate(branches),
        }
    }
}

/// Parser output: the tree plus capture-group metadata.
#[derive(Debug, Clone)]
pub struct Ast {
    pub root: Node,
    /// Number of capturing groups, not counting group 0.
    pub group_count: usize,
    /// Name of each group by index; slot 0 (whole match) is always `None`.
    pub group_names: Vec<Option<SmolStr>>,
}
