//! Iterators over failure graphs.

use alloc::vec::Vec;
use core::iter::FusedIterator;

use crate::FailureNode;

/// An iterator over a node and its owned causes, outermost first.
///
/// Back-references end the chain; they are never followed.
#[must_use]
#[derive(Clone)]
pub struct CauseChain<'a> {
    next: Option<&'a FailureNode>,
}

impl<'a> CauseChain<'a> {
    pub(crate) fn new(node: &'a FailureNode) -> Self {
        Self { next: Some(node) }
    }
}

impl<'a> Iterator for CauseChain<'a> {
    type Item = &'a FailureNode;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.cause.as_owned();
        Some(current)
    }
}

impl FusedIterator for CauseChain<'_> {}

/// How a node visited by [`GraphWalk`] is attached to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// The node the walk started from.
    Root,
    /// The owned cause of the previous node.
    Cause,
    /// A suppressed entry of its parent.
    Suppressed,
}

impl Relation {
    /// A lowercase name, suitable for structured logging.
    pub fn as_str(self) -> &'static str {
        match self {
            Relation::Root => "root",
            Relation::Cause => "cause",
            Relation::Suppressed => "suppressed",
        }
    }
}

/// A node visited by [`GraphWalk`].
#[derive(Debug, Clone, Copy)]
pub struct Visit<'a> {
    /// The suppressed-nesting depth, which is also the number of extra
    /// indentation units the node is written with.
    pub depth: usize,
    /// How the node hangs off its parent.
    pub relation: Relation,
    /// The node itself.
    pub node: &'a FailureNode,
}

/// An iterator over every node of a graph in the order the encoder writes
/// them: a node, then its suppressed entries (recursively), then its cause.
#[must_use]
pub struct GraphWalk<'a> {
    stack: Vec<Visit<'a>>,
}

impl<'a> GraphWalk<'a> {
    /// Starts a walk at `root`.
    pub fn new(root: &'a FailureNode) -> Self {
        Self {
            stack: alloc::vec![Visit {
                depth: 0,
                relation: Relation::Root,
                node: root,
            }],
        }
    }
}

impl<'a> Iterator for GraphWalk<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        if let Some(cause) = current.node.cause.as_owned() {
            self.stack.push(Visit {
                depth: current.depth,
                relation: Relation::Cause,
                node: cause,
            });
        }
        self.stack
            .extend(current.node.suppressed.iter().rev().map(|node| Visit {
                depth: current.depth + 1,
                relation: Relation::Suppressed,
                node,
            }));
        Some(current)
    }
}

impl FusedIterator for GraphWalk<'_> {}
