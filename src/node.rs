use alloc::{boxed::Box, string::String, vec::Vec};
use core::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{codec::CodecConfig, frame::StackFrame, iter::CauseChain};

/// The identity of a [`FailureNode`].
///
/// Identities are assigned from a process-wide counter when a node is
/// constructed. Cloning a node copies its identity, so back-references inside
/// a cloned graph keep resolving to the clone's own nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric value of the identity.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A non-owning link from a node to one of its ancestors.
///
/// The link holds only the target's identity and a snapshot of its display
/// text taken when the link was created. It is never dereferenced directly:
/// [`FailureNode::resolve_back_ref`] looks the target up by identity, and the
/// encoder prefers the live display text of an open ancestor over the
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BackRef {
    target: NodeId,
    display: String,
}

impl BackRef {
    /// Creates a back-reference pointing at `target`.
    pub fn to(target: &FailureNode) -> Self {
        Self::new(target.id, target.display_text())
    }

    pub(crate) fn new(target: NodeId, display: impl Into<String>) -> Self {
        Self {
            target,
            display: display.into(),
        }
    }

    /// The identity of the referenced node.
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// The display text of the target at the time the link was created.
    pub fn display(&self) -> &str {
        &self.display
    }
}

/// The cause slot of a [`FailureNode`].
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Cause {
    /// The node has no cause.
    #[default]
    None,
    /// The node exclusively owns its cause.
    Owned(Box<FailureNode>),
    /// The cause is an ancestor that is already part of the graph.
    BackRef(BackRef),
}

impl Cause {
    /// Returns the owned cause, if any.
    pub fn as_owned(&self) -> Option<&FailureNode> {
        match self {
            Cause::Owned(node) => Some(node),
            Cause::None | Cause::BackRef(_) => None,
        }
    }

    /// Returns the owned cause mutably, if any.
    pub fn as_owned_mut(&mut self) -> Option<&mut FailureNode> {
        match self {
            Cause::Owned(node) => Some(node),
            Cause::None | Cause::BackRef(_) => None,
        }
    }

    /// Returns the back-reference, if any.
    pub fn as_back_ref(&self) -> Option<&BackRef> {
        match self {
            Cause::BackRef(back_ref) => Some(back_ref),
            Cause::None | Cause::Owned(_) => None,
        }
    }

    /// Consumes the slot and returns the owned cause, if any.
    pub fn into_owned(self) -> Option<FailureNode> {
        match self {
            Cause::Owned(node) => Some(*node),
            Cause::None | Cause::BackRef(_) => None,
        }
    }

    /// Returns `true` if the slot is empty.
    pub fn is_none(&self) -> bool {
        matches!(self, Cause::None)
    }
}

impl From<FailureNode> for Cause {
    fn from(node: FailureNode) -> Self {
        Cause::Owned(Box::new(node))
    }
}

impl From<BackRef> for Cause {
    fn from(back_ref: BackRef) -> Self {
        Cause::BackRef(back_ref)
    }
}

/// Where a node's type came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeOrigin {
    /// The type name resolved to a known failure type.
    #[default]
    Resolved,
    /// The type name could not be resolved while decoding. The node keeps
    /// the type name and message verbatim, and renders `indicator` in front
    /// of the type name.
    Surrogate {
        /// The marker written before the type name.
        indicator: String,
    },
}

/// One failure in a failure graph: a type, an optional message, a stack, a
/// cause, and any number of suppressed failures.
///
/// # Examples
///
/// ```
/// use failtrace::{
///     FailureNode,
///     frame::{LineNumber, StackFrame},
/// };
///
/// let frame = StackFrame::new("app.Main", "main", Some("Main.java"), LineNumber::Number(3));
/// let node = FailureNode::new("java.lang.IllegalStateException")
///     .with_message("not ready")
///     .with_frames([frame])
///     .with_cause(FailureNode::new("java.io.IOException").with_message("disk full"));
///
/// assert_eq!(node.display_text(), "java.lang.IllegalStateException: not ready");
/// assert_eq!(node.root_cause().type_name(), "java.io.IOException");
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FailureNode {
    id: NodeId,
    /// Fully qualified type identifier.
    pub type_name: String,
    /// The message. `None` and `Some("")` are distinct.
    pub message: Option<String>,
    /// The call stack, innermost call first.
    pub frames: Vec<StackFrame>,
    /// The cause of this failure.
    pub cause: Cause,
    /// Secondary failures recorded alongside this one.
    pub suppressed: Vec<FailureNode>,
    /// Whether the type was resolved or substituted.
    pub origin: NodeOrigin,
}

impl FailureNode {
    /// Creates a node with the given type name and nothing else.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            id: NodeId::next(),
            type_name: type_name.into(),
            message: None,
            frames: Vec::new(),
            cause: Cause::None,
            suppressed: Vec::new(),
            origin: NodeOrigin::Resolved,
        }
    }

    pub(crate) fn surrogate(type_name: impl Into<String>, indicator: impl Into<String>) -> Self {
        Self {
            origin: NodeOrigin::Surrogate {
                indicator: indicator.into(),
            },
            ..Self::new(type_name)
        }
    }

    /// Sets the message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Replaces the frames.
    #[must_use]
    pub fn with_frames(mut self, frames: impl IntoIterator<Item = StackFrame>) -> Self {
        self.frames = frames.into_iter().collect();
        self
    }

    /// Sets an owned cause.
    #[must_use]
    pub fn with_cause(mut self, cause: FailureNode) -> Self {
        self.cause = Cause::from(cause);
        self
    }

    /// Appends a suppressed failure.
    #[must_use]
    pub fn with_suppressed(mut self, suppressed: FailureNode) -> Self {
        self.suppressed.push(suppressed);
        self
    }

    /// The identity of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The fully qualified type identifier.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns `true` if the type of this node could not be resolved while
    /// decoding.
    pub fn is_surrogate(&self) -> bool {
        matches!(self.origin, NodeOrigin::Surrogate { .. })
    }

    /// The type as written in text: the type name, preceded by the surrogate
    /// indicator for surrogate nodes.
    pub fn display_type(&self) -> String {
        match &self.origin {
            NodeOrigin::Resolved => self.type_name.clone(),
            NodeOrigin::Surrogate { indicator } => {
                let mut display = String::with_capacity(indicator.len() + self.type_name.len());
                display.push_str(indicator);
                display.push_str(&self.type_name);
                display
            }
        }
    }

    /// The header as written in text, `type: message` or just `type`. This
    /// is also the text a circular reference to this node carries.
    pub fn display_text(&self) -> String {
        let mut display = self.display_type();
        if let Some(message) = &self.message {
            display.push_str(": ");
            display.push_str(message);
        }
        display
    }

    /// Iterates over this node and its owned causes, outermost first.
    pub fn cause_chain(&self) -> CauseChain<'_> {
        CauseChain::new(self)
    }

    /// Returns the innermost owned cause, or `self` if there is none.
    pub fn root_cause(&self) -> &FailureNode {
        self.cause_chain().last().unwrap_or(self)
    }

    /// Finds a node in this graph (following owned causes and suppressed
    /// entries) by identity.
    pub fn find(&self, id: NodeId) -> Option<&FailureNode> {
        if self.id == id {
            return Some(self);
        }
        if let Some(found) = self.cause.as_owned().and_then(|cause| cause.find(id)) {
            return Some(found);
        }
        self.suppressed.iter().find_map(|node| node.find(id))
    }

    /// Resolves a back-reference found somewhere inside this graph.
    ///
    /// Returns `None` if the target is no longer part of the graph.
    pub fn resolve_back_ref(&self, back_ref: &BackRef) -> Option<&FailureNode> {
        self.find(back_ref.target)
    }

    /// Renders the whole graph using the default [`CodecConfig`].
    pub fn to_trace_string(&self) -> String {
        crate::codec::encode::encode(self, &CodecConfig::DEFAULT)
    }

    /// Compares two graphs structurally: type names, messages, origins,
    /// frames, suppressed entries, and causes, recursively. Back-references
    /// compare equal when their display snapshots are equal. Identities are
    /// ignored.
    pub fn structurally_eq(&self, other: &FailureNode) -> bool {
        self.type_name == other.type_name
            && self.message == other.message
            && self.origin == other.origin
            && self.frames == other.frames
            && self.suppressed.len() == other.suppressed.len()
            && self
                .suppressed
                .iter()
                .zip(&other.suppressed)
                .all(|(a, b)| a.structurally_eq(b))
            && match (&self.cause, &other.cause) {
                (Cause::None, Cause::None) => true,
                (Cause::Owned(a), Cause::Owned(b)) => a.structurally_eq(b),
                (Cause::BackRef(a), Cause::BackRef(b)) => a.display == b.display,
                _ => false,
            }
    }
}

impl PartialEq for FailureNode {
    fn eq(&self, other: &Self) -> bool {
        self.structurally_eq(other)
    }
}

/// Writes the header line only. Use [`FailureNode::to_trace_string`] for the
/// whole graph.
impl fmt::Display for FailureNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}

impl core::error::Error for FailureNode {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        self.cause
            .as_owned()
            .map(|cause| cause as &(dyn core::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::LineNumber;

    static_assertions::assert_impl_all!(FailureNode: Send, Sync, Clone);
    static_assertions::assert_impl_all!(Cause: Send, Sync, Clone);

    #[test]
    fn test_ids_are_unique() {
        let a = FailureNode::new("A");
        let b = FailureNode::new("A");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
        assert_eq!(a, b);
    }

    #[test]
    fn test_display_text() {
        let node = FailureNode::new("x.Error");
        assert_eq!(node.display_text(), "x.Error");
        let node = node.with_message("");
        assert_eq!(node.display_text(), "x.Error: ");

        let surrogate = FailureNode::surrogate("x.Missing", "[?] ").with_message("gone");
        assert_eq!(surrogate.type_name(), "x.Missing");
        assert_eq!(surrogate.display_type(), "[?] x.Missing");
        assert_eq!(surrogate.display_text(), "[?] x.Missing: gone");
        assert!(surrogate.is_surrogate());
    }

    #[test]
    fn test_find_and_back_ref() {
        let mut root = FailureNode::new("Root").with_suppressed(FailureNode::new("Side"));
        let root_id = root.id();
        let side_id = root.suppressed[0].id();
        let mut inner = FailureNode::new("Inner");
        inner.cause = Cause::BackRef(BackRef::to(&root));
        root.cause = Cause::from(inner);

        assert_eq!(root.find(side_id).map(|n| n.type_name()), Some("Side"));
        let back_ref = root
            .cause
            .as_owned()
            .and_then(|inner| inner.cause.as_back_ref())
            .cloned()
            .unwrap();
        assert_eq!(back_ref.target(), root_id);
        assert_eq!(back_ref.display(), "Root");
        assert_eq!(root.resolve_back_ref(&back_ref).map(|n| n.id()), Some(root_id));

        let detached = root.cause.as_owned().unwrap().clone();
        assert!(detached.resolve_back_ref(&back_ref).is_none());
    }

    #[test]
    fn test_root_cause_and_source() {
        let frame = StackFrame::new("a.B", "c", Some("B.java"), LineNumber::Number(1));
        let node = FailureNode::new("Outer")
            .with_frames([frame])
            .with_cause(FailureNode::new("Middle").with_cause(FailureNode::new("Inner")));
        assert_eq!(node.root_cause().type_name(), "Inner");
        assert_eq!(FailureNode::new("Alone").root_cause().type_name(), "Alone");

        let source = core::error::Error::source(&node).unwrap();
        assert_eq!(source.to_string(), "Middle");
        let node = FailureNode::new("Outer").with_message("line one\nline two");
        assert_eq!(node.to_string(), "Outer: line one\nline two");
        assert!(node.to_trace_string().starts_with("Outer: line one\nline two"));
    }

    #[test]
    fn test_structural_inequality() {
        let a = FailureNode::new("A").with_message("m");
        assert_ne!(a, FailureNode::new("A"));
        assert_ne!(a, FailureNode::new("A").with_message("m").with_cause(FailureNode::new("B")));
        assert_ne!(a, FailureNode::new("A").with_message("m").with_suppressed(FailureNode::new("B")));
    }
}
