//! Rewriting failure graphs before they are written or propagated.
//!
//! A [`Transform`] is built once from a [`TransformBuilder`] and then applied
//! to as many graphs as needed. It can:
//!
//! - replace the message of every node ([`replace_message`]),
//! - splice uninformative wrapper nodes out of cause chains
//!   ([`unwrap_when`]),
//! - rewrite whole frame lists ([`rewrite_frames`]),
//! - rewrite or drop individual frames ([`map_frames`]).
//!
//! [`replace_message`]: TransformBuilder::replace_message
//! [`unwrap_when`]: TransformBuilder::unwrap_when
//! [`rewrite_frames`]: TransformBuilder::rewrite_frames
//! [`map_frames`]: TransformBuilder::map_frames
//!
//! # Examples
//!
//! ```
//! use failtrace::{FailureNode, transform::Transform};
//!
//! let mut builder = Transform::builder();
//! builder
//!     .unwrap_when(|node| node.type_name() == "java.lang.reflect.InvocationTargetException")?
//!     .map_frames(|frame| (!frame.unit().starts_with("sun.reflect.")).then_some(frame))?;
//! let transform = builder.finish()?;
//!
//! let node = FailureNode::new("app.Failure").with_cause(
//!     FailureNode::new("java.lang.reflect.InvocationTargetException")
//!         .with_cause(FailureNode::new("java.io.IOException")),
//! );
//! let node = transform.apply(node).unwrap();
//! assert_eq!(node.cause.as_owned().unwrap().type_name(), "java.io.IOException");
//! # Ok::<(), failtrace::error::ConfigError>(())
//! ```

use alloc::{boxed::Box, string::String, vec::Vec};
use core::{fmt, mem};

use triomphe::Arc;

use crate::{BackRef, Cause, FailureNode, NodeId, error::ConfigError, frame::StackFrame};

type MessageRule = Box<dyn Fn(&FailureNode) -> Option<String> + Send + Sync>;
type UnwrapRule = Box<dyn Fn(&FailureNode) -> bool + Send + Sync>;
type FrameListRule = Box<dyn Fn(Vec<StackFrame>) -> Vec<StackFrame> + Send + Sync>;
type FrameRule = Box<dyn Fn(StackFrame) -> Option<StackFrame> + Send + Sync>;

#[derive(Default)]
struct Rules {
    message: Option<MessageRule>,
    unwrap: Vec<UnwrapRule>,
    frame_lists: Vec<FrameListRule>,
    frames: Vec<FrameRule>,
}

/// Accumulates the rules of a [`Transform`].
///
/// Rules are kept in the order they were added. Once [`finish`] has been
/// called, every further call fails with
/// [`ConfigError::AmbiguousConfiguration`].
///
/// [`finish`]: Self::finish
pub struct TransformBuilder {
    rules: Option<Rules>,
}

impl TransformBuilder {
    fn rules_mut(&mut self) -> Result<&mut Rules, ConfigError> {
        self.rules
            .as_mut()
            .ok_or(ConfigError::AmbiguousConfiguration {
                reason: "the transform has already been finished",
            })
    }

    /// Sets the message rule. It receives each surviving node after its
    /// frames have been rewritten and returns the node's new message.
    ///
    /// Only one message rule may be set.
    pub fn replace_message<F>(&mut self, rule: F) -> Result<&mut Self, ConfigError>
    where
        F: Fn(&FailureNode) -> Option<String> + Send + Sync + 'static,
    {
        let rules = self.rules_mut()?;
        if rules.message.is_some() {
            return Err(ConfigError::AmbiguousConfiguration {
                reason: "a message rule has already been set",
            });
        }
        rules.message = Some(Box::new(rule));
        Ok(self)
    }

    /// Adds an unwrap predicate. A node matched by any predicate is replaced
    /// by its own (already transformed) cause, or removed when it has none.
    ///
    /// Nodes whose cause is a circular reference are never unwrapped.
    /// Circular references to an unwrapped node move to its replacement.
    pub fn unwrap_when<F>(&mut self, predicate: F) -> Result<&mut Self, ConfigError>
    where
        F: Fn(&FailureNode) -> bool + Send + Sync + 'static,
    {
        self.rules_mut()?.unwrap.push(Box::new(predicate));
        Ok(self)
    }

    /// Adds a rewrite of a node's whole frame list. Frame list rewrites run
    /// in the order they were added, before any per-frame rule.
    pub fn rewrite_frames<F>(&mut self, rule: F) -> Result<&mut Self, ConfigError>
    where
        F: Fn(Vec<StackFrame>) -> Vec<StackFrame> + Send + Sync + 'static,
    {
        self.rules_mut()?.frame_lists.push(Box::new(rule));
        Ok(self)
    }

    /// Adds a per-frame rule. Returning `None` drops the frame; later rules
    /// do not see dropped frames.
    pub fn map_frames<F>(&mut self, rule: F) -> Result<&mut Self, ConfigError>
    where
        F: Fn(StackFrame) -> Option<StackFrame> + Send + Sync + 'static,
    {
        self.rules_mut()?.frames.push(Box::new(rule));
        Ok(self)
    }

    /// Builds the transform.
    pub fn finish(&mut self) -> Result<Transform, ConfigError> {
        let rules = self.rules.take().ok_or(ConfigError::AmbiguousConfiguration {
            reason: "the transform has already been finished",
        })?;
        Ok(Transform {
            rules: Arc::new(rules),
        })
    }
}

impl fmt::Debug for TransformBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformBuilder")
            .field("finished", &self.rules.is_none())
            .finish_non_exhaustive()
    }
}

/// A finished set of rewrite rules.
///
/// Cloning a transform is cheap; clones share their rules.
#[derive(Clone)]
pub struct Transform {
    rules: Arc<Rules>,
}

impl Transform {
    /// Starts building a transform.
    pub fn builder() -> TransformBuilder {
        TransformBuilder {
            rules: Some(Rules::default()),
        }
    }

    /// Applies the transform to a graph.
    ///
    /// Causes are transformed before the node that owns them, so an unwrap
    /// decision further down the chain is settled before the parent is
    /// inspected. Returns `None` when the root itself is unwrapped and has no
    /// cause to take its place.
    ///
    /// Back-references to a node that is spliced out are pointed at the node
    /// that takes its place.
    pub fn apply(&self, root: FailureNode) -> Option<FailureNode> {
        self.apply_node(root)
    }

    /// Applies the transform to a graph whose root must survive.
    ///
    /// The root is only spliced out when it has an owned cause to take its
    /// place; otherwise it is kept and transformed like any other node.
    pub fn apply_keeping_root(&self, mut root: FailureNode) -> FailureNode {
        self.transform_cause(&mut root);
        if self.unwraps(&root) {
            match splice(root) {
                Ok(replacement) => return replacement,
                Err(kept) => root = kept,
            }
        }
        self.transform_contents(&mut root);
        root
    }

    fn apply_node(&self, mut node: FailureNode) -> Option<FailureNode> {
        self.transform_cause(&mut node);
        if self.unwraps(&node) {
            return splice(node).ok();
        }
        self.transform_contents(&mut node);
        Some(node)
    }

    fn unwraps(&self, node: &FailureNode) -> bool {
        !matches!(node.cause, Cause::BackRef(_))
            && self.rules.unwrap.iter().any(|predicate| predicate(node))
    }

    fn transform_cause(&self, node: &mut FailureNode) {
        node.cause = match mem::take(&mut node.cause) {
            Cause::Owned(cause) => self.apply_node(*cause).map_or(Cause::None, Cause::from),
            other => other,
        };
    }

    fn transform_contents(&self, node: &mut FailureNode) {
        node.suppressed = mem::take(&mut node.suppressed)
            .into_iter()
            .filter_map(|suppressed| self.apply_node(suppressed))
            .collect();

        let mut frames = mem::take(&mut node.frames);
        for rewrite in &self.rules.frame_lists {
            frames = rewrite(frames);
        }
        if !self.rules.frames.is_empty() {
            frames = frames
                .into_iter()
                .filter_map(|frame| {
                    self.rules
                        .frames
                        .iter()
                        .try_fold(frame, |frame, rule| rule(frame))
                })
                .collect();
        }
        node.frames = frames;

        if let Some(rule) = &self.rules.message {
            let message = rule(node);
            node.message = message;
        }
    }
}

/// Replaces `node` by its owned cause, or hands it back when it has none.
fn splice(mut node: FailureNode) -> Result<FailureNode, FailureNode> {
    match mem::take(&mut node.cause) {
        Cause::Owned(mut replacement) => {
            let (to, display) = (replacement.id(), replacement.display_text());
            retarget(&mut replacement, node.id(), to, &display);
            Ok(*replacement)
        }
        other => {
            node.cause = other;
            Err(node)
        }
    }
}

/// Points every back-reference to `from` below `node` at `to` instead.
fn retarget(node: &mut FailureNode, from: NodeId, to: NodeId, display: &str) {
    match &mut node.cause {
        Cause::BackRef(back_ref) if back_ref.target() == from => {
            *back_ref = BackRef::new(to, display);
        }
        Cause::Owned(cause) => retarget(cause, from, to, display),
        _ => {}
    }
    for suppressed in &mut node.suppressed {
        retarget(suppressed, from, to, display);
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("message_rule", &self.rules.message.is_some())
            .field("unwrap_rules", &self.rules.unwrap.len())
            .field("frame_list_rules", &self.rules.frame_lists.len())
            .field("frame_rules", &self.rules.frames.len())
            .finish()
    }
}
