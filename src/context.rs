//! Carrying a default transform to the places where failures are rethrown.
//!
//! A [`TransformContext`] is an explicit value: code that rethrows failures
//! receives the context it should use, and code that hands work to a child
//! task passes it an [`inherit`](TransformContext::inherit)ed snapshot.

use crate::{FailureNode, transform::Transform};

/// Holds the transform applied when a failure is rethrown.
///
/// # Examples
///
/// ```
/// use failtrace::{FailureNode, context::TransformContext, transform::Transform};
///
/// let mut builder = Transform::builder();
/// builder.replace_message(|node| node.message().map(str::to_uppercase))?;
///
/// let mut context = TransformContext::new();
/// context.set_default(builder.finish()?);
///
/// let result: Result<(), FailureNode> =
///     context.rethrow(FailureNode::new("app.Failure").with_message("disk full"));
/// assert_eq!(result.unwrap_err().message(), Some("DISK FULL"));
/// # Ok::<(), failtrace::error::ConfigError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct TransformContext {
    default: Option<Transform>,
}

impl TransformContext {
    /// Creates a context without a default transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the default transform, returning the previous one.
    pub fn set_default(&mut self, transform: Transform) -> Option<Transform> {
        self.default.replace(transform)
    }

    /// Removes the default transform, returning it.
    pub fn clear_default(&mut self) -> Option<Transform> {
        self.default.take()
    }

    /// The current default transform, if any.
    pub fn default_transform(&self) -> Option<&Transform> {
        self.default.as_ref()
    }

    /// Takes a snapshot of this context for a child task.
    ///
    /// The child starts with the same default. Changes made afterwards to
    /// either context are not seen by the other.
    pub fn inherit(&self) -> Self {
        self.clone()
    }

    /// Applies the default transform, keeping the root unless it can be
    /// spliced out. Without a default the node is returned unchanged.
    pub fn transform(&self, node: FailureNode) -> FailureNode {
        match &self.default {
            Some(transform) => transform.apply_keeping_root(node),
            None => node,
        }
    }

    /// Transforms `node` and returns it as the error of a `Result`, so it can
    /// be propagated with `?`.
    pub fn rethrow<T>(&self, node: FailureNode) -> Result<T, FailureNode> {
        Err(self.transform(node))
    }
}
