#![deny(
    missing_docs,
    unsafe_code,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]

//! Structured `tracing` events for failtrace failure graphs.
//!
//! The core crate never logs. This crate turns a failure graph into one
//! event per node, and logs decode failures, so they show up in whatever
//! subscriber the application already has.
//!
//! # Quick Start
//!
//! ```
//! use failtrace::{Codec, FailureNode};
//! use failtrace_tracing::{DecodeResultExt, FailureTracingExt};
//! use tracing::Level;
//!
//! let node = FailureNode::new("app.Failure")
//!     .with_message("request failed")
//!     .with_cause(FailureNode::new("app.Io").with_message("connection reset"));
//!
//! // One event for the root, one for its cause.
//! node.trace_failure(Level::ERROR);
//!
//! // Logs a warning and hands the error back.
//! let result = Codec::new().decode("").log_decode_error();
//! assert!(result.is_err());
//! ```
//!
//! Every node event carries these fields:
//!
//! - `depth`: the suppressed-nesting depth of the node,
//! - `relation`: `root`, `cause`, `suppressed`, or `circular` for a cause
//!   that loops back to an ancestor,
//! - `type_name` and `message`,
//! - `frames`: the node's frames, one encoded frame after another.
//!
//! # Environment Variables
//!
//! - `FAILTRACE_TRACING` - Comma-separated options:
//!   - `noframes` - Leave the `frames` field out of node events

use std::sync::OnceLock;

use failtrace::{
    Cause, FailureNode,
    error::DecodeError,
    frame,
    iter::{GraphWalk, Visit},
};
use tracing::Level;

/// Controls what node events contain.
#[derive(Copy, Clone, Debug)]
pub struct TraceOptions {
    /// Whether node events carry the `frames` field.
    pub include_frames: bool,
}

#[derive(Debug)]
struct FailtraceTracingEnvOptions {
    no_frames: bool,
}

impl FailtraceTracingEnvOptions {
    fn get() -> &'static Self {
        static FAILTRACE_TRACING_FLAGS: OnceLock<FailtraceTracingEnvOptions> = OnceLock::new();

        FAILTRACE_TRACING_FLAGS.get_or_init(|| {
            let mut no_frames = false;

            if let Some(var) = std::env::var_os("FAILTRACE_TRACING") {
                for v in var.to_string_lossy().split(',') {
                    if v.trim().eq_ignore_ascii_case("noframes") {
                        no_frames = true;
                    }
                }
            }

            FailtraceTracingEnvOptions { no_frames }
        })
    }
}

impl TraceOptions {
    /// Creates options from the `FAILTRACE_TRACING` environment variable.
    pub fn new() -> Self {
        Self {
            include_frames: !FailtraceTracingEnvOptions::get().no_frames,
        }
    }
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self::new()
    }
}

// The level of a `tracing` event is part of its static metadata.
macro_rules! event_at {
    ($level:expr, $($rest:tt)+) => {
        match $level {
            level if level == Level::ERROR => tracing::event!(Level::ERROR, $($rest)+),
            level if level == Level::WARN => tracing::event!(Level::WARN, $($rest)+),
            level if level == Level::INFO => tracing::event!(Level::INFO, $($rest)+),
            level if level == Level::DEBUG => tracing::event!(Level::DEBUG, $($rest)+),
            _ => tracing::event!(Level::TRACE, $($rest)+),
        }
    };
}

fn emit(
    level: Level,
    depth: usize,
    relation: &str,
    type_name: Option<&str>,
    message: Option<&str>,
    frames: Option<&str>,
) {
    event_at!(level, depth, relation, type_name, message, frames);
}

fn joined_frames(node: &FailureNode) -> String {
    node.frames
        .iter()
        .map(frame::encode)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Emits failure graphs as `tracing` events.
pub trait FailureTracingExt {
    /// Emits one event per node at `level`, in the order the nodes appear in
    /// the text form, using [`TraceOptions::new`].
    ///
    /// # Examples
    ///
    /// ```
    /// use failtrace::FailureNode;
    /// use failtrace_tracing::FailureTracingExt;
    ///
    /// FailureNode::new("app.Failure").trace_failure(tracing::Level::WARN);
    /// ```
    fn trace_failure(&self, level: Level) {
        self.trace_failure_with(level, TraceOptions::new());
    }

    /// Like [`trace_failure`](Self::trace_failure) with explicit options.
    fn trace_failure_with(&self, level: Level, options: TraceOptions);
}

impl FailureTracingExt for FailureNode {
    fn trace_failure_with(&self, level: Level, options: TraceOptions) {
        for Visit {
            depth,
            relation,
            node,
        } in GraphWalk::new(self)
        {
            let frames = options.include_frames.then(|| joined_frames(node));
            emit(
                level,
                depth,
                relation.as_str(),
                Some(node.type_name()),
                node.message(),
                frames.as_deref(),
            );

            if let Cause::BackRef(back_ref) = &node.cause {
                emit(
                    level,
                    depth,
                    "circular",
                    None,
                    Some(back_ref.display()),
                    None,
                );
            }
        }
    }
}

/// Logs decode failures.
pub trait DecodeResultExt: Sized {
    /// Emits a `warn` event with the error kind and line index if this is a
    /// decode error, and returns `self` unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use failtrace::Codec;
    /// use failtrace_tracing::DecodeResultExt;
    ///
    /// let node = Codec::new()
    ///     .decode("app.Failure: boom\n")
    ///     .log_decode_error()
    ///     .unwrap();
    /// assert_eq!(node.message(), Some("boom"));
    /// ```
    fn log_decode_error(self) -> Self;
}

impl<T> DecodeResultExt for Result<T, DecodeError> {
    fn log_decode_error(self) -> Self {
        if let Err(error) = &self {
            tracing::warn!(
                kind = error.kind(),
                line = error.line(),
                "failed to decode stack trace: {error}"
            );
        }
        self
    }
}
