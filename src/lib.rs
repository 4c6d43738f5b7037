#![deny(
    missing_docs,
    unsafe_code,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Failure graphs and their stack trace text form.
//!
//! ## Overview
//!
//! This crate models a failure the way managed runtimes print it: a node
//! with a type name, an optional message, and a list of stack frames, linked
//! to the failure that caused it and to any failures that were suppressed
//! while handling it. It reads and writes the familiar text form of such
//! graphs:
//!
//! ```text
//! java.lang.IllegalStateException: request failed
//! 	at com.example.Service.handle(Service.java:42)
//! 	at com.example.Server.run(Server.java:17)
//! Caused by: java.io.IOException: connection reset
//! 	at com.example.Client.read(Client.java:88)
//! 	... 2 more
//! ```
//!
//! The main pieces are:
//!
//! - [`FailureNode`], the graph node, with [`Cause`] distinguishing an owned
//!   cause from a [`BackRef`] that closes a cycle.
//! - [`frame`], the one-line text form of a single [`StackFrame`].
//! - [`Codec`], which encodes whole graphs and decodes them again, expanding
//!   `... N more` elisions and resolving circular references. Type names the
//!   configured [`TypeResolver`] does not know become surrogate nodes, so
//!   decoding never fails on an unknown type.
//! - [`Transform`], a reusable set of rewrite rules: message replacement,
//!   unwrapping of wrapper nodes, and frame rewriting.
//! - [`TransformContext`], the explicit carrier of the transform applied when
//!   a failure is rethrown.
//!
//! [`StackFrame`]: frame::StackFrame
//! [`TypeResolver`]: resolver::TypeResolver
//! [`Transform`]: transform::Transform
//! [`TransformContext`]: context::TransformContext
//!
//! ## Example
//!
//! ```
//! use failtrace::{
//!     Codec,
//!     frame::{LineNumber, StackFrame},
//! };
//!
//! let text = "\
//! app.Failure: request failed
//! \tat app.Service.handle(Service.java:42)
//! \tat app.Server.run(Server.java:17)
//! Caused by: app.Io: connection reset
//! \tat app.Client.read(Client.java:88)
//! \t... 1 more
//! ";
//!
//! let node = Codec::new().decode(text)?;
//! let cause = node.root_cause();
//! assert_eq!(cause.message(), Some("connection reset"));
//! assert_eq!(
//!     cause.frames[1],
//!     StackFrame::new("app.Server", "run", Some("Server.java"), LineNumber::Number(17))
//! );
//! # Ok::<(), failtrace::error::DecodeError>(())
//! ```
//!
//! ## Features
//!
//! - `serde`: derives `Serialize` and `Deserialize` for the data model.

extern crate alloc;

pub mod codec;
pub mod context;
pub mod error;
pub mod frame;
pub mod iter;
mod node;
pub mod prelude;
pub mod resolver;
pub mod transform;

pub use self::{
    codec::Codec,
    node::{BackRef, Cause, FailureNode, NodeId, NodeOrigin},
};
