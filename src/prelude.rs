//! Commonly used items for convenient importing.
//!
//! ```
//! use failtrace::prelude::*;
//!
//! fn load() -> Result<(), FailureNode> {
//!     Err(FailureNode::new("app.LoadFailure").with_message("missing file"))
//! }
//!
//! let text = load().unwrap_err().to_trace_string();
//! assert_eq!(Codec::new().decode(&text).unwrap().type_name(), "app.LoadFailure");
//! ```

pub use crate::{
    BackRef, Cause, Codec, FailureNode, NodeId, NodeOrigin,
    codec::CodecConfig,
    context::TransformContext,
    error::{ConfigError, DecodeError},
    frame::{LineNumber, StackFrame},
    transform::Transform,
};
