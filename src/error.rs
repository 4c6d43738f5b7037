//! Errors produced while decoding stack trace text or configuring a
//! [`Transform`](crate::transform::Transform).
//!
//! Decode errors are format errors: the text does not follow the grammar
//! described in the [`codec`](crate::codec) module. They are returned to the
//! caller as-is and never recovered from inside the codec. A type name that
//! cannot be resolved is *not* an error; it produces a surrogate node instead
//! (see [`NodeOrigin`](crate::NodeOrigin)).

use alloc::string::String;

/// A single frame line could not be split into unit, operation, and location.
///
/// Returned by [`frame::decode`](crate::frame::decode). The graph decoder
/// converts it into [`DecodeError::MalformedFrame`] once it knows the index of
/// the offending line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("malformed stack frame: {reason}")]
pub struct MalformedFrame {
    /// What part of the frame could not be isolated.
    pub reason: &'static str,
}

/// An error returned when stack trace text cannot be decoded.
///
/// Every variant except [`EmptyInput`](Self::EmptyInput) carries the
/// zero-based index of the offending line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The input contained no header line at all.
    #[error("no failure header found in empty input")]
    EmptyInput,

    /// A frame line could not be split into its parts.
    #[error("line {line}: malformed stack frame: {reason}")]
    MalformedFrame {
        /// Index of the offending line.
        line: usize,
        /// What part of the frame could not be isolated.
        reason: &'static str,
    },

    /// A `... N more` line appeared where no enclosing node can supply the
    /// elided frames.
    #[error("line {line}: elision of {count} frame(s) has no enclosing trace to copy from")]
    DanglingElision {
        /// Index of the offending line.
        line: usize,
        /// The number of frames the marker asked for.
        count: u32,
    },

    /// A circular reference named a failure that is not currently open.
    #[error("line {line}: circular reference to unknown failure `{display}`")]
    UnresolvedCircularReference {
        /// Index of the offending line.
        line: usize,
        /// The display text found inside the marker.
        display: String,
    },

    /// A line matched none of the productions expected at this point.
    #[error("line {line}: unexpected line format")]
    UnknownLineFormat {
        /// Index of the offending line.
        line: usize,
    },
}

impl DecodeError {
    /// Returns the zero-based index of the line the error refers to, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use failtrace::{Codec, error::DecodeError};
    ///
    /// let error = Codec::new()
    ///     .decode("java.lang.Exception\n\tat nowhere\n")
    ///     .unwrap_err();
    /// assert!(matches!(error, DecodeError::MalformedFrame { .. }));
    /// assert_eq!(error.line(), Some(1));
    /// ```
    pub fn line(&self) -> Option<usize> {
        match self {
            DecodeError::EmptyInput => None,
            DecodeError::MalformedFrame { line, .. }
            | DecodeError::DanglingElision { line, .. }
            | DecodeError::UnresolvedCircularReference { line, .. }
            | DecodeError::UnknownLineFormat { line } => Some(*line),
        }
    }

    /// Returns a short, stable name for the kind of error.
    ///
    /// Useful as a structured field when logging.
    pub fn kind(&self) -> &'static str {
        match self {
            DecodeError::EmptyInput => "empty_input",
            DecodeError::MalformedFrame { .. } => "malformed_frame",
            DecodeError::DanglingElision { .. } => "dangling_elision",
            DecodeError::UnresolvedCircularReference { .. } => "unresolved_circular_reference",
            DecodeError::UnknownLineFormat { .. } => "unknown_line_format",
        }
    }

    pub(crate) fn malformed_frame(line: usize, error: MalformedFrame) -> Self {
        DecodeError::MalformedFrame {
            line,
            reason: error.reason,
        }
    }
}

/// An error returned when a [`TransformBuilder`] is misused.
///
/// [`TransformBuilder`]: crate::transform::TransformBuilder
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The configuration would be ambiguous or the builder has already been
    /// finished.
    #[error("ambiguous transform configuration: {reason}")]
    AmbiguousConfiguration {
        /// Which rule caused the conflict.
        reason: &'static str,
    },
}
