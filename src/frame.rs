//! Stack frames and their one-line text form.
//!
//! A frame line looks like `unit.operation(location)`, for example
//! `com.example.Service.handle(Service.java:42)`. The location is one of:
//!
//! - `Native Method` for frames executing native code,
//! - `Unknown Source` when no source label is known,
//! - `label:line` or just `label` otherwise.
//!
//! The unit is everything up to the *last* dot before the opening
//! parenthesis, so dotted unit names such as `java.util.ArrayList` survive,
//! while operation names never contain dots.

use alloc::{
    format,
    string::{String, ToString},
};
use core::fmt;

use crate::error::MalformedFrame;

const NATIVE_METHOD: &str = "Native Method";
const UNKNOWN_SOURCE: &str = "Unknown Source";

/// The line indicator of a [`StackFrame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineNumber {
    /// A known line in the source label.
    Number(i32),
    /// The frame is executing native code.
    Native,
    /// No line information is available.
    Unavailable,
}

/// A single call-stack frame.
///
/// Frames are plain values; once constructed they are never modified. A
/// [`Transform`](crate::transform::Transform) replaces frames rather than
/// editing them.
///
/// # Examples
///
/// ```
/// use failtrace::frame::{LineNumber, StackFrame};
///
/// let frame = StackFrame::new("com.example.Service", "handle", Some("Service.java"), LineNumber::Number(42));
/// assert_eq!(frame.to_string(), "com.example.Service.handle(Service.java:42)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StackFrame {
    unit: String,
    operation: String,
    source_label: Option<String>,
    line: LineNumber,
}

impl StackFrame {
    /// Creates a new frame.
    pub fn new(
        unit: impl Into<String>,
        operation: impl Into<String>,
        source_label: Option<impl Into<String>>,
        line: LineNumber,
    ) -> Self {
        Self {
            unit: unit.into(),
            operation: operation.into(),
            source_label: source_label.map(Into::into),
            line,
        }
    }

    /// The declaring unit, e.g. a fully qualified class name.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// The operation (method or function) name.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// The source label, usually a file name.
    pub fn source_label(&self) -> Option<&str> {
        self.source_label.as_deref()
    }

    /// The line indicator.
    pub fn line(&self) -> LineNumber {
        self.line
    }

    /// Returns `true` if the frame executes native code.
    pub fn is_native(&self) -> bool {
        self.line == LineNumber::Native
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.unit, self.operation)?;
        match (&self.source_label, self.line) {
            (_, LineNumber::Native) => f.write_str(NATIVE_METHOD)?,
            (None, _) => f.write_str(UNKNOWN_SOURCE)?,
            (Some(label), LineNumber::Number(line)) => write!(f, "{label}:{line}")?,
            (Some(label), LineNumber::Unavailable) => f.write_str(label)?,
        }
        f.write_str(")")
    }
}

/// Encodes a frame as a single line of text, without any indentation or
/// frame marker.
pub fn encode(frame: &StackFrame) -> String {
    frame.to_string()
}

/// Decodes a frame from `text`, starting at byte offset `start`.
///
/// Anything after the closing parenthesis is ignored.
///
/// # Examples
///
/// ```
/// use failtrace::frame::{self, LineNumber};
///
/// let line = "\tat java.util.ArrayList.get(ArrayList.java:427)";
/// let frame = frame::decode(line, 4).unwrap();
/// assert_eq!(frame.unit(), "java.util.ArrayList");
/// assert_eq!(frame.operation(), "get");
/// assert_eq!(frame.source_label(), Some("ArrayList.java"));
/// assert_eq!(frame.line(), LineNumber::Number(427));
/// ```
pub fn decode(text: &str, start: usize) -> Result<StackFrame, MalformedFrame> {
    let text = text.get(start..).ok_or(MalformedFrame {
        reason: "start offset is out of bounds",
    })?;

    let mut unit_end = None;
    let mut location_start = None;
    let mut last_colon = None;
    let mut location_end = None;

    for (i, c) in text.char_indices() {
        match (c, location_start) {
            ('.', None) => unit_end = Some(i),
            ('(', None) => location_start = Some(i),
            (':', Some(_)) => last_colon = Some(i),
            (')', Some(_)) => location_end = Some(i),
            _ => {}
        }
    }

    let Some(location_start) = location_start else {
        return Err(MalformedFrame {
            reason: "missing opening parenthesis",
        });
    };
    let Some(location_end) = location_end else {
        return Err(MalformedFrame {
            reason: "missing closing parenthesis",
        });
    };
    let Some(unit_end) = unit_end.filter(|&end| end > 0) else {
        return Err(MalformedFrame {
            reason: "missing declaring unit",
        });
    };

    let unit = &text[..unit_end];
    let operation = &text[unit_end + 1..location_start];
    if operation.is_empty() {
        return Err(MalformedFrame {
            reason: "missing operation name",
        });
    }

    let location = &text[location_start + 1..location_end];
    let (source_label, line) = if location == NATIVE_METHOD {
        (None, LineNumber::Native)
    } else if location == UNKNOWN_SOURCE {
        (None, LineNumber::Unavailable)
    } else {
        match last_colon.filter(|&colon| colon < location_end) {
            Some(colon) => match text[colon + 1..location_end].parse::<i32>() {
                Ok(line) => (
                    Some(text[location_start + 1..colon].to_string()),
                    LineNumber::Number(line),
                ),
                Err(_) => (Some(location.to_string()), LineNumber::Unavailable),
            },
            None => (Some(location.to_string()), LineNumber::Unavailable),
        }
    };

    Ok(StackFrame {
        unit: unit.to_string(),
        operation: operation.to_string(),
        source_label,
        line,
    })
}

/// Builds the `unit.operation` part of a frame, mostly useful in transform
/// rules that match on it.
pub fn qualified_operation(frame: &StackFrame) -> String {
    format!("{}.{}", frame.unit, frame.operation)
}
