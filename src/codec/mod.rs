//! The stack trace text format.
//!
//! # Format
//!
//! A failure graph is written as a sequence of lines. Every node starts with
//! a header, `type: message` (or just `type` when there is no message),
//! followed by its frames, its suppressed failures, and finally its cause:
//!
//! ```text
//! java.lang.Exception: main exception
//! 	at app.Main.run(Main.java:10)
//! 	at app.Main.main(Main.java:4)
//! 	Suppressed: java.io.IOException: close failed
//! 		at app.Resource.close(Resource.java:22)
//! 		... 1 more
//! Caused by: java.lang.Error: the real cause
//! 	at app.Worker.work(Worker.java:7)
//! 	... 2 more
//! ```
//!
//! - A frame line is the node's prefix, a tab, `at `, and the frame (see
//!   [`frame`](crate::frame)).
//! - A suppressed failure is introduced by the prefix, a tab, and
//!   `Suppressed: `. All of its lines carry one more tab of prefix.
//! - A cause is introduced by the prefix and `Caused by: `. Causes stay at
//!   the prefix of the node they belong to.
//! - `... N more` says that the last `N` frames are the same as the last `N`
//!   frames of the enclosing node. The decoder expands it; the encoder never
//!   writes it.
//! - `[CIRCULAR REFERENCE:text]` closes a cause chain that loops back to an
//!   ancestor whose header is `text`.
//!
//! Messages are written verbatim, even when they span several lines. A
//! message line that looks like one of the productions above is read as that
//! production.
//!
//! # Usage
//!
//! ```
//! use failtrace::{Codec, FailureNode};
//!
//! let node = FailureNode::new("java.lang.Exception")
//!     .with_message("main exception")
//!     .with_cause(FailureNode::new("java.lang.Error").with_message("the real cause"));
//!
//! let codec = Codec::new();
//! let text = codec.encode(&node);
//! assert_eq!(
//!     text,
//!     "java.lang.Exception: main exception\nCaused by: java.lang.Error: the real cause\n"
//! );
//! assert_eq!(codec.decode(&text).unwrap(), node);
//! ```

use alloc::{borrow::Cow, boxed::Box, string::String};
use std::sync::OnceLock;

use crate::{
    FailureNode,
    error::DecodeError,
    resolver::{AnyType, TypeResolver},
};

pub(crate) mod decode;
pub(crate) mod encode;
pub(crate) mod header;

/// The literal tokens of the text format.
pub mod tokens {
    /// One level of suppressed-nesting indentation.
    pub const INDENT: &str = "\t";
    /// Starts a frame line, after the prefix.
    pub const FRAME: &str = "\tat ";
    /// Starts a suppressed failure, after the prefix.
    pub const SUPPRESSED: &str = "\tSuppressed: ";
    /// Starts a cause, after the prefix.
    pub const CAUSED_BY: &str = "Caused by: ";
    /// Starts a circular reference, after the prefix.
    pub const CIRCULAR_OPEN: &str = "\t[CIRCULAR REFERENCE:";
    /// Ends a circular reference.
    pub const CIRCULAR_CLOSE: &str = "]";
    /// Separates the type name from the message in a header.
    pub const MESSAGE_SEPARATOR: &str = ": ";
}

/// The platform's native line terminator.
#[cfg(windows)]
pub const PLATFORM_LINE_TERMINATOR: &str = "\r\n";
/// The platform's native line terminator.
#[cfg(not(windows))]
pub const PLATFORM_LINE_TERMINATOR: &str = "\n";

/// Settings for writing stack trace text.
///
/// # Examples
///
/// ```
/// use failtrace::codec::CodecConfig;
///
/// let config = CodecConfig {
///     surrogate_indicator: "[unresolved] ".into(),
///     ..CodecConfig::DEFAULT
/// };
/// assert_eq!(config.line_terminator, failtrace::codec::PLATFORM_LINE_TERMINATOR);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Written after every line.
    pub line_terminator: Cow<'static, str>,
    /// Given to surrogate nodes created while decoding, and written in front
    /// of their type name.
    pub surrogate_indicator: Cow<'static, str>,
}

impl CodecConfig {
    /// The default settings: the platform line terminator and no surrogate
    /// indicator.
    pub const DEFAULT: Self = Self {
        line_terminator: Cow::Borrowed(PLATFORM_LINE_TERMINATOR),
        surrogate_indicator: Cow::Borrowed(""),
    };

    /// Settings read once from the environment.
    ///
    /// # Environment Variables
    ///
    /// - `FAILTRACE_LINE_TERMINATOR` - `lf` or `crlf`; anything else keeps
    ///   the platform terminator.
    /// - `FAILTRACE_SURROGATE_INDICATOR` - text written before the type of
    ///   surrogate nodes.
    pub fn from_env() -> &'static Self {
        static FROM_ENV: OnceLock<CodecConfig> = OnceLock::new();

        FROM_ENV.get_or_init(|| {
            let line_terminator = match std::env::var("FAILTRACE_LINE_TERMINATOR") {
                Ok(value) if value.eq_ignore_ascii_case("lf") => Cow::Borrowed("\n"),
                Ok(value) if value.eq_ignore_ascii_case("crlf") => Cow::Borrowed("\r\n"),
                _ => Cow::Borrowed(PLATFORM_LINE_TERMINATOR),
            };
            let surrogate_indicator = std::env::var("FAILTRACE_SURROGATE_INDICATOR")
                .map(Cow::Owned)
                .unwrap_or(Cow::Borrowed(""));
            CodecConfig {
                line_terminator,
                surrogate_indicator,
            }
        })
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Encoder and decoder for stack trace text.
///
/// A codec pairs a [`CodecConfig`] with the [`TypeResolver`] used to decide
/// which decoded type names become surrogate nodes.
pub struct Codec {
    config: CodecConfig,
    resolver: Box<dyn TypeResolver + Send + Sync>,
}

impl Codec {
    /// Creates a codec with [`CodecConfig::DEFAULT`] that resolves every type
    /// name.
    pub fn new() -> Self {
        Self {
            config: CodecConfig::DEFAULT,
            resolver: Box::new(AnyType),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the type resolver.
    #[must_use]
    pub fn with_resolver<R>(mut self, resolver: R) -> Self
    where
        R: TypeResolver + Send + Sync + 'static,
    {
        self.resolver = Box::new(resolver);
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Writes `node` and everything reachable from it.
    pub fn encode(&self, node: &FailureNode) -> String {
        encode::encode(node, &self.config)
    }

    /// Rebuilds a failure graph from text.
    ///
    /// Lines may end in `\n` or `\r\n`, whatever the configured terminator.
    pub fn decode(&self, text: &str) -> Result<FailureNode, DecodeError> {
        decode::decode(text, &*self.resolver, &self.config)
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Codec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Codec")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Decodes `text` with [`CodecConfig::DEFAULT`], resolving every type name.
pub fn decode(text: &str) -> Result<FailureNode, DecodeError> {
    decode::decode(text, &AnyType, &CodecConfig::DEFAULT)
}

/// Encodes `node` with [`CodecConfig::DEFAULT`].
pub fn encode(node: &FailureNode) -> String {
    encode::encode(node, &CodecConfig::DEFAULT)
}
