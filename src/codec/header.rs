//! Node headers and frame lists.

use alloc::string::String;
use std::sync::OnceLock;

use super::{CodecConfig, tokens};
use crate::{FailureNode, frame, resolver::TypeResolver};

/// Writes the header of `node` followed by its frame lines. The caller has
/// already written whatever introduces the node (`Caused by: ` and so on).
pub(crate) fn write_node_body(
    out: &mut String,
    prefix: &str,
    node: &FailureNode,
    config: &CodecConfig,
) {
    out.push_str(&node.display_text());
    out.push_str(&config.line_terminator);
    for frame in &node.frames {
        out.push_str(prefix);
        out.push_str(tokens::FRAME);
        out.push_str(&frame::encode(frame));
        out.push_str(&config.line_terminator);
    }
}

/// Splits a header line into type name and the first line of the message.
pub(crate) fn split_header(header: &str) -> (&str, Option<&str>) {
    match header.split_once(tokens::MESSAGE_SEPARATOR) {
        Some((type_name, message)) => (type_name, Some(message)),
        None => (header, None),
    }
}

/// Builds the node a header describes, falling back to a surrogate when the
/// resolver does not know the type.
pub(crate) fn construct(
    type_name: &str,
    message: Option<String>,
    resolver: &dyn TypeResolver,
    config: &CodecConfig,
) -> FailureNode {
    let mut node = match resolver.resolve(type_name) {
        Some(ty) => ty.construct_default(),
        None => FailureNode::surrogate(type_name, config.surrogate_indicator.clone().into_owned()),
    };
    node.message = message;
    node
}

/// Returns the `N` of an elision line such as `\t\t... 3 more` once the
/// node's prefix has been stripped, or `None` if the text is not an elision
/// line. Counts too large for a `u32` saturate.
pub(crate) fn elision_count(rest: &str) -> Option<u32> {
    static ELISION: OnceLock<regex::Regex> = OnceLock::new();
    let elision = ELISION.get_or_init(|| {
        regex::Regex::new(r"^\t*\t\.\.\. ([0-9]+) more$")
            .expect("built-in regex pattern for elision lines should be valid")
    });
    let digits = elision.captures(rest)?.get(1)?.as_str();
    Some(digits.parse().unwrap_or(u32::MAX))
}

/// Returns `true` if `line` is one of the structural productions of the
/// format at `prefix` or at any shorter prefix. Such a line ends a message
/// that spans several lines.
pub(crate) fn is_structural(line: &str, prefix: &str) -> bool {
    let rest = line.trim_start_matches(tokens::INDENT);
    let tabs = line.len() - rest.len();
    let depth = prefix.len();

    let framed = |token: &str| {
        tabs >= 1
            && tabs <= depth + 1
            && rest.starts_with(&token[tokens::INDENT.len()..])
    };

    framed(tokens::FRAME)
        || framed(tokens::SUPPRESSED)
        || framed(tokens::CIRCULAR_OPEN)
        || (tabs <= depth && rest.starts_with(tokens::CAUSED_BY))
        || (tabs >= 1 && elision_count(&line[tabs - 1..]).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{AnyType, KnownTypes};

    #[test]
    fn test_split_header() {
        assert_eq!(split_header("a.B"), ("a.B", None));
        assert_eq!(split_header("a.B: "), ("a.B", Some("")));
        assert_eq!(split_header("a.B: x: y"), ("a.B", Some("x: y")));
        assert_eq!(split_header("a.B:x"), ("a.B:x", None));
    }

    #[test]
    fn test_elision_count() {
        assert_eq!(elision_count("\t... 3 more"), Some(3));
        assert_eq!(elision_count("\t\t\t... 12 more"), Some(12));
        assert_eq!(elision_count("... 3 more"), None);
        assert_eq!(elision_count("\t... x more"), None);
        assert_eq!(elision_count("\t... 3 more!"), None);
        assert_eq!(elision_count("\t... 99999999999 more"), Some(u32::MAX));
    }

    #[test]
    fn test_is_structural() {
        assert!(is_structural("\tat a.B.c(B.java:1)", ""));
        assert!(is_structural("\t\tat a.B.c(B.java:1)", "\t"));
        assert!(is_structural("\tat a.B.c(B.java:1)", "\t"));
        assert!(!is_structural("\t\tat a.B.c(B.java:1)", ""));
        assert!(is_structural("Caused by: x", ""));
        assert!(is_structural("Caused by: x", "\t"));
        assert!(!is_structural("\tCaused by: x", ""));
        assert!(is_structural("\tSuppressed: x", ""));
        assert!(is_structural("\t[CIRCULAR REFERENCE:x]", ""));
        assert!(is_structural("\t... 2 more", ""));
        assert!(is_structural("\t\t\t... 2 more", ""));
        assert!(!is_structural("at a.B.c(B.java:1)", ""));
        assert!(!is_structural("just text", ""));
    }

    #[test]
    fn test_construct() {
        let config = CodecConfig {
            surrogate_indicator: "<?>".into(),
            ..CodecConfig::DEFAULT
        };
        let node = construct("a.B", Some("m".into()), &AnyType, &config);
        assert!(!node.is_surrogate());
        assert_eq!(node.message(), Some("m"));

        let node = construct("a.B", None, &KnownTypes::new(), &config);
        assert!(node.is_surrogate());
        assert_eq!(node.type_name(), "a.B");
        assert_eq!(node.display_type(), "<?>a.B");
    }

    #[test]
    fn test_write_node_body() {
        let node = FailureNode::new("a.B").with_message("m").with_frames([
            crate::frame::StackFrame::new("a.B", "c", Some("B.java"), crate::frame::LineNumber::Number(3)),
        ]);
        let config = CodecConfig {
            line_terminator: "\n".into(),
            ..CodecConfig::DEFAULT
        };
        let mut out = String::new();
        write_node_body(&mut out, "\t", &node, &config);
        assert_eq!(out, "a.B: m\n\t\tat a.B.c(B.java:3)\n");
    }
}
