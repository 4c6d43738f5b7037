use alloc::string::String;

use indexmap::IndexMap;

use super::{CodecConfig, header, tokens};
use crate::{Cause, FailureNode, NodeId};

/// Writes a whole graph. Elision is never applied: every node is written
/// with its complete frame list.
pub(crate) fn encode(root: &FailureNode, config: &CodecConfig) -> String {
    let mut encoder = Encoder {
        out: String::new(),
        config,
        open: IndexMap::new(),
    };
    header::write_node_body(&mut encoder.out, "", root, config);
    encoder.write_relations("", root);
    encoder.out
}

struct Encoder<'a> {
    out: String,
    config: &'a CodecConfig,
    /// The display text of every node whose subtree is being written, by
    /// identity.
    open: IndexMap<NodeId, String>,
}

impl Encoder<'_> {
    /// Writes the suppressed entries and then the cause of a node whose
    /// header and frames have already been written.
    fn write_relations(&mut self, prefix: &str, node: &FailureNode) {
        let shadowed = self.open.insert(node.id(), node.display_text());

        let nested = {
            let mut nested = String::with_capacity(prefix.len() + tokens::INDENT.len());
            nested.push_str(prefix);
            nested.push_str(tokens::INDENT);
            nested
        };
        for suppressed in &node.suppressed {
            self.out.push_str(prefix);
            self.out.push_str(tokens::SUPPRESSED);
            header::write_node_body(&mut self.out, &nested, suppressed, self.config);
            self.write_relations(&nested, suppressed);
        }

        match &node.cause {
            Cause::None => {}
            Cause::Owned(cause) => {
                self.out.push_str(prefix);
                self.out.push_str(tokens::CAUSED_BY);
                header::write_node_body(&mut self.out, prefix, cause, self.config);
                self.write_relations(prefix, cause);
            }
            Cause::BackRef(back_ref) => {
                let display = self
                    .open
                    .get(&back_ref.target())
                    .map_or(back_ref.display(), String::as_str);
                self.out.push_str(prefix);
                self.out.push_str(tokens::CIRCULAR_OPEN);
                self.out.push_str(display);
                self.out.push_str(tokens::CIRCULAR_CLOSE);
                self.out.push_str(&self.config.line_terminator);
            }
        }

        match shadowed {
            Some(display) => {
                self.open.insert(node.id(), display);
            }
            None => {
                self.open.pop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        BackRef,
        frame::{LineNumber, StackFrame},
    };

    fn config() -> CodecConfig {
        CodecConfig {
            line_terminator: "\n".into(),
            ..CodecConfig::DEFAULT
        }
    }

    fn frame(operation: &str, line: i32) -> StackFrame {
        StackFrame::new("app.Main", operation, Some("Main.java"), LineNumber::Number(line))
    }

    #[test]
    fn test_encode_cause_keeps_full_frames() {
        let f1 = frame("a", 1);
        let f2 = frame("b", 2);
        let f3 = frame("c", 3);
        let node = FailureNode::new("java.lang.Exception")
            .with_message("main exception")
            .with_frames([f1.clone(), f2.clone()])
            .with_cause(
                FailureNode::new("java.lang.Error")
                    .with_message("the real cause")
                    .with_frames([f1, f2, f3]),
            );
        assert_eq!(
            encode(&node, &config()),
            "java.lang.Exception: main exception\n\
             \tat app.Main.a(Main.java:1)\n\
             \tat app.Main.b(Main.java:2)\n\
             Caused by: java.lang.Error: the real cause\n\
             \tat app.Main.a(Main.java:1)\n\
             \tat app.Main.b(Main.java:2)\n\
             \tat app.Main.c(Main.java:3)\n"
        );
    }

    #[test]
    fn test_encode_suppressed_indentation() {
        let node = FailureNode::new("Top")
            .with_frames([frame("a", 1)])
            .with_suppressed(
                FailureNode::new("Side")
                    .with_message("closing")
                    .with_frames([frame("b", 2)])
                    .with_suppressed(FailureNode::new("Deep"))
                    .with_cause(FailureNode::new("SideCause").with_frames([frame("c", 3)])),
            )
            .with_cause(FailureNode::new("Cause"));
        assert_eq!(
            encode(&node, &config()),
            "Top\n\
             \tat app.Main.a(Main.java:1)\n\
             \tSuppressed: Side: closing\n\
             \t\tat app.Main.b(Main.java:2)\n\
             \t\tSuppressed: Deep\n\
             \tCaused by: SideCause\n\
             \t\tat app.Main.c(Main.java:3)\n\
             Caused by: Cause\n"
        );
    }

    #[test]
    fn test_encode_back_ref_uses_live_display() {
        let mut root = FailureNode::new("Loop").with_message("before");
        root.cause = Cause::BackRef(BackRef::to(&root));
        root.message = Some("after".into());
        assert_eq!(
            encode(&root, &config()),
            "Loop: after\n\t[CIRCULAR REFERENCE:Loop: after]\n"
        );

        // A dangling link falls back to the snapshot.
        let detached = FailureNode::new("Other").with_cause(FailureNode::new("x"));
        let mut orphan = FailureNode::new("Orphan");
        orphan.cause = Cause::BackRef(BackRef::to(&detached));
        assert_eq!(
            encode(&orphan, &config()),
            "Orphan\n\t[CIRCULAR REFERENCE:Other]\n"
        );
    }

    #[test]
    fn test_encode_surrogate() {
        let node = FailureNode::surrogate("gone.Type", "?").with_message("m");
        assert_eq!(encode(&node, &config()), "?gone.Type: m\n");
    }
}
