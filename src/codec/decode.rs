use alloc::{format, string::String, vec::Vec};

use super::{CodecConfig, header, tokens};
use crate::{
    BackRef, Cause, FailureNode, NodeId, error::DecodeError, frame::StackFrame,
    resolver::TypeResolver,
};

/// Rebuilds a failure graph from text.
pub(crate) fn decode(
    text: &str,
    resolver: &dyn TypeResolver,
    config: &CodecConfig,
) -> Result<FailureNode, DecodeError> {
    let mut lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    if text.ends_with('\n') {
        lines.pop();
    }

    let Some(&header) = lines.first().filter(|header| !header.is_empty()) else {
        return Err(DecodeError::EmptyInput);
    };

    let mut decoder = Decoder {
        lines,
        cursor: 1,
        open: Vec::new(),
        resolver,
        config,
    };
    let root = decoder.decode_node(header, "", None)?;

    if decoder.cursor < decoder.lines.len() {
        return Err(DecodeError::UnknownLineFormat {
            line: decoder.cursor,
        });
    }
    Ok(root)
}

struct Decoder<'t, 'a> {
    lines: Vec<&'t str>,
    /// Index of the next unread line.
    cursor: usize,
    /// Nodes whose suppressed entries or cause are being decoded, innermost
    /// last, with the display text a circular reference would use.
    open: Vec<(NodeId, String)>,
    resolver: &'a dyn TypeResolver,
    config: &'a CodecConfig,
}

impl<'t> Decoder<'t, '_> {
    fn peek(&self) -> Option<&'t str> {
        self.lines.get(self.cursor).copied()
    }

    /// Returns the rest of the next line if it starts with `prefix` followed
    /// by `token`.
    fn peek_after(&self, prefix: &str, token: &str) -> Option<&'t str> {
        self.peek()?.strip_prefix(prefix)?.strip_prefix(token)
    }

    /// Decodes one node whose header line has already been consumed, along
    /// with everything nested under it.
    ///
    /// `enclosing` holds the frames of the node this one hangs off, which is
    /// where an elision marker copies its frames from.
    fn decode_node(
        &mut self,
        header: &'t str,
        prefix: &str,
        enclosing: Option<&[StackFrame]>,
    ) -> Result<FailureNode, DecodeError> {
        let (type_name, first_message_line) = header::split_header(header);
        let indicator = &*self.config.surrogate_indicator;
        let type_name = match type_name.strip_prefix(indicator) {
            Some(stripped) if !indicator.is_empty() => stripped,
            _ => type_name,
        };

        let mut message = first_message_line.map(String::from);
        while let Some(line) = self.peek() {
            if header::is_structural(line, prefix) {
                break;
            }
            let Some(message) = &mut message else {
                break;
            };
            message.push_str(&self.config.line_terminator);
            message.push_str(line);
            self.cursor += 1;
        }

        let mut node = header::construct(type_name, message, self.resolver, self.config);

        let frame_offset = prefix.len() + tokens::FRAME.len();
        while let Some(line) = self.peek() {
            if self.peek_after(prefix, tokens::FRAME).is_none() {
                break;
            }
            let frame = crate::frame::decode(line, frame_offset)
                .map_err(|error| DecodeError::malformed_frame(self.cursor, error))?;
            node.frames.push(frame);
            self.cursor += 1;
        }

        if let Some(count) = self
            .peek()
            .and_then(|line| line.strip_prefix(prefix))
            .and_then(header::elision_count)
        {
            let available = enclosing.unwrap_or_default();
            let shared = usize::try_from(count)
                .ok()
                .filter(|&shared| enclosing.is_some() && shared <= available.len())
                .ok_or(DecodeError::DanglingElision {
                    line: self.cursor,
                    count,
                })?;
            node.frames
                .extend_from_slice(&available[available.len() - shared..]);
            self.cursor += 1;
        }

        let nested_prefix = format!("{prefix}{}", tokens::INDENT);
        while let Some(header) = self.peek_after(prefix, tokens::SUPPRESSED) {
            self.cursor += 1;
            self.open.push((node.id(), node.display_text()));
            let suppressed = self.decode_node(header, &nested_prefix, Some(&node.frames))?;
            self.open.pop();
            node.suppressed.push(suppressed);
        }

        if let Some(first) = self.peek_after(prefix, tokens::CIRCULAR_OPEN) {
            let line = self.cursor;
            let (target, display, consumed) = self.resolve_circular(first, &node);
            let Some(target) = target else {
                return Err(DecodeError::UnresolvedCircularReference { line, display });
            };
            node.cause = Cause::BackRef(BackRef::new(target, display));
            self.cursor += consumed;
        } else if let Some(header) = self.peek_after(prefix, tokens::CAUSED_BY) {
            self.cursor += 1;
            self.open.push((node.id(), node.display_text()));
            let cause = self.decode_node(header, prefix, Some(&node.frames))?;
            self.open.pop();
            node.cause = Cause::from(cause);
        }

        Ok(node)
    }

    /// Reads the display text of a circular reference starting with `first`,
    /// the rest of its opening line. The text spans several lines when the
    /// target's message does, so every line ending in `]` is a candidate
    /// end; the first candidate naming an open ancestor wins.
    ///
    /// Ancestors are searched most recent first. The node being decoded is
    /// only considered when no ancestor matches, which is what a node that
    /// is its own cause looks like.
    ///
    /// Returns the target, the display text, and the number of lines the
    /// reference occupies. Without a target, the display text is the first
    /// candidate.
    fn resolve_circular(
        &self,
        first: &str,
        node: &FailureNode,
    ) -> (Option<NodeId>, String, usize) {
        let own_display = node.display_text();
        let mut display = String::from(first);
        let mut unresolved: Option<String> = None;

        for (offset, line) in self.lines[self.cursor..].iter().enumerate() {
            if offset > 0 {
                display.push_str(&self.config.line_terminator);
                display.push_str(line);
            }
            let Some(candidate) = display.strip_suffix(tokens::CIRCULAR_CLOSE) else {
                continue;
            };
            let target = self
                .open
                .iter()
                .rev()
                .find(|(_, open)| open == candidate)
                .map(|&(id, _)| id)
                .or_else(|| (own_display == candidate).then(|| node.id()));
            if target.is_some() {
                return (target, candidate.into(), offset + 1);
            }
            unresolved.get_or_insert_with(|| String::from(candidate));
        }

        (None, unresolved.unwrap_or_else(|| first.into()), 1)
    }
}
