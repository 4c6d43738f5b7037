use std::{
    io,
    sync::{Arc, Mutex},
};

use failtrace::{
    BackRef, Cause, Codec, FailureNode,
    frame::{LineNumber, StackFrame},
};
use failtrace_tracing::{DecodeResultExt, FailureTracingExt, TraceOptions};
use tracing::Level;

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }
}

fn capture(f: impl FnOnce()) -> Vec<String> {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::TRACE)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    captured.lines()
}

fn sample() -> FailureNode {
    FailureNode::new("app.Failure")
        .with_message("request failed")
        .with_frames([StackFrame::new(
            "app.Service",
            "handle",
            Some("Service.java"),
            LineNumber::Number(42),
        )])
        .with_suppressed(FailureNode::new("app.Close"))
        .with_cause(FailureNode::new("app.Io").with_message("connection reset"))
}

#[test]
fn one_event_per_node_in_text_order() {
    let lines = capture(|| sample().trace_failure(Level::ERROR));
    assert_eq!(lines.len(), 3, "{lines:#?}");

    assert!(lines[0].contains("ERROR"));
    assert!(lines[0].contains("request failed"));
    assert!(lines[0].contains("depth=0"));
    assert!(lines[0].contains("relation=\"root\""));
    assert!(lines[0].contains("app.Service.handle(Service.java:42)"));

    assert!(lines[1].contains("depth=1"));
    assert!(lines[1].contains("relation=\"suppressed\""));
    assert!(lines[1].contains("app.Close"));

    assert!(lines[2].contains("depth=0"));
    assert!(lines[2].contains("relation=\"cause\""));
    assert!(lines[2].contains("connection reset"));
}

#[test]
fn frames_can_be_left_out() {
    let options = TraceOptions {
        include_frames: false,
    };
    let lines = capture(|| sample().trace_failure_with(Level::INFO, options));
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|line| line.contains("INFO")));
    assert!(lines.iter().all(|line| !line.contains("frames=")));
}

#[test]
fn circular_cause_gets_its_own_event() {
    let mut middle = FailureNode::new("app.Middle");
    let root = FailureNode::new("app.Outer").with_message("o");
    middle.cause = Cause::BackRef(BackRef::to(&root));
    let root = root.with_cause(middle);

    let lines = capture(|| root.trace_failure(Level::WARN));
    assert_eq!(lines.len(), 3, "{lines:#?}");
    assert!(lines[2].contains("relation=\"circular\""));
    assert!(lines[2].contains("app.Outer: o"));
}

#[test]
fn decode_errors_are_logged_and_returned() {
    let codec = Codec::new();
    let mut result = None;
    let lines = capture(|| {
        result = Some(codec.decode("app.Failure\n\tat nowhere\n").log_decode_error());
    });
    assert!(result.unwrap().is_err());
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("WARN"));
    assert!(lines[0].contains("kind=\"malformed_frame\""));
    assert!(lines[0].contains("line=1"));

    let lines = capture(|| {
        codec.decode("app.Failure\n").log_decode_error().unwrap();
    });
    assert!(lines.is_empty());
}
