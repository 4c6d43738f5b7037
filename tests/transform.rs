use failtrace::{
    BackRef, Cause, Codec, FailureNode,
    codec::CodecConfig,
    context::TransformContext,
    frame::{self, LineNumber, StackFrame},
    transform::Transform,
};

const WRAPPERS: [&str; 2] = [
    "java.lang.reflect.InvocationTargetException",
    "java.util.concurrent.ExecutionException",
];

fn reflection_cleanup() -> Transform {
    let mut builder = Transform::builder();
    builder
        .unwrap_when(|node| WRAPPERS.contains(&node.type_name()))
        .unwrap()
        .map_frames(|frame| {
            (!frame::qualified_operation(&frame).starts_with("sun.reflect.")).then_some(frame)
        })
        .unwrap();
    builder.finish().unwrap()
}

fn reflective_failure() -> FailureNode {
    let call = StackFrame::new("app.Handler", "call", Some("Handler.java"), LineNumber::Number(3));
    let invoke = StackFrame::new(
        "sun.reflect.NativeMethodAccessorImpl",
        "invoke0",
        None::<&str>,
        LineNumber::Native,
    );
    FailureNode::new("app.DispatchFailed")
        .with_frames([invoke.clone(), call.clone()])
        .with_cause(
            FailureNode::new(WRAPPERS[0]).with_cause(
                FailureNode::new(WRAPPERS[1])
                    .with_cause(FailureNode::new("java.io.IOException").with_frames([invoke, call])),
            ),
        )
}

#[test]
fn unwrap_twice_equals_unwrap_once() {
    let transform = reflection_cleanup();
    let once = transform.apply(reflective_failure()).unwrap();
    let twice = transform.apply(once.clone()).unwrap();
    assert_eq!(once, twice);

    let chain: Vec<_> = once.cause_chain().map(FailureNode::type_name).collect();
    assert_eq!(chain, ["app.DispatchFailed", "java.io.IOException"]);
    assert!(
        once.cause_chain()
            .flat_map(|node| &node.frames)
            .all(|frame| frame.unit() == "app.Handler")
    );
}

#[test]
fn transformed_graph_encodes_cleanly() {
    let codec = Codec::new().with_config(CodecConfig {
        line_terminator: "\n".into(),
        ..CodecConfig::DEFAULT
    });
    let node = reflection_cleanup().apply(reflective_failure()).unwrap();
    assert_eq!(
        codec.encode(&node),
        "app.DispatchFailed\n\
         \tat app.Handler.call(Handler.java:3)\n\
         Caused by: java.io.IOException\n\
         \tat app.Handler.call(Handler.java:3)\n"
    );
}

#[test]
fn unwrapped_cycle_target_still_decodes() {
    let codec = Codec::new().with_config(CodecConfig {
        line_terminator: "\n".into(),
        ..CodecConfig::DEFAULT
    });
    let wrapper = FailureNode::new(WRAPPERS[0]);
    let mut inner = FailureNode::new("app.Inner");
    inner.cause = Cause::BackRef(BackRef::to(&wrapper));
    let node = FailureNode::new("app.Top").with_cause(wrapper.with_cause(inner));

    let node = reflection_cleanup().apply(node).unwrap();
    let text = codec.encode(&node);
    assert_eq!(
        text,
        "app.Top\n\
         Caused by: app.Inner\n\
         \t[CIRCULAR REFERENCE:app.Inner]\n"
    );

    let decoded = codec.decode(&text).unwrap();
    assert_eq!(decoded, node);
    let inner = decoded.cause.as_owned().unwrap();
    assert_eq!(inner.cause.as_back_ref().unwrap().target(), inner.id());
}

#[test]
fn transform_is_shared_across_threads() {
    let transform = reflection_cleanup();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let transform = transform.clone();
            std::thread::spawn(move || {
                transform
                    .apply(reflective_failure())
                    .unwrap()
                    .root_cause()
                    .type_name()
                    .to_owned()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), "java.io.IOException");
    }
}

#[test]
fn rethrow_uses_context_default() {
    fn load(context: &TransformContext) -> Result<u32, FailureNode> {
        context.rethrow(reflective_failure())
    }

    fn run(context: &TransformContext) -> Result<u32, FailureNode> {
        let value = load(context)?;
        Ok(value + 1)
    }

    let mut context = TransformContext::new();
    let error = run(&context).unwrap_err();
    assert_eq!(error.cause_chain().count(), 4);

    context.set_default(reflection_cleanup());
    let child = context.inherit();
    context.clear_default();

    let error = run(&child).unwrap_err();
    assert_eq!(error.cause_chain().count(), 2);
    assert_eq!(run(&context).unwrap_err().cause_chain().count(), 4);
}
