//! Registration, parsing and top-level error selection.

mod common;

use common::{Source, assert_error, dispatcher, ok, recording_consumer};
use cmdgrammar_core::{
    ErrorKind, NodeId, argument, greedy_string, integer, integer_range, literal, string, word,
};

// ─── Registration ────────────────────────────────────────────────────────────

#[test]
fn registering_a_path_twice_merges_nodes() {
    let mut d = dispatcher();
    let first = d.register(literal("foo").then(literal("bar").executes(ok)));
    let before = d.tree().len();
    let second = d.register(literal("foo").then(literal("bar").executes(ok)));
    assert_eq!(first, second);
    assert_eq!(d.tree().len(), before);
    assert_eq!(d.node(NodeId::ROOT).children().len(), 1);
}

#[test]
fn re_registering_a_leaf_overwrites_its_command() {
    let mut d = dispatcher();
    d.register(literal("foo").executes(|_| Ok(1)));
    d.register(literal("foo").executes(|_| Ok(2)));
    assert_eq!(d.execute("foo", Source::default()).unwrap(), 2);
}

#[test]
fn merging_without_a_command_keeps_the_existing_one() {
    let mut d = dispatcher();
    d.register(literal("foo").executes(|_| Ok(7)));
    d.register(literal("foo").then(literal("bar").executes(ok)));
    assert_eq!(d.execute("foo", Source::default()).unwrap(), 7);
    assert_eq!(d.execute("foo bar", Source::default()).unwrap(), 1);
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

#[test]
fn distinct_literal_wins_over_its_prefix() {
    let mut d = dispatcher();
    d.register(literal("foo").executes(|_| Ok(1)));
    d.register(literal("foobar").executes(|_| Ok(2)));

    let parse = d.parse("foobar", Source::default());
    assert!(!parse.reader().can_read());
    assert!(parse.is_complete());
    assert_eq!(d.execute("foobar", Source::default()).unwrap(), 2);
    assert_eq!(d.execute("foo", Source::default()).unwrap(), 1);
}

#[test]
fn literal_is_preferred_over_argument_sibling() {
    let mut d = dispatcher();
    d.register(literal("foo").executes(|_| Ok(1)));
    d.register(argument("name", word()).executes(|_| Ok(2)));
    assert_eq!(d.execute("foo", Source::default()).unwrap(), 1);
    assert_eq!(d.execute("other", Source::default()).unwrap(), 2);
}

#[test]
fn deeper_failure_falls_back_to_sibling_path() {
    let mut d = dispatcher();
    d.register(
        literal("set")
            .then(argument("n", integer()).executes(|ctx| ctx.get_argument::<i32>("n")))
            .then(argument("text", word()).executes(|_| Ok(-1))),
    );
    assert_eq!(d.execute("set 12", Source::default()).unwrap(), 12);
    assert_eq!(d.execute("set twelve", Source::default()).unwrap(), -1);
}

#[test]
fn parse_records_matched_nodes_and_ranges() {
    let mut d = dispatcher();
    d.register(literal("say").then(argument("msg", greedy_string()).executes(ok)));
    let parse = d.parse("say hello there", Source::default());
    let nodes = parse.context().nodes();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].range().get("say hello there"), "say");
    assert_eq!(nodes[1].range().get("say hello there"), "hello there");

    let ctx = parse.context().build(parse.reader().string());
    assert_eq!(ctx.get_argument::<String>("msg").unwrap(), "hello there");
}

#[test]
fn quoted_argument_is_unescaped() {
    let mut d = dispatcher();
    d.register(
        literal("echo").then(argument("text", string()).executes(|ctx| {
            let text = ctx.get_argument_ref::<String>("text")?;
            Ok(text.len() as i32)
        })),
    );
    assert_eq!(d.execute(r#"echo "a \"b\"""#, Source::default()).unwrap(), 5);
}

#[test]
fn wrong_argument_type_is_reported() {
    let mut d = dispatcher();
    d.register(
        literal("n").then(argument("value", integer()).executes(|ctx| {
            let _: String = ctx.get_argument("value")?;
            Ok(1)
        })),
    );
    let err = d.execute("n 3", Source::default()).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::ArgumentTypeMismatch { name, .. } if name == "value"));
}

// ─── Top-level error selection ───────────────────────────────────────────────

#[test]
fn bounds_error_carries_data_and_cursor() {
    let mut d = dispatcher();
    d.register(literal("base").then(argument("n", integer_range(-100, 100)).executes(ok)));
    let err = d.execute("base 101", Source::default()).unwrap_err();
    assert_eq!(
        err.kind(),
        &ErrorKind::IntegerTooHigh {
            found: 101,
            maximum: 100
        }
    );
    assert_eq!(err.cursor(), Some(5));
    let data = err.kind().data();
    assert_eq!(data.get("found").map(String::as_str), Some("101"));
    assert_eq!(data.get("maximum").map(String::as_str), Some("100"));
    assert_eq!(err.kind().code(), "CMD2002");
}

#[test]
fn missing_separator_after_argument_is_reported_at_boundary() {
    let mut d = dispatcher();
    d.register(literal("foo").then(argument("n", integer()).executes(ok)));
    assert_error(
        d.execute("foo 12a", Source::default()),
        &ErrorKind::ExpectedArgumentSeparator,
        Some(6),
    );
}

#[test]
fn literal_glued_to_text_is_an_unknown_command() {
    let mut d = dispatcher();
    d.register(literal("foo").then(argument("n", integer()).executes(ok)));
    assert_error(
        d.execute("foo5", Source::default()),
        &ErrorKind::UnknownCommand,
        Some(0),
    );
}

#[test]
fn single_failed_child_error_is_surfaced() {
    let mut d = dispatcher();
    d.register(literal("base").then(argument("n", integer()).executes(ok)));
    assert_error(
        d.execute("base abc", Source::default()),
        &ErrorKind::ExpectedInt,
        Some(5),
    );
}

#[test]
fn several_failed_children_become_unknown_argument() {
    let mut d = dispatcher();
    d.register(
        literal("base")
            .then(argument("n", integer_range(0, 10)).executes(ok))
            .then(argument("m", integer_range(20, 30)).executes(ok)),
    );
    assert_error(
        d.execute("base 15", Source::default()),
        &ErrorKind::UnknownArgument,
        Some(5),
    );
}

#[test]
fn trailing_separator_is_unknown_argument() {
    let mut d = dispatcher();
    d.register(literal("foo").executes(ok));
    assert_error(
        d.execute("foo ", Source::default()),
        &ErrorKind::UnknownArgument,
        Some(3),
    );
}

#[test]
fn unknown_first_word_is_unknown_command() {
    let mut d = dispatcher();
    d.register(literal("foo").executes(ok));
    let err = d.execute("bar baz", Source::default()).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::UnknownCommand);
    assert_eq!(err.cursor(), Some(0));
    assert_eq!(err.context().as_deref(), Some("<--[HERE]"));
}

#[test]
fn non_executable_path_is_unknown_command_and_notifies_consumer() {
    let mut d = dispatcher();
    d.register(literal("a").then(literal("b").executes(ok)));
    let (consumer, log) = recording_consumer();
    d.set_consumer(consumer);

    assert_error(
        d.execute("a", Source::player("steve")),
        &ErrorKind::UnknownCommand,
        Some(1),
    );
    assert_eq!(
        *log.lock().unwrap(),
        vec![("steve".to_string(), false, 0)]
    );
}

// ─── Permissions ─────────────────────────────────────────────────────────────

#[test]
fn requirement_hides_node_from_parse() {
    let mut d = dispatcher();
    d.register(literal("stop").requires(|s: &Source| s.admin).executes(ok));

    assert_eq!(d.execute("stop", Source::admin("op")).unwrap(), 1);
    assert_error(
        d.execute("stop", Source::player("steve")),
        &ErrorKind::UnknownCommand,
        Some(0),
    );
}

// ─── Default values ──────────────────────────────────────────────────────────

#[test]
fn default_value_fills_missing_trailing_argument() {
    let mut d = dispatcher();
    d.register(
        literal("give").then(
            argument("count", integer())
                .default_value(1i32)
                .executes(|ctx| ctx.get_argument::<i32>("count")),
        ),
    );
    assert_eq!(d.execute("give", Source::default()).unwrap(), 1);
    assert_eq!(d.execute("give 5", Source::default()).unwrap(), 5);

    let parse = d.parse("give", Source::default());
    let ctx = parse.context().build("give");
    let count = ctx.parsed_argument("count").unwrap();
    assert!(count.range().is_empty());
    assert_eq!(count.range().start, 4);
}

#[test]
fn default_values_chain_until_executable() {
    let mut d = dispatcher();
    d.register(
        literal("tp").then(
            argument("x", integer()).default_value(0i32).then(
                argument("y", integer())
                    .default_value(64i32)
                    .executes(|ctx| {
                        Ok(ctx.get_argument::<i32>("x")? + ctx.get_argument::<i32>("y")?)
                    }),
            ),
        ),
    );
    assert_eq!(d.execute("tp", Source::default()).unwrap(), 64);
    assert_eq!(d.execute("tp 3", Source::default()).unwrap(), 67);
    assert_eq!(d.execute("tp 3 4", Source::default()).unwrap(), 7);
}

#[test]
fn default_value_does_not_apply_with_trailing_input() {
    let mut d = dispatcher();
    d.register(
        literal("give").then(argument("count", integer()).default_value(1i32).executes(ok)),
    );
    assert_error(
        d.execute("give ", Source::default()),
        &ErrorKind::UnknownArgument,
        Some(4),
    );
}

// ─── Lookup and ambiguity ────────────────────────────────────────────────────

#[test]
fn path_lookup_round_trips() {
    let mut d = dispatcher();
    d.register(literal("give").then(argument("count", integer()).then(literal("now").executes(ok))));
    let id = d.find_node(["give", "count", "now"]).unwrap();
    assert_eq!(d.get_path(id), vec!["give", "count", "now"]);
    assert_eq!(d.find_node(["give", "later"]), None);
}

#[test]
fn ambiguity_between_literal_and_word_is_reported() {
    let mut d = dispatcher();
    d.register(
        literal("cmd")
            .then(literal("foo").executes(ok))
            .then(argument("name", word()).executes(ok)),
    );
    let mut found = Vec::new();
    d.find_ambiguities(|parent, child, sibling, inputs| {
        found.push((
            d.get_path(parent),
            d.node(child).name().to_string(),
            d.node(sibling).name().to_string(),
            inputs.iter().cloned().collect::<Vec<_>>(),
        ));
    });
    assert_eq!(
        found,
        vec![(
            vec!["cmd".to_string()],
            "foo".to_string(),
            "name".to_string(),
            vec!["foo".to_string()],
        )]
    );
}

// ─── Trace ───────────────────────────────────────────────────────────────────

#[test]
fn trace_describes_hops_and_errors() {
    let mut d = dispatcher();
    d.register(literal("base").then(argument("n", integer_range(0, 10)).executes(ok)));
    let parse = d.parse("base 11", Source::default());
    let trace = parse.trace(&d);

    assert_eq!(trace.hops.len(), 1);
    assert_eq!(trace.hops[0].nodes[0].name, "base");
    assert_eq!(trace.hops[0].nodes[0].kind, "literal");
    assert_eq!(trace.remaining, "11");
    assert!(!trace.complete);
    assert_eq!(trace.errors.len(), 1);
    assert_eq!(trace.errors[0].node, vec!["base", "n"]);
    assert_eq!(trace.errors[0].diagnostic.id, "CMD2002");

    let json = cmdgrammar_core::to_pretty_json(&trace).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["hops"][0]["nodes"][0]["text"], "base");
}
