//! Fuzz smoke tests for the reader, parser, completion engine and executor.
//!
//! Random inputs built from grammar fragments and awkward characters must never
//! panic, and every reported position must stay inside the input.
//!
//! A simple deterministic PRNG provides reproducible randomness.

mod common;

use cmdgrammar_core::{
    CommandContext, CommandDispatcher, NodeId, StringReader, argument, bool, double_range,
    greedy_string, integer_range, literal, string, word,
};
use common::{Source, dispatcher, ok};

// ─── Simple deterministic PRNG (LCG) ────────────────────────────────────────

struct SimpleRng(u64);

impl SimpleRng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range(&mut self, max: usize) -> usize {
        ((self.next() >> 33) as usize) % max
    }
}

const FRAGMENTS: &[&str] = &[
    "give",
    "tp",
    "say",
    "quote",
    "as",
    "each",
    "hop",
    "toggle",
    "true",
    "false",
    "1",
    "-5",
    "3.25",
    "999999999999",
    " ",
    " ",
    " ",
    "\"",
    "\\",
    "\\\"",
    "x",
    "é",
    "日本",
    "_",
    ".",
    "+",
    "-",
    "\t",
];

fn grammar() -> CommandDispatcher<Source> {
    let mut d = dispatcher();
    d.register(literal("give").then(
        argument("target", word()).then(argument("count", integer_range(1, 64)).executes(ok)),
    ));
    d.register(
        literal("tp").then(
            argument("x", double_range(-10.0, 10.0))
                .then(argument("y", double_range(-10.0, 10.0)).executes(ok)),
        ),
    );
    d.register(literal("say").then(argument("msg", greedy_string()).executes(ok)));
    d.register(literal("quote").then(argument("text", string()).executes(ok)));
    d.register(literal("toggle").then(argument("on", bool()).executes(ok)));
    d.register(
        literal("as").then(argument("who", word()).redirect_with(NodeId::ROOT, |ctx| {
            Ok(Source::player(ctx.get_argument_ref::<String>("who")?))
        })),
    );
    d.register(
        literal("each").fork(NodeId::ROOT, |ctx: &CommandContext<Source>| {
            Ok(vec![ctx.source().clone(), Source::admin("extra")])
        }),
    );
    d.register(literal("hop").redirect(NodeId::ROOT));
    d
}

fn random_input(rng: &mut SimpleRng) -> String {
    let pieces = rng.gen_range(8);
    (0..pieces)
        .map(|_| FRAGMENTS[rng.gen_range(FRAGMENTS.len())])
        .collect()
}

// ─── Invariant checking ─────────────────────────────────────────────────────

fn assert_invariants(d: &CommandDispatcher<Source>, input: &str, rng: &mut SimpleRng) {
    let parse = d.parse(input, Source::default());
    assert!(
        parse.reader().cursor() <= input.len(),
        "cursor past end for {input:?}"
    );
    assert!(parse.context().range().end <= input.len());
    for (_, err) in parse.exceptions() {
        if let Some(cursor) = err.cursor() {
            assert!(cursor <= input.len(), "error cursor past end for {input:?}");
        }
        let _ = err.to_string();
    }

    let suggestions = d.get_completion_suggestions(&parse);
    for s in suggestions.list() {
        assert!(s.range().start <= s.range().end);
        assert!(
            s.range().end <= input.len(),
            "suggestion past end for {input:?}"
        );
        let _ = s.apply(input);
    }

    let cursor = rng.gen_range(input.len() + 1);
    let _ = d.get_completion_suggestions_at(&parse, cursor);

    match d.execute_parsed(&parse) {
        Ok(result) => assert!(result >= 0),
        Err(err) => {
            let _ = err.context();
            let _ = err.to_diagnostic();
        }
    }

    let _ = parse.trace(d);
}

#[test]
fn random_inputs_never_panic() {
    let d = grammar();
    let mut rng = SimpleRng::new(0x5eed);
    for _ in 0..2_000 {
        let input = random_input(&mut rng);
        assert_invariants(&d, &input, &mut rng);
    }
}

#[test]
fn reader_survives_random_text() {
    let mut rng = SimpleRng::new(42);
    for _ in 0..2_000 {
        let input = random_input(&mut rng);
        let mut reader = StringReader::new(input.as_str());
        while reader.can_read() {
            let before = reader.cursor();
            match rng.gen_range(5) {
                0 => {
                    let _ = reader.read_string();
                }
                1 => {
                    let _ = reader.read_int();
                }
                2 => {
                    let _ = reader.read_double();
                }
                3 => {
                    let _ = reader.read_boolean();
                }
                _ => {
                    reader.skip_whitespace();
                }
            }
            assert!(reader.cursor() <= input.len());
            if reader.cursor() == before {
                reader.skip();
            }
        }
    }
}

#[test]
fn edge_case_inputs() {
    let d = grammar();
    let mut rng = SimpleRng::new(7);
    for input in [
        "",
        " ",
        "  ",
        "give",
        "give ",
        "give  ",
        "give steve 65",
        "quote \"unterminated",
        "quote \"bad \\x escape\"",
        "tp 1e5 2",
        "hop hop hop hop",
        "each each each give a 1",
        "as é give a 1",
        "日本語",
        "say ",
    ] {
        assert_invariants(&d, input, &mut rng);
    }
}
