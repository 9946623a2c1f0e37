//! Shared test helpers for `cmdgrammar_core` integration tests.

#![allow(unreachable_pub)]
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use cmdgrammar_core::{
    CommandContext, CommandDispatcher, CommandSyntaxError, ErrorKind, ResultConsumer, Suggestions,
};

/// Source value passed through every test dispatch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Source {
    pub name: String,
    pub admin: bool,
}

impl Source {
    pub fn player(name: &str) -> Self {
        Self {
            name: name.to_string(),
            admin: false,
        }
    }

    pub fn admin(name: &str) -> Self {
        Self {
            name: name.to_string(),
            admin: true,
        }
    }
}

/// A fresh dispatcher over [`Source`].
pub fn dispatcher() -> CommandDispatcher<Source> {
    CommandDispatcher::new()
}

/// Command body returning `1`.
pub fn ok(_: &CommandContext<Source>) -> Result<i32, CommandSyntaxError> {
    Ok(1)
}

/// Command body that always fails.
pub fn fail(_: &CommandContext<Source>) -> Result<i32, CommandSyntaxError> {
    Err(CommandSyntaxError::custom("boom"))
}

// ─── Consumer recording ──────────────────────────────────────────────────────

/// One consumer call: `(source name, success, result)`.
pub type Completion = (String, bool, i32);

/// A consumer that appends every call to the returned log.
pub fn recording_consumer() -> (ResultConsumer<Source>, Arc<Mutex<Vec<Completion>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let consumer: ResultConsumer<Source> = Arc::new(
        move |ctx: &CommandContext<Source>, success: bool, result: i32| {
            sink.lock().expect("consumer log poisoned").push((
                ctx.source().name.clone(),
                success,
                result,
            ));
        },
    );
    (consumer, log)
}

// ─── Assertion helpers ───────────────────────────────────────────────────────

/// Suggestion texts in order.
pub fn texts(suggestions: &Suggestions) -> Vec<String> {
    suggestions
        .list()
        .iter()
        .map(|s| s.text().to_string())
        .collect()
}

/// Assert `result` failed with `kind` at `cursor`.
#[track_caller]
pub fn assert_error<T: std::fmt::Debug>(
    result: Result<T, CommandSyntaxError>,
    kind: &ErrorKind,
    cursor: Option<usize>,
) {
    let err = result.expect_err("expected a syntax error");
    assert_eq!(err.kind(), kind, "unexpected kind: {err}");
    assert_eq!(err.cursor(), cursor, "unexpected cursor: {err}");
}
