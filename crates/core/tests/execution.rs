//! Redirects, forks, context chains and the trampoline executor.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use cmdgrammar_core::context::Stage;
use cmdgrammar_core::{
    CommandContext, CommandDispatcher, CommandSyntaxError, ContextChain, ErrorKind, NodeId,
    argument, integer, literal, word,
};
use common::{Source, assert_error, dispatcher, fail, ok, recording_consumer};

fn three_players() -> Vec<Source> {
    vec![
        Source::player("alice"),
        Source::admin("bob"),
        Source::player("carol"),
    ]
}

/// `each` forks into three players, `hop` redirects back to the root.
fn forking_dispatcher() -> CommandDispatcher<Source> {
    let mut d = dispatcher();
    d.register(literal("each").fork(NodeId::ROOT, |_| Ok(three_players())));
    d.register(literal("hop").redirect(NodeId::ROOT));
    d
}

// ─── Plain and redirected execution ──────────────────────────────────────────

#[test]
fn plain_execution_returns_command_result() {
    let mut d = dispatcher();
    d.register(literal("five").executes(|_| Ok(5)));
    assert_eq!(d.execute("five", Source::default()).unwrap(), 5);
}

#[test]
fn redirect_to_root_continues_parsing() {
    let mut d = forking_dispatcher();
    d.register(literal("five").executes(|_| Ok(5)));
    assert_eq!(d.execute("hop hop five", Source::default()).unwrap(), 5);
}

#[test]
fn redirect_modifier_replaces_source() {
    let mut d = dispatcher();
    d.register(
        literal("as").then(argument("who", word()).redirect_with(NodeId::ROOT, |ctx| {
            let who = ctx.get_argument_ref::<String>("who")?;
            if who == "nobody" {
                return Err(CommandSyntaxError::custom("no such player"));
            }
            Ok(Source::player(who))
        })),
    );
    d.register(
        literal("whoami")
            .executes(|ctx: &CommandContext<Source>| Ok(ctx.source().name.len() as i32)),
    );

    assert_eq!(d.execute("as alice whoami", Source::default()).unwrap(), 5);
    assert_eq!(
        d.execute("as bo as carol whoami", Source::default())
            .unwrap(),
        5
    );
}

#[test]
fn modifier_failure_outside_fork_propagates() {
    let mut d = dispatcher();
    d.register(
        literal("as").then(
            argument("who", word())
                .redirect_with(NodeId::ROOT, |_| Err(CommandSyntaxError::custom("denied"))),
        ),
    );
    d.register(literal("run").executes(ok));
    let (consumer, log) = recording_consumer();
    d.set_consumer(consumer);

    let err = d.execute("as alice run", Source::default()).unwrap_err();
    assert_eq!(
        err.kind(),
        &ErrorKind::Custom {
            message: "denied".to_string()
        }
    );
    assert_eq!(log.lock().unwrap().len(), 1);
    assert!(!log.lock().unwrap()[0].1);
}

#[test]
fn command_failure_outside_fork_propagates() {
    let mut d = dispatcher();
    d.register(literal("bad").executes(fail));
    let err = d.execute("bad", Source::default()).unwrap_err();
    assert_eq!(err.raw_message(), "boom");
}

// ─── Forks ───────────────────────────────────────────────────────────────────

#[test]
fn fork_counts_successes_not_results() {
    let mut d = forking_dispatcher();
    d.register(literal("run").executes(|_| Ok(7)));
    let (consumer, log) = recording_consumer();
    d.set_consumer(consumer);

    assert_eq!(d.execute("each run", Source::default()).unwrap(), 3);
    let log = log.lock().unwrap();
    let names: Vec<&str> = log.iter().map(|(name, _, _)| name.as_str()).collect();
    assert_eq!(names, vec!["alice", "bob", "carol"]);
    assert!(
        log.iter()
            .all(|(_, success, result)| *success && *result == 7)
    );
}

#[test]
fn fork_swallows_command_failures() {
    let mut d = forking_dispatcher();
    d.register(literal("check").executes(|ctx: &CommandContext<Source>| {
        if ctx.source().admin {
            Ok(1)
        } else {
            Err(CommandSyntaxError::custom("not an admin"))
        }
    }));
    let (consumer, log) = recording_consumer();
    d.set_consumer(consumer);

    assert_eq!(d.execute("each check", Source::default()).unwrap(), 1);
    let failures = log.lock().unwrap().iter().filter(|(_, s, _)| !s).count();
    assert_eq!(failures, 2);
}

#[test]
fn fork_swallows_modifier_failures_per_source() {
    let mut d = forking_dispatcher();
    d.register(
        literal("admins").fork(NodeId::ROOT, |ctx: &CommandContext<Source>| {
            if ctx.source().admin {
                Ok(vec![ctx.source().clone()])
            } else {
                Err(CommandSyntaxError::custom("filtered"))
            }
        }),
    );
    d.register(literal("run").executes(ok));
    let (consumer, log) = recording_consumer();
    d.set_consumer(consumer);

    assert_eq!(d.execute("each admins run", Source::default()).unwrap(), 1);
    let log = log.lock().unwrap();
    assert_eq!(log.iter().filter(|(_, s, _)| !s).count(), 2);
    assert_eq!(
        log.iter()
            .filter(|(_, s, _)| *s)
            .map(|(n, _, _)| n.as_str())
            .collect::<Vec<_>>(),
        vec!["bob"]
    );
}

#[test]
fn fork_into_nothing_returns_zero() {
    let mut d = dispatcher();
    d.register(literal("none").fork(NodeId::ROOT, |_| Ok(Vec::new())));
    d.register(literal("run").executes(ok));
    assert_eq!(d.execute("none run", Source::default()).unwrap(), 0);
}

#[test]
fn nested_forks_multiply() {
    let mut d = forking_dispatcher();
    d.register(literal("run").executes(ok));
    assert_eq!(d.execute("each each run", Source::default()).unwrap(), 9);
}

// ─── Context chains ──────────────────────────────────────────────────────────

#[test]
fn three_hop_redirect_flattens_into_two_modifiers() {
    let mut d = forking_dispatcher();
    d.register(literal("five").executes(|_| Ok(5)));
    let parse = d.parse("hop hop five", Source::default());
    let context = parse.context().build(parse.reader().string());

    let chain = ContextChain::try_flatten(&context).unwrap();
    assert_eq!(chain.modifiers().len(), 2);
    assert_eq!(chain.stage(), Stage::Modify);

    let second = chain.next_stage().unwrap();
    assert_eq!(second.modifiers().len(), 1);
    let third = second.next_stage().unwrap();
    assert_eq!(third.stage(), Stage::Execute);
    assert!(third.next_stage().is_none());

    let (consumer, _) = recording_consumer();
    assert_eq!(chain.execute_all(Source::default(), &consumer).unwrap(), 5);
}

#[test]
fn flatten_fails_without_terminal_command() {
    let mut d = forking_dispatcher();
    d.register(literal("group").then(literal("leaf").executes(ok)));
    let parse = d.parse("hop group", Source::default());
    let context = parse.context().build(parse.reader().string());
    assert!(ContextChain::try_flatten(&context).is_none());
}

#[test]
fn execute_all_counts_fork_successes() {
    let mut d = forking_dispatcher();
    d.register(literal("run").executes(|_| Ok(4)));
    let parse = d.parse("each run", Source::default());
    let context = parse.context().build(parse.reader().string());
    let chain = ContextChain::try_flatten(&context).unwrap();
    let (consumer, log) = recording_consumer();
    assert_eq!(chain.execute_all(Source::default(), &consumer).unwrap(), 3);
    assert_eq!(log.lock().unwrap().len(), 3);
}

// ─── Scheduled dispatches ────────────────────────────────────────────────────

fn countdown_dispatcher(counter: Arc<AtomicUsize>) -> CommandDispatcher<Source> {
    let mut d = dispatcher();
    d.register(literal("countdown").then(argument("n", integer()).executes(
        move |ctx: &CommandContext<Source>| {
            counter.fetch_add(1, Ordering::SeqCst);
            let n: i32 = ctx.get_argument("n")?;
            if n > 0
                && let Some(scheduler) = ctx.scheduler()
            {
                scheduler.schedule(format!("countdown {}", n - 1), ctx.source().clone());
            }
            Ok(1)
        },
    )));
    d
}

#[test]
fn scheduled_dispatches_run_without_native_recursion() {
    let counter = Arc::new(AtomicUsize::new(0));
    let d = countdown_dispatcher(Arc::clone(&counter));
    // Only the top-level command contributes to the return value.
    assert_eq!(d.execute("countdown 20000", Source::default()).unwrap(), 1);
    assert_eq!(counter.load(Ordering::SeqCst), 20_001);
}

#[test]
fn entry_limit_aborts_runaway_execution() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut d = countdown_dispatcher(Arc::clone(&counter));
    d.set_max_queued_entries(100);
    assert_error(
        d.execute("countdown 1000", Source::default()),
        &ErrorKind::ExecutionLimitReached { limit: 100 },
        None,
    );
    assert!(counter.load(Ordering::SeqCst) < 100);
}

#[test]
fn scheduled_failure_propagates_outside_fork() {
    let mut d = forking_dispatcher();
    d.register(literal("spawn").executes(|ctx: &CommandContext<Source>| {
        if let Some(scheduler) = ctx.scheduler() {
            scheduler.schedule("nonsense", ctx.source().clone());
        }
        Ok(1)
    }));
    assert_error(
        d.execute("spawn", Source::default()),
        &ErrorKind::UnknownCommand,
        Some(0),
    );
}

#[test]
fn scheduled_failure_is_swallowed_in_fork() {
    let mut d = forking_dispatcher();
    d.register(literal("spawn").executes(|ctx: &CommandContext<Source>| {
        if let Some(scheduler) = ctx.scheduler() {
            scheduler.schedule("nonsense", ctx.source().clone());
        }
        Ok(1)
    }));
    assert_eq!(d.execute("each spawn", Source::default()).unwrap(), 3);
}

/// `try` queues `mark leaked` and then fails for alice only.
fn failing_scheduler_dispatcher() -> CommandDispatcher<Source> {
    let mut d = forking_dispatcher();
    d.register(literal("mark").then(argument("tag", word()).executes(ok)));
    d.register(literal("try").executes(|ctx| {
        if let Some(scheduler) = ctx.scheduler() {
            scheduler.schedule("mark leaked", Source::player("leaked"));
        }
        if ctx.source().name == "alice" {
            return Err(CommandSyntaxError::custom("boom"));
        }
        Ok(1)
    }));
    d.register(literal("spawn").executes(|ctx: &CommandContext<Source>| {
        if let Some(scheduler) = ctx.scheduler() {
            scheduler.schedule("try", ctx.source().clone());
        }
        Ok(1)
    }));
    d
}

#[test]
fn failed_command_discards_its_scheduled_work() {
    let mut d = failing_scheduler_dispatcher();
    let (consumer, log) = recording_consumer();
    d.set_consumer(consumer);

    assert_eq!(d.execute("each spawn", Source::default()).unwrap(), 3);
    let log = log.lock().unwrap();
    let leaked = log.iter().filter(|(name, _, _)| name == "leaked").count();
    assert_eq!(
        leaked, 2,
        "only bob and carol queue surviving work: {log:?}"
    );
    assert!(log.contains(&("alice".to_string(), false, 0)));
}

#[test]
fn forked_failure_discards_its_scheduled_work() {
    let mut d = failing_scheduler_dispatcher();
    let (consumer, log) = recording_consumer();
    d.set_consumer(consumer);

    assert_eq!(d.execute("each try", Source::default()).unwrap(), 2);
    let log = log.lock().unwrap();
    let leaked = log.iter().filter(|(name, _, _)| name == "leaked").count();
    assert_eq!(leaked, 2, "alice's queued work must not run: {log:?}");
}

#[test]
fn scheduled_work_runs_in_queue_order_and_reaches_consumer() {
    let mut d = dispatcher();
    d.register(literal("mark").then(argument("tag", word()).executes(ok)));
    d.register(literal("spawn").executes(|ctx| {
        if let Some(scheduler) = ctx.scheduler() {
            scheduler.schedule("mark first", Source::player("first"));
            scheduler.schedule("mark second", Source::player("second"));
        }
        Ok(1)
    }));
    let (consumer, log) = recording_consumer();
    d.set_consumer(consumer);

    assert_eq!(d.execute("spawn", Source::player("root")).unwrap(), 1);
    let names: Vec<String> = log
        .lock()
        .unwrap()
        .iter()
        .map(|(n, _, _)| n.clone())
        .collect();
    assert_eq!(names, vec!["root", "first", "second"]);
}

#[test]
fn scheduler_is_absent_outside_the_dispatcher() {
    let mut d = dispatcher();
    d.register(literal("check").executes(|ctx| Ok(i32::from(ctx.scheduler().is_some()))));
    assert_eq!(d.execute("check", Source::default()).unwrap(), 1);

    let parse = d.parse("check", Source::default());
    let context = parse.context().build("check");
    let chain = ContextChain::try_flatten(&context).unwrap();
    let (consumer, _) = recording_consumer();
    assert_eq!(chain.execute_all(Source::default(), &consumer).unwrap(), 0);
}
