//! Execution: flatten a parse into a [`ContextChain`] and run it on an
//! explicit work stack.
//!
//! Native stack depth stays constant no matter how deeply commands redirect,
//! fork, or schedule further dispatches: every continuation becomes a
//! [`Frame`] on the executor's stack.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::context::{ContextChain, Scheduler};
use crate::error::{CommandSyntaxError, ErrorKind};

use super::{CommandDispatcher, ParseResults};

enum Frame<S> {
    /// Run stage `index` of `chain` for every source. Indices below the
    /// modifier count apply a redirect; the last index runs the command.
    Stage {
        chain: Arc<ContextChain<S>>,
        index: usize,
        sources: Vec<S>,
        forked: bool,
        top_level: bool,
    },
    /// Parse and run a scheduled command line.
    Dispatch { input: String, source: S },
    /// Catches errors raised by frames above it. Swallows them in fork mode,
    /// re-raises otherwise.
    Handler { forked: bool },
}

struct Executor<'a, S> {
    dispatcher: &'a CommandDispatcher<S>,
    stack: Vec<Frame<S>>,
    pending: Vec<Frame<S>>,
    scheduler: Scheduler<S>,
    result: i32,
}

impl<S: Clone + 'static> CommandDispatcher<S> {
    /// Parse and execute `input` as `source`.
    pub fn execute(&self, input: &str, source: S) -> Result<i32, CommandSyntaxError> {
        let parse = self.parse(input, source);
        self.execute_parsed(&parse)
    }

    /// Execute a previous [`parse`](Self::parse).
    ///
    /// Unconsumed input raises the single recorded child error when exactly
    /// one child was tried, otherwise an unknown-command or unknown-argument
    /// error. A path whose last hop has no command raises unknown-command.
    pub fn execute_parsed(&self, parse: &ParseResults<S>) -> Result<i32, CommandSyntaxError> {
        if let Some(err) = parse.syntax_error() {
            debug!(error = %err, "parse did not consume input");
            return Err(err);
        }
        let chain = self.flatten(parse)?;
        let source = chain.top_context().source().clone();
        debug!(
            input = parse.reader().string(),
            modifiers = chain.modifiers().len(),
            "executing"
        );

        let mut executor = Executor::new(self);
        let result = executor.run(Frame::Stage {
            chain: Arc::new(chain),
            index: 0,
            sources: vec![source],
            forked: false,
            top_level: true,
        });
        debug!(ok = result.is_ok(), "execution finished");
        result
    }

    fn flatten(&self, parse: &ParseResults<S>) -> Result<ContextChain<S>, CommandSyntaxError> {
        let original = parse.context().build(parse.reader().string());
        match ContextChain::try_flatten(&original) {
            Some(chain) => Ok(chain),
            None => {
                (self.consumer)(&original, false, 0);
                Err(ErrorKind::UnknownCommand.create_with_context(parse.reader()))
            }
        }
    }
}

impl<'a, S: Clone + 'static> Executor<'a, S> {
    fn new(dispatcher: &'a CommandDispatcher<S>) -> Self {
        Self {
            dispatcher,
            stack: Vec::new(),
            pending: Vec::new(),
            scheduler: Scheduler::new(),
            result: 0,
        }
    }

    fn run(&mut self, initial: Frame<S>) -> Result<i32, CommandSyntaxError> {
        let limit = self.dispatcher.max_queued_entries;
        let mut entries = 0usize;
        self.stack.push(initial);

        while let Some(frame) = self.stack.pop() {
            let weight = match &frame {
                Frame::Handler { .. } => continue,
                Frame::Stage { sources, .. } => sources.len().max(1),
                Frame::Dispatch { .. } => 1,
            };
            entries += weight;
            if entries > limit {
                warn!(limit, "execution entry limit reached");
                return Err(ErrorKind::ExecutionLimitReached { limit }.create());
            }

            if let Err(err) = self.step(frame) {
                self.pending.clear();
                self.scheduler.drain();
                self.unwind(err)?;
                continue;
            }
            // Work queued by this frame runs next, in the order it was queued.
            while let Some(frame) = self.pending.pop() {
                self.stack.push(frame);
            }
        }
        Ok(self.result)
    }

    /// Pop frames until a handler decides what to do with `err`.
    fn unwind(&mut self, err: CommandSyntaxError) -> Result<(), CommandSyntaxError> {
        while let Some(frame) = self.stack.pop() {
            if let Frame::Handler { forked: true } = frame {
                warn!(error = %err, "scheduled command failed in fork; continuing");
                return Ok(());
            }
        }
        Err(err)
    }

    fn step(&mut self, frame: Frame<S>) -> Result<(), CommandSyntaxError> {
        match frame {
            Frame::Stage {
                chain,
                index,
                sources,
                forked,
                top_level,
            } => self.run_stage(chain, index, sources, forked, top_level),
            Frame::Dispatch { input, source } => self.run_dispatch(&input, source),
            Frame::Handler { .. } => Ok(()),
        }
    }

    fn run_stage(
        &mut self,
        chain: Arc<ContextChain<S>>,
        index: usize,
        sources: Vec<S>,
        forked: bool,
        top_level: bool,
    ) -> Result<(), CommandSyntaxError> {
        let dispatcher = self.dispatcher;
        let consumer = &dispatcher.consumer;

        if let Some(modifier) = chain.modifiers().get(index) {
            let forked = forked || modifier.is_forked();
            let mut next = Vec::new();
            for source in sources {
                next.extend(ContextChain::run_modifier(modifier, source, consumer, forked)?);
            }
            if next.is_empty() {
                debug!(stage = index, "redirect produced no sources");
                return Ok(());
            }
            debug!(stage = index, sources = next.len(), forked, "redirect stage expanded");
            self.pending.push(Frame::Stage {
                chain,
                index: index + 1,
                sources: next,
                forked,
                top_level,
            });
            return Ok(());
        }

        let executable = chain.executable();
        for source in sources {
            let value = ContextChain::run_executable_with(
                executable,
                source,
                consumer,
                forked,
                Some(self.scheduler.clone()),
            )?;
            if top_level {
                self.result = self.result.wrapping_add(value);
            }
            self.queue_scheduled(forked);
        }
        Ok(())
    }

    fn queue_scheduled(&mut self, forked: bool) {
        for (input, source) in self.scheduler.drain() {
            debug!(input = %input, forked, "queued scheduled command");
            self.pending.push(Frame::Dispatch { input, source });
            self.pending.push(Frame::Handler { forked });
        }
    }

    fn run_dispatch(&mut self, input: &str, source: S) -> Result<(), CommandSyntaxError> {
        let parse = self.dispatcher.parse(input, source);
        if let Some(err) = parse.syntax_error() {
            return Err(err);
        }
        let chain = self.dispatcher.flatten(&parse)?;
        let source = chain.top_context().source().clone();
        self.pending.push(Frame::Stage {
            chain: Arc::new(chain),
            index: 0,
            sources: vec![source],
            forked: false,
            top_level: false,
        });
        Ok(())
    }
}
