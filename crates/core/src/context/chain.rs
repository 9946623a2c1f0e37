use tracing::debug;

use crate::command::ResultConsumer;
use crate::error::CommandSyntaxError;

use super::{CommandContext, Scheduler};

/// Which kind of stage a [`ContextChain`] is at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// At least one redirect modifier remains.
    Modify,
    /// Only the executable context remains.
    Execute,
}

/// A context-with-children chain flattened into modifier hops followed by
/// exactly one executable hop.
pub struct ContextChain<S> {
    modifiers: Vec<CommandContext<S>>,
    executable: CommandContext<S>,
}

impl<S: Clone> Clone for ContextChain<S> {
    fn clone(&self) -> Self {
        Self {
            modifiers: self.modifiers.clone(),
            executable: self.executable.clone(),
        }
    }
}

impl<S: Clone> ContextChain<S> {
    /// Flatten `root`. Returns `None` when the last hop has no command.
    pub fn try_flatten(root: &CommandContext<S>) -> Option<ContextChain<S>> {
        let mut modifiers = Vec::new();
        let mut current = root;
        loop {
            match current.child() {
                Some(child) => {
                    modifiers.push(current.clone());
                    current = child;
                }
                None => {
                    if current.command().is_none() {
                        return None;
                    }
                    return Some(ContextChain {
                        modifiers,
                        executable: current.clone(),
                    });
                }
            }
        }
    }

    /// Redirect hops still to run.
    pub fn modifiers(&self) -> &[CommandContext<S>] {
        &self.modifiers
    }

    /// The terminal hop.
    pub fn executable(&self) -> &CommandContext<S> {
        &self.executable
    }

    /// Current stage.
    pub fn stage(&self) -> Stage {
        if self.modifiers.is_empty() {
            Stage::Execute
        } else {
            Stage::Modify
        }
    }

    /// The context the current stage runs.
    pub fn top_context(&self) -> &CommandContext<S> {
        self.modifiers.first().unwrap_or(&self.executable)
    }

    /// The chain without its first modifier, or `None` at the execute stage.
    pub fn next_stage(&self) -> Option<ContextChain<S>> {
        if self.modifiers.is_empty() {
            return None;
        }
        Some(ContextChain {
            modifiers: self.modifiers[1..].to_vec(),
            executable: self.executable.clone(),
        })
    }

    /// Apply `modifier`'s redirect modifier to `source`.
    ///
    /// A hop without a modifier passes `source` through. On failure the
    /// consumer is told, and the error is swallowed in fork mode.
    pub fn run_modifier(
        modifier: &CommandContext<S>,
        source: S,
        consumer: &ResultConsumer<S>,
        forked: bool,
    ) -> Result<Vec<S>, CommandSyntaxError> {
        let Some(redirect) = modifier.redirect_modifier() else {
            return Ok(vec![source]);
        };
        let context = modifier.copy_for(source);
        match redirect(&context) {
            Ok(sources) => Ok(sources),
            Err(err) => {
                consumer(&context, false, 0);
                if forked {
                    debug!(error = %err, "redirect modifier failed in fork; dropping source");
                    Ok(Vec::new())
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Run `executable`'s command as `source`.
    ///
    /// Returns the command result, or `1` per success in fork mode. On failure
    /// the consumer is told, and the error becomes `0` in fork mode.
    pub fn run_executable(
        executable: &CommandContext<S>,
        source: S,
        consumer: &ResultConsumer<S>,
        forked: bool,
    ) -> Result<i32, CommandSyntaxError> {
        Self::run_executable_with(executable, source, consumer, forked, None)
    }

    pub(crate) fn run_executable_with(
        executable: &CommandContext<S>,
        source: S,
        consumer: &ResultConsumer<S>,
        forked: bool,
        scheduler: Option<Scheduler<S>>,
    ) -> Result<i32, CommandSyntaxError> {
        let context = executable.copy_for(source).with_scheduler(scheduler);
        let Some(command) = context.command() else {
            return Ok(0);
        };
        match command(&context) {
            Ok(result) => {
                consumer(&context, true, result);
                Ok(if forked { 1 } else { result })
            }
            Err(err) => {
                consumer(&context, false, 0);
                // Work queued by a failed command never runs.
                if let Some(scheduler) = context.scheduler() {
                    scheduler.drain();
                }
                if forked {
                    debug!(error = %err, "command failed in fork");
                    Ok(0)
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Run every stage to completion for `source`.
    ///
    /// Returns the count of successes when any hop forked, otherwise the sum
    /// of command results. A stage that leaves no sources ends execution with `0`.
    pub fn execute_all(
        &self,
        source: S,
        consumer: &ResultConsumer<S>,
    ) -> Result<i32, CommandSyntaxError> {
        if self.modifiers.is_empty() {
            return Self::run_executable(&self.executable, source, consumer, false);
        }

        let mut forked = false;
        let mut current = vec![source];
        for modifier in &self.modifiers {
            forked |= modifier.is_forked();
            let mut next = Vec::new();
            for source in current {
                next.extend(Self::run_modifier(modifier, source, consumer, forked)?);
            }
            if next.is_empty() {
                return Ok(0);
            }
            debug!(sources = next.len(), forked, "redirect stage expanded");
            current = next;
        }

        let mut result = 0i32;
        for source in current {
            let value = Self::run_executable(&self.executable, source, consumer, forked)?;
            result = result.wrapping_add(value);
        }
        Ok(result)
    }
}
