//! Parse contexts.
//!
//! A [`CommandContextBuilder`] accumulates one parse path and is cloned, never
//! shared, whenever the parser branches. Building it yields an immutable
//! [`CommandContext`], linked to the continuation after a redirect through
//! [`CommandContext::child`]. [`ContextChain`] flattens that linked list into
//! modifier stages plus one executable stage.

mod builder;
mod chain;
mod range;
mod scheduler;

use std::any::Any;
use std::sync::Arc;

pub use builder::{CommandContextBuilder, SuggestionContext};
pub use chain::{ContextChain, Stage};
pub use range::StringRange;
pub use scheduler::Scheduler;

use crate::arguments::ArgumentValue;
use crate::command::{Command, RedirectModifier};
use crate::error::{CommandSyntaxError, ErrorKind};
use crate::tree::NodeId;

/// An argument value together with the input range it was read from.
#[derive(Debug, Clone)]
pub struct ParsedArgument {
    range: StringRange,
    value: ArgumentValue,
}

impl ParsedArgument {
    /// Pair a value with its range.
    pub fn new(range: StringRange, value: ArgumentValue) -> Self {
        Self { range, value }
    }

    /// Range of the raw text.
    pub fn range(&self) -> StringRange {
        self.range
    }

    /// The decoded value.
    pub fn value(&self) -> &ArgumentValue {
        &self.value
    }
}

/// A matched node and the range it consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCommandNode {
    node: NodeId,
    range: StringRange,
}

impl ParsedCommandNode {
    /// Pair a node with its range.
    pub fn new(node: NodeId, range: StringRange) -> Self {
        Self { node, range }
    }

    /// The matched node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Range it consumed.
    pub fn range(&self) -> StringRange {
        self.range
    }
}

/// Immutable snapshot of one parse path.
pub struct CommandContext<S> {
    pub(crate) source: S,
    pub(crate) input: Arc<str>,
    pub(crate) arguments: Vec<(String, ParsedArgument)>,
    pub(crate) command: Option<Command<S>>,
    pub(crate) root_node: NodeId,
    pub(crate) nodes: Vec<ParsedCommandNode>,
    pub(crate) range: StringRange,
    pub(crate) child: Option<Arc<CommandContext<S>>>,
    pub(crate) modifier: Option<RedirectModifier<S>>,
    pub(crate) forks: bool,
    pub(crate) scheduler: Option<Scheduler<S>>,
}

impl<S: Clone> Clone for CommandContext<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            input: Arc::clone(&self.input),
            arguments: self.arguments.clone(),
            command: self.command.clone(),
            root_node: self.root_node,
            nodes: self.nodes.clone(),
            range: self.range,
            child: self.child.clone(),
            modifier: self.modifier.clone(),
            forks: self.forks,
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<S> CommandContext<S> {
    /// The source this path runs as.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The full command line.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Continuation after a redirect.
    pub fn child(&self) -> Option<&CommandContext<S>> {
        self.child.as_deref()
    }

    /// The deepest continuation (or `self`).
    pub fn last_child(&self) -> &CommandContext<S> {
        let mut result = self;
        while let Some(child) = result.child() {
            result = child;
        }
        result
    }

    /// The command to run, if this path is executable.
    pub fn command(&self) -> Option<&Command<S>> {
        self.command.as_ref()
    }

    /// Range of input this hop consumed.
    pub fn range(&self) -> StringRange {
        self.range
    }

    /// Matched nodes in order.
    pub fn nodes(&self) -> &[ParsedCommandNode] {
        &self.nodes
    }

    /// Node this hop started from.
    pub fn root_node(&self) -> NodeId {
        self.root_node
    }

    /// Source modifier of the redirect this hop ends in.
    pub fn redirect_modifier(&self) -> Option<&RedirectModifier<S>> {
        self.modifier.as_ref()
    }

    /// True when this hop's redirect forks.
    pub fn is_forked(&self) -> bool {
        self.forks
    }

    /// True when any node matched.
    pub fn has_nodes(&self) -> bool {
        !self.nodes.is_empty()
    }

    /// Parsed arguments in the order they were read.
    pub fn arguments(&self) -> impl Iterator<Item = (&str, &ParsedArgument)> {
        self.arguments.iter().map(|(name, arg)| (name.as_str(), arg))
    }

    /// The raw parsed argument called `name`.
    pub fn parsed_argument(&self, name: &str) -> Option<&ParsedArgument> {
        self.arguments
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, arg)| arg)
    }

    /// Borrow the argument `name` as a `T`.
    pub fn get_argument_ref<T: Any>(&self, name: &str) -> Result<&T, CommandSyntaxError> {
        let Some(argument) = self.parsed_argument(name) else {
            return Err(ErrorKind::NoSuchArgument {
                name: name.to_string(),
            }
            .create());
        };
        argument.value.downcast_ref::<T>().ok_or_else(|| {
            ErrorKind::ArgumentTypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
                found: argument.value.type_name(),
            }
            .create()
        })
    }

    /// Clone out the argument `name` as a `T`.
    pub fn get_argument<T: Any + Clone>(&self, name: &str) -> Result<T, CommandSyntaxError> {
        self.get_argument_ref::<T>(name).cloned()
    }

    /// Handle for queueing follow-up dispatches, present while running under
    /// a dispatcher.
    pub fn scheduler(&self) -> Option<&Scheduler<S>> {
        self.scheduler.as_ref()
    }
}

impl<S: Clone> CommandContext<S> {
    /// This context with a different source.
    pub fn copy_for(&self, source: S) -> CommandContext<S> {
        let mut copy = self.clone();
        copy.source = source;
        copy
    }

    pub(crate) fn with_scheduler(mut self, scheduler: Option<Scheduler<S>>) -> Self {
        self.scheduler = scheduler;
        self
    }
}

impl<S> std::fmt::Debug for CommandContext<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("input", &self.input)
            .field("range", &self.range)
            .field("nodes", &self.nodes)
            .field("arguments", &self.arguments)
            .field("executable", &self.command.is_some())
            .field("forks", &self.forks)
            .field("child", &self.child)
            .finish_non_exhaustive()
    }
}
