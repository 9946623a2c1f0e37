use std::sync::Arc;

use crate::command::{Command, RedirectModifier};
use crate::tree::{CommandNode, NodeId};

use super::{CommandContext, ParsedArgument, ParsedCommandNode, StringRange};

/// Mutable accumulator for one parse path.
pub struct CommandContextBuilder<S> {
    source: S,
    root_node: NodeId,
    arguments: Vec<(String, ParsedArgument)>,
    nodes: Vec<ParsedCommandNode>,
    command: Option<Command<S>>,
    child: Option<Box<CommandContextBuilder<S>>>,
    range: StringRange,
    modifier: Option<RedirectModifier<S>>,
    forks: bool,
}

/// Where completion should look: the node whose children are candidates and
/// the offset their text starts at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionContext {
    /// Node whose children are asked for completions.
    pub parent: NodeId,
    /// Offset the completed token starts at.
    pub start_pos: usize,
}

impl<S: Clone> Clone for CommandContextBuilder<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            root_node: self.root_node,
            arguments: self.arguments.clone(),
            nodes: self.nodes.clone(),
            command: self.command.clone(),
            child: self.child.clone(),
            range: self.range,
            modifier: self.modifier.clone(),
            forks: self.forks,
        }
    }
}

impl<S> CommandContextBuilder<S> {
    /// An empty path starting at `root_node`, at input offset `start`.
    pub fn new(source: S, root_node: NodeId, start: usize) -> Self {
        Self {
            source,
            root_node,
            arguments: Vec::new(),
            nodes: Vec::new(),
            command: None,
            child: None,
            range: StringRange::at(start),
            modifier: None,
            forks: false,
        }
    }

    /// The source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Replace the source.
    pub fn with_source(&mut self, source: S) -> &mut Self {
        self.source = source;
        self
    }

    /// Node the path started from.
    pub fn root_node(&self) -> NodeId {
        self.root_node
    }

    /// Record (or replace) an argument.
    pub fn with_argument(&mut self, name: String, argument: ParsedArgument) -> &mut Self {
        match self.arguments.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = argument,
            None => self.arguments.push((name, argument)),
        }
        self
    }

    /// Arguments read so far.
    pub fn arguments(&self) -> &[(String, ParsedArgument)] {
        &self.arguments
    }

    /// Set the command to run.
    pub fn with_command(&mut self, command: Option<Command<S>>) -> &mut Self {
        self.command = command;
        self
    }

    /// Append a matched node, widening the range and adopting its redirect
    /// modifier and fork flag.
    pub fn with_node(
        &mut self,
        id: NodeId,
        node: &CommandNode<S>,
        range: StringRange,
    ) -> &mut Self {
        self.nodes.push(ParsedCommandNode::new(id, range));
        self.range = StringRange::encompassing(self.range, range);
        self.modifier = node.redirect_modifier().cloned();
        self.forks = node.is_fork();
        self
    }

    /// Attach the continuation after a redirect.
    pub fn with_child(&mut self, child: CommandContextBuilder<S>) -> &mut Self {
        self.child = Some(Box::new(child));
        self
    }

    /// Continuation after a redirect.
    pub fn child(&self) -> Option<&CommandContextBuilder<S>> {
        self.child.as_deref()
    }

    /// The deepest continuation (or `self`).
    pub fn last_child(&self) -> &CommandContextBuilder<S> {
        let mut result = self;
        while let Some(child) = result.child() {
            result = child;
        }
        result
    }

    pub(crate) fn last_child_mut(&mut self) -> &mut CommandContextBuilder<S> {
        match self.child {
            Some(ref mut child) => child.last_child_mut(),
            None => self,
        }
    }

    /// The command recorded so far.
    pub fn command(&self) -> Option<&Command<S>> {
        self.command.as_ref()
    }

    /// Matched nodes.
    pub fn nodes(&self) -> &[ParsedCommandNode] {
        &self.nodes
    }

    /// Range covered so far.
    pub fn range(&self) -> StringRange {
        self.range
    }

    /// Locate the node whose children should complete the text at `cursor`.
    ///
    /// Returns `None` when `cursor` lies before this path's start.
    pub fn find_suggestion_context(&self, cursor: usize) -> Option<SuggestionContext> {
        if self.range.start > cursor {
            return None;
        }
        if self.range.end < cursor {
            if let Some(child) = self.child() {
                return child.find_suggestion_context(cursor);
            }
            return Some(match self.nodes.last() {
                Some(last) => SuggestionContext {
                    parent: last.node(),
                    start_pos: last.range().end + 1,
                },
                None => SuggestionContext {
                    parent: self.root_node,
                    start_pos: self.range.start,
                },
            });
        }
        let mut prev = self.root_node;
        for node in &self.nodes {
            let range = node.range();
            if range.start <= cursor && cursor <= range.end {
                return Some(SuggestionContext {
                    parent: prev,
                    start_pos: range.start,
                });
            }
            prev = node.node();
        }
        Some(SuggestionContext {
            parent: prev,
            start_pos: self.range.start,
        })
    }
}

impl<S: Clone> CommandContextBuilder<S> {
    /// Freeze into a [`CommandContext`] over `input`.
    pub fn build(&self, input: &str) -> CommandContext<S> {
        self.build_shared(&Arc::from(input))
    }

    pub(crate) fn build_shared(&self, input: &Arc<str>) -> CommandContext<S> {
        CommandContext {
            source: self.source.clone(),
            input: Arc::clone(input),
            arguments: self.arguments.clone(),
            command: self.command.clone(),
            root_node: self.root_node,
            nodes: self.nodes.clone(),
            range: self.range,
            child: self.child.as_ref().map(|c| Arc::new(c.build_shared(input))),
            modifier: self.modifier.clone(),
            forks: self.forks,
            scheduler: None,
        }
    }
}
