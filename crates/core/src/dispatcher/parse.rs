use tracing::trace;

use crate::context::{CommandContextBuilder, ParsedArgument, StringRange};
use crate::error::{CommandSyntaxError, ErrorKind};
use crate::reader::{ARGUMENT_SEPARATOR, StringReader};
use crate::tree::{NodeId, NodeKind};

use super::CommandDispatcher;

/// Outcome of [`CommandDispatcher::parse`].
///
/// Always produced, even when nothing matched: the context holds the deepest
/// path reached, the reader sits at the first unconsumed byte, and
/// `exceptions` records why each child tried at the point of divergence failed.
pub struct ParseResults<S> {
    pub(crate) context: CommandContextBuilder<S>,
    pub(crate) reader: StringReader,
    pub(crate) exceptions: Vec<(NodeId, CommandSyntaxError)>,
}

impl<S: Clone> Clone for ParseResults<S> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
            reader: self.reader.clone(),
            exceptions: self.exceptions.clone(),
        }
    }
}

impl<S> ParseResults<S> {
    /// The root context builder of the chosen path.
    pub fn context(&self) -> &CommandContextBuilder<S> {
        &self.context
    }

    /// Reader positioned after the last consumed token.
    pub fn reader(&self) -> &StringReader {
        &self.reader
    }

    /// Per-child failures at the point parsing stopped, in the order tried.
    pub fn exceptions(&self) -> &[(NodeId, CommandSyntaxError)] {
        &self.exceptions
    }

    /// True when all input was consumed and the last hop is executable.
    pub fn is_complete(&self) -> bool {
        !self.reader.can_read() && self.context.last_child().command().is_some()
    }

    /// The error `execute` would raise for unconsumed input, if any.
    pub fn syntax_error(&self) -> Option<CommandSyntaxError> {
        if !self.reader.can_read() {
            return None;
        }
        if let [(_, only)] = self.exceptions.as_slice() {
            return Some(only.clone());
        }
        let kind = if self.context.range().is_empty() {
            ErrorKind::UnknownCommand
        } else {
            ErrorKind::UnknownArgument
        };
        Some(kind.create_with_context(&self.reader))
    }
}

impl<S: Clone + 'static> CommandDispatcher<S> {
    /// Parse `input` as `source`. Never fails; see [`ParseResults`].
    pub fn parse(&self, input: &str, source: S) -> ParseResults<S> {
        self.parse_reader(StringReader::new(input), source)
    }

    /// Parse from the reader's current cursor.
    pub fn parse_reader(&self, reader: StringReader, source: S) -> ParseResults<S> {
        let context = CommandContextBuilder::new(source, NodeId::ROOT, reader.cursor());
        let mut results = self.parse_nodes(NodeId::ROOT, &reader, context);
        if !results.reader.can_read() {
            self.fill_defaults(&mut results);
        }
        results
    }

    fn parse_nodes(
        &self,
        node: NodeId,
        original: &StringReader,
        context_so_far: CommandContextBuilder<S>,
    ) -> ParseResults<S> {
        let mut errors = Vec::new();
        let mut potentials: Vec<ParseResults<S>> = Vec::new();

        for &child_id in self.tree[node].relevant_nodes(original) {
            let child = &self.tree[child_id];
            if !child.can_use(context_so_far.source()) {
                continue;
            }
            let mut context = context_so_far.clone();
            let mut reader = original.clone();

            let parsed = child
                .parse(child_id, &mut reader, &mut context)
                .and_then(|()| match reader.peek() {
                    Some(c) if c != ARGUMENT_SEPARATOR => {
                        Err(ErrorKind::ExpectedArgumentSeparator.create_with_context(&reader))
                    }
                    _ => Ok(()),
                });
            if let Err(err) = parsed {
                trace!(
                    node = child.name(),
                    cursor = err.cursor(),
                    error = %err,
                    "child rejected input"
                );
                errors.push((child_id, err));
                continue;
            }

            context.with_command(child.command().cloned());
            let needed = if child.redirect().is_some() { 1 } else { 2 };
            if reader.can_read_n(needed) {
                reader.skip();
                if let Some(target) = child.redirect() {
                    let child_context = CommandContextBuilder::new(
                        context_so_far.source().clone(),
                        target,
                        reader.cursor(),
                    );
                    let parse = self.parse_nodes(target, &reader, child_context);
                    context.with_child(parse.context);
                    return ParseResults {
                        context,
                        reader: parse.reader,
                        exceptions: parse.exceptions,
                    };
                }
                potentials.push(self.parse_nodes(child_id, &reader, context));
            } else {
                potentials.push(ParseResults {
                    context,
                    reader,
                    exceptions: Vec::new(),
                });
            }
        }

        if potentials.is_empty() {
            return ParseResults {
                context: context_so_far,
                reader: original.clone(),
                exceptions: errors,
            };
        }
        // Prefer paths that consumed everything, then paths without errors.
        potentials.sort_by_key(|p| (p.reader.can_read(), !p.exceptions.is_empty()));
        potentials.swap_remove(0)
    }

    /// Walk default-valued arguments after a path that ends at end of input
    /// without a command.
    fn fill_defaults(&self, results: &mut ParseResults<S>) {
        let end = results.reader.total_length();
        let builder = results.context.last_child_mut();
        if builder.command().is_some() {
            return;
        }
        let Some(last) = builder.nodes().last() else {
            return;
        };
        let mut current = last.node();
        loop {
            let next = self.tree[current].children().iter().copied().find(|&id| {
                let node = &self.tree[id];
                node.default_value().is_some() && node.can_use(builder.source())
            });
            let Some(next) = next else { break };
            let child = &self.tree[next];
            if let (NodeKind::Argument(argument), Some(value)) =
                (child.kind(), child.default_value())
            {
                let parsed = ParsedArgument::new(StringRange::at(end), value.clone());
                builder.with_argument(argument.name().to_string(), parsed);
            }
            builder.with_node(next, child, StringRange::at(end));
            builder.with_command(child.command().cloned());
            trace!(node = child.name(), "applied default value");
            if builder.command().is_some() {
                break;
            }
            current = next;
        }
    }
}
