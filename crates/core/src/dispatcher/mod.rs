//! The dispatcher: registration, parsing, execution, completion and usage
//! over one [`CommandTree`].

mod execute;
mod parse;
mod suggest;
mod trace;
mod usage;

use tracing::debug;

use crate::command::{ResultConsumer, noop_consumer};
use crate::tree::{ArgumentBuilder, CommandNode, CommandTree, NodeId};

pub use parse::ParseResults;
pub use trace::{ParseTrace, TraceError, TraceHop, TraceNode, to_pretty_json};

/// Default trampoline quota for one `execute` call.
pub const DEFAULT_MAX_QUEUED_ENTRIES: usize = 65_536;

/// Owns a command tree and runs input against it.
pub struct CommandDispatcher<S> {
    tree: CommandTree<S>,
    consumer: ResultConsumer<S>,
    max_queued_entries: usize,
}

impl<S: 'static> Default for CommandDispatcher<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: 'static> CommandDispatcher<S> {
    /// An empty dispatcher.
    pub fn new() -> Self {
        Self::with_tree(CommandTree::new())
    }

    /// A dispatcher over an existing tree.
    pub fn with_tree(tree: CommandTree<S>) -> Self {
        Self {
            tree,
            consumer: noop_consumer(),
            max_queued_entries: DEFAULT_MAX_QUEUED_ENTRIES,
        }
    }
}

impl<S> CommandDispatcher<S> {
    /// The root id.
    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    /// The underlying tree.
    pub fn tree(&self) -> &CommandTree<S> {
        &self.tree
    }

    /// Look up a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not from this dispatcher's tree.
    pub fn node(&self, id: NodeId) -> &CommandNode<S> {
        &self.tree[id]
    }

    /// Merge `command` into the root. Returns the top-level node's id, for use
    /// as a redirect target.
    pub fn register(&mut self, command: ArgumentBuilder<S>) -> NodeId {
        let name = command.name().to_string();
        let id = self.tree.add_child(NodeId::ROOT, command);
        debug!(
            command = %name,
            node = id.index(),
            nodes = self.tree.len(),
            "registered command"
        );
        id
    }

    /// Install the callback told about every terminal attempt.
    pub fn set_consumer(&mut self, consumer: ResultConsumer<S>) {
        self.consumer = consumer;
    }

    /// Cap the number of executor entries one `execute` may process.
    pub fn set_max_queued_entries(&mut self, limit: usize) {
        self.max_queued_entries = limit;
    }

    /// The current executor quota.
    pub fn max_queued_entries(&self) -> usize {
        self.max_queued_entries
    }

    /// Names from the root to `target`.
    pub fn get_path(&self, target: NodeId) -> Vec<String> {
        self.tree.get_path(target)
    }

    /// Follow `path` by child name from the root.
    pub fn find_node<I, T>(&self, path: I) -> Option<NodeId>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.tree.find_node(path)
    }

    /// See [`CommandTree::find_ambiguities`].
    pub fn find_ambiguities<F>(&self, consumer: F)
    where
        F: FnMut(NodeId, NodeId, NodeId, &std::collections::BTreeSet<String>),
    {
        self.tree.find_ambiguities(consumer);
    }
}
