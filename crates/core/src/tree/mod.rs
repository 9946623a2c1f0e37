//! The command tree.
//!
//! Nodes live in an arena owned by [`CommandTree`] and refer to each other by
//! [`NodeId`]. Redirects are plain ids too, so a node may redirect back to the
//! root (or any ancestor) to build recursive grammars without reference cycles.
//!
//! Registration merges: adding a node whose [`MergeKey`] already exists under
//! the same parent folds its command and children into the existing node.

mod builder;
mod node;

use std::collections::BTreeSet;
use std::ops::Index;

use serde::Serialize;

pub use builder::{ArgumentBuilder, argument, literal};
pub use node::{ArgumentNode, CommandNode, MergeKey, NodeKind, Redirect};

/// Handle to a node inside a [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    /// The root node of every tree.
    pub const ROOT: NodeId = NodeId(0);

    /// Arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Arena of [`CommandNode`]s rooted at [`NodeId::ROOT`].
pub struct CommandTree<S> {
    nodes: Vec<CommandNode<S>>,
}

impl<S> Default for CommandTree<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> CommandTree<S> {
    /// A tree holding only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![CommandNode::root()],
        }
    }

    /// The root id.
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Look up a node.
    pub fn get(&self, id: NodeId) -> Option<&CommandNode<S>> {
        self.nodes.get(id.0)
    }

    /// Number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root is always present.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Register `builder` (and its subtree) under `parent`, merging with an
    /// existing sibling of the same key. Returns the id of the (possibly
    /// pre-existing) node.
    ///
    /// # Panics
    ///
    /// Panics if `parent` or a redirect target does not belong to this tree.
    pub fn add_child(&mut self, parent: NodeId, builder: ArgumentBuilder<S>) -> NodeId {
        let ArgumentBuilder {
            target,
            children,
            command,
            requirement,
            redirect,
            default_value,
        } = builder;
        if let Some(r) = &redirect {
            assert!(
                r.target.0 < self.nodes.len(),
                "redirect target {:?} is not in this tree",
                r.target
            );
        }

        let key = target.merge_key();
        if let Some(existing) = self.nodes[parent.0].child(&key) {
            if command.is_some() {
                self.nodes[existing.0].command = command;
            }
            for child in children {
                self.add_child(existing, child);
            }
            return existing;
        }

        let id = NodeId(self.nodes.len());
        let mut node = CommandNode::new(target.into_kind(), Some(parent));
        node.command = command;
        node.requirement = requirement;
        node.redirect = redirect;
        node.default_value = default_value;
        let is_literal = node.is_literal();
        let name = node.name().to_string();
        self.nodes.push(node);

        let parent_node = &mut self.nodes[parent.0];
        parent_node.children.push(id);
        parent_node.index.insert(key, id);
        if is_literal {
            parent_node.literals.insert(name, id);
        } else {
            parent_node.arguments.push(id);
        }

        for child in children {
            self.add_child(id, child);
        }
        id
    }

    /// Report every pair of siblings where one accepts an example of the other.
    ///
    /// The callback receives `(parent, child, sibling, inputs)` where `inputs`
    /// are the child's examples that the sibling also accepts. Quadratic in the
    /// branching factor; meant for registration-time diagnostics.
    pub fn find_ambiguities<F>(&self, mut consumer: F)
    where
        F: FnMut(NodeId, NodeId, NodeId, &BTreeSet<String>),
    {
        self.find_ambiguities_under(NodeId::ROOT, &mut consumer);
    }

    fn find_ambiguities_under<F>(&self, parent: NodeId, consumer: &mut F)
    where
        F: FnMut(NodeId, NodeId, NodeId, &BTreeSet<String>),
    {
        let children = &self[parent].children;
        for &child in children {
            for &sibling in children {
                if child == sibling {
                    continue;
                }
                let sibling_node = &self[sibling];
                let matches: BTreeSet<String> = self[child]
                    .examples()
                    .into_iter()
                    .filter(|input| sibling_node.is_valid_input(input))
                    .map(str::to_string)
                    .collect();
                if !matches.is_empty() {
                    consumer(parent, child, sibling, &matches);
                }
            }
            self.find_ambiguities_under(child, consumer);
        }
    }

    /// Names from the root down to `target`, excluding the root.
    pub fn get_path(&self, target: NodeId) -> Vec<String> {
        let mut path = Vec::new();
        let mut current = self.get(target);
        while let Some(node) = current {
            let Some(parent) = node.parent else { break };
            path.push(node.name().to_string());
            current = self.get(parent);
        }
        path.reverse();
        path
    }

    /// Walk `path` from the root by child name, preferring literals.
    pub fn find_node<I, T>(&self, path: I) -> Option<NodeId>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut current = NodeId::ROOT;
        for name in path {
            let name = name.as_ref();
            let node = &self[current];
            current = node
                .child(&MergeKey::Literal(name.to_string()))
                .or_else(|| node.child(&MergeKey::Argument(name.to_string())))?;
        }
        Some(current)
    }

    /// Iterate `(id, node)` pairs in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &CommandNode<S>)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }
}

impl<S> Index<NodeId> for CommandTree<S> {
    type Output = CommandNode<S>;

    fn index(&self, id: NodeId) -> &CommandNode<S> {
        &self.nodes[id.0]
    }
}
