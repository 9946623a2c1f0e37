use std::any::Any;
use std::sync::Arc;

use crate::arguments::{ArgumentType, ArgumentValue};
use crate::command::{Command, RedirectModifier, Requirement, SuggestionProvider};
use crate::context::CommandContext;
use crate::error::CommandSyntaxError;
use crate::suggestion::{Suggestions, SuggestionsBuilder};

use super::NodeId;
use super::node::{ArgumentNode, MergeKey, NodeKind, Redirect};

pub(crate) enum BuilderTarget<S> {
    Literal(String),
    Argument(ArgumentNode<S>),
}

impl<S> BuilderTarget<S> {
    pub(crate) fn merge_key(&self) -> MergeKey {
        match self {
            BuilderTarget::Literal(literal) => MergeKey::Literal(literal.clone()),
            BuilderTarget::Argument(argument) => MergeKey::Argument(argument.name.clone()),
        }
    }

    pub(crate) fn into_kind(self) -> NodeKind<S> {
        match self {
            BuilderTarget::Literal(literal) => NodeKind::Literal(literal),
            BuilderTarget::Argument(argument) => NodeKind::Argument(argument),
        }
    }
}

/// Fluent description of a literal or argument node and its subtree.
///
/// Nothing is shared with a dispatcher until the builder is registered.
pub struct ArgumentBuilder<S> {
    pub(crate) target: BuilderTarget<S>,
    pub(crate) children: Vec<ArgumentBuilder<S>>,
    pub(crate) command: Option<Command<S>>,
    pub(crate) requirement: Option<Requirement<S>>,
    pub(crate) redirect: Option<Redirect<S>>,
    pub(crate) default_value: Option<ArgumentValue>,
}

/// Start a literal node matching `literal` exactly.
pub fn literal<S>(literal: impl Into<String>) -> ArgumentBuilder<S> {
    ArgumentBuilder::new(BuilderTarget::Literal(literal.into()))
}

/// Start an argument node named `name` decoded by `ty`.
pub fn argument<S, T: ArgumentType>(name: impl Into<String>, ty: T) -> ArgumentBuilder<S> {
    ArgumentBuilder::new(BuilderTarget::Argument(ArgumentNode {
        name: name.into(),
        ty: Arc::new(ty),
        suggestions: None,
    }))
}

impl<S> ArgumentBuilder<S> {
    fn new(target: BuilderTarget<S>) -> Self {
        Self {
            target,
            children: Vec::new(),
            command: None,
            requirement: None,
            redirect: None,
            default_value: None,
        }
    }

    /// Literal text or argument name.
    pub fn name(&self) -> &str {
        match &self.target {
            BuilderTarget::Literal(literal) => literal,
            BuilderTarget::Argument(argument) => &argument.name,
        }
    }

    /// Child builders added so far.
    pub fn children(&self) -> &[ArgumentBuilder<S>] {
        &self.children
    }

    /// Redirect target, if set.
    pub fn redirect_target(&self) -> Option<NodeId> {
        self.redirect.as_ref().map(|r| r.target)
    }
}

impl<S: 'static> ArgumentBuilder<S> {
    /// Add a child subtree.
    ///
    /// # Panics
    ///
    /// Panics if this node already redirects.
    pub fn then(mut self, child: ArgumentBuilder<S>) -> Self {
        assert!(
            self.redirect.is_none(),
            "cannot add children to a redirected node"
        );
        self.children.push(child);
        self
    }

    /// Make the node executable.
    pub fn executes<F>(mut self, command: F) -> Self
    where
        F: Fn(&CommandContext<S>) -> Result<i32, CommandSyntaxError> + Send + Sync + 'static,
    {
        self.command = Some(Arc::new(command));
        self
    }

    /// Use an existing [`Command`] handle.
    pub fn executes_command(mut self, command: Command<S>) -> Self {
        self.command = Some(command);
        self
    }

    /// Restrict the node to sources accepted by `requirement`.
    pub fn requires<F>(mut self, requirement: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        self.requirement = Some(Arc::new(requirement));
        self
    }

    /// Continue at `target` with the same source.
    ///
    /// # Panics
    ///
    /// Panics if the node already has children.
    pub fn redirect(self, target: NodeId) -> Self {
        self.forward(target, None, false)
    }

    /// Continue at `target` with the source replaced by `modifier`'s result.
    ///
    /// # Panics
    ///
    /// Panics if the node already has children.
    pub fn redirect_with<F>(self, target: NodeId, modifier: F) -> Self
    where
        F: Fn(&CommandContext<S>) -> Result<S, CommandSyntaxError> + Send + Sync + 'static,
    {
        let modifier: RedirectModifier<S> =
            Arc::new(move |ctx: &CommandContext<S>| modifier(ctx).map(|s| vec![s]));
        self.forward(target, Some(modifier), false)
    }

    /// Continue at `target` once per source produced by `modifier`.
    ///
    /// # Panics
    ///
    /// Panics if the node already has children.
    pub fn fork<F>(self, target: NodeId, modifier: F) -> Self
    where
        F: Fn(&CommandContext<S>) -> Result<Vec<S>, CommandSyntaxError> + Send + Sync + 'static,
    {
        let modifier: RedirectModifier<S> = Arc::new(modifier);
        self.forward(target, Some(modifier), true)
    }

    /// General form of [`redirect`](Self::redirect) and [`fork`](Self::fork).
    ///
    /// # Panics
    ///
    /// Panics if the node already has children.
    pub fn forward(
        mut self,
        target: NodeId,
        modifier: Option<RedirectModifier<S>>,
        forks: bool,
    ) -> Self {
        assert!(
            self.children.is_empty(),
            "cannot forward a node with children"
        );
        self.redirect = Some(Redirect {
            target,
            modifier,
            forks,
        });
        self
    }

    /// Override the argument type's completions.
    ///
    /// # Panics
    ///
    /// Panics on a literal builder.
    pub fn suggests<F>(mut self, provider: F) -> Self
    where
        F: Fn(&CommandContext<S>, SuggestionsBuilder) -> Result<Suggestions, CommandSyntaxError>
            + Send
            + Sync
            + 'static,
    {
        match &mut self.target {
            BuilderTarget::Argument(argument) => {
                let provider: SuggestionProvider<S> = Arc::new(provider);
                argument.suggestions = Some(provider);
            }
            BuilderTarget::Literal(literal) => {
                panic!("literal '{literal}' cannot carry a suggestion provider")
            }
        }
        self
    }

    /// Value substituted when input ends right before this argument.
    ///
    /// `value` should have the argument type's value type.
    ///
    /// # Panics
    ///
    /// Panics on a literal builder.
    pub fn default_value<T: Any + Send + Sync>(mut self, value: T) -> Self {
        if let BuilderTarget::Literal(literal) = &self.target {
            panic!("literal '{literal}' cannot carry a default value");
        }
        self.default_value = Some(ArgumentValue::new(value));
        self
    }
}
