use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::arguments::{ArgumentValue, ErasedArgumentType};
use crate::command::{Command, RedirectModifier, Requirement, SuggestionProvider};
use crate::context::{CommandContext, CommandContextBuilder, ParsedArgument, StringRange};
use crate::error::{CommandSyntaxError, ErrorKind};
use crate::reader::{ARGUMENT_SEPARATOR, StringReader};
use crate::suggestion::{Suggestions, SuggestionsBuilder};

use super::NodeId;

/// Identity under which siblings are merged on registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MergeKey {
    /// A literal keyword.
    Literal(String),
    /// A named argument.
    Argument(String),
}

/// A typed argument slot.
pub struct ArgumentNode<S> {
    pub(crate) name: String,
    pub(crate) ty: Arc<dyn ErasedArgumentType<S>>,
    pub(crate) suggestions: Option<SuggestionProvider<S>>,
}

impl<S> ArgumentNode<S> {
    /// Argument name, as used by `get_argument`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The argument type.
    pub fn argument_type(&self) -> &dyn ErasedArgumentType<S> {
        self.ty.as_ref()
    }

    /// True when a custom suggestion provider overrides the type's own.
    pub fn has_custom_suggestions(&self) -> bool {
        self.suggestions.is_some()
    }
}

/// What a node matches.
pub enum NodeKind<S> {
    /// The tree root. Matches nothing itself.
    Root,
    /// A fixed keyword.
    Literal(String),
    /// A typed value.
    Argument(ArgumentNode<S>),
}

/// Where execution continues after a node, and how the source is transformed.
pub struct Redirect<S> {
    pub(crate) target: NodeId,
    pub(crate) modifier: Option<RedirectModifier<S>>,
    pub(crate) forks: bool,
}

impl<S> Clone for Redirect<S> {
    fn clone(&self) -> Self {
        Self {
            target: self.target,
            modifier: self.modifier.clone(),
            forks: self.forks,
        }
    }
}

/// One node of a [`CommandTree`](super::CommandTree).
pub struct CommandNode<S> {
    pub(crate) kind: NodeKind<S>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) index: HashMap<MergeKey, NodeId>,
    pub(crate) literals: HashMap<String, NodeId>,
    pub(crate) arguments: Vec<NodeId>,
    pub(crate) command: Option<Command<S>>,
    pub(crate) requirement: Option<Requirement<S>>,
    pub(crate) redirect: Option<Redirect<S>>,
    pub(crate) default_value: Option<ArgumentValue>,
}

impl<S> CommandNode<S> {
    pub(crate) fn root() -> Self {
        Self::new(NodeKind::Root, None)
    }

    pub(crate) fn new(kind: NodeKind<S>, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            index: HashMap::new(),
            literals: HashMap::new(),
            arguments: Vec::new(),
            command: None,
            requirement: None,
            redirect: None,
            default_value: None,
        }
    }

    /// What this node matches.
    pub fn kind(&self) -> &NodeKind<S> {
        &self.kind
    }

    /// The node this one was registered under. `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Child registered under `key`.
    pub fn child(&self, key: &MergeKey) -> Option<NodeId> {
        self.index.get(key).copied()
    }

    /// Literal text, argument name, or `""` for the root.
    pub fn name(&self) -> &str {
        match &self.kind {
            NodeKind::Root => "",
            NodeKind::Literal(literal) => literal,
            NodeKind::Argument(argument) => &argument.name,
        }
    }

    /// Merge key, or `None` for the root.
    pub fn merge_key(&self) -> Option<MergeKey> {
        match &self.kind {
            NodeKind::Root => None,
            NodeKind::Literal(literal) => Some(MergeKey::Literal(literal.clone())),
            NodeKind::Argument(argument) => Some(MergeKey::Argument(argument.name.clone())),
        }
    }

    /// `literal` for literals, `<name>` for arguments, `""` for the root.
    pub fn usage_text(&self) -> String {
        match &self.kind {
            NodeKind::Root => String::new(),
            NodeKind::Literal(literal) => literal.clone(),
            NodeKind::Argument(argument) => format!("<{}>", argument.name),
        }
    }

    /// True for literal nodes.
    pub fn is_literal(&self) -> bool {
        matches!(self.kind, NodeKind::Literal(_))
    }

    /// True for argument nodes.
    pub fn is_argument(&self) -> bool {
        matches!(self.kind, NodeKind::Argument(_))
    }

    /// Callback run when a path ends here.
    pub fn command(&self) -> Option<&Command<S>> {
        self.command.as_ref()
    }

    /// Whether `source` passes this node's permission predicate.
    pub fn can_use(&self, source: &S) -> bool {
        self.requirement.as_ref().is_none_or(|requirement| requirement(source))
    }

    /// Redirect target, if any.
    pub fn redirect(&self) -> Option<NodeId> {
        self.redirect.as_ref().map(|r| r.target)
    }

    /// Source modifier applied when passing through the redirect.
    pub fn redirect_modifier(&self) -> Option<&RedirectModifier<S>> {
        self.redirect.as_ref().and_then(|r| r.modifier.as_ref())
    }

    /// True when the redirect forks.
    pub fn is_fork(&self) -> bool {
        self.redirect.as_ref().is_some_and(|r| r.forks)
    }

    /// Value used when input ends before this argument.
    pub fn default_value(&self) -> Option<&ArgumentValue> {
        self.default_value.as_ref()
    }

    /// Representative inputs this node accepts.
    pub fn examples(&self) -> Vec<&str> {
        match &self.kind {
            NodeKind::Root => Vec::new(),
            NodeKind::Literal(literal) => vec![literal.as_str()],
            NodeKind::Argument(argument) => argument.ty.examples_erased().to_vec(),
        }
    }

    /// Children worth trying at the reader's position.
    ///
    /// When the next word is exactly one of this node's literals only that
    /// literal is returned; otherwise only the argument children are.
    pub fn relevant_nodes(&self, reader: &StringReader) -> &[NodeId] {
        if self.literals.is_empty() {
            return &self.arguments;
        }
        let remaining = reader.remaining();
        let word = remaining
            .split(ARGUMENT_SEPARATOR)
            .next()
            .unwrap_or(remaining);
        match self.literals.get(word) {
            Some(id) => std::slice::from_ref(id),
            None => &self.arguments,
        }
    }

    /// Literals sort before arguments, then by name.
    pub fn compare(&self, other: &CommandNode<S>) -> Ordering {
        match (self.is_literal(), other.is_literal()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => self.merge_key().cmp(&other.merge_key()),
        }
    }

    /// Whether `input` would parse as this node alone.
    pub fn is_valid_input(&self, input: &str) -> bool {
        let mut reader = StringReader::new(input);
        match &self.kind {
            NodeKind::Root => false,
            NodeKind::Literal(literal) => match_literal(literal, &mut reader).is_some(),
            NodeKind::Argument(argument) => {
                argument.ty.parse_erased(&mut reader).is_ok()
                    && (!reader.can_read() || reader.peek() == Some(ARGUMENT_SEPARATOR))
            }
        }
    }
}

impl<S: Clone + 'static> CommandNode<S> {
    /// Consume this node's token from `reader` and record it in `context`.
    pub(crate) fn parse(
        &self,
        id: NodeId,
        reader: &mut StringReader,
        context: &mut CommandContextBuilder<S>,
    ) -> Result<(), CommandSyntaxError> {
        match &self.kind {
            NodeKind::Root => Ok(()),
            NodeKind::Literal(literal) => {
                let start = reader.cursor();
                match match_literal(literal, reader) {
                    Some(end) => {
                        context.with_node(id, self, StringRange::between(start, end));
                        Ok(())
                    }
                    None => Err(ErrorKind::LiteralIncorrect {
                        expected: literal.clone(),
                    }
                    .create_with_context(reader)),
                }
            }
            NodeKind::Argument(argument) => {
                let start = reader.cursor();
                let value = argument.ty.parse_erased(reader)?;
                let parsed = ParsedArgument::new(StringRange::between(start, reader.cursor()), value);
                let range = parsed.range();
                context.with_argument(argument.name.clone(), parsed);
                context.with_node(id, self, range);
                Ok(())
            }
        }
    }

    /// Completions this node offers for the text in `builder`.
    pub fn list_suggestions(
        &self,
        context: &CommandContext<S>,
        mut builder: SuggestionsBuilder,
    ) -> Result<Suggestions, CommandSyntaxError> {
        match &self.kind {
            NodeKind::Root => Ok(Suggestions::empty()),
            NodeKind::Literal(literal) => {
                if literal.to_lowercase().starts_with(builder.remaining_lower_case()) {
                    builder.suggest(literal.as_str());
                    Ok(builder.build())
                } else {
                    Ok(Suggestions::empty())
                }
            }
            NodeKind::Argument(argument) => match &argument.suggestions {
                Some(provider) => provider(context, builder),
                None => argument.ty.list_suggestions_erased(context, builder),
            },
        }
    }
}

/// Match `literal` at the cursor as a whole word. Returns the end offset and
/// leaves the cursor there, or leaves the cursor untouched.
fn match_literal(literal: &str, reader: &mut StringReader) -> Option<usize> {
    let remaining = reader.remaining();
    if !remaining.starts_with(literal) {
        return None;
    }
    match remaining[literal.len()..].chars().next() {
        None | Some(ARGUMENT_SEPARATOR) => {
            let end = reader.cursor() + literal.len();
            reader.set_cursor(end);
            Some(end)
        }
        Some(_) => None,
    }
}

impl<S> fmt::Debug for CommandNode<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            NodeKind::Root => "root",
            NodeKind::Literal(_) => "literal",
            NodeKind::Argument(_) => "argument",
        };
        f.debug_struct("CommandNode")
            .field("kind", &kind)
            .field("name", &self.name())
            .field("children", &self.children)
            .field("executable", &self.command.is_some())
            .field("redirect", &self.redirect())
            .field("fork", &self.is_fork())
            .finish()
    }
}
