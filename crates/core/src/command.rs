//! Host callback signatures.
//!
//! All callbacks are reference-counted closures so nodes and contexts can be
//! cloned freely and shared across threads once the tree is built.

use std::sync::Arc;

use crate::context::CommandContext;
use crate::error::CommandSyntaxError;
use crate::suggestion::{Suggestions, SuggestionsBuilder};

/// Body of an executable node. Returns a result magnitude, conventionally `1`.
pub type Command<S> = Arc<dyn Fn(&CommandContext<S>) -> Result<i32, CommandSyntaxError> + Send + Sync>;

/// Permission predicate deciding whether a source may use a node.
pub type Requirement<S> = Arc<dyn Fn(&S) -> bool + Send + Sync>;

/// Source transformation applied when execution passes through a redirect.
///
/// Returns zero or more sources; anything other than exactly one only makes
/// sense on a forking redirect.
pub type RedirectModifier<S> =
    Arc<dyn Fn(&CommandContext<S>) -> Result<Vec<S>, CommandSyntaxError> + Send + Sync>;

/// Per-argument completion override.
pub type SuggestionProvider<S> = Arc<
    dyn Fn(&CommandContext<S>, SuggestionsBuilder) -> Result<Suggestions, CommandSyntaxError>
        + Send
        + Sync,
>;

/// Called once per terminal attempt with `(context, success, result)`.
pub type ResultConsumer<S> = Arc<dyn Fn(&CommandContext<S>, bool, i32) + Send + Sync>;

/// Wrap a closure as a [`Command`].
pub fn command<S, F>(f: F) -> Command<S>
where
    F: Fn(&CommandContext<S>) -> Result<i32, CommandSyntaxError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A consumer that ignores every completion.
pub fn noop_consumer<S: 'static>() -> ResultConsumer<S> {
    Arc::new(|_: &CommandContext<S>, _: bool, _: i32| {})
}
