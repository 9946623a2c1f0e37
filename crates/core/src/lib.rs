//! cmdgrammar core library.
//!
//! A command-grammar engine: build a tree of literal and typed-argument nodes,
//! parse single lines of text against it with backtracking, execute the
//! matched command through redirects and forks, and compute completions and
//! usage strings. The main entry point is [`CommandDispatcher`]; trees are
//! described with the [`literal`] and [`argument`] builders.
//!
//! ```
//! use cmdgrammar_core::{CommandDispatcher, argument, integer_range, literal};
//!
//! let mut dispatcher = CommandDispatcher::<()>::new();
//! dispatcher.register(literal("base").then(
//!     argument("n", integer_range(-100, 100)).executes(|ctx| ctx.get_argument::<i32>("n")),
//! ));
//! assert_eq!(dispatcher.execute("base 42", ()).unwrap(), 42);
//! assert!(dispatcher.execute("base 101", ()).is_err());
//! ```

#![warn(missing_docs)]

/// Argument types and the type-erased value store.
pub mod arguments;
/// Host callback signatures.
pub mod command;
/// Parse contexts, ranges, context chains and the dispatch scheduler.
pub mod context;
/// The dispatcher: parse, execute, complete, usage.
pub mod dispatcher;
/// Error kinds and the syntax error type.
pub mod error;
/// Cursor-based tokenizer over one line of input.
pub mod reader;
/// Completion suggestions and their builder.
pub mod suggestion;
/// The command tree and its builders.
pub mod tree;

// ── Convenience re-exports ──────────────────────────────────────────────────
// Flat imports for the most common entry points. The full module paths
// remain available for less common types.

// Dispatcher
pub use dispatcher::{
    CommandDispatcher, DEFAULT_MAX_QUEUED_ENTRIES, ParseResults, ParseTrace, to_pretty_json,
};

// Tree
pub use tree::{ArgumentBuilder, CommandNode, CommandTree, NodeId, argument, literal};

// Arguments
pub use arguments::{
    ArgumentType, ArgumentValue, bool, double, double_range, float, float_range, greedy_string,
    integer, integer_min, integer_range, long, long_range, string, word,
};

// Contexts
pub use context::{CommandContext, CommandContextBuilder, ContextChain, Scheduler, StringRange};

// Callbacks
pub use command::{Command, RedirectModifier, Requirement, ResultConsumer, SuggestionProvider};

// Errors
pub use error::{CommandSyntaxError, ErrorCategory, ErrorKind};

// Reader
pub use reader::StringReader;

// Suggestions
pub use suggestion::{Suggestion, Suggestions, SuggestionsBuilder};

// Diagnostics (re-exported from the diagnostics crate)
pub use cmdgrammar_diagnostics::{Diagnostic, Severity, Span};
