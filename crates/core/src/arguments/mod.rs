//! Argument types: the typed leaves of the grammar.
//!
//! An [`ArgumentType`] consumes a prefix of the reader and produces a typed
//! value, or fails leaving the cursor at the failure point. Nodes store
//! argument types behind the object-safe [`ErasedArgumentType`] so one tree can
//! hold arguments of any value type.

mod boolean;
mod number;
mod string;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

pub use self::boolean::{BoolArgumentType, bool};
pub use self::number::{
    DoubleArgumentType, FloatArgumentType, IntegerArgumentType, LongArgumentType, double,
    double_min, double_range, float, float_min, float_range, integer, integer_min, integer_range,
    long, long_min, long_range,
};
pub use self::string::{StringArgumentType, StringKind, escape_if_required, greedy_string, string, word};

use crate::context::CommandContext;
use crate::error::CommandSyntaxError;
use crate::reader::StringReader;
use crate::suggestion::{Suggestions, SuggestionsBuilder};

/// Contract every argument type satisfies.
pub trait ArgumentType: Send + Sync + 'static {
    /// The decoded value stored in the context.
    type Value: Any + Send + Sync;

    /// Consume a value from `reader`.
    ///
    /// On failure the cursor must be at (or rewound to) the offending token.
    fn parse(&self, reader: &mut StringReader) -> Result<Self::Value, CommandSyntaxError>;

    /// Completions for the partial token in `builder`.
    fn list_suggestions<S>(
        &self,
        _context: &CommandContext<S>,
        _builder: SuggestionsBuilder,
    ) -> Result<Suggestions, CommandSyntaxError> {
        Ok(Suggestions::empty())
    }

    /// Representative inputs used for ambiguity detection.
    fn examples(&self) -> &[&'static str] {
        &[]
    }
}

/// Object-safe view of an [`ArgumentType`] for a given source type.
pub trait ErasedArgumentType<S>: Send + Sync {
    /// Parse and box the value.
    fn parse_erased(&self, reader: &mut StringReader) -> Result<ArgumentValue, CommandSyntaxError>;

    /// See [`ArgumentType::list_suggestions`].
    fn list_suggestions_erased(
        &self,
        context: &CommandContext<S>,
        builder: SuggestionsBuilder,
    ) -> Result<Suggestions, CommandSyntaxError>;

    /// See [`ArgumentType::examples`].
    fn examples_erased(&self) -> &[&'static str];

    /// Rust type name of the produced value.
    fn value_type_name(&self) -> &'static str;
}

impl<S, T: ArgumentType> ErasedArgumentType<S> for T {
    fn parse_erased(&self, reader: &mut StringReader) -> Result<ArgumentValue, CommandSyntaxError> {
        self.parse(reader).map(ArgumentValue::new)
    }

    fn list_suggestions_erased(
        &self,
        context: &CommandContext<S>,
        builder: SuggestionsBuilder,
    ) -> Result<Suggestions, CommandSyntaxError> {
        self.list_suggestions(context, builder)
    }

    fn examples_erased(&self) -> &[&'static str] {
        self.examples()
    }

    fn value_type_name(&self) -> &'static str {
        std::any::type_name::<T::Value>()
    }
}

/// A parsed argument value of some type, shared cheaply between contexts.
#[derive(Clone)]
pub struct ArgumentValue {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl ArgumentValue {
    /// Box `value`.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Borrow the value as `T`, if that is its type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Rust type name of the stored value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for ArgumentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentValue")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
