use crate::context::CommandContext;
use crate::error::CommandSyntaxError;
use crate::reader::StringReader;
use crate::suggestion::{Suggestions, SuggestionsBuilder};

use super::ArgumentType;

/// `true` or `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoolArgumentType;

/// A boolean argument.
pub fn bool() -> BoolArgumentType {
    BoolArgumentType
}

impl ArgumentType for BoolArgumentType {
    type Value = bool;

    fn parse(&self, reader: &mut StringReader) -> Result<bool, CommandSyntaxError> {
        reader.read_boolean()
    }

    fn list_suggestions<S>(
        &self,
        _context: &CommandContext<S>,
        mut builder: SuggestionsBuilder,
    ) -> Result<Suggestions, CommandSyntaxError> {
        for candidate in ["true", "false"] {
            if candidate.starts_with(builder.remaining_lower_case()) {
                builder.suggest(candidate);
            }
        }
        Ok(builder.build())
    }

    fn examples(&self) -> &[&'static str] {
        &["true", "false"]
    }
}
