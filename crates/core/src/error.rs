//! Command syntax errors: a typed [`ErrorKind`] plus optional input/cursor.
//!
//! The core never formats user-facing text itself. Every kind maps to a
//! diagnostic code whose message template lives in the diagnostics crate;
//! [`ErrorKind::data`] supplies the values interpolated into that template.

use std::collections::BTreeMap;

use cmdgrammar_diagnostics::{Diagnostic, Span, codes, render_message};
use serde::Serialize;

use crate::reader::StringReader;

/// Number of characters shown before the cursor in [`CommandSyntaxError::context`].
pub const CONTEXT_AMOUNT: usize = 10;

/// Shorthand for building a `BTreeMap<String, String>` payload from key-value pairs.
macro_rules! data {
    () => {
        BTreeMap::new()
    };
    ($($k:expr => $v:expr),+ $(,)?) => {
        BTreeMap::from([$(($k.to_string(), $v.to_string())),+])
    };
}

/// Broad family an [`ErrorKind`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Malformed quote, escape, number or boolean, raised by the reader.
    Lexical,
    /// A well-formed value outside the bounds declared by its argument type.
    Semantic,
    /// No child matched, trailing input remained, or a literal was wrong.
    Grammar,
    /// The executor gave up on the queued work.
    Execution,
    /// A command asked its context for an argument it does not have.
    Usage,
    /// Raised by host code (commands, modifiers, custom argument types).
    Custom,
}

/// Every error the engine can raise, with its interpolation data.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Expected `"` to open a quoted string.
    ExpectedStartOfQuote,
    /// Quoted string ran to the end of input.
    ExpectedEndOfQuote,
    /// An escape other than `\"` or `\\` inside a quoted string.
    InvalidEscape {
        /// The character following the backslash.
        character: char,
    },
    /// A word that is neither `true` nor `false`.
    InvalidBool {
        /// The word that was read.
        value: String,
    },
    /// No token where a boolean was expected.
    ExpectedBool,
    /// A numeric run that is not a valid `i32`.
    InvalidInt {
        /// The numeric run that was read.
        value: String,
    },
    /// No numeric run where an integer was expected.
    ExpectedInt,
    /// A numeric run that is not a valid `i64`.
    InvalidLong {
        /// The numeric run that was read.
        value: String,
    },
    /// No numeric run where a long was expected.
    ExpectedLong,
    /// A numeric run that is not a valid `f64`.
    InvalidDouble {
        /// The numeric run that was read.
        value: String,
    },
    /// No numeric run where a double was expected.
    ExpectedDouble,
    /// A numeric run that is not a valid `f32`.
    InvalidFloat {
        /// The numeric run that was read.
        value: String,
    },
    /// No numeric run where a float was expected.
    ExpectedFloat,
    /// A specific character was required.
    ExpectedSymbol {
        /// The required character.
        symbol: char,
    },
    /// Integer below the declared minimum.
    IntegerTooLow {
        /// Parsed value.
        found: i32,
        /// Declared minimum.
        minimum: i32,
    },
    /// Integer above the declared maximum.
    IntegerTooHigh {
        /// Parsed value.
        found: i32,
        /// Declared maximum.
        maximum: i32,
    },
    /// Long below the declared minimum.
    LongTooLow {
        /// Parsed value.
        found: i64,
        /// Declared minimum.
        minimum: i64,
    },
    /// Long above the declared maximum.
    LongTooHigh {
        /// Parsed value.
        found: i64,
        /// Declared maximum.
        maximum: i64,
    },
    /// Float below the declared minimum.
    FloatTooLow {
        /// Parsed value.
        found: f32,
        /// Declared minimum.
        minimum: f32,
    },
    /// Float above the declared maximum.
    FloatTooHigh {
        /// Parsed value.
        found: f32,
        /// Declared maximum.
        maximum: f32,
    },
    /// Double below the declared minimum.
    DoubleTooLow {
        /// Parsed value.
        found: f64,
        /// Declared minimum.
        minimum: f64,
    },
    /// Double above the declared maximum.
    DoubleTooHigh {
        /// Parsed value.
        found: f64,
        /// Declared maximum.
        maximum: f64,
    },
    /// A literal node did not match.
    LiteralIncorrect {
        /// The literal keyword.
        expected: String,
    },
    /// Nothing matched at the start of input, or the path is not executable.
    UnknownCommand,
    /// A command matched but what follows did not.
    UnknownArgument,
    /// A parsed argument was followed by something other than a separator.
    ExpectedArgumentSeparator,
    /// A host parser rejected the input.
    ParseFailure {
        /// The parser's explanation.
        message: String,
    },
    /// The trampoline ran out of queued-entry quota.
    ExecutionLimitReached {
        /// The configured quota.
        limit: usize,
    },
    /// [`CommandContext::get_argument`](crate::CommandContext::get_argument) on a missing name.
    NoSuchArgument {
        /// Requested argument name.
        name: String,
    },
    /// [`CommandContext::get_argument`](crate::CommandContext::get_argument) with the wrong type.
    ArgumentTypeMismatch {
        /// Requested argument name.
        name: String,
        /// Type the caller asked for.
        expected: &'static str,
        /// Type actually stored.
        found: &'static str,
    },
    /// Host-defined failure.
    Custom {
        /// Message supplied by the host.
        message: String,
    },
}

impl ErrorKind {
    /// Stable diagnostic code for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::ExpectedStartOfQuote => codes::READER_EXPECTED_START_OF_QUOTE,
            ErrorKind::ExpectedEndOfQuote => codes::READER_EXPECTED_END_OF_QUOTE,
            ErrorKind::InvalidEscape { .. } => codes::READER_INVALID_ESCAPE,
            ErrorKind::InvalidBool { .. } => codes::READER_INVALID_BOOL,
            ErrorKind::ExpectedBool => codes::READER_EXPECTED_BOOL,
            ErrorKind::InvalidInt { .. } => codes::READER_INVALID_INT,
            ErrorKind::ExpectedInt => codes::READER_EXPECTED_INT,
            ErrorKind::InvalidLong { .. } => codes::READER_INVALID_LONG,
            ErrorKind::ExpectedLong => codes::READER_EXPECTED_LONG,
            ErrorKind::InvalidDouble { .. } => codes::READER_INVALID_DOUBLE,
            ErrorKind::ExpectedDouble => codes::READER_EXPECTED_DOUBLE,
            ErrorKind::InvalidFloat { .. } => codes::READER_INVALID_FLOAT,
            ErrorKind::ExpectedFloat => codes::READER_EXPECTED_FLOAT,
            ErrorKind::ExpectedSymbol { .. } => codes::READER_EXPECTED_SYMBOL,
            ErrorKind::IntegerTooLow { .. } => codes::INTEGER_TOO_LOW,
            ErrorKind::IntegerTooHigh { .. } => codes::INTEGER_TOO_HIGH,
            ErrorKind::LongTooLow { .. } => codes::LONG_TOO_LOW,
            ErrorKind::LongTooHigh { .. } => codes::LONG_TOO_HIGH,
            ErrorKind::FloatTooLow { .. } => codes::FLOAT_TOO_LOW,
            ErrorKind::FloatTooHigh { .. } => codes::FLOAT_TOO_HIGH,
            ErrorKind::DoubleTooLow { .. } => codes::DOUBLE_TOO_LOW,
            ErrorKind::DoubleTooHigh { .. } => codes::DOUBLE_TOO_HIGH,
            ErrorKind::LiteralIncorrect { .. } => codes::LITERAL_INCORRECT,
            ErrorKind::UnknownCommand => codes::DISPATCHER_UNKNOWN_COMMAND,
            ErrorKind::UnknownArgument => codes::DISPATCHER_UNKNOWN_ARGUMENT,
            ErrorKind::ExpectedArgumentSeparator => codes::DISPATCHER_EXPECTED_ARGUMENT_SEPARATOR,
            ErrorKind::ParseFailure { .. } => codes::DISPATCHER_PARSE_EXCEPTION,
            ErrorKind::ExecutionLimitReached { .. } => codes::EXECUTION_LIMIT_REACHED,
            ErrorKind::NoSuchArgument { .. } => codes::CONTEXT_NO_SUCH_ARGUMENT,
            ErrorKind::ArgumentTypeMismatch { .. } => codes::CONTEXT_ARGUMENT_TYPE_MISMATCH,
            ErrorKind::Custom { .. } => codes::CUSTOM,
        }
    }

    /// The family this kind belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorKind::ExpectedStartOfQuote
            | ErrorKind::ExpectedEndOfQuote
            | ErrorKind::InvalidEscape { .. }
            | ErrorKind::InvalidBool { .. }
            | ErrorKind::ExpectedBool
            | ErrorKind::InvalidInt { .. }
            | ErrorKind::ExpectedInt
            | ErrorKind::InvalidLong { .. }
            | ErrorKind::ExpectedLong
            | ErrorKind::InvalidDouble { .. }
            | ErrorKind::ExpectedDouble
            | ErrorKind::InvalidFloat { .. }
            | ErrorKind::ExpectedFloat
            | ErrorKind::ExpectedSymbol { .. } => ErrorCategory::Lexical,
            ErrorKind::IntegerTooLow { .. }
            | ErrorKind::IntegerTooHigh { .. }
            | ErrorKind::LongTooLow { .. }
            | ErrorKind::LongTooHigh { .. }
            | ErrorKind::FloatTooLow { .. }
            | ErrorKind::FloatTooHigh { .. }
            | ErrorKind::DoubleTooLow { .. }
            | ErrorKind::DoubleTooHigh { .. } => ErrorCategory::Semantic,
            ErrorKind::LiteralIncorrect { .. }
            | ErrorKind::UnknownCommand
            | ErrorKind::UnknownArgument
            | ErrorKind::ExpectedArgumentSeparator
            | ErrorKind::ParseFailure { .. } => ErrorCategory::Grammar,
            ErrorKind::ExecutionLimitReached { .. } => ErrorCategory::Execution,
            ErrorKind::NoSuchArgument { .. } | ErrorKind::ArgumentTypeMismatch { .. } => {
                ErrorCategory::Usage
            }
            ErrorKind::Custom { .. } => ErrorCategory::Custom,
        }
    }

    /// Structured payload, keyed by the code's template placeholders.
    pub fn data(&self) -> BTreeMap<String, String> {
        match self {
            ErrorKind::InvalidEscape { character } => data!("character" => character),
            ErrorKind::ExpectedSymbol { symbol } => data!("symbol" => symbol),
            ErrorKind::InvalidBool { value }
            | ErrorKind::InvalidInt { value }
            | ErrorKind::InvalidLong { value }
            | ErrorKind::InvalidDouble { value }
            | ErrorKind::InvalidFloat { value } => data!("value" => value),
            ErrorKind::IntegerTooLow { found, minimum } => {
                data!("found" => found, "minimum" => minimum)
            }
            ErrorKind::IntegerTooHigh { found, maximum } => {
                data!("found" => found, "maximum" => maximum)
            }
            ErrorKind::LongTooLow { found, minimum } => {
                data!("found" => found, "minimum" => minimum)
            }
            ErrorKind::LongTooHigh { found, maximum } => {
                data!("found" => found, "maximum" => maximum)
            }
            ErrorKind::FloatTooLow { found, minimum } => {
                data!("found" => found, "minimum" => minimum)
            }
            ErrorKind::FloatTooHigh { found, maximum } => {
                data!("found" => found, "maximum" => maximum)
            }
            ErrorKind::DoubleTooLow { found, minimum } => {
                data!("found" => found, "minimum" => minimum)
            }
            ErrorKind::DoubleTooHigh { found, maximum } => {
                data!("found" => found, "maximum" => maximum)
            }
            ErrorKind::LiteralIncorrect { expected } => data!("expected" => expected),
            ErrorKind::ParseFailure { message } | ErrorKind::Custom { message } => {
                data!("message" => message)
            }
            ErrorKind::ExecutionLimitReached { limit } => data!("limit" => limit),
            ErrorKind::NoSuchArgument { name } => data!("name" => name),
            ErrorKind::ArgumentTypeMismatch {
                name,
                expected,
                found,
            } => data!("name" => name, "expected" => expected, "found" => found),
            ErrorKind::ExpectedStartOfQuote
            | ErrorKind::ExpectedEndOfQuote
            | ErrorKind::ExpectedBool
            | ErrorKind::ExpectedInt
            | ErrorKind::ExpectedLong
            | ErrorKind::ExpectedDouble
            | ErrorKind::ExpectedFloat
            | ErrorKind::UnknownCommand
            | ErrorKind::UnknownArgument
            | ErrorKind::ExpectedArgumentSeparator => data!(),
        }
    }

    /// Message rendered from the code's template.
    pub fn message(&self) -> String {
        render_message(self.code(), &self.data()).unwrap_or_else(|| self.code().to_string())
    }

    /// Raise this kind without input context.
    pub fn create(self) -> CommandSyntaxError {
        CommandSyntaxError {
            kind: self,
            input: None,
            cursor: None,
        }
    }

    /// Raise this kind pointing at the reader's current cursor.
    pub fn create_with_context(self, reader: &StringReader) -> CommandSyntaxError {
        CommandSyntaxError {
            kind: self,
            input: Some(reader.string().to_string()),
            cursor: Some(reader.cursor()),
        }
    }
}

/// The error type raised by every fallible engine operation and host callback.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", describe(.kind, .input, .cursor))]
pub struct CommandSyntaxError {
    kind: ErrorKind,
    input: Option<String>,
    cursor: Option<usize>,
}

impl CommandSyntaxError {
    /// A host-defined failure with its own message.
    pub fn custom(message: impl Into<String>) -> Self {
        ErrorKind::Custom {
            message: message.into(),
        }
        .create()
    }

    /// The typed kind.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// The full input line, when raised with context.
    pub fn input(&self) -> Option<&str> {
        self.input.as_deref()
    }

    /// Byte offset the error points at, when raised with context.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// The rendered message without position information.
    pub fn raw_message(&self) -> String {
        self.kind.message()
    }

    /// Up to [`CONTEXT_AMOUNT`] bytes before the cursor followed by `<--[HERE]`,
    /// prefixed with `...` when truncated.
    pub fn context(&self) -> Option<String> {
        let input = self.input.as_deref()?;
        let mut cursor = self.cursor?.min(input.len());
        while !input.is_char_boundary(cursor) {
            cursor -= 1;
        }
        let mut start = cursor.saturating_sub(CONTEXT_AMOUNT);
        while !input.is_char_boundary(start) {
            start += 1;
        }

        let mut out = String::new();
        if cursor > CONTEXT_AMOUNT {
            out.push_str("...");
        }
        out.push_str(&input[start..cursor]);
        out.push_str("<--[HERE]");
        Some(out)
    }

    /// Convert into a boundary [`Diagnostic`] with a zero-width span at the cursor.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::from_template(self.kind.code(), self.kind.data(), self.cursor.map(Span::empty))
    }
}

impl From<ErrorKind> for CommandSyntaxError {
    fn from(kind: ErrorKind) -> Self {
        kind.create()
    }
}

fn describe(kind: &ErrorKind, input: &Option<String>, cursor: &Option<usize>) -> String {
    let message = kind.message();
    let error = CommandSyntaxError {
        kind: kind.clone(),
        input: input.clone(),
        cursor: *cursor,
    };
    match (error.context(), cursor) {
        (Some(context), Some(cursor)) => format!("{message} at position {cursor}: {context}"),
        _ => message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_shows_left_window() {
        let mut reader = StringReader::new("hello world");
        reader.set_cursor(5);
        let err = ErrorKind::ExpectedBool.create_with_context(&reader);
        assert_eq!(err.context().as_deref(), Some("hello<--[HERE]"));
    }

    #[test]
    fn context_truncates_with_ellipsis() {
        let mut reader = StringReader::new("0123456789abcdef");
        reader.set_cursor(14);
        let err = ErrorKind::UnknownArgument.create_with_context(&reader);
        assert_eq!(err.context().as_deref(), Some("...456789abcd<--[HERE]"));
    }

    #[test]
    fn no_context_without_input() {
        let err = ErrorKind::UnknownCommand.create();
        assert!(err.context().is_none());
        assert_eq!(err.to_string(), "Unknown command");
    }

    #[test]
    fn display_includes_position() {
        let mut reader = StringReader::new("base 101");
        reader.set_cursor(5);
        let err = ErrorKind::IntegerTooHigh {
            found: 101,
            maximum: 100,
        }
        .create_with_context(&reader);
        assert_eq!(
            err.to_string(),
            "Integer must not be more than 100, found 101 at position 5: base <--[HERE]"
        );
    }

    #[test]
    fn data_matches_template_keys() {
        let kind = ErrorKind::IntegerTooHigh {
            found: 101,
            maximum: 100,
        };
        let data = kind.data();
        assert_eq!(data.get("found").map(String::as_str), Some("101"));
        assert_eq!(data.get("maximum").map(String::as_str), Some("100"));
        assert_eq!(kind.category(), ErrorCategory::Semantic);
    }

    #[test]
    fn diagnostic_carries_code_and_span() {
        let mut reader = StringReader::new("foo bar");
        reader.set_cursor(4);
        let diag = ErrorKind::UnknownArgument
            .create_with_context(&reader)
            .to_diagnostic();
        assert_eq!(diag.id, codes::DISPATCHER_UNKNOWN_ARGUMENT);
        assert_eq!(diag.span, Some(Span::empty(4)));
        assert_eq!(diag.message, "Incorrect argument for command");
    }

    #[test]
    fn custom_error_message() {
        let err = CommandSyntaxError::custom("no such player");
        assert_eq!(err.kind().category(), ErrorCategory::Custom);
        assert_eq!(err.to_string(), "no such player");
    }
}
