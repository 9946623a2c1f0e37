use crate::error::CommandSyntaxError;
use crate::reader::StringReader;

use super::ArgumentType;

/// How much input a [`StringArgumentType`] consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
    /// One unquoted word.
    SingleWord,
    /// One word, or a `"`-quoted phrase.
    QuotablePhrase,
    /// Everything up to the end of input.
    GreedyPhrase,
}

/// A string argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringArgumentType {
    kind: StringKind,
}

impl StringArgumentType {
    /// Which flavour of string this is.
    pub fn kind(&self) -> StringKind {
        self.kind
    }
}

/// A single unquoted word.
pub fn word() -> StringArgumentType {
    StringArgumentType {
        kind: StringKind::SingleWord,
    }
}

/// A word or a quoted phrase.
pub fn string() -> StringArgumentType {
    StringArgumentType {
        kind: StringKind::QuotablePhrase,
    }
}

/// The rest of the input, verbatim.
pub fn greedy_string() -> StringArgumentType {
    StringArgumentType {
        kind: StringKind::GreedyPhrase,
    }
}

impl ArgumentType for StringArgumentType {
    type Value = String;

    fn parse(&self, reader: &mut StringReader) -> Result<String, CommandSyntaxError> {
        match self.kind {
            StringKind::GreedyPhrase => {
                let text = reader.remaining().to_string();
                let end = reader.total_length();
                reader.set_cursor(end);
                Ok(text)
            }
            StringKind::SingleWord => Ok(reader.read_unquoted_string().to_string()),
            StringKind::QuotablePhrase => reader.read_string(),
        }
    }

    fn examples(&self) -> &[&'static str] {
        match self.kind {
            StringKind::SingleWord => &["word", "words_with_underscores"],
            StringKind::QuotablePhrase => &["\"quoted phrase\"", "word", "\"\""],
            StringKind::GreedyPhrase => &["word", "words with spaces", "\"and symbols\""],
        }
    }
}

/// Quote `input` unless every character is allowed in an unquoted word.
pub fn escape_if_required(input: &str) -> String {
    if input.chars().all(StringReader::is_allowed_in_unquoted_string) {
        return input.to_string();
    }
    let mut result = String::with_capacity(input.len() + 2);
    result.push('"');
    for c in input.chars() {
        if c == '\\' || c == '"' {
            result.push('\\');
        }
        result.push(c);
    }
    result.push('"');
    result
}
