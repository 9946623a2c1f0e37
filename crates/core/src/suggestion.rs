//! Completion candidates anchored to a replacement range.

use std::cmp::Ordering;

use serde::Serialize;

use crate::context::StringRange;

/// One completion: replace `range` of the input with `text`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Suggestion {
    range: StringRange,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tooltip: Option<String>,
    #[serde(skip)]
    integer: Option<i32>,
}

impl Suggestion {
    /// A plain text suggestion.
    pub fn new(range: StringRange, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
            tooltip: None,
            integer: None,
        }
    }

    /// Attach a tooltip.
    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    /// Range of the input this suggestion replaces.
    pub fn range(&self) -> StringRange {
        self.range
    }

    /// Replacement text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Optional tooltip.
    pub fn tooltip(&self) -> Option<&str> {
        self.tooltip.as_deref()
    }

    /// `input` with this suggestion applied.
    pub fn apply(&self, input: &str) -> String {
        if self.range.start == 0 && self.range.end == input.len() {
            return self.text.clone();
        }
        let mut result = String::with_capacity(input.len() + self.text.len());
        result.push_str(input.get(..self.range.start).unwrap_or(input));
        result.push_str(&self.text);
        if let Some(rest) = input.get(self.range.end..) {
            result.push_str(rest);
        }
        result
    }

    /// Widen this suggestion to `range`, copying the surrounding text of
    /// `command` into it so applying it has the same effect.
    pub fn expand(&self, command: &str, range: StringRange) -> Suggestion {
        if range == self.range {
            return self.clone();
        }
        let mut text = String::new();
        if range.start < self.range.start {
            text.push_str(StringRange::new(range.start, self.range.start).get(command));
        }
        text.push_str(&self.text);
        if range.end > self.range.end {
            text.push_str(StringRange::new(self.range.end, range.end).get(command));
        }
        Suggestion {
            range,
            text,
            tooltip: self.tooltip.clone(),
            integer: None,
        }
    }

    fn compare_ignore_case(&self, other: &Suggestion) -> Ordering {
        match (self.integer, other.integer) {
            (Some(a), Some(b)) => return a.cmp(&b).then_with(|| self.range.cmp(&other.range)),
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (None, None) => {}
        }
        self.text
            .to_lowercase()
            .cmp(&other.text.to_lowercase())
            .then_with(|| self.text.cmp(&other.text))
            .then_with(|| self.range.cmp(&other.range))
            .then_with(|| self.tooltip.cmp(&other.tooltip))
    }
}

/// A sorted, de-duplicated set of suggestions sharing one enclosing range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestions {
    range: StringRange,
    suggestions: Vec<Suggestion>,
}

impl Suggestions {
    /// No suggestions.
    pub fn empty() -> Self {
        Self {
            range: StringRange::at(0),
            suggestions: Vec::new(),
        }
    }

    /// Range every suggestion has been expanded to.
    pub fn range(&self) -> StringRange {
        self.range
    }

    /// The suggestions in order.
    pub fn list(&self) -> &[Suggestion] {
        &self.suggestions
    }

    /// True when there is nothing to suggest.
    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }

    /// Combine several suggestion sets for the same `command`.
    pub fn merge(command: &str, input: Vec<Suggestions>) -> Suggestions {
        match input.len() {
            0 => Suggestions::empty(),
            1 => input.into_iter().next().unwrap_or_else(Suggestions::empty),
            _ => Suggestions::create(
                command,
                input.into_iter().flat_map(|s| s.suggestions).collect(),
            ),
        }
    }

    /// Expand every suggestion to the enclosing range, de-duplicate, and sort
    /// case-insensitively.
    pub fn create(command: &str, suggestions: Vec<Suggestion>) -> Suggestions {
        if suggestions.is_empty() {
            return Suggestions::empty();
        }
        let start = suggestions.iter().map(|s| s.range.start).min().unwrap_or(0);
        let end = suggestions.iter().map(|s| s.range.end).max().unwrap_or(0);
        let range = StringRange::new(start, end);

        let mut expanded: Vec<Suggestion> = suggestions
            .iter()
            .map(|s| s.expand(command, range))
            .collect();
        expanded.sort_by(Suggestion::compare_ignore_case);
        expanded.dedup_by(|a, b| a.text == b.text && a.range == b.range && a.tooltip == b.tooltip);
        Suggestions {
            range,
            suggestions: expanded,
        }
    }
}

/// Accumulates suggestions for the text after `start`.
#[derive(Debug, Clone)]
pub struct SuggestionsBuilder {
    input: String,
    start: usize,
    remaining: String,
    remaining_lower: String,
    result: Vec<Suggestion>,
}

impl SuggestionsBuilder {
    /// A builder completing `input` from byte offset `start`.
    pub fn new(input: impl Into<String>, start: usize) -> Self {
        let input = input.into();
        let start = start.min(input.len());
        let remaining = input.get(start..).unwrap_or("").to_string();
        let remaining_lower = remaining.to_lowercase();
        Self {
            input,
            start,
            remaining,
            remaining_lower,
            result: Vec::new(),
        }
    }

    /// The (possibly truncated) input being completed.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Offset completions replace from.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Text after `start`.
    pub fn remaining(&self) -> &str {
        &self.remaining
    }

    /// [`remaining`](Self::remaining), lowercased.
    pub fn remaining_lower_case(&self) -> &str {
        &self.remaining_lower
    }

    fn replacement_range(&self) -> StringRange {
        StringRange::new(self.start, self.input.len())
    }

    /// Suggest `text`, unless it equals what is already typed.
    pub fn suggest(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        if text != self.remaining {
            self.result.push(Suggestion::new(self.replacement_range(), text));
        }
        self
    }

    /// Suggest `text` with a tooltip.
    pub fn suggest_with_tooltip(
        &mut self,
        text: impl Into<String>,
        tooltip: impl Into<String>,
    ) -> &mut Self {
        let text = text.into();
        if text != self.remaining {
            self.result
                .push(Suggestion::new(self.replacement_range(), text).with_tooltip(tooltip));
        }
        self
    }

    /// Suggest a number; numeric suggestions sort by value among themselves.
    pub fn suggest_integer(&mut self, value: i32) -> &mut Self {
        let mut suggestion = Suggestion::new(self.replacement_range(), value.to_string());
        suggestion.integer = Some(value);
        self.result.push(suggestion);
        self
    }

    /// Take every suggestion collected by `other`.
    pub fn add(&mut self, other: SuggestionsBuilder) -> &mut Self {
        self.result.extend(other.result);
        self
    }

    /// A fresh builder over the same input starting at `start`.
    pub fn create_offset(&self, start: usize) -> SuggestionsBuilder {
        SuggestionsBuilder::new(self.input.clone(), start)
    }

    /// A fresh builder over the same input and start.
    pub fn restart(&self) -> SuggestionsBuilder {
        self.create_offset(self.start)
    }

    /// Finish.
    pub fn build(self) -> Suggestions {
        Suggestions::create(&self.input, self.result)
    }
}

/// Suggest each candidate whose lowercase form starts with the typed remainder.
pub fn suggest_matching<I, T>(candidates: I, mut builder: SuggestionsBuilder) -> Suggestions
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    for candidate in candidates {
        let candidate = candidate.as_ref();
        if candidate
            .to_lowercase()
            .starts_with(builder.remaining_lower_case())
        {
            builder.suggest(candidate);
        }
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(s: &Suggestions) -> Vec<&str> {
        s.list().iter().map(Suggestion::text).collect()
    }

    #[test]
    fn apply_replaces_range() {
        let s = Suggestion::new(StringRange::new(4, 5), "bar");
        assert_eq!(s.apply("foo b"), "foo bar");
        let whole = Suggestion::new(StringRange::new(0, 3), "xyz");
        assert_eq!(whole.apply("abc"), "xyz");
        let middle = Suggestion::new(StringRange::new(1, 2), "Z");
        assert_eq!(middle.apply("abc"), "aZc");
    }

    #[test]
    fn expand_copies_surrounding_text() {
        let s = Suggestion::new(StringRange::new(4, 5), "bar");
        let e = s.expand("foo b x", StringRange::new(0, 7));
        assert_eq!(e.text(), "foo bar x");
        assert_eq!(e.apply("foo b x"), s.apply("foo b x"));
    }

    #[test]
    fn merge_with_self_is_identity() {
        let mut b = SuggestionsBuilder::new("foo ", 4);
        b.suggest("bar").suggest("baz");
        let one = b.build();
        let merged = Suggestions::merge("foo ", vec![one.clone(), one.clone()]);
        assert_eq!(merged, one);
    }

    #[test]
    fn merge_disjoint_takes_union_and_enclosing_range() {
        let a = Suggestions::create("ab", vec![Suggestion::new(StringRange::new(1, 2), "zeta")]);
        let b = Suggestions::create("ab", vec![Suggestion::new(StringRange::new(0, 2), "Alpha")]);
        let merged = Suggestions::merge("ab", vec![a, b]);
        assert_eq!(merged.range(), StringRange::new(0, 2));
        assert_eq!(texts(&merged), vec!["Alpha", "azeta"]);
    }

    #[test]
    fn sorting_is_case_insensitive() {
        let mut b = SuggestionsBuilder::new("", 0);
        b.suggest("b").suggest("A").suggest("a").suggest("C");
        assert_eq!(texts(&b.build()), vec!["A", "a", "b", "C"]);
    }

    #[test]
    fn integers_sort_numerically() {
        let mut b = SuggestionsBuilder::new("", 0);
        b.suggest_integer(10).suggest_integer(9).suggest_integer(100);
        assert_eq!(texts(&b.build()), vec!["9", "10", "100"]);
    }

    #[test]
    fn suggest_skips_exact_remaining() {
        let mut b = SuggestionsBuilder::new("foo", 0);
        b.suggest("foo");
        assert!(b.build().is_empty());
    }

    #[test]
    fn matching_uses_lowercase_prefix() {
        let b = SuggestionsBuilder::new("give Ap", 5);
        let s = suggest_matching(["apple", "apricot", "banana"], b);
        assert_eq!(texts(&s), vec!["apple", "apricot"]);
        assert_eq!(s.range(), StringRange::new(5, 7));
    }

    #[test]
    fn tooltip_preserved_on_expand() {
        let mut b = SuggestionsBuilder::new("x", 1);
        b.suggest_with_tooltip("yz", "help");
        let s = b.build();
        assert_eq!(s.list()[0].tooltip(), Some("help"));
    }
}
