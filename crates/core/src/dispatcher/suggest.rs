use tracing::trace;

use crate::suggestion::{Suggestions, SuggestionsBuilder};

use super::{CommandDispatcher, ParseResults};

impl<S: Clone + 'static> CommandDispatcher<S> {
    /// Completions for the end of the parsed input.
    pub fn get_completion_suggestions(&self, parse: &ParseResults<S>) -> Suggestions {
        let cursor = parse.reader().total_length();
        self.get_completion_suggestions_at(parse, cursor)
    }

    /// Completions for the text ending at byte offset `cursor`.
    ///
    /// Every usable child of the node before the cursor contributes; a child
    /// whose provider fails contributes nothing. Offsets past the end or
    /// inside a UTF-8 sequence are moved back to the previous boundary.
    pub fn get_completion_suggestions_at(
        &self,
        parse: &ParseResults<S>,
        cursor: usize,
    ) -> Suggestions {
        let full_input = parse.reader().string();
        let mut cursor = cursor.min(full_input.len());
        while !full_input.is_char_boundary(cursor) {
            cursor -= 1;
        }

        let context = parse.context();
        let Some(found) = context.find_suggestion_context(cursor) else {
            return Suggestions::empty();
        };
        let start = found.start_pos.min(cursor);
        let truncated = &full_input[..cursor];
        let built = context.build(truncated);

        let mut collected = Vec::new();
        for &child_id in self.tree[found.parent].children() {
            let child = &self.tree[child_id];
            if !child.can_use(context.source()) {
                continue;
            }
            let builder = SuggestionsBuilder::new(truncated, start);
            match child.list_suggestions(&built, builder) {
                Ok(suggestions) => collected.push(suggestions),
                Err(err) => {
                    trace!(node = child.name(), error = %err, "suggestion provider failed");
                }
            }
        }
        Suggestions::merge(full_input, collected)
    }
}
