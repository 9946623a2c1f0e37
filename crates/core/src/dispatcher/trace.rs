//! Serializable snapshot of a parse, for tooling and debugging dumps.

use serde::Serialize;

use cmdgrammar_diagnostics::Diagnostic;

use crate::context::{CommandContextBuilder, StringRange};
use crate::tree::NodeKind;

use super::{CommandDispatcher, ParseResults};

/// What a parse matched and where it stopped.
#[derive(Debug, Clone, Serialize)]
pub struct ParseTrace {
    /// The full input.
    pub input: String,
    /// One entry per context hop; a redirect starts a new hop.
    pub hops: Vec<TraceHop>,
    /// Input left unconsumed.
    pub remaining: String,
    /// Whether the input names an executable command.
    pub complete: bool,
    /// Why each child tried at the stopping point was rejected.
    pub errors: Vec<TraceError>,
}

/// Nodes matched under one root.
#[derive(Debug, Clone, Serialize)]
pub struct TraceHop {
    /// Path of the node this hop started from; empty for the tree root.
    pub root: Vec<String>,
    /// Range of input covered by this hop.
    pub range: StringRange,
    /// Matched nodes in order.
    pub nodes: Vec<TraceNode>,
    /// Whether the hop ends on an executable node.
    pub executable: bool,
}

/// One matched node.
#[derive(Debug, Clone, Serialize)]
pub struct TraceNode {
    /// Literal text or argument name.
    pub name: String,
    /// `"literal"` or `"argument"`.
    pub kind: &'static str,
    /// Consumed range.
    pub range: StringRange,
    /// The consumed text; empty for a default value.
    pub text: String,
}

/// A rejected child.
#[derive(Debug, Clone, Serialize)]
pub struct TraceError {
    /// Path of the rejected node.
    pub node: Vec<String>,
    /// The rejection as a boundary diagnostic.
    pub diagnostic: Diagnostic,
}

impl<S> ParseResults<S> {
    /// Describe this parse in terms of `dispatcher`'s node names.
    pub fn trace(&self, dispatcher: &CommandDispatcher<S>) -> ParseTrace {
        let input = self.reader.string();
        let mut hops = Vec::new();
        let mut current: Option<&CommandContextBuilder<S>> = Some(&self.context);
        while let Some(builder) = current {
            let nodes = builder
                .nodes()
                .iter()
                .map(|parsed| {
                    let node = dispatcher.node(parsed.node());
                    let kind = match node.kind() {
                        NodeKind::Argument(_) => "argument",
                        _ => "literal",
                    };
                    TraceNode {
                        name: node.name().to_string(),
                        kind,
                        range: parsed.range(),
                        text: parsed.range().get(input).to_string(),
                    }
                })
                .collect();
            hops.push(TraceHop {
                root: dispatcher.get_path(builder.root_node()),
                range: builder.range(),
                nodes,
                executable: builder.command().is_some(),
            });
            current = builder.child();
        }

        let errors = self
            .exceptions
            .iter()
            .map(|(node, err)| TraceError {
                node: dispatcher.get_path(*node),
                diagnostic: err.to_diagnostic(),
            })
            .collect();

        ParseTrace {
            input: input.to_string(),
            hops,
            remaining: self.reader.remaining().to_string(),
            complete: self.is_complete(),
            errors,
        }
    }
}

/// Serialize a trace (or any serializable value) as indented JSON.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}
