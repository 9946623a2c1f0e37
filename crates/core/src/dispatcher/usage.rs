use crate::reader::ARGUMENT_SEPARATOR;
use crate::tree::NodeId;

use super::CommandDispatcher;

const USAGE_OPTIONAL_OPEN: &str = "[";
const USAGE_OPTIONAL_CLOSE: &str = "]";
const USAGE_REQUIRED_OPEN: &str = "(";
const USAGE_REQUIRED_CLOSE: &str = ")";
const USAGE_OR: &str = "|";

impl<S> CommandDispatcher<S> {
    /// Every executable path below `node`, one line each, relative to `node`.
    ///
    /// A redirect ends its line with `...` (back to the root) or `-> target`.
    /// With `restricted`, subtrees `source` may not use are left out.
    pub fn get_all_usage(&self, node: NodeId, source: &S, restricted: bool) -> Vec<String> {
        let mut result = Vec::new();
        self.collect_all_usage(node, source, &mut result, String::new(), restricted);
        result
    }

    fn collect_all_usage(
        &self,
        node: NodeId,
        source: &S,
        result: &mut Vec<String>,
        prefix: String,
        restricted: bool,
    ) {
        let current = &self.tree[node];
        if restricted && !current.can_use(source) {
            return;
        }
        if current.command().is_some() {
            result.push(prefix.clone());
        }
        if let Some(target) = current.redirect() {
            let redirect = self.redirect_usage(target);
            if prefix.is_empty() {
                result.push(format!(
                    "{}{ARGUMENT_SEPARATOR}{redirect}",
                    current.usage_text()
                ));
            } else {
                result.push(format!("{prefix}{ARGUMENT_SEPARATOR}{redirect}"));
            }
            return;
        }
        for &child_id in current.children() {
            let child_usage = self.tree[child_id].usage_text();
            let next = if prefix.is_empty() {
                child_usage
            } else {
                format!("{prefix}{ARGUMENT_SEPARATOR}{child_usage}")
            };
            self.collect_all_usage(child_id, source, result, next, restricted);
        }
    }

    /// One condensed usage line per child of `node` that `source` may use,
    /// in child order.
    ///
    /// `[x]` marks a part that may be left off because the node before it is
    /// executable, `(x)` a required choice, and `a|b` alternatives.
    pub fn get_smart_usage(&self, node: NodeId, source: &S) -> Vec<(NodeId, String)> {
        let current = &self.tree[node];
        let optional = current.command().is_some();
        current
            .children()
            .iter()
            .filter_map(|&child| {
                self.smart_usage(child, source, optional, false)
                    .map(|usage| (child, usage))
            })
            .collect()
    }

    fn smart_usage(&self, node: NodeId, source: &S, optional: bool, deep: bool) -> Option<String> {
        let current = &self.tree[node];
        if !current.can_use(source) {
            return None;
        }
        let this = if optional {
            format!(
                "{USAGE_OPTIONAL_OPEN}{}{USAGE_OPTIONAL_CLOSE}",
                current.usage_text()
            )
        } else {
            current.usage_text()
        };
        if deep {
            return Some(this);
        }

        if let Some(target) = current.redirect() {
            let redirect = self.redirect_usage(target);
            return Some(format!("{this}{ARGUMENT_SEPARATOR}{redirect}"));
        }

        let child_optional = current.command().is_some();
        let (open, close) = if child_optional {
            (USAGE_OPTIONAL_OPEN, USAGE_OPTIONAL_CLOSE)
        } else {
            (USAGE_REQUIRED_OPEN, USAGE_REQUIRED_CLOSE)
        };
        let children: Vec<NodeId> = current
            .children()
            .iter()
            .copied()
            .filter(|&child| self.tree[child].can_use(source))
            .collect();

        match children.as_slice() {
            [] => {}
            [only] => {
                if let Some(usage) = self.smart_usage(*only, source, child_optional, child_optional)
                {
                    return Some(format!("{this}{ARGUMENT_SEPARATOR}{usage}"));
                }
            }
            many => {
                let mut distinct: Vec<String> = Vec::new();
                for &child in many {
                    if let Some(usage) = self.smart_usage(child, source, child_optional, true)
                        && !distinct.contains(&usage)
                    {
                        distinct.push(usage);
                    }
                }
                match distinct.as_slice() {
                    [] => {}
                    [usage] => {
                        let usage = if child_optional {
                            format!("{USAGE_OPTIONAL_OPEN}{usage}{USAGE_OPTIONAL_CLOSE}")
                        } else {
                            usage.clone()
                        };
                        return Some(format!("{this}{ARGUMENT_SEPARATOR}{usage}"));
                    }
                    _ => {
                        let alternatives = many
                            .iter()
                            .map(|&child| self.tree[child].usage_text())
                            .collect::<Vec<_>>()
                            .join(USAGE_OR);
                        return Some(format!(
                            "{this}{ARGUMENT_SEPARATOR}{open}{alternatives}{close}"
                        ));
                    }
                }
            }
        }
        Some(this)
    }

    fn redirect_usage(&self, target: NodeId) -> String {
        if target == NodeId::ROOT {
            "...".to_string()
        } else {
            format!("-> {}", self.tree[target].usage_text())
        }
    }
}
