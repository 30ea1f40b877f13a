//! Flattening of hierarchical documents into dotted configuration paths.

use tessera_primitives::{ConfigName, Node};
use tracing::warn;

/// Flattens `root` into `(path, node)` pairs, depth-first and pre-order.
///
/// Mapping keys are lower-cased and joined with `.`; every mapping entry yields
/// its own path before the paths of its children, and the node paired with a
/// path is the whole subtree below it. Sequences are leaves. A path outside
/// `[a-z0-9._]+` is skipped together with its subtree and logged.
///
/// # Examples
///
/// ```
/// use tessera_config::flatten;
/// use tessera_primitives::Node;
///
/// let root = Node::parse(r#"{"a": {"b": 1, "c": [1, 2]}}"#);
/// let paths: Vec<_> = flatten(&root).into_iter().map(|(path, _)| path).collect();
/// assert_eq!(paths, ["a", "a.b", "a.c"]);
/// ```
#[must_use]
pub fn flatten(root: &Node) -> Vec<(String, &Node)> {
    let mut out = Vec::new();
    if let Some(entries) = root.as_mapping() {
        for (key, child) in entries {
            collect(key.to_lowercase(), child, &mut out);
        }
    }
    out
}

fn collect<'a>(path: String, node: &'a Node, out: &mut Vec<(String, &'a Node)>) {
    if !ConfigName::is_valid(&path) {
        warn!(path = %path, node = %node, "skipping configuration path with invalid name");
        return;
    }

    let children = node.as_mapping().unwrap_or_default();
    out.push((path.clone(), node));
    for (key, child) in children {
        collect(format!("{path}.{}", key.to_lowercase()), child, out);
    }
}
