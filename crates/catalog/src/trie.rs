use std::cmp::Ordering;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tokenizer::{tokenize, TokenKind};

/// A node in the metric-name prefix trie.
///
/// Only part tokens become nodes; the separators leading up to a part are
/// folded into `path`. `path` is the concatenation of every ancestor part
/// and the separators between them — it excludes the node's own `part`, so
/// `path + part` is the full prefix this node represents. `count` is the
/// number of input names whose part sequence passes through the node
/// (duplicates count twice: the trie stores frequency, not a set).
#[derive(Debug, Clone, Default)]
pub struct TrieNode {
    pub part: String,
    pub path: String,
    pub count: usize,
    pub children: IndexMap<String, TrieNode>,
}

/// Fold a name list into a prefix trie. Root has empty `part`/`path` and
/// `count == names.len()`. O(total tokens) over the whole list; rebuilt
/// wholesale when the name list changes.
pub fn build_trie<S: AsRef<str>>(names: &[S]) -> TrieNode {
    let mut root = TrieNode {
        count: names.len(),
        ..TrieNode::default()
    };
    for name in names {
        insert(&mut root, name.as_ref());
    }
    debug!(names = names.len(), "built metric name trie");
    root
}

fn insert(root: &mut TrieNode, name: &str) {
    let mut node = root;
    let mut path = String::new();
    for token in tokenize(name) {
        match token.kind {
            TokenKind::Separator => path.push_str(&token.text),
            TokenKind::Part => {
                let text = token.text;
                node = node
                    .children
                    .entry(text.clone())
                    .or_insert_with(|| TrieNode {
                        part: text.clone(),
                        path: path.clone(),
                        ..TrieNode::default()
                    });
                node.count += 1;
                path.push_str(&text);
            }
        }
    }
}

/// Array-based rendering of the trie: same shape, children as lists.
/// Built on demand from [`TrieNode`] so there is a single tree-walking
/// implementation; this form serializes cleanly for UI consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayNode {
    pub part: String,
    pub path: String,
    pub count: usize,
    pub children: Vec<ArrayNode>,
}

/// Convert the map-based trie into its array form, children in insertion
/// order.
pub fn flatten(node: &TrieNode) -> ArrayNode {
    ArrayNode {
        part: node.part.clone(),
        path: node.path.clone(),
        count: node.count,
        children: node.children.values().map(flatten).collect(),
    }
}

/// Convert to the array form with children ordered by a caller-supplied
/// comparator at every level.
pub fn flatten_sorted_by<F>(node: &TrieNode, cmp: &F) -> ArrayNode
where
    F: Fn(&ArrayNode, &ArrayNode) -> Ordering,
{
    let mut children: Vec<ArrayNode> = node
        .children
        .values()
        .map(|child| flatten_sorted_by(child, cmp))
        .collect();
    children.sort_by(|a, b| cmp(a, b));
    ArrayNode {
        part: node.part.clone(),
        path: node.path.clone(),
        count: node.count,
        children,
    }
}
