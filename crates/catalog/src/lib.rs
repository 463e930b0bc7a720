//! Metric catalogue organizer.
//!
//! Turns a flat list of metric-name strings into browsable groupings:
//! - a common-prefix trie (insert-friendly map form plus a render-friendly
//!   array form),
//! - prefix / suffix facet groups with long-tail consolidation,
//! - keyword-based category tags,
//! - a recording-rule vs. raw-metric split.
//!
//! Everything here is pure computation over an in-memory name list; fetching
//! names and rendering facets belong to the caller.

pub mod categories;
pub mod groups;
pub mod tokenizer;
pub mod trie;

pub use categories::{CategoryMatcher, CategoryRegistry};
pub use groups::{
    category_groups, prefix_groups, rules_split, sub_prefix_groups, suffix_groups, GroupSummary,
    MetricEntry,
};
pub use tokenizer::{tokenize, Token, TokenKind};
pub use trie::{build_trie, flatten, flatten_sorted_by, ArrayNode, TrieNode};
