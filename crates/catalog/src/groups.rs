use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::categories::CategoryRegistry;
use crate::tokenizer::is_separator;

/// Display label of the suffix catch-all bucket.
pub const CATCH_ALL_LABEL: &str = "<none>";

/// Match-expression fragment selecting names without a colon.
pub const NON_RULES_VALUE: &str = "^(?!.*:.*)";
pub const NON_RULES_LABEL: &str = "Non-rules metrics";

/// Match-expression fragment selecting recording rules (colon present).
pub const RULES_VALUE: &str = ":";
pub const RULES_LABEL: &str = "Recording rules";

/// A metric name as handed to the grouping heuristics: `value` is the name
/// itself, `label` is carried through for display (identical at this stage).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricEntry {
    pub label: String,
    pub value: String,
}

impl MetricEntry {
    pub fn new(name: impl Into<String>) -> Self {
        let value = name.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

/// Common output shape of every grouping heuristic. `value` is a machine
/// key (may double as a filter expression), `label` is for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub value: String,
    pub label: String,
    pub count: usize,
}

/// Text before the first separator run, or the whole name if it has none.
fn first_segment(name: &str) -> &str {
    name.split(is_separator).next().unwrap_or(name)
}

/// First non-empty piece after the first separator run.
fn second_segment(name: &str) -> Option<&str> {
    let mut pieces = name.split(is_separator);
    pieces.next()?;
    pieces.find(|p| !p.is_empty())
}

/// Count desc, ties broken case-insensitively on the group key. A final
/// case-sensitive pass keeps the order total when two keys differ only in
/// case (the counts come out of a HashMap, so nothing earlier is stable).
fn sort_by_count_then_key(groups: &mut [GroupSummary]) {
    groups.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.value.to_lowercase().cmp(&b.value.to_lowercase()))
            .then_with(|| a.value.cmp(&b.value))
    });
}

/// Group names by their first segment. The groups partition the input:
/// counts sum to `entries.len()`.
pub fn prefix_groups(entries: &[MetricEntry]) -> Vec<GroupSummary> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for entry in entries {
        *counts.entry(first_segment(&entry.value)).or_default() += 1;
    }
    let mut groups: Vec<GroupSummary> = counts
        .into_iter()
        .map(|(key, count)| GroupSummary {
            value: key.to_string(),
            label: key.to_string(),
            count,
        })
        .collect();
    sort_by_count_then_key(&mut groups);
    groups
}

/// Second-level prefix groups beneath a previously chosen top-level prefix.
///
/// Only names whose first segment equals `parent_prefix` and which have a
/// second segment contribute. The output `value` is the compound
/// `"{parent}:{sub}"` key so that identical sub-segments under different
/// parents stay distinct; `label` is the bare sub-segment.
pub fn sub_prefix_groups(entries: &[MetricEntry], parent_prefix: &str) -> Vec<GroupSummary> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for entry in entries {
        if first_segment(&entry.value) != parent_prefix {
            continue;
        }
        if let Some(sub) = second_segment(&entry.value) {
            *counts.entry(sub).or_default() += 1;
        }
    }
    let mut groups: Vec<GroupSummary> = counts
        .into_iter()
        .map(|(sub, count)| GroupSummary {
            value: format!("{}:{}", parent_prefix, sub),
            label: sub.to_string(),
            count,
        })
        .collect();
    groups.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.label.to_lowercase().cmp(&b.label.to_lowercase()))
            .then_with(|| a.label.cmp(&b.label))
    });
    groups
}

/// Group names by their last segment (split on any non-alphanumeric run).
///
/// Unsplittable names and suffixes owning exactly one name fold into a
/// catch-all group whose `value` is the `|`-joined member list (usable as
/// an alternation filter) and whose label is [`CATCH_ALL_LABEL`]. The
/// groups partition the input. Count desc, stable within ties.
pub fn suffix_groups(entries: &[MetricEntry]) -> Vec<GroupSummary> {
    // IndexMap keeps first-seen suffix order so the final sort is stable
    // with respect to the input.
    let mut members: IndexMap<&str, Vec<&str>> = IndexMap::new();
    let mut catch_all: Vec<&str> = Vec::new();

    for entry in entries {
        let segments: Vec<&str> = entry
            .value
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| !s.is_empty())
            .collect();
        match segments.last() {
            Some(&last) if segments.len() > 1 => {
                members.entry(last).or_default().push(&entry.value);
            }
            // Single-segment or empty names are unsplittable.
            _ => catch_all.push(&entry.value),
        }
    }

    let mut groups = Vec::new();
    for (suffix, names) in members {
        if names.len() == 1 {
            // Long-tail consolidation: singleton suffixes join the catch-all.
            catch_all.push(names[0]);
        } else {
            groups.push(GroupSummary {
                value: suffix.to_string(),
                label: suffix.to_string(),
                count: names.len(),
            });
        }
    }
    if !catch_all.is_empty() {
        groups.push(GroupSummary {
            value: catch_all.join("|"),
            label: CATCH_ALL_LABEL.to_string(),
            count: catch_all.len(),
        });
    }
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups
}

/// Partition names into exactly two fixed groups: raw metrics (no colon)
/// and recording rules (colon present). Both groups are always returned,
/// even with a zero count; the `value` keys are match-expression fragments.
pub fn rules_split(entries: &[MetricEntry]) -> Vec<GroupSummary> {
    let rules = entries.iter().filter(|e| e.value.contains(':')).count();
    vec![
        GroupSummary {
            value: NON_RULES_VALUE.to_string(),
            label: NON_RULES_LABEL.to_string(),
            count: entries.len() - rules,
        },
        GroupSummary {
            value: RULES_VALUE.to_string(),
            label: RULES_LABEL.to_string(),
            count: rules,
        },
    ]
}

/// Tag names against every matcher of the registry. Categories are not
/// exclusive: one name may increment several counts. Output covers every
/// category with at least one hit, count desc; ties keep registry order
/// (the stable sort walks matchers in registry order).
pub fn category_groups(entries: &[MetricEntry], registry: &CategoryRegistry) -> Vec<GroupSummary> {
    let mut groups: Vec<GroupSummary> = registry
        .matchers()
        .iter()
        .filter_map(|matcher| {
            let count = entries
                .iter()
                .filter(|e| matcher.is_match(&e.value))
                .count();
            (count > 0).then(|| GroupSummary {
                value: matcher.id().to_string(),
                label: matcher.label().to_string(),
                count,
            })
        })
        .collect();
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups
}
