//! Structural checks: sources present, fields selected, sources joined.

use std::collections::HashMap;

use serde_json::json;

use super::{QueryValidation, ValidationCode, ValidationMessage};
use crate::model::QueryDefinition;

pub(super) fn check_sources(query: &QueryDefinition, result: &mut QueryValidation) {
    if query.sources.is_empty() {
        result.push(ValidationMessage::error(
            ValidationCode::NoSources,
            "Query must include at least one data source",
        ));
    }
}

pub(super) fn check_fields(query: &QueryDefinition, result: &mut QueryValidation) {
    if query.selected_fields.is_empty() {
        result.push(ValidationMessage::error(
            ValidationCode::NoFields,
            "Query must select at least one field",
        ));
    }
}

/// Multi-source queries need `sources - 1` joins, and those joins must
/// actually connect every source.
pub(super) fn check_join_coverage(query: &QueryDefinition, result: &mut QueryValidation) {
    let sources = query.sources.len();
    if sources < 2 {
        return;
    }

    let required = sources - 1;
    let joins = query.joins.len();
    if joins < required {
        result.push(
            ValidationMessage::error(
                ValidationCode::MissingJoins,
                format!(
                    "Query uses {sources} sources but defines {joins} join(s); \
                     at least {required} join(s) are required"
                ),
            )
            .with_context(json!({
                "sources": sources,
                "joins": joins,
                "required": required,
            })),
        );
        return;
    }

    let disconnected = disconnected_aliases(query);
    if !disconnected.is_empty() {
        result.push(
            ValidationMessage::error(
                ValidationCode::MissingJoins,
                format!(
                    "Source(s) {} are not joined to the rest of the query",
                    disconnected.join(", ")
                ),
            )
            .with_source(disconnected[0].clone())
            .with_context(json!({
                "sources": sources,
                "joins": joins,
                "disconnected": disconnected,
            })),
        );
    }
}

/// Aliases outside the component of the first source, in source order.
fn disconnected_aliases(query: &QueryDefinition) -> Vec<String> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    for (i, alias) in query.source_aliases().enumerate() {
        index.entry(alias).or_insert(i);
    }

    let mut sets = DisjointSet::new(query.sources.len());
    for join in &query.joins {
        let left = index.get(join.left_field.source.as_str());
        let right = index.get(join.right_field.source.as_str());
        if let (Some(&l), Some(&r)) = (left, right) {
            sets.union(l, r);
        }
    }

    let root = sets.find(0);
    query
        .sources
        .iter()
        .enumerate()
        .filter(|(i, _)| sets.find(*i) != root)
        .map(|(_, s)| s.alias.clone())
        .collect()
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}
