//! Reference integrity: unique aliases, no fields pointing at unknown sources.

use std::collections::HashSet;

use extract_core::Field;
use serde_json::json;

use super::{QueryValidation, ValidationCode, ValidationMessage};
use crate::model::QueryDefinition;

pub(super) fn check_duplicate_aliases(query: &QueryDefinition, result: &mut QueryValidation) {
    let mut seen = HashSet::new();
    for (i, source) in query.sources.iter().enumerate() {
        if !seen.insert(source.alias.as_str()) {
            result.push(
                ValidationMessage::error(
                    ValidationCode::DuplicateAlias,
                    format!("Source alias '{}' is used more than once", source.alias),
                )
                .with_source(source.alias.clone())
                .with_context(json!({ "index": i })),
            );
        }
    }
}

/// Warn about every field whose alias is absent from `sources`.
/// Skipped when there are no sources at all, which is already an error.
pub(super) fn check_unknown_sources(query: &QueryDefinition, result: &mut QueryValidation) {
    if query.sources.is_empty() {
        return;
    }
    let aliases: HashSet<&str> = query.source_aliases().collect();

    for (path, field) in referenced_fields(query) {
        if aliases.contains(field.source.as_str()) {
            continue;
        }
        result.push(
            ValidationMessage::warning(
                ValidationCode::UnknownSource,
                format!(
                    "Field '{}' at {path} refers to source '{}', which is not part of the query",
                    field.name, field.source
                ),
            )
            .with_field(field.name.clone())
            .with_source(field.source.clone())
            .with_context(json!({ "path": path })),
        );
    }
}

/// Every field reference in the definition with a JSON-path-like location.
fn referenced_fields(query: &QueryDefinition) -> Vec<(String, &Field)> {
    let mut refs = Vec::new();
    for (i, f) in query.selected_fields.iter().enumerate() {
        refs.push((format!("selectedFields[{i}]"), f));
    }
    for (i, j) in query.joins.iter().enumerate() {
        refs.push((format!("joins[{i}].leftField"), &j.left_field));
        refs.push((format!("joins[{i}].rightField"), &j.right_field));
    }
    for (i, f) in query.filters.iter().enumerate() {
        refs.push((format!("filters[{i}].field"), &f.field));
    }
    for (i, f) in query.group_by.iter().enumerate() {
        refs.push((format!("groupBy[{i}]"), f));
    }
    for (i, f) in query.having.iter().enumerate() {
        refs.push((format!("having[{i}].field"), &f.field));
    }
    for (i, s) in query.order_by.iter().enumerate() {
        refs.push((format!("orderBy[{i}].field"), &s.field));
    }
    for (i, a) in query.aggregates.iter().enumerate() {
        refs.push((format!("aggregates[{i}].field"), &a.field));
    }
    refs
}
