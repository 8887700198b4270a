//! Join checks: both sides selected, distinct sources, compatible types.

use extract_core::{Field, FieldType};
use serde_json::json;

use super::fuzzy::fuzzy_match;
use super::{QueryValidation, ValidationCode, ValidationMessage};
use crate::model::QueryDefinition;

/// Equal types join; so do any two numeric types.
pub fn types_compatible(left: &FieldType, right: &FieldType) -> bool {
    left == right || (left.is_numeric() && right.is_numeric())
}

/// `INVALID_JOIN` for every join before any type check runs, so the
/// messages keep rule order across several joins.
pub(super) fn check_join_references(query: &QueryDefinition, result: &mut QueryValidation) {
    for (i, join) in query.joins.iter().enumerate() {
        if query.find_selected(&join.left_field).is_none() {
            result.push(unresolved(query, i, "left", &join.left_field));
        }
        if query.find_selected(&join.right_field).is_none() {
            result.push(unresolved(query, i, "right", &join.right_field));
        }

        if join.left_field.source == join.right_field.source {
            result.push(
                ValidationMessage::error(
                    ValidationCode::InvalidJoin,
                    format!(
                        "Join {} connects '{}' and '{}' within the same source",
                        i + 1,
                        join.left_field.qualified_name(),
                        join.right_field.qualified_name()
                    ),
                )
                .with_source(join.left_field.source.clone())
                .with_context(json!({ "join": i })),
            );
        }
    }
}

/// Type check for joins whose both sides resolve to selected fields.
pub(super) fn check_join_types(query: &QueryDefinition, result: &mut QueryValidation) {
    for (i, join) in query.joins.iter().enumerate() {
        let (Some(l), Some(r)) = (
            query.find_selected(&join.left_field),
            query.find_selected(&join.right_field),
        ) else {
            continue;
        };
        if types_compatible(&l.field_type, &r.field_type) {
            continue;
        }

        result.push(
            ValidationMessage::error(
                ValidationCode::IncompatibleTypes,
                format!(
                    "Cannot join '{}' ({}) with '{}' ({}): incompatible types",
                    l.qualified_name(),
                    l.field_type,
                    r.qualified_name(),
                    r.field_type
                ),
            )
            .with_field(l.name.clone())
            .with_source(l.source.clone())
            .with_context(json!({
                "join": i,
                "leftField": l.name,
                "leftType": l.field_type,
                "rightField": r.name,
                "rightType": r.field_type,
            })),
        );
    }
}

fn unresolved(query: &QueryDefinition, join: usize, side: &str, field: &Field) -> ValidationMessage {
    let candidates: Vec<&str> = query
        .selected_fields
        .iter()
        .filter(|f| f.source == field.source)
        .map(|f| f.name.as_str())
        .collect();

    let mut context = json!({ "join": join, "side": side });
    if let Some(s) = fuzzy_match(&field.name, &candidates) {
        context["suggestion"] = json!(format!("Did you mean '{}.{s}'?", field.source));
    }

    ValidationMessage::error(
        ValidationCode::InvalidJoin,
        format!(
            "Join {} {side} field '{}' is not among the selected fields",
            join + 1,
            field.qualified_name()
        ),
    )
    .with_field(field.name.clone())
    .with_source(field.source.clone())
    .with_context(context)
}
