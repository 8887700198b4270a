//! Filter checks: operator allowed for the filtered field's type.

use extract_core::FieldType;
use serde_json::json;

use super::{QueryValidation, ValidationCode, ValidationMessage};
use crate::model::{FilterOperator, QueryDefinition};

const STRING_OPERATORS: &[FilterOperator] = &[
    FilterOperator::Equals,
    FilterOperator::NotEquals,
    FilterOperator::Contains,
    FilterOperator::In,
];

const ORDERED_OPERATORS: &[FilterOperator] = &[
    FilterOperator::Equals,
    FilterOperator::NotEquals,
    FilterOperator::GreaterThan,
    FilterOperator::LessThan,
    FilterOperator::Between,
];

const BOOLEAN_OPERATORS: &[FilterOperator] = &[FilterOperator::Equals, FilterOperator::NotEquals];

/// Operators allowed for a field type. `None` means the type is not
/// checked.
pub fn allowed_operators(field_type: &FieldType) -> Option<&'static [FilterOperator]> {
    match field_type {
        FieldType::String => Some(STRING_OPERATORS),
        FieldType::Number | FieldType::Decimal | FieldType::Date => Some(ORDERED_OPERATORS),
        FieldType::Boolean => Some(BOOLEAN_OPERATORS),
        FieldType::Other(_) => None,
    }
}

pub(super) fn check_operators(query: &QueryDefinition, result: &mut QueryValidation) {
    for (i, filter) in query.filters.iter().enumerate() {
        let field = &filter.field;
        let Some(allowed) = allowed_operators(&field.field_type) else {
            continue;
        };
        if allowed.contains(&filter.operator) {
            continue;
        }

        let allowed_names: Vec<&str> = allowed.iter().map(FilterOperator::as_str).collect();
        result.push(
            ValidationMessage::error(
                ValidationCode::InvalidOperator,
                format!(
                    "Operator '{}' is not valid for {} field '{}' (allowed: {})",
                    filter.operator,
                    field.field_type,
                    field.qualified_name(),
                    allowed_names.join(", ")
                ),
            )
            .with_field(field.name.clone())
            .with_source(field.source.clone())
            .with_context(json!({
                "filter": i,
                "operator": filter.operator,
                "fieldType": field.field_type,
                "allowed": allowed_names,
            })),
        );
    }
}
