//! Advisory checks that never affect validity.

use extract_core::config::ValidationConfig;
use serde_json::json;

use super::{QueryValidation, ValidationCode, ValidationMessage};
use crate::model::QueryDefinition;

pub(super) fn check_performance(
    query: &QueryDefinition,
    config: &ValidationConfig,
    result: &mut QueryValidation,
) {
    let selected = query.selected_fields.len();
    if selected > config.max_selected_fields {
        result.push(
            ValidationMessage::warning(
                ValidationCode::PerformanceWarning,
                format!(
                    "Selecting {selected} fields may slow down the extract; \
                     consider keeping it to {} or fewer",
                    config.max_selected_fields
                ),
            )
            .with_context(json!({
                "selectedFields": selected,
                "limit": config.max_selected_fields,
            })),
        );
    }

    if config.warn_without_filters && query.filters.is_empty() {
        result.push(ValidationMessage::warning(
            ValidationCode::PerformanceWarning,
            "No filters defined; the query will read every row of its sources",
        ));
    }
}
