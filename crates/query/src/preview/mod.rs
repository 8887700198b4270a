//! Preview execution.
//!
//! A preview is a small synthetic result shaped by the query's selected
//! fields. [`QueryBackend`] is the execution seam; [`SyntheticBackend`] is
//! the stand-in implementation and [`PreviewSession`] sequences concurrent
//! requests so a stale response never replaces a newer one.

mod backend;
mod session;

pub use backend::{QueryBackend, SyntheticBackend};
pub use session::{PreviewOutcome, PreviewSession};

use chrono::{Days, NaiveDate};
use extract_core::config::PreviewConfig;
use extract_core::{Field, FieldType};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::model::QueryDefinition;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("preview backend failed: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResult {
    pub columns: Vec<PreviewColumn>,
    pub rows: Vec<Map<String, Value>>,
    pub total_rows: usize,
    /// Wall-clock milliseconds spent producing the result.
    pub execution_time: u64,
}

/// Selected fields projected to `{name, type}`, in selection order.
pub fn columns_for(query: &QueryDefinition) -> Vec<PreviewColumn> {
    query
        .selected_fields
        .iter()
        .map(|f| PreviewColumn {
            name: f.name.clone(),
            field_type: f.field_type.clone(),
        })
        .collect()
}

/// `row_count` rows keyed by field name. `row` is 1-based.
pub fn synthesize_rows(fields: &[Field], row_count: usize) -> Vec<Map<String, Value>> {
    (1..=row_count)
        .map(|row| {
            fields
                .iter()
                .map(|f| (f.name.clone(), sample_value(&f.field_type, row)))
                .collect()
        })
        .collect()
}

fn sample_value(field_type: &FieldType, row: usize) -> Value {
    match field_type {
        FieldType::String => Value::String(format!("Sample{row}")),
        FieldType::Date => NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|epoch| epoch.checked_add_days(Days::new(row as u64 - 1)))
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null),
        FieldType::Number => json!(row * 100),
        FieldType::Decimal => json!(row as f64 * 100.0 + 0.5),
        FieldType::Boolean | FieldType::Other(_) => Value::Null,
    }
}

/// Run a preview against a default [`SyntheticBackend`].
pub async fn preview(query: &QueryDefinition) -> Result<PreviewResult, PreviewError> {
    SyntheticBackend::new(PreviewConfig::default())
        .execute(query)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_values_follow_field_type() {
        assert_eq!(sample_value(&FieldType::String, 3), json!("Sample3"));
        assert_eq!(sample_value(&FieldType::Date, 1), json!("2024-01-01"));
        assert_eq!(sample_value(&FieldType::Date, 32), json!("2024-02-01"));
        assert_eq!(sample_value(&FieldType::Number, 2), json!(200));
        assert_eq!(sample_value(&FieldType::Decimal, 2), json!(200.5));
        assert_eq!(sample_value(&FieldType::Boolean, 1), Value::Null);
    }

    #[test]
    fn rows_are_keyed_by_field_name() {
        let fields = vec![
            Field::new("s1", "name", FieldType::String),
            Field::new("s1", "qty", FieldType::Number),
        ];
        let rows = synthesize_rows(&fields, 5);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[4]["name"], "Sample5");
        assert_eq!(rows[4]["qty"], 500);
        assert_eq!(rows[0].len(), 2);
    }

    #[test]
    fn numeric_series_is_increasing() {
        let fields = vec![Field::new("s1", "amount", FieldType::Decimal)];
        let values: Vec<f64> = synthesize_rows(&fields, 5)
            .iter()
            .map(|r| r["amount"].as_f64().unwrap())
            .collect();
        assert!(values.windows(2).all(|w| w[0] < w[1]));
    }
}
