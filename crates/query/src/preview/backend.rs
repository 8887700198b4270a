use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use extract_core::config::PreviewConfig;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use super::{columns_for, synthesize_rows, PreviewError, PreviewResult};
use crate::model::QueryDefinition;

/// Executes a query definition for preview purposes.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    async fn execute(&self, query: &QueryDefinition) -> Result<PreviewResult, PreviewError>;
}

/// Stand-in backend that fabricates rows from the selected fields.
///
/// Filters, joins and aggregates are ignored. A fixture registered under a
/// query id is returned verbatim instead of synthesized rows.
pub struct SyntheticBackend {
    config: PreviewConfig,
    fixtures: RwLock<HashMap<String, PreviewResult>>,
    /// One-shot simulated failure for the next execution.
    failure: Mutex<Option<String>>,
}

impl SyntheticBackend {
    pub fn new(config: PreviewConfig) -> Self {
        Self {
            config,
            fixtures: RwLock::new(HashMap::new()),
            failure: Mutex::new(None),
        }
    }

    pub async fn register_fixture(&self, query_id: impl Into<String>, result: PreviewResult) {
        let mut fixtures = self.fixtures.write().await;
        fixtures.insert(query_id.into(), result);
    }

    pub async fn remove_fixture(&self, query_id: &str) -> bool {
        let mut fixtures = self.fixtures.write().await;
        fixtures.remove(query_id).is_some()
    }

    /// Make the next execution fail with `reason`.
    pub async fn fail_next(&self, reason: impl Into<String>) {
        let mut failure = self.failure.lock().await;
        *failure = Some(reason.into());
    }
}

#[async_trait]
impl QueryBackend for SyntheticBackend {
    async fn execute(&self, query: &QueryDefinition) -> Result<PreviewResult, PreviewError> {
        let started = Instant::now();
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }

        if let Some(reason) = self.failure.lock().await.take() {
            warn!(query_id = %query.id, %reason, "simulated preview failure");
            return Err(PreviewError::Backend(reason));
        }

        if let Some(fixture) = self.fixtures.read().await.get(&query.id) {
            debug!(query_id = %query.id, "returning preview fixture");
            return Ok(fixture.clone());
        }

        let rows = synthesize_rows(&query.selected_fields, self.config.row_count);
        let result = PreviewResult {
            columns: columns_for(query),
            total_rows: rows.len(),
            rows,
            execution_time: started.elapsed().as_millis() as u64,
        };
        debug!(
            query_id = %query.id,
            columns = result.columns.len(),
            rows = result.total_rows,
            elapsed_ms = result.execution_time,
            "preview synthesized"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extract_core::{Field, FieldType};
    use serde_json::Map;

    fn instant_backend() -> SyntheticBackend {
        SyntheticBackend::new(PreviewConfig {
            row_count: 5,
            latency_ms: 0,
        })
    }

    fn query() -> QueryDefinition {
        QueryDefinition::new("preview")
            .add_source("crm", Some("customers".into()))
            .add_field(Field::new("s1", "name", FieldType::String))
            .add_field(Field::new("s1", "joined", FieldType::Date))
            .add_field(Field::new("s1", "balance", FieldType::Decimal))
    }

    #[tokio::test]
    async fn columns_mirror_selected_fields() {
        let q = query();
        let result = instant_backend().execute(&q).await.unwrap();

        let expected: Vec<(String, FieldType)> = q
            .selected_fields
            .iter()
            .map(|f| (f.name.clone(), f.field_type.clone()))
            .collect();
        let actual: Vec<(String, FieldType)> = result
            .columns
            .iter()
            .map(|c| (c.name.clone(), c.field_type.clone()))
            .collect();
        assert_eq!(actual, expected);
        assert_eq!(result.rows.len(), 5);
        assert_eq!(result.total_rows, 5);
        assert_eq!(result.rows[1]["joined"], "2024-01-02");
    }

    #[tokio::test]
    async fn fixture_is_returned_verbatim() {
        let backend = instant_backend();
        let q = query();
        let mut row = Map::new();
        row.insert("name".into(), "Ada".into());
        let canned = PreviewResult {
            columns: Vec::new(),
            rows: vec![row],
            total_rows: 1200,
            execution_time: 42,
        };
        backend.register_fixture(q.id.clone(), canned.clone()).await;
        assert_eq!(backend.execute(&q).await.unwrap(), canned);

        assert!(backend.remove_fixture(&q.id).await);
        assert_eq!(backend.execute(&q).await.unwrap().total_rows, 5);
    }

    #[tokio::test]
    async fn simulated_failure_is_one_shot() {
        let backend = instant_backend();
        backend.fail_next("warehouse unavailable").await;

        let err = backend.execute(&query()).await.unwrap_err();
        assert!(err.to_string().contains("warehouse unavailable"));
        assert!(backend.execute(&query()).await.is_ok());
    }

    #[tokio::test]
    async fn query_without_fields_yields_empty_rows() {
        let q = QueryDefinition::new("empty");
        let result = instant_backend().execute(&q).await.unwrap();
        assert!(result.columns.is_empty());
        assert_eq!(result.rows.len(), 5);
        assert!(result.rows.iter().all(|r| r.is_empty()));
    }
}
