//! In-memory store of saved query definitions.
//!
//! Queries live in an `Arc<RwLock<IndexMap<_, _>>>` keyed by id, so
//! listing preserves insertion order. Nothing is persisted to disk.

use std::sync::Arc;

use chrono::Utc;
use extract_core::config::StoreConfig;
use indexmap::IndexMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::model::QueryDefinition;
use crate::validation::{QueryValidation, Validator};

#[derive(Debug, Error)]
pub enum QueryStoreError {
    #[error("query not found: {0}")]
    NotFound(String),
    #[error("query '{id}' failed validation: {}", .errors.join("; "))]
    Invalid { id: String, errors: Vec<String> },
}

/// Whether the store re-checks validity on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorePolicy {
    /// Store anything; callers gate writes on validation. Invalid writes
    /// are logged.
    #[default]
    Trust,
    /// Reject definitions with validation errors.
    Enforce,
}

impl From<&StoreConfig> for StorePolicy {
    fn from(config: &StoreConfig) -> Self {
        if config.enforce_validation {
            StorePolicy::Enforce
        } else {
            StorePolicy::Trust
        }
    }
}

#[derive(Clone, Default)]
pub struct QueryStore {
    queries: Arc<RwLock<IndexMap<String, QueryDefinition>>>,
    policy: StorePolicy,
    validator: Validator,
}

impl QueryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: StorePolicy, validator: Validator) -> Self {
        Self {
            queries: Arc::default(),
            policy,
            validator,
        }
    }

    pub fn policy(&self) -> StorePolicy {
        self.policy
    }

    /// List all queries in insertion order.
    pub async fn list(&self) -> Vec<QueryDefinition> {
        let map = self.queries.read().await;
        map.values().cloned().collect()
    }

    pub async fn get(&self, id: &str) -> Option<QueryDefinition> {
        let map = self.queries.read().await;
        map.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.queries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.queries.read().await.is_empty()
    }

    /// Insert under a freshly generated id with current timestamps.
    pub async fn create(&self, query: QueryDefinition) -> Result<QueryDefinition, QueryStoreError> {
        let mut map = self.queries.write().await;
        self.insert_new(&mut map, query)
    }

    /// Replace an existing query, keeping its id and `created_at`.
    pub async fn update(
        &self,
        id: &str,
        query: QueryDefinition,
    ) -> Result<QueryDefinition, QueryStoreError> {
        let mut map = self.queries.write().await;
        self.replace(&mut map, id, query)
    }

    /// Update when the id is already stored, create otherwise. Both the
    /// lookup and the write happen under one lock.
    pub async fn save(&self, query: QueryDefinition) -> Result<QueryDefinition, QueryStoreError> {
        let mut map = self.queries.write().await;
        if map.contains_key(&query.id) {
            let id = query.id.clone();
            self.replace(&mut map, &id, query)
        } else {
            self.insert_new(&mut map, query)
        }
    }

    /// Remove a query. Returns `true` if it existed.
    pub async fn delete(&self, id: &str) -> bool {
        let mut map = self.queries.write().await;
        let removed = map.shift_remove(id).is_some();
        if removed {
            info!(query_id = %id, "query deleted");
        }
        removed
    }

    fn insert_new(
        &self,
        map: &mut IndexMap<String, QueryDefinition>,
        mut query: QueryDefinition,
    ) -> Result<QueryDefinition, QueryStoreError> {
        let now = Utc::now();
        query.id = format!("query-{}", Uuid::new_v4());
        query.created_at = now;
        query.updated_at = now;
        self.check_policy(&query)?;

        info!(query_id = %query.id, name = %query.name, "query created");
        map.insert(query.id.clone(), query.clone());
        Ok(query)
    }

    fn replace(
        &self,
        map: &mut IndexMap<String, QueryDefinition>,
        id: &str,
        mut query: QueryDefinition,
    ) -> Result<QueryDefinition, QueryStoreError> {
        let existing = map
            .get_mut(id)
            .ok_or_else(|| QueryStoreError::NotFound(id.to_string()))?;

        query.id = existing.id.clone();
        query.created_at = existing.created_at;
        query.touch();
        self.check_policy(&query)?;

        *existing = query.clone();
        info!(query_id = %id, "query updated");
        Ok(query)
    }

    fn check_policy(&self, query: &QueryDefinition) -> Result<(), QueryStoreError> {
        let report: QueryValidation = self.validator.validate(query);
        if report.is_valid {
            return Ok(());
        }

        let errors: Vec<String> = report.errors().map(|m| m.message.clone()).collect();
        match self.policy {
            StorePolicy::Trust => {
                warn!(
                    query_id = %query.id,
                    errors = errors.len(),
                    "storing query that fails validation"
                );
                Ok(())
            }
            StorePolicy::Enforce => Err(QueryStoreError::Invalid {
                id: query.id.clone(),
                errors,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FilterCondition, FilterOperator};
    use extract_core::{Field, FieldType};
    use serde_json::json;

    fn valid_query(name: &str) -> QueryDefinition {
        let f = Field::new("s1", "name", FieldType::String);
        QueryDefinition::new(name)
            .add_source("crm", Some("customers".into()))
            .add_field(f.clone())
            .add_filter(FilterCondition::new(f, FilterOperator::Equals, json!("x")))
    }

    #[tokio::test]
    async fn create_assigns_fresh_id_and_timestamps() {
        let store = QueryStore::new();
        let draft = valid_query("draft");
        let draft_id = draft.id.clone();

        let created = store.create(draft).await.unwrap();
        assert_ne!(created.id, draft_id);
        assert!(created.id.starts_with("query-"));
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(store.get(&created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn update_keeps_id_and_created_at() {
        let store = QueryStore::new();
        let created = store.create(valid_query("v1")).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let mut edited = created.clone();
        edited.name = "v2".into();
        edited.id = "ignored".into();
        let updated = store.update(&created.id, edited).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "v2");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn update_missing_id_fails() {
        let store = QueryStore::new();
        let err = store.update("query-missing", valid_query("x")).await.unwrap_err();
        assert!(matches!(err, QueryStoreError::NotFound(id) if id == "query-missing"));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = QueryStore::new();
        let created = store.create(valid_query("gone")).await.unwrap();
        assert!(store.delete(&created.id).await);
        assert!(!store.delete(&created.id).await);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn list_preserves_insertion_order() {
        let store = QueryStore::new();
        for name in ["c", "a", "b"] {
            store.create(valid_query(name)).await.unwrap();
        }
        let names: Vec<String> = store.list().await.into_iter().map(|q| q.name).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn trust_policy_stores_invalid_queries() {
        let store = QueryStore::new();
        let created = store.create(QueryDefinition::new("empty")).await.unwrap();
        assert!(store.get(&created.id).await.is_some());
    }

    #[tokio::test]
    async fn enforce_policy_rejects_invalid_queries() {
        let store = QueryStore::with_policy(StorePolicy::Enforce, Validator::default());
        let err = store.create(QueryDefinition::new("empty")).await.unwrap_err();
        match err {
            QueryStoreError::Invalid { errors, .. } => assert_eq!(errors.len(), 2),
            other => panic!("expected invalid error, got {other:?}"),
        }
        assert!(store.is_empty().await);

        let created = store.create(valid_query("ok")).await.unwrap();
        let broken = created.clone().remove_source(0);
        assert!(store.update(&created.id, broken).await.is_err());
        assert_eq!(store.get(&created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn save_upserts() {
        let store = QueryStore::new();
        let created = store.save(valid_query("first")).await.unwrap();
        let mut edited = created.clone();
        edited.tags = vec!["finance".into()];
        let saved = store.save(edited).await.unwrap();

        assert_eq!(saved.id, created.id);
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(&created.id).await.unwrap().tags, vec!["finance"]);
    }

    #[tokio::test]
    async fn save_racing_delete_never_reports_missing() {
        let store = QueryStore::new();
        for _ in 0..20 {
            let created = store.create(valid_query("racy")).await.unwrap();
            let (saved, _) = tokio::join!(store.save(created.clone()), store.delete(&created.id));
            assert!(saved.is_ok());
        }
    }

    #[tokio::test]
    async fn save_after_delete_creates_again() {
        let store = QueryStore::new();
        let created = store.create(valid_query("again")).await.unwrap();
        store.delete(&created.id).await;

        let saved = store.save(created.clone()).await.unwrap();
        assert_ne!(saved.id, created.id);
        assert_eq!(store.len().await, 1);
    }

    #[test]
    fn policy_follows_config() {
        let enforce = StoreConfig {
            enforce_validation: true,
        };
        assert_eq!(StorePolicy::from(&enforce), StorePolicy::Enforce);
        assert_eq!(StorePolicy::from(&StoreConfig::default()), StorePolicy::Trust);
    }
}
