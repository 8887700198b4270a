//! In-memory registry of external data sources.
//!
//! Sources are held in an `Arc<RwLock<_>>` keyed by id, in registration
//! order. The registry never opens connections; it only serves metadata to
//! the field resolver.

use std::sync::Arc;

use extract_core::{Field, QuerySource};
use indexmap::IndexMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::datasource::DataSource;
use crate::resolver::{get_source_fields, TableCatalog};

/// Errors produced by [`DataSourceRegistry`] operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("data source not found: {0}")]
    NotFound(String),
    #[error("data source already registered: {0}")]
    AlreadyExists(String),
}

#[derive(Clone, Default)]
pub struct DataSourceRegistry {
    sources: Arc<RwLock<IndexMap<String, DataSource>>>,
}

impl DataSourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of sources. Later duplicates replace
    /// earlier ones.
    pub fn from_sources(sources: Vec<DataSource>) -> Self {
        let map = sources
            .into_iter()
            .map(|s| (s.id.clone(), s))
            .collect::<IndexMap<_, _>>();
        for source in map.values() {
            debug!(
                source_id = %source.id,
                location = %source.connection.describe(),
                "data source loaded"
            );
        }
        info!(count = map.len(), "data source registry initialized");
        Self {
            sources: Arc::new(RwLock::new(map)),
        }
    }

    /// Register a new source. Fails if the id is taken.
    pub async fn register(&self, source: DataSource) -> Result<(), RegistryError> {
        let mut map = self.sources.write().await;
        if map.contains_key(&source.id) {
            return Err(RegistryError::AlreadyExists(source.id));
        }
        info!(
            source_id = %source.id,
            kind = %source.kind(),
            location = %source.connection.describe(),
            tables = source.metadata.tables.len(),
            "data source registered"
        );
        map.insert(source.id.clone(), source);
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Option<DataSource> {
        let map = self.sources.read().await;
        map.get(id).cloned()
    }

    pub async fn list(&self) -> Vec<DataSource> {
        let map = self.sources.read().await;
        map.values().cloned().collect()
    }

    /// Remove a source. Returns `true` if it existed.
    pub async fn remove(&self, id: &str) -> bool {
        let mut map = self.sources.write().await;
        let removed = map.shift_remove(id).is_some();
        if removed {
            info!(source_id = %id, "data source removed");
        }
        removed
    }

    /// Table catalog for one registered source.
    pub async fn catalog_for(&self, id: &str) -> Result<TableCatalog, RegistryError> {
        let map = self.sources.read().await;
        map.get(id)
            .map(TableCatalog::from_source)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Resolve the fields of a query source against its registered metadata.
    pub async fn fields_for(&self, source: &QuerySource) -> Result<Vec<Field>, RegistryError> {
        let catalog = self.catalog_for(&source.source_id).await?;
        Ok(get_source_fields(source, &catalog))
    }
}
