use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use extract_catalog::{DataSource, DataSourceRegistry};
use extract_core::{Config, QuerySource};
use extract_query::{
    PreviewOutcome, PreviewSession, QueryDefinition, QueryStore, QueryStoreError, QueryValidation,
    StorePolicy, SyntheticBackend, Validator,
};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

/// Parse a query definition, choosing the format from the file extension.
pub fn parse_query(contents: &str, path: &Path) -> Result<QueryDefinition> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let query = match ext {
        "yml" | "yaml" => serde_yaml::from_str(contents)
            .with_context(|| format!("YAML parse error in {}", path.display()))?,
        _ => serde_json::from_str(contents)
            .with_context(|| format!("JSON parse error in {}", path.display()))?,
    };
    Ok(query)
}

pub fn load_query(path: &Path) -> Result<QueryDefinition> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read: {}", path.display()))?;
    parse_query(&contents, path)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Returns the report so the caller can pick the exit status.
pub fn validate(config: &Config, path: &Path) -> Result<QueryValidation> {
    let query = load_query(path)?;
    let report = Validator::new(config.validation.clone()).validate(&query);
    info!(
        query_id = %query.id,
        valid = report.is_valid,
        messages = report.messages.len(),
        "validated query file"
    );
    print_json(&report)?;
    Ok(report)
}

pub async fn preview(
    config: &Config,
    path: &Path,
    rows: Option<usize>,
    force: bool,
) -> Result<()> {
    let query = load_query(path)?;
    let report = Validator::new(config.validation.clone()).validate(&query);
    if !report.is_valid {
        if !force {
            print_json(&report)?;
            bail!("query '{}' has validation errors; pass --force to preview anyway", query.id);
        }
        warn!(query_id = %query.id, "previewing a query with validation errors");
    }

    let mut preview_config = config.preview.clone();
    if let Some(rows) = rows {
        preview_config.row_count = rows;
    }
    let session = PreviewSession::new(Arc::new(SyntheticBackend::new(preview_config)));
    match session.run(&query).await.context("preview failed")? {
        PreviewOutcome::Current(result) => print_json(&result),
        PreviewOutcome::Superseded { ticket, latest } => {
            bail!("preview {ticket} was superseded by {latest}")
        }
    }
}

/// One line of the `import` listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedQuery {
    pub file: String,
    pub id: Option<String>,
    pub name: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected: Option<String>,
}

/// Create each query in `store`. Rejections are reported, not fatal.
pub async fn import_queries(
    store: &QueryStore,
    validator: &Validator,
    queries: Vec<(String, QueryDefinition)>,
) -> Vec<ImportedQuery> {
    let mut imported = Vec::with_capacity(queries.len());
    for (file, query) in queries {
        let valid = validator.validate(&query).is_valid;
        let name = query.name.clone();
        let entry = match store.create(query).await {
            Ok(stored) => ImportedQuery {
                file,
                id: Some(stored.id),
                name,
                valid,
                rejected: None,
            },
            Err(err @ QueryStoreError::Invalid { .. }) => {
                warn!(%file, error = %err, "query rejected by store");
                ImportedQuery {
                    file,
                    id: None,
                    name,
                    valid,
                    rejected: Some(err.to_string()),
                }
            }
            Err(QueryStoreError::NotFound(id)) => {
                warn!(%file, %id, "unexpected missing query during import");
                continue;
            }
        };
        imported.push(entry);
    }
    imported
}

pub async fn import(config: &Config, files: &[PathBuf]) -> Result<()> {
    let queries = files
        .iter()
        .map(|path| Ok((path.display().to_string(), load_query(path)?)))
        .collect::<Result<Vec<_>>>()?;

    let validator = Validator::new(config.validation.clone());
    let store = QueryStore::with_policy(StorePolicy::from(&config.store), validator.clone());
    let imported = import_queries(&store, &validator, queries).await;
    info!(
        policy = ?store.policy(),
        files = files.len(),
        stored = store.len().await,
        "import finished"
    );
    print_json(&imported)
}

/// Profiles discovered in the environment plus the active settings.
pub fn profile_report(config: &Config) -> serde_json::Value {
    json!({
        "active": config.profile_label(),
        "available": Config::available_profiles(),
        "settings": config.redacted_summary(),
    })
}

pub fn profiles(config: &Config) -> Result<()> {
    print_json(&profile_report(config))
}

pub async fn fields(catalog: &Path, source_id: &str, table: &str, alias: &str) -> Result<()> {
    let contents = std::fs::read_to_string(catalog)
        .with_context(|| format!("failed to read: {}", catalog.display()))?;
    let sources: Vec<DataSource> = serde_json::from_str(&contents)
        .with_context(|| format!("invalid data source list in {}", catalog.display()))?;
    let registry = DataSourceRegistry::from_sources(sources);

    let source = QuerySource::new(source_id, Some(table.to_string()), alias);
    let fields = registry.fields_for(&source).await?;
    if fields.is_empty() {
        warn!(source_id, table, "no fields resolved");
    }
    print_json(&fields)
}
