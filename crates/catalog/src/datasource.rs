use std::collections::BTreeMap;

use extract_core::FieldType;
use serde::{Deserialize, Deserializer, Serialize};

/// An externally registered data source.
///
/// The connection settings are flattened into the record and tagged by
/// `type`, e.g. `{"id": "crm", "type": "database", "driver": "postgres", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: SourceStatus,
    #[serde(flatten)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub metadata: SourceMetadata,
}

impl DataSource {
    pub fn kind(&self) -> SourceKind {
        self.connection.kind()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    #[default]
    Active,
    Inactive,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Database,
    File,
    Api,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Database => write!(f, "database"),
            SourceKind::File => write!(f, "file"),
            SourceKind::Api => write!(f, "api"),
        }
    }
}

// ── Connection settings ─────────────────────────────────────────────

/// Connection settings, one variant per source kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConnectionConfig {
    Database(DatabaseConfig),
    File(FileConfig),
    Api(ApiConfig),
}

impl ConnectionConfig {
    pub fn kind(&self) -> SourceKind {
        match self {
            ConnectionConfig::Database(_) => SourceKind::Database,
            ConnectionConfig::File(_) => SourceKind::File,
            ConnectionConfig::Api(_) => SourceKind::Api,
        }
    }

    /// Short human-readable location, for listings and logs.
    pub fn describe(&self) -> String {
        match self {
            ConnectionConfig::Database(db) => match db.port {
                Some(port) => format!("{}://{}:{}/{}", db.driver, db.host, port, db.database),
                None => format!("{}://{}/{}", db.driver, db.host, db.database),
            },
            ConnectionConfig::File(file) => format!("{} ({})", file.path, file.format),
            ConnectionConfig::Api(api) => format!("{} {}", api.method, api.base_url),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub driver: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub database: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub format: FileFormat,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub delimiter: Option<char>,
    #[serde(default = "default_has_header")]
    pub has_header: bool,
}

fn default_has_header() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    #[default]
    Csv,
    Json,
    Parquet,
    Fixed,
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileFormat::Csv => write!(f, "csv"),
            FileFormat::Json => write!(f, "json"),
            FileFormat::Parquet => write!(f, "parquet"),
            FileFormat::Fixed => write!(f, "fixed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

// ── Table metadata ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceMetadata {
    #[serde(default)]
    pub tables: Vec<TableMetadata>,
}

/// A table (or file / endpoint resource) exposed by a data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default)]
    pub fields: Vec<TableField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableField {
    pub name: String,
    /// Declared column type; SQL spellings fold into the known set.
    #[serde(rename = "type", deserialize_with = "sql_type")]
    pub field_type: FieldType,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

fn sql_type<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FieldType, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(FieldType::parse(&raw))
}
