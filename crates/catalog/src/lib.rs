//! Data source registry and field catalog resolution.
//!
//! The registry holds externally registered data sources (databases, flat
//! files, APIs) together with their table metadata. The resolver turns that
//! metadata into [`Field`](extract_core::Field) descriptors scoped to a
//! query-local source alias.

pub mod datasource;
pub mod registry;
pub mod resolver;

pub use datasource::{
    ApiConfig, ConnectionConfig, DataSource, DatabaseConfig, FileConfig, FileFormat, HttpMethod,
    SourceKind, SourceMetadata, SourceStatus, TableField, TableMetadata,
};
pub use registry::{DataSourceRegistry, RegistryError};
pub use resolver::{get_source_fields, TableCatalog};
