use serde::{Deserialize, Serialize};

/// Query-local reference to an externally registered data source.
///
/// The query never owns the underlying connection; `source_id` is a weak
/// key into the data source registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySource {
    pub source_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub alias: String,
}

impl QuerySource {
    pub fn new(
        source_id: impl Into<String>,
        table: Option<String>,
        alias: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            table,
            alias: alias.into(),
        }
    }

    /// Numeric part of a generated `s{N}` alias.
    pub fn alias_ordinal(&self) -> Option<u64> {
        self.alias.strip_prefix('s')?.parse().ok()
    }
}
