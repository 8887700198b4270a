use serde::{Deserialize, Serialize};

/// Declared data type of a field.
///
/// Serialized as the lowercase type name. Names outside the known set are
/// kept verbatim in [`FieldType::Other`], so a query document reads back
/// exactly as written. Catalog metadata goes through [`FieldType::parse`]
/// instead, which also folds SQL spellings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    String,
    Number,
    Decimal,
    Date,
    Boolean,
    Other(String),
}

impl FieldType {
    /// Normalize a raw type name, including common SQL spellings
    /// (`varchar`, `bigint`, `timestamp`, ...).
    pub fn parse(raw: &str) -> Self {
        let lower = raw.trim().to_ascii_lowercase();
        // `varchar(255)` / `decimal(10,2)` -> base name
        let base = lower.split('(').next().unwrap_or("").trim();
        match base {
            "string" | "varchar" | "char" | "text" | "nvarchar" | "uuid" => FieldType::String,
            "number" | "int" | "integer" | "bigint" | "smallint" | "tinyint" => FieldType::Number,
            "decimal" | "numeric" | "float" | "double" | "real" | "money" => FieldType::Decimal,
            "date" | "datetime" | "timestamp" | "timestamptz" => FieldType::Date,
            "boolean" | "bool" | "bit" => FieldType::Boolean,
            _ => FieldType::Other(lower),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Decimal => "decimal",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
            FieldType::Other(name) => name,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Number | FieldType::Decimal)
    }
}

impl From<String> for FieldType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "string" => FieldType::String,
            "number" => FieldType::Number,
            "decimal" => FieldType::Decimal,
            "date" => FieldType::Date,
            "boolean" => FieldType::Boolean,
            _ => FieldType::Other(raw),
        }
    }
}

impl From<FieldType> for String {
    fn from(t: FieldType) -> Self {
        t.as_str().to_string()
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, typed column reference scoped to one query-local source alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Alias of the query source this field belongs to.
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

impl Field {
    pub fn new(
        source: impl Into<String>,
        name: impl Into<String>,
        field_type: FieldType,
    ) -> Self {
        Self {
            name: name.into(),
            field_type,
            source: source.into(),
            table: None,
            alias: None,
            description: None,
            expression: None,
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Same source alias and same name.
    pub fn same_reference(&self, other: &Field) -> bool {
        self.source == other.source && self.name == other.name
    }

    /// `alias.name`, used in diagnostics.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.source, self.name)
    }
}
