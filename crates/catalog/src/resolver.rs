//! Field catalog resolution: table metadata -> alias-scoped [`Field`]s.

use std::collections::HashMap;

use extract_core::{Field, QuerySource};

use crate::datasource::{DataSource, TableMetadata};

/// Case-insensitive lookup of table metadata by table name.
#[derive(Debug, Clone, Default)]
pub struct TableCatalog {
    tables: HashMap<String, TableMetadata>,
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

impl TableCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every table of a data source by `name` and by `schema.name`.
    pub fn from_source(source: &DataSource) -> Self {
        let mut catalog = Self::new();
        for table in &source.metadata.tables {
            catalog.insert(table.clone());
        }
        catalog
    }

    pub fn insert(&mut self, table: TableMetadata) {
        if let Some(schema) = &table.schema {
            let qualified = normalize(&format!("{}.{}", schema, table.name));
            self.tables.insert(qualified, table.clone());
        }
        // Unqualified name: first registration wins.
        self.tables.entry(normalize(&table.name)).or_insert(table);
    }

    pub fn get(&self, table: &str) -> Option<&TableMetadata> {
        self.tables.get(&normalize(table))
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Resolve the fields a query source exposes.
///
/// Each `{name, type, nullable}` descriptor of `catalog[source.table]` becomes
/// a [`Field`] bound to `source.alias`, in catalog order. Returns an empty
/// list when the source has no table or the table is unknown.
pub fn get_source_fields(source: &QuerySource, catalog: &TableCatalog) -> Vec<Field> {
    let Some(table_name) = source.table.as_deref() else {
        return Vec::new();
    };
    let Some(table) = catalog.get(table_name) else {
        tracing::debug!(
            source_id = %source.source_id,
            table = %table_name,
            "table not found in catalog"
        );
        return Vec::new();
    };

    table
        .fields
        .iter()
        .map(|f| Field {
            name: f.name.clone(),
            field_type: f.field_type.clone(),
            source: source.alias.clone(),
            table: Some(table_name.to_string()),
            alias: None,
            description: None,
            expression: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::TableField;
    use extract_core::FieldType;

    fn orders_table() -> TableMetadata {
        TableMetadata {
            name: "Orders".into(),
            schema: Some("sales".into()),
            fields: vec![
                TableField {
                    name: "order_id".into(),
                    field_type: FieldType::Number,
                    nullable: false,
                },
                TableField {
                    name: "customer_id".into(),
                    field_type: FieldType::String,
                    nullable: false,
                },
                TableField {
                    name: "placed_at".into(),
                    field_type: FieldType::Date,
                    nullable: true,
                },
            ],
        }
    }

    fn catalog() -> TableCatalog {
        let mut c = TableCatalog::new();
        c.insert(orders_table());
        c
    }

    #[test]
    fn resolves_fields_scoped_to_alias() {
        let source = QuerySource::new("erp", Some("orders".into()), "s2");
        let fields = get_source_fields(&source, &catalog());

        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["order_id", "customer_id", "placed_at"]);
        assert!(fields.iter().all(|f| f.source == "s2"));
        assert_eq!(fields[2].field_type, FieldType::Date);
        assert_eq!(fields[0].table.as_deref(), Some("orders"));
    }

    #[test]
    fn lookup_is_case_insensitive_and_schema_aware() {
        let c = catalog();
        assert!(c.get("ORDERS").is_some());
        assert!(c.get("Sales.Orders").is_some());
        assert!(c.get("inventory").is_none());
    }

    #[test]
    fn unknown_or_missing_table_yields_nothing() {
        let c = catalog();
        let no_table = QuerySource::new("erp", None, "s1");
        assert!(get_source_fields(&no_table, &c).is_empty());

        let unknown = QuerySource::new("erp", Some("invoices".into()), "s1");
        assert!(get_source_fields(&unknown, &c).is_empty());
    }

    #[test]
    fn resolution_is_idempotent() {
        let c = catalog();
        let source = QuerySource::new("erp", Some("orders".into()), "s1");
        assert_eq!(get_source_fields(&source, &c), get_source_fields(&source, &c));
    }
}
