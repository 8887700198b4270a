//! End-to-end flows through the query builder: resolve fields from a
//! registered source, edit a query, validate, preview and save it.

use std::sync::Arc;

use extract_catalog::{DataSource, DataSourceRegistry};
use extract_core::config::PreviewConfig;
use extract_query::{
    validate, FieldType, FilterCondition, FilterOperator, JoinCondition, PreviewOutcome,
    PreviewSession, QueryDefinition, QueryStore, Severity, SyntheticBackend, ValidationCode,
};
use serde_json::json;

fn registry() -> DataSourceRegistry {
    let sources: Vec<DataSource> = serde_json::from_value(json!([
        {
            "id": "crm",
            "name": "CRM database",
            "type": "database",
            "driver": "postgres",
            "host": "crm.internal",
            "database": "crm",
            "metadata": { "tables": [ {
                "name": "customers",
                "schema": "public",
                "fields": [
                    { "name": "customer_id", "type": "varchar", "nullable": false },
                    { "name": "signed_up", "type": "date", "nullable": true },
                    { "name": "region", "type": "string", "nullable": true }
                ]
            } ] }
        },
        {
            "id": "orders-drop",
            "name": "Nightly orders file",
            "type": "file",
            "format": "csv",
            "path": "/drops/orders.csv",
            "metadata": { "tables": [ {
                "name": "orders",
                "fields": [
                    { "name": "customer_id", "type": "string", "nullable": false },
                    { "name": "total", "type": "decimal", "nullable": false },
                    { "name": "placed_at", "type": "timestamp", "nullable": false }
                ]
            } ] }
        }
    ]))
    .unwrap();
    DataSourceRegistry::from_sources(sources)
}

async fn build_orders_query(registry: &DataSourceRegistry) -> QueryDefinition {
    let mut query = QueryDefinition::new("customer orders")
        .add_source("crm", Some("Customers".into()))
        .add_source("orders-drop", Some("orders".into()));

    let customers = registry.fields_for(&query.sources[0]).await.unwrap();
    let orders = registry.fields_for(&query.sources[1]).await.unwrap();
    assert_eq!(customers.len(), 3);
    assert_eq!(orders[1].field_type, FieldType::Decimal);
    assert_eq!(orders[2].field_type, FieldType::Date);

    let left = customers[0].clone();
    let right = orders[0].clone();
    for f in customers.into_iter().chain(orders) {
        query = query.add_field(f);
    }
    query
        .add_join(JoinCondition::inner(left.clone(), right))
        .add_filter(FilterCondition::new(left, FilterOperator::Equals, json!("C-42")))
}

#[tokio::test]
async fn resolved_query_is_valid_and_previews() {
    let registry = registry();
    let query = build_orders_query(&registry).await;

    let report = validate(&query);
    assert!(report.is_valid, "unexpected messages: {:?}", report.messages);
    assert!(report.messages.is_empty());

    let backend = SyntheticBackend::new(PreviewConfig {
        row_count: 5,
        latency_ms: 0,
    });
    let session = PreviewSession::new(Arc::new(backend));
    let result = match session.run(&query).await.unwrap() {
        PreviewOutcome::Current(result) => result,
        other => panic!("expected current preview, got {other:?}"),
    };

    let columns: Vec<(&str, &FieldType)> = result
        .columns
        .iter()
        .map(|c| (c.name.as_str(), &c.field_type))
        .collect();
    let expected: Vec<(&str, &FieldType)> = query
        .selected_fields
        .iter()
        .map(|f| (f.name.as_str(), &f.field_type))
        .collect();
    assert_eq!(columns, expected);
    assert_eq!(result.rows.len(), 5);
    assert_eq!(result.rows[0]["region"], "Sample1");
    assert_eq!(result.rows[2]["total"], 300.5);
    assert_eq!(result.rows[0]["placed_at"], "2024-01-01");
}

#[tokio::test]
async fn removing_a_source_cleans_up_and_revalidates() {
    let registry = registry();
    let query = build_orders_query(&registry).await.remove_source(1);

    assert!(query
        .selected_fields
        .iter()
        .chain(query.joins.iter().flat_map(|j| [&j.left_field, &j.right_field]))
        .chain(query.filters.iter().map(|f| &f.field))
        .all(|f| f.source != "s2"));

    let report = validate(&query);
    assert!(report.is_valid);

    // A new source gets a fresh alias, and now needs a join again.
    let query = query.add_source("orders-drop", Some("orders".into()));
    assert_eq!(query.sources[1].alias, "s3");
    let report = validate(&query);
    assert_eq!(report.codes(), vec![ValidationCode::MissingJoins]);
}

#[tokio::test]
async fn editing_a_saved_query_round_trips_through_the_store() {
    let registry = registry();
    let store = QueryStore::new();
    let saved = store.create(build_orders_query(&registry).await).await.unwrap();

    // Clone for edit, break the join, and check what the editor would show.
    let edited = store.get(&saved.id).await.unwrap().remove_field(3);
    let report = validate(&edited);
    let invalid_join = report
        .messages
        .iter()
        .find(|m| m.code == ValidationCode::InvalidJoin)
        .unwrap();
    assert_eq!(invalid_join.severity, Severity::Error);
    assert_eq!(invalid_join.source.as_deref(), Some("s2"));

    let fixed = edited.add_field(saved.selected_fields[3].clone());
    assert!(validate(&fixed).is_valid);
    let updated = store.update(&saved.id, fixed).await.unwrap();
    assert_eq!(updated.created_at, saved.created_at);

    let listed = store.list().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].selected_fields.len(), 6);
}

#[test]
fn query_definition_accepts_ui_payload() {
    let query: QueryDefinition = serde_json::from_value(json!({
        "id": "query-1700000000000",
        "name": "Legacy payload",
        "sources": [
            { "sourceId": "crm", "table": "customers", "alias": "s1" },
            { "sourceId": "orders-drop", "table": "orders", "alias": "s2" }
        ],
        "selectedFields": [
            { "name": "customer_id", "type": "string", "source": "s1" },
            { "name": "signed_up", "type": "date", "source": "s2" }
        ],
        "joins": [ {
            "leftField": { "name": "customer_id", "type": "string", "source": "s1" },
            "rightField": { "name": "signed_up", "type": "date", "source": "s2" },
            "type": "LEFT"
        } ],
        "filters": [],
        "createdAt": "2024-05-01T10:00:00.000Z",
        "updatedAt": "2024-05-01T10:00:00.000Z",
        "isTemplate": true,
        "tags": ["demo"]
    }))
    .unwrap();

    let report = validate(&query);
    assert!(report.has_code(ValidationCode::IncompatibleTypes));
    assert!(report.has_code(ValidationCode::PerformanceWarning));
    assert!(!report.is_valid);

    // Counter starts behind the stored aliases and catches up.
    let query = query.add_source("billing", None);
    assert_eq!(query.sources[2].alias, "s3");
}
