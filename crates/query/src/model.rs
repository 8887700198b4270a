//! Query definition model and its mutation operations.
//!
//! Every mutation consumes the definition and returns the edited one. No
//! mutation fails: structural problems (dangling joins, bad operators, ...)
//! are reported by [`crate::validation`], never raised while editing.

use chrono::{DateTime, Utc};
use extract_core::{Field, QuerySource};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Joins ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

/// Pairing of two fields from different sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinCondition {
    pub left_field: Field,
    pub right_field: Field,
    #[serde(rename = "type")]
    pub join_type: JoinType,
}

impl JoinCondition {
    pub fn new(left_field: Field, right_field: Field, join_type: JoinType) -> Self {
        Self {
            left_field,
            right_field,
            join_type,
        }
    }

    pub fn inner(left_field: Field, right_field: Field) -> Self {
        Self::new(left_field, right_field, JoinType::Inner)
    }

    fn references(&self, alias: &str) -> bool {
        self.left_field.source == alias || self.right_field.source == alias
    }
}

// ── Filters ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
    In,
    Between,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Equals => "equals",
            FilterOperator::NotEquals => "notEquals",
            FilterOperator::GreaterThan => "greaterThan",
            FilterOperator::LessThan => "lessThan",
            FilterOperator::Contains => "contains",
            FilterOperator::In => "in",
            FilterOperator::Between => "between",
        }
    }
}

impl std::fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    And,
    Or,
}

/// Predicate on one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCondition {
    pub field: Field,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_operator: Option<LogicalOperator>,
}

impl FilterCondition {
    pub fn new(field: Field, operator: FilterOperator, value: serde_json::Value) -> Self {
        Self {
            field,
            operator,
            value,
            logical_operator: None,
        }
    }
}

// ── Sorting & aggregation ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortConfig {
    pub field: Field,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregateFunction {
    Sum,
    Avg,
    Count,
    Min,
    Max,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateConfig {
    pub field: Field,
    pub function: AggregateFunction,
    pub alias: String,
}

// ── Query definition ────────────────────────────────────────────────

/// Complete, serializable description of a cross-source query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDefinition {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub sources: Vec<QuerySource>,
    #[serde(default)]
    pub selected_fields: Vec<Field>,
    #[serde(default)]
    pub joins: Vec<JoinCondition>,
    #[serde(default)]
    pub filters: Vec<FilterCondition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<Field>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub having: Vec<FilterCondition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<SortConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aggregates: Vec<AggregateConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default)]
    pub is_template: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Ordinal of the next generated `s{N}` alias. Aliases are never
    /// reissued, even after the source that held them is removed.
    #[serde(default = "first_alias")]
    pub next_alias: u64,
}

fn first_alias() -> u64 {
    1
}

fn remove_at<T>(items: &mut Vec<T>, index: usize) {
    if index < items.len() {
        items.remove(index);
    }
}

impl QueryDefinition {
    /// An empty query with a fresh id and current timestamps.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: format!("query-{}", Uuid::new_v4()),
            name: name.into(),
            description: None,
            sources: Vec::new(),
            selected_fields: Vec::new(),
            joins: Vec::new(),
            filters: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            order_by: Vec::new(),
            aggregates: Vec::new(),
            limit: None,
            created_at: now,
            updated_at: now,
            created_by: None,
            is_template: false,
            tags: Vec::new(),
            next_alias: first_alias(),
        }
    }

    pub fn source_aliases(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.alias.as_str())
    }

    pub fn source_by_alias(&self, alias: &str) -> Option<&QuerySource> {
        self.sources.iter().find(|s| s.alias == alias)
    }

    /// The selected field with the same source alias and name, if any.
    pub fn find_selected(&self, field: &Field) -> Option<&Field> {
        self.selected_fields.iter().find(|f| f.same_reference(field))
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Issue `s{N}` past both the counter and every alias already present.
    /// An exhausted counter falls back to the lowest unused ordinal.
    fn issue_alias(&mut self) -> String {
        let used: Vec<u64> = self
            .sources
            .iter()
            .filter_map(QuerySource::alias_ordinal)
            .collect();
        let past_existing = match used.iter().max() {
            Some(highest) => highest.checked_add(1),
            None => Some(1),
        };

        let ordinal = match past_existing.map(|n| n.max(self.next_alias)) {
            Some(n) if n < u64::MAX => n,
            _ => (1..).find(|n| !used.contains(n)).unwrap_or(1),
        };
        self.next_alias = self.next_alias.max(ordinal + 1);
        format!("s{ordinal}")
    }

    // ── Sources ─────────────────────────────────────────────────────

    pub fn add_source(mut self, source_id: impl Into<String>, table: Option<String>) -> Self {
        let alias = self.issue_alias();
        self.sources.push(QuerySource::new(source_id, table, alias));
        self
    }

    /// Remove the source at `index` together with everything that
    /// references its alias.
    pub fn remove_source(mut self, index: usize) -> Self {
        if index >= self.sources.len() {
            return self;
        }
        let alias = self.sources.remove(index).alias;
        let alias = alias.as_str();

        self.selected_fields.retain(|f| f.source != alias);
        self.joins.retain(|j| !j.references(alias));
        self.filters.retain(|f| f.field.source != alias);
        self.group_by.retain(|f| f.source != alias);
        self.having.retain(|f| f.field.source != alias);
        self.order_by.retain(|s| s.field.source != alias);
        self.aggregates.retain(|a| a.field.source != alias);
        self
    }

    // ── Fields ──────────────────────────────────────────────────────

    pub fn add_field(mut self, field: Field) -> Self {
        self.selected_fields.push(field);
        self
    }

    /// Joins and filters using the removed field are left in place.
    pub fn remove_field(mut self, index: usize) -> Self {
        remove_at(&mut self.selected_fields, index);
        self
    }

    // ── Joins & filters ─────────────────────────────────────────────

    pub fn add_join(mut self, join: JoinCondition) -> Self {
        self.joins.push(join);
        self
    }

    pub fn remove_join(mut self, index: usize) -> Self {
        remove_at(&mut self.joins, index);
        self
    }

    pub fn add_filter(mut self, filter: FilterCondition) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn remove_filter(mut self, index: usize) -> Self {
        remove_at(&mut self.filters, index);
        self
    }

    // ── Grouping, sorting, limits ───────────────────────────────────

    pub fn add_group_by(mut self, field: Field) -> Self {
        self.group_by.push(field);
        self
    }

    pub fn remove_group_by(mut self, index: usize) -> Self {
        remove_at(&mut self.group_by, index);
        self
    }

    pub fn add_having(mut self, condition: FilterCondition) -> Self {
        self.having.push(condition);
        self
    }

    pub fn remove_having(mut self, index: usize) -> Self {
        remove_at(&mut self.having, index);
        self
    }

    pub fn add_sort(mut self, field: Field, direction: SortDirection) -> Self {
        self.order_by.push(SortConfig { field, direction });
        self
    }

    pub fn remove_sort(mut self, index: usize) -> Self {
        remove_at(&mut self.order_by, index);
        self
    }

    pub fn add_aggregate(
        mut self,
        field: Field,
        function: AggregateFunction,
        alias: impl Into<String>,
    ) -> Self {
        self.aggregates.push(AggregateConfig {
            field,
            function,
            alias: alias.into(),
        });
        self
    }

    pub fn remove_aggregate(mut self, index: usize) -> Self {
        remove_at(&mut self.aggregates, index);
        self
    }

    pub fn set_limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }
}
