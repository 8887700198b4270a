//! Rule-based validation of query definitions.
//!
//! Every rule runs on every call, in a fixed order, against the whole
//! [`QueryDefinition`]. The outcome is a [`QueryValidation`] holding the
//! messages in rule order; errors block save and preview, warnings are
//! advisory. Validation never fails.

mod filter_checks;
mod join_checks;
mod performance_checks;
mod reference_checks;
mod structure_checks;

pub mod fuzzy;

pub use filter_checks::allowed_operators;
pub use join_checks::types_compatible;

use chrono::{DateTime, Utc};
use extract_core::config::ValidationConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::QueryDefinition;

// ── Result types ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    NoSources,
    NoFields,
    MissingJoins,
    InvalidJoin,
    IncompatibleTypes,
    InvalidOperator,
    PerformanceWarning,
    DuplicateAlias,
    UnknownSource,
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationCode::NoSources => "NO_SOURCES",
            ValidationCode::NoFields => "NO_FIELDS",
            ValidationCode::MissingJoins => "MISSING_JOINS",
            ValidationCode::InvalidJoin => "INVALID_JOIN",
            ValidationCode::IncompatibleTypes => "INCOMPATIBLE_TYPES",
            ValidationCode::InvalidOperator => "INVALID_OPERATOR",
            ValidationCode::PerformanceWarning => "PERFORMANCE_WARNING",
            ValidationCode::DuplicateAlias => "DUPLICATE_ALIAS",
            ValidationCode::UnknownSource => "UNKNOWN_SOURCE",
        }
    }
}

impl std::fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A coded, severity-tagged diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationMessage {
    pub code: ValidationCode,
    pub message: String,
    pub severity: Severity,
    /// Name of the offending field, when one is involved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Source alias of the offending field or source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

impl ValidationMessage {
    pub fn error(code: ValidationCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Error, message)
    }

    pub fn warning(code: ValidationCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Warning, message)
    }

    fn new(code: ValidationCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            severity,
            field: None,
            source: None,
            context: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Overall validation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryValidation {
    pub is_valid: bool,
    pub messages: Vec<ValidationMessage>,
    pub timestamp: DateTime<Utc>,
}

impl QueryValidation {
    pub(crate) fn new() -> Self {
        Self {
            is_valid: true,
            messages: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub(crate) fn push(&mut self, message: ValidationMessage) {
        if message.is_error() {
            self.is_valid = false;
        }
        self.messages.push(message);
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationMessage> {
        self.messages.iter().filter(|m| m.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationMessage> {
        self.messages.iter().filter(|m| m.severity == Severity::Warning)
    }

    pub fn has_code(&self, code: ValidationCode) -> bool {
        self.messages.iter().any(|m| m.code == code)
    }

    /// Codes in emission order.
    pub fn codes(&self) -> Vec<ValidationCode> {
        self.messages.iter().map(|m| m.code).collect()
    }
}

// ── Public API ──────────────────────────────────────────────────────

/// Validator with tunable thresholds.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn validate(&self, query: &QueryDefinition) -> QueryValidation {
        let mut result = QueryValidation::new();
        structure_checks::check_sources(query, &mut result);
        structure_checks::check_fields(query, &mut result);
        structure_checks::check_join_coverage(query, &mut result);
        join_checks::check_join_references(query, &mut result);
        join_checks::check_join_types(query, &mut result);
        filter_checks::check_operators(query, &mut result);
        performance_checks::check_performance(query, &self.config, &mut result);
        reference_checks::check_duplicate_aliases(query, &mut result);
        reference_checks::check_unknown_sources(query, &mut result);

        debug!(
            query_id = %query.id,
            valid = result.is_valid,
            errors = result.errors().count(),
            warnings = result.warnings().count(),
            "query validated"
        );
        result
    }
}

/// Validate with the default thresholds.
pub fn validate(query: &QueryDefinition) -> QueryValidation {
    Validator::default().validate(query)
}
