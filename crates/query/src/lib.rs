//! Cross-source extract query engine.
//!
//! This crate provides:
//! - The query model ([`QueryDefinition`]) and its pure mutation operations
//! - A rule-based validator producing severity-tagged messages
//! - A synthetic preview backend with request sequencing
//! - An in-memory store of saved query definitions

pub mod model;
pub mod preview;
pub mod store;
pub mod validation;

pub use extract_core::{Field, FieldType, QuerySource};
pub use model::{
    AggregateConfig, AggregateFunction, FilterCondition, FilterOperator, JoinCondition, JoinType,
    LogicalOperator, QueryDefinition, SortConfig, SortDirection,
};
pub use preview::{
    preview, PreviewColumn, PreviewError, PreviewOutcome, PreviewResult, PreviewSession,
    QueryBackend, SyntheticBackend,
};
pub use store::{QueryStore, QueryStoreError, StorePolicy};
pub use validation::{
    validate, QueryValidation, Severity, ValidationCode, ValidationMessage, Validator,
};
