use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use super::{PreviewError, PreviewResult, QueryBackend};
use crate::model::QueryDefinition;

/// What became of one preview request.
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewOutcome {
    /// The response belongs to the latest request and is now the current result.
    Current(PreviewResult),
    /// A newer request was issued while this one was in flight; the
    /// response (success or failure) was discarded.
    Superseded { ticket: u64, latest: u64 },
}

/// Sequences preview requests for one editing session.
///
/// Each request takes a ticket from a monotonically increasing counter.
/// Only the response to the most recently issued ticket is accepted.
pub struct PreviewSession {
    backend: Arc<dyn QueryBackend>,
    issued: AtomicU64,
    current: RwLock<Option<(u64, PreviewResult)>>,
}

impl PreviewSession {
    pub fn new(backend: Arc<dyn QueryBackend>) -> Self {
        Self {
            backend,
            issued: AtomicU64::new(0),
            current: RwLock::new(None),
        }
    }

    pub async fn run(&self, query: &QueryDefinition) -> Result<PreviewOutcome, PreviewError> {
        let ticket = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let response = self.backend.execute(query).await;

        let mut current = self.current.write().await;
        let latest = self.issued.load(Ordering::SeqCst);
        if ticket != latest {
            debug!(query_id = %query.id, ticket, latest, "discarding stale preview response");
            return Ok(PreviewOutcome::Superseded { ticket, latest });
        }

        let result = response?;
        *current = Some((ticket, result.clone()));
        Ok(PreviewOutcome::Current(result))
    }

    /// The result of the latest accepted request.
    pub async fn latest(&self) -> Option<PreviewResult> {
        self.current.read().await.as_ref().map(|(_, r)| r.clone())
    }

    /// Number of requests issued so far.
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }
}
