//! Query statuses and failure types.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::id::QueryId;

/// A terminal, non-retryable query failure.
///
/// Propagates to every dependent query; it never corrupts sibling queries
/// and is never re-attempted within an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct QueryFailure {
    pub message: String,
}

impl QueryFailure {
    pub fn new(message: impl Into<String>) -> Self {
        QueryFailure {
            message: message.into(),
        }
    }
}

/// The cached status of one (definition, key) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStatus<K, V> {
    /// The computation finished; the value is cached and returned as-is on
    /// every subsequent request.
    Resolved(V),
    /// The computation was abandoned because the listed queries are not yet
    /// resolved. Re-attempted on the next request.
    Waiting(BTreeSet<QueryId<K>>),
    /// The computation failed; terminal.
    Failed(QueryFailure),
}

impl<K, V> QueryStatus<K, V> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, QueryStatus::Resolved(_))
    }

    pub fn resolved(self) -> Option<V> {
        match self {
            QueryStatus::Resolved(value) => Some(value),
            _ => None,
        }
    }
}

/// Early exit from a compute function.
#[derive(Debug, Clone)]
pub enum QueryErr<K> {
    /// One or more dependencies are unresolved; retry on a later pass.
    Blocked(BTreeSet<QueryId<K>>),
    /// A domain error; the query becomes terminally `Failed`.
    Failed(QueryFailure),
}

impl<K: Ord> QueryErr<K> {
    /// Blocks on a single query.
    pub fn blocked_on(id: QueryId<K>) -> Self {
        QueryErr::Blocked(BTreeSet::from([id]))
    }

    /// Fails the query with a message.
    pub fn fail(message: impl Into<String>) -> Self {
        QueryErr::Failed(QueryFailure::new(message))
    }
}

/// Engine setup errors, detected at registration time.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("duplicate query definition '{name}'")]
    DuplicateDefinition { name: &'static str },

    #[error("unknown query definition '{name}'")]
    UnknownDefinition { name: &'static str },

    #[error("query definition '{name}' is not an input")]
    NotAnInput { name: &'static str },
}
