//! Semantic-layer errors.

use thiserror::Error;

use arbor_model::{ModelError, NodeId};
use arbor_query::EngineError;

/// Fatal semantic errors. Constraint conflicts are not errors; they go to
/// the diagnostics sink and evaluation continues.
#[derive(Debug, Error)]
pub enum SemError {
    #[error("duplicate type name '{name}'")]
    DuplicateType { name: String },

    #[error("a rule for node kind '{kind}' is already registered")]
    DuplicateRule { kind: String },

    #[error("node {node} has no reference in slot '{slot}'")]
    MissingReference { node: NodeId, slot: String },

    #[error("node {node} is missing required property '{name}'")]
    MissingProperty { node: NodeId, name: String },

    #[error("evaluation deadlocked after {passes} passes; stuck queries: {}", stuck.join(", "))]
    Deadlock { passes: u32, stuck: Vec<String> },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Model(#[from] ModelError),
}
