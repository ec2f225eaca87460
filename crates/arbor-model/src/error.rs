//! Model errors.
//!
//! Uses `thiserror` for structured, matchable variants. Structural problems
//! are detected at schema-validation time, before any semantic evaluation
//! starts; they are fatal to setup, never recoverable mid-pass.

use thiserror::Error;

use crate::id::NodeId;
use crate::schema::{Cardinality, PropertyType};

/// Errors produced by the node model.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// Registering a second schema for a kind that already has one.
    #[error("duplicate schema for node kind '{kind}'")]
    DuplicateSchema { kind: String },

    /// A node's kind has no registered schema.
    #[error("no schema registered for node kind '{kind}' (node {node})")]
    UnknownKind { node: NodeId, kind: String },

    /// A node ID was not found in the arena.
    #[error("node {id} not found")]
    NodeNotFound { id: NodeId },

    /// A node carries a property its schema does not declare.
    #[error("node {node} ({kind}): undeclared property '{name}'")]
    UndeclaredProperty {
        node: NodeId,
        kind: String,
        name: String,
    },

    /// A property value's type disagrees with its declaration.
    #[error("node {node}: property '{name}' expects {expected:?}")]
    PropertyTypeMismatch {
        node: NodeId,
        name: String,
        expected: PropertyType,
    },

    /// A required property is absent.
    #[error("node {node} ({kind}): missing required property '{name}'")]
    MissingProperty {
        node: NodeId,
        kind: String,
        name: String,
    },

    /// A node has children in a slot its schema does not declare.
    #[error("node {node} ({kind}): undeclared child slot '{slot}'")]
    UndeclaredChildSlot {
        node: NodeId,
        kind: String,
        slot: String,
    },

    /// The number of children in a slot violates its declared cardinality.
    #[error("node {node}: child slot '{slot}' expects {expected:?}, has {actual}")]
    CardinalityViolation {
        node: NodeId,
        slot: String,
        expected: Cardinality,
        actual: usize,
    },

    /// A node holds a reference in a slot its schema does not declare.
    #[error("node {node} ({kind}): undeclared reference slot '{slot}'")]
    UndeclaredReference {
        node: NodeId,
        kind: String,
        slot: String,
    },
}
