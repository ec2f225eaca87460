//! Node model for the arbor semantic core.
//!
//! Program trees are produced by an external parser/model layer; this crate
//! stores them in an arena and exposes the uniform capability every higher
//! layer operates through: named properties, named ordered child lists,
//! named references, and a non-owning parent back-reference. Concrete node
//! types never appear above this boundary.

pub mod arena;
pub mod error;
pub mod id;
pub mod node;
pub mod schema;

pub use arena::NodeArena;
pub use error::ModelError;
pub use id::NodeId;
pub use node::{Node, NodeKind, NodeReference, PropertyValue, RefSlot};
pub use schema::{Cardinality, ChildSpec, NodeSchema, PropertySpec, PropertyType, RefSpec, SchemaSet};
