//! Node data: kinds, property values, references, and the node record.
//!
//! A node's fields are partitioned into three categories: properties (scalar
//! values such as a variable's name), children (nodes owned by this node,
//! grouped into named ordered lists), and references (pointers-by-identifier
//! to nodes owned elsewhere in the tree).

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::id::NodeId;

/// Tag identifying what kind of construct a node represents.
///
/// Kinds are plain interned-by-convention strings; the set of valid kinds for
/// a program is fixed by the registered [`SchemaSet`](crate::schema::SchemaSet).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeKind(String);

impl NodeKind {
    pub fn new(name: impl Into<String>) -> Self {
        NodeKind(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeKind {
    fn from(name: &str) -> Self {
        NodeKind::new(name)
    }
}

/// A scalar property value on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl PropertyValue {
    /// Returns the string payload, if this is a `Str` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Str(s.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

/// An unresolved named pointer-by-identifier to another node.
///
/// Carries only the textual identifier used for lookup. Resolution is a pure
/// function of (reference, scope) computed and cached by the semantic layer;
/// it never mutates the reference and never implies ownership of the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeReference {
    /// The identifier the reference names, e.g. a variable name.
    pub target: String,
}

impl NodeReference {
    pub fn new(target: impl Into<String>) -> Self {
        NodeReference {
            target: target.into(),
        }
    }
}

/// Identity of one reference occurrence: which node holds it, in which slot.
///
/// Used as the cache key for reference resolution.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RefSlot {
    pub node: NodeId,
    pub slot: String,
}

impl RefSlot {
    pub fn new(node: NodeId, slot: impl Into<String>) -> Self {
        RefSlot {
            node,
            slot: slot.into(),
        }
    }
}

impl fmt::Display for RefSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.slot)
    }
}

/// A single node record.
///
/// Nodes are created and mutated only through [`NodeArena`](crate::arena::NodeArena)
/// methods, which maintain the tree invariant: every node except a root has
/// exactly one parent, and the child/parent relation contains no cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) properties: IndexMap<String, PropertyValue>,
    pub(crate) children: IndexMap<String, Vec<NodeId>>,
    pub(crate) references: IndexMap<String, NodeReference>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Node {
            kind,
            parent,
            properties: IndexMap::new(),
            children: IndexMap::new(),
            references: IndexMap::new(),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Non-owning back-reference to the parent; `None` for roots.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn properties(&self) -> &IndexMap<String, PropertyValue> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Named ordered child lists, in slot declaration order.
    pub fn children(&self) -> &IndexMap<String, Vec<NodeId>> {
        &self.children
    }

    pub fn children_in(&self, slot: &str) -> &[NodeId] {
        self.children.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn references(&self) -> &IndexMap<String, NodeReference> {
        &self.references
    }

    pub fn reference(&self, slot: &str) -> Option<&NodeReference> {
        self.references.get(slot)
    }
}
