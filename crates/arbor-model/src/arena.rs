//! Arena storage for program trees.
//!
//! The arena owns every node exclusively; parents hold their children through
//! IDs and each node holds a non-owning ID back to its parent. All mutations
//! go through arena methods so the tree invariant cannot be violated: nodes
//! are created in place under their parent, and there is no re-parenting, so
//! no node ever has two parents and no cycle can form.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::id::NodeId;
use crate::node::{Node, NodeKind, NodeReference, PropertyValue};

/// Owning store for one or more program trees.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeArena {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl NodeArena {
    pub fn new() -> Self {
        NodeArena::default()
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Creates a new root node (no parent).
    pub fn add_root(&mut self, kind: impl Into<NodeKind>) -> NodeId {
        let id = self.alloc(Node::new(kind.into(), None));
        self.roots.push(id);
        id
    }

    /// Creates a new node as the last child of `parent` in `slot`.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        slot: &str,
        kind: impl Into<NodeKind>,
    ) -> Result<NodeId, ModelError> {
        if self.node(parent).is_none() {
            return Err(ModelError::NodeNotFound { id: parent });
        }
        let id = self.alloc(Node::new(kind.into(), Some(parent)));
        self.nodes[parent.0 as usize]
            .children
            .entry(slot.to_string())
            .or_default()
            .push(id);
        Ok(id)
    }

    /// Sets (or replaces) a scalar property on a node.
    pub fn set_property(
        &mut self,
        node: NodeId,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<(), ModelError> {
        let record = self
            .nodes
            .get_mut(node.0 as usize)
            .ok_or(ModelError::NodeNotFound { id: node })?;
        record.properties.insert(name.to_string(), value.into());
        Ok(())
    }

    /// Installs an unresolved reference in a named slot.
    pub fn set_reference(
        &mut self,
        node: NodeId,
        slot: &str,
        target_identifier: &str,
    ) -> Result<(), ModelError> {
        let record = self
            .nodes
            .get_mut(node.0 as usize)
            .ok_or(ModelError::NodeNotFound { id: node })?;
        record
            .references
            .insert(slot.to_string(), NodeReference::new(target_identifier));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    /// Looks up a node, erroring if absent.
    pub fn get(&self, id: NodeId) -> Result<&Node, ModelError> {
        self.node(id).ok_or(ModelError::NodeNotFound { id })
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(Node::kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    /// All children of a node across every slot, in slot order then list order.
    pub fn all_children(&self, id: NodeId) -> Vec<NodeId> {
        match self.node(id) {
            Some(node) => node.children.values().flatten().copied().collect(),
            None => Vec::new(),
        }
    }

    /// The root of the tree containing `id`.
    pub fn root_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Breadth-first traversal of the subtree under `id`, inclusive.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut queue = vec![id];
        let mut next = 0;
        while next < queue.len() {
            let current = queue[next];
            next += 1;
            result.push(current);
            queue.extend(self.all_children(current));
        }
        result
    }

    /// All node IDs in the arena, in creation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }
}
