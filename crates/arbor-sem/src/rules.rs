//! Scope traversal rules: per-kind contributions to the scope graph.
//!
//! Traversal visits one node at a time under an incoming scope and dispatches
//! on the node's kind through a table built and validated up front. A rule
//! declares names, opens scopes, registers reference lookups, and queues
//! children for traversal; kinds without a rule get the default behavior of
//! traversing every child under the incoming scope. Whether a declaration is
//! visible to earlier siblings is the rule's own choice of ordering between
//! `declare` and `traverse`.

use std::collections::VecDeque;

use indexmap::IndexMap;

use arbor_model::{Node, NodeArena, NodeId, NodeKind, RefSlot};

use crate::error::SemError;
use crate::scope::{Namespace, ScopeGraph, ScopeId};

/// One node kind's contribution to scope building.
pub trait ScopeRule {
    fn apply(&self, node: NodeId, scope: ScopeId, cx: &mut ScopeCx<'_>) -> Result<(), SemError>;
}

/// Handle given to a running scope rule.
pub struct ScopeCx<'a> {
    arena: &'a NodeArena,
    scopes: &'a mut ScopeGraph,
    queue: &'a mut VecDeque<(NodeId, ScopeId)>,
}

impl<'a> ScopeCx<'a> {
    pub(crate) fn new(
        arena: &'a NodeArena,
        scopes: &'a mut ScopeGraph,
        queue: &'a mut VecDeque<(NodeId, ScopeId)>,
    ) -> Self {
        ScopeCx {
            arena,
            scopes,
            queue,
        }
    }

    pub fn arena(&self) -> &NodeArena {
        self.arena
    }

    /// Looks up the node record, erroring if the ID is dangling.
    pub fn node(&self, id: NodeId) -> Result<&Node, SemError> {
        Ok(self.arena.get(id)?)
    }

    /// A required string property, as rule code reads names.
    pub fn name_property(&self, id: NodeId, name: &str) -> Result<String, SemError> {
        self.node(id)?
            .property(name)
            .and_then(|value| value.as_str())
            .map(str::to_string)
            .ok_or_else(|| SemError::MissingProperty {
                node: id,
                name: name.to_string(),
            })
    }

    /// Opens a fresh scope that sees through to `inherit_from`.
    pub fn new_scope(
        &mut self,
        label: impl Into<String>,
        inherit_from: ScopeId,
        edge_label: impl Into<String>,
    ) -> ScopeId {
        let scope = self.scopes.add_scope(label);
        self.scopes.inherit(scope, inherit_from, edge_label);
        scope
    }

    /// Opens a fresh scope with no inheritance.
    pub fn isolated_scope(&mut self, label: impl Into<String>) -> ScopeId {
        self.scopes.add_scope(label)
    }

    pub fn inherit(&mut self, scope: ScopeId, from: ScopeId, label: impl Into<String>) {
        self.scopes.inherit(scope, from, label);
    }

    pub fn declare(
        &mut self,
        scope: ScopeId,
        namespace: Namespace,
        name: impl Into<String>,
        node: NodeId,
    ) {
        self.scopes.declare(scope, namespace, name, node);
    }

    /// Queues a child for traversal under `scope`. Queue order is source
    /// order, so sibling rules run in the order they were queued.
    pub fn traverse(&mut self, child: NodeId, scope: ScopeId) {
        self.queue.push_back((child, scope));
    }

    /// Queues every child of `node`, in slot order, under `scope`.
    pub fn traverse_children(&mut self, node: NodeId, scope: ScopeId) {
        for child in self.arena.all_children(node) {
            self.queue.push_back((child, scope));
        }
    }

    /// Registers the reference in `slot` for later resolution in `scope`.
    pub fn reference(
        &mut self,
        node: NodeId,
        slot: &str,
        namespace: Namespace,
        scope: ScopeId,
    ) -> Result<(), SemError> {
        let identifier = self
            .node(node)?
            .reference(slot)
            .map(|reference| reference.target.clone())
            .ok_or_else(|| SemError::MissingReference {
                node,
                slot: slot.to_string(),
            })?;
        self.scopes
            .register_lookup(RefSlot::new(node, slot), namespace, scope, identifier);
        Ok(())
    }
}

/// Kind-keyed dispatch table for scope rules.
#[derive(Default)]
pub struct ScopeRuleSet {
    rules: IndexMap<NodeKind, Box<dyn ScopeRule>>,
}

impl ScopeRuleSet {
    pub fn new() -> Self {
        ScopeRuleSet::default()
    }

    /// Registers a rule for one node kind; at most one rule per kind.
    pub fn register(
        &mut self,
        kind: impl Into<NodeKind>,
        rule: Box<dyn ScopeRule>,
    ) -> Result<(), SemError> {
        let kind = kind.into();
        if self.rules.contains_key(&kind) {
            return Err(SemError::DuplicateRule {
                kind: kind.as_str().to_string(),
            });
        }
        self.rules.insert(kind, rule);
        Ok(())
    }

    /// Dispatches to the kind's rule, or the default of traversing every
    /// child under the incoming scope.
    pub fn apply(
        &self,
        kind: &NodeKind,
        node: NodeId,
        scope: ScopeId,
        cx: &mut ScopeCx<'_>,
    ) -> Result<(), SemError> {
        match self.rules.get(kind) {
            Some(rule) => rule.apply(node, scope, cx),
            None => {
                cx.traverse_children(node, scope);
                Ok(())
            }
        }
    }
}
