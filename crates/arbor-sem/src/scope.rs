//! The scope graph: named declarations, inheritance edges, and lookup.
//!
//! Scopes form a directed graph. Each scope carries an insertion-ordered list
//! of declarations (namespace, name, node); `Inherit` edges point from a
//! scope to the scopes it sees through. Lookup checks local declarations
//! first, scanning newest-first so a later declaration of the same name
//! shadows an earlier one, then follows inherited scopes depth-first in edge
//! insertion order. The graph may contain cycles; lookup carries a visited
//! set and terminates regardless.

use std::collections::{HashMap, HashSet};
use std::fmt;

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::Directed;
use tracing::trace;

use arbor_model::{NodeId, RefSlot};

/// Handle to one scope in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(pub u32);

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope{}", self.0)
    }
}

impl ScopeId {
    fn index(self) -> NodeIndex {
        NodeIndex::new(self.0 as usize)
    }

    fn from_index(index: NodeIndex) -> Self {
        ScopeId(index.index() as u32)
    }
}

/// Partition of the declaration space; lookups only see their own namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Namespace(pub &'static str);

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone)]
struct Declaration {
    namespace: Namespace,
    name: String,
    node: NodeId,
}

#[derive(Debug, Clone)]
struct ScopeData {
    label: String,
    declarations: Vec<Declaration>,
}

#[derive(Debug, Clone)]
struct InheritEdge {
    label: String,
}

/// A reference lookup registered during traversal, resolved later as the
/// `resolve` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLookup {
    pub namespace: Namespace,
    pub scope: ScopeId,
    pub identifier: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScopeGraph {
    graph: StableGraph<ScopeData, InheritEdge, Directed>,
    scope_of: HashMap<NodeId, ScopeId>,
    pending: HashMap<RefSlot, PendingLookup>,
}

impl ScopeGraph {
    pub fn new() -> Self {
        ScopeGraph::default()
    }

    pub fn add_scope(&mut self, label: impl Into<String>) -> ScopeId {
        let index = self.graph.add_node(ScopeData {
            label: label.into(),
            declarations: Vec::new(),
        });
        ScopeId::from_index(index)
    }

    /// Makes `scope` see through to `from`. Edge order is lookup order.
    pub fn inherit(&mut self, scope: ScopeId, from: ScopeId, label: impl Into<String>) {
        self.graph.add_edge(
            scope.index(),
            from.index(),
            InheritEdge { label: label.into() },
        );
    }

    pub fn declare(&mut self, scope: ScopeId, namespace: Namespace, name: impl Into<String>, node: NodeId) {
        let name = name.into();
        trace!(%scope, %namespace, name, %node, "declare");
        if let Some(data) = self.graph.node_weight_mut(scope.index()) {
            data.declarations.push(Declaration {
                namespace,
                name,
                node,
            });
        }
    }

    pub fn label(&self, scope: ScopeId) -> Option<&str> {
        self.graph
            .node_weight(scope.index())
            .map(|data| data.label.as_str())
    }

    /// The scope each node was traversed under.
    pub fn set_scope_of(&mut self, node: NodeId, scope: ScopeId) {
        self.scope_of.insert(node, scope);
    }

    pub fn scope_of(&self, node: NodeId) -> Option<ScopeId> {
        self.scope_of.get(&node).copied()
    }

    pub fn scope_assignments(&self) -> impl Iterator<Item = (NodeId, ScopeId)> + '_ {
        self.scope_of.iter().map(|(&node, &scope)| (node, scope))
    }

    /// Records a reference occurrence for later resolution.
    pub fn register_lookup(
        &mut self,
        slot: RefSlot,
        namespace: Namespace,
        scope: ScopeId,
        identifier: impl Into<String>,
    ) {
        self.pending.insert(
            slot,
            PendingLookup {
                namespace,
                scope,
                identifier: identifier.into(),
            },
        );
    }

    pub fn pending(&self, slot: &RefSlot) -> Option<&PendingLookup> {
        self.pending.get(slot)
    }

    pub fn pending_lookups(&self) -> impl Iterator<Item = (&RefSlot, &PendingLookup)> {
        self.pending.iter()
    }

    /// Resolves `name` in `namespace`, starting at `scope`.
    ///
    /// Local declarations win over inherited ones, and among local
    /// declarations the latest wins. Inherited scopes are searched
    /// depth-first in the order their edges were added. Absence is an
    /// ordinary `None`, not an error.
    pub fn lookup(&self, scope: ScopeId, namespace: Namespace, name: &str) -> Option<NodeId> {
        let mut visited = HashSet::new();
        self.lookup_in(scope, namespace, name, &mut visited)
    }

    fn lookup_in(
        &self,
        scope: ScopeId,
        namespace: Namespace,
        name: &str,
        visited: &mut HashSet<ScopeId>,
    ) -> Option<NodeId> {
        if !visited.insert(scope) {
            return None;
        }
        let data = self.graph.node_weight(scope.index())?;
        for declaration in data.declarations.iter().rev() {
            if declaration.namespace == namespace && declaration.name == name {
                return Some(declaration.node);
            }
        }
        for target in self.inherited(scope) {
            if let Some(found) = self.lookup_in(target, namespace, name, visited) {
                return Some(found);
            }
        }
        None
    }

    /// Outgoing inheritance targets in edge insertion order.
    fn inherited(&self, scope: ScopeId) -> Vec<ScopeId> {
        // petgraph iterates outgoing edges newest-first; reverse to get
        // insertion order.
        let mut targets: Vec<ScopeId> = self
            .graph
            .edges(scope.index())
            .map(|edge| ScopeId::from_index(petgraph::visit::EdgeRef::target(&edge)))
            .collect();
        targets.reverse();
        targets
    }

    pub fn scope_count(&self) -> usize {
        self.graph.node_count()
    }
}
