//! Query definitions shared by the solvers.
//!
//! Three definitions cover the scoping/typing interleave:
//!
//! - `scope_built` (input): published by the scope solver once a tree's
//!   scopes and declarations are complete. Everything that reads the scope
//!   graph demands this first, so lookups into half-built scopes wait
//!   instead of resolving against partial data.
//! - `type_of` (input): published by the type solver at conclusion, one per
//!   node with an inference variable.
//! - `resolve` (derived): reference resolution, a pure function of the
//!   registered lookup and the finished scope graph.

use arbor_model::{NodeArena, NodeId, RefSlot};
use arbor_query::{DefName, QueryCompute, QueryCx, QueryErr};

use crate::scope::ScopeGraph;
use crate::table::Ty;

pub const SCOPE_BUILT: DefName = DefName("scope_built");
pub const TYPE_OF: DefName = DefName("type_of");
pub const RESOLVE: DefName = DefName("resolve");

/// Key space of the semantic queries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SemKey {
    /// A tree root (`scope_built`) or any node (`type_of`).
    Node(NodeId),
    /// A reference occurrence (`resolve`).
    Ref(RefSlot),
}

/// Value space of the semantic queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemValue {
    /// Marker value of `scope_built`.
    Built,
    /// A node's concluded type.
    Type(Ty),
    /// A reference's target; `None` when the name is not in scope.
    Target(Option<NodeId>),
}

impl SemValue {
    pub fn as_type(&self) -> Option<Ty> {
        match self {
            SemValue::Type(ty) => Some(*ty),
            _ => None,
        }
    }

    pub fn as_target(&self) -> Option<Option<NodeId>> {
        match self {
            SemValue::Target(target) => Some(*target),
            _ => None,
        }
    }
}

/// The read-only state the derived queries compute over.
#[derive(Debug, Clone, Default)]
pub struct Facts {
    pub arena: NodeArena,
    pub scopes: ScopeGraph,
}

/// Compute function of the `resolve` query.
pub struct ResolveRef;

impl QueryCompute<Facts, SemKey, SemValue> for ResolveRef {
    fn compute(
        &self,
        key: &SemKey,
        facts: &Facts,
        cx: &mut QueryCx<'_, Facts, SemKey, SemValue>,
    ) -> Result<SemValue, QueryErr<SemKey>> {
        let slot = match key {
            SemKey::Ref(slot) => slot,
            SemKey::Node(node) => {
                return Err(QueryErr::fail(format!(
                    "resolve expects a reference key, got node {node}"
                )))
            }
        };
        // Wait for the scope solver to finish the tree this reference
        // lives in.
        let root = facts.arena.root_of(slot.node);
        cx.demand(SCOPE_BUILT, SemKey::Node(root))?;
        let pending = facts.scopes.pending(slot).ok_or_else(|| {
            QueryErr::fail(format!("no lookup was registered for reference {slot}"))
        })?;
        let target = facts
            .scopes
            .lookup(pending.scope, pending.namespace, &pending.identifier);
        Ok(SemValue::Target(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Namespace;
    use arbor_query::{QueryEngine, QueryStatus};
    use std::sync::Arc;

    const VARS: Namespace = Namespace("variables");

    fn engine() -> QueryEngine<Facts, SemKey, SemValue> {
        let mut engine = QueryEngine::new();
        engine.register_input(SCOPE_BUILT).unwrap();
        engine.register_input(TYPE_OF).unwrap();
        engine.register_derived(RESOLVE, Arc::new(ResolveRef)).unwrap();
        engine
    }

    #[test]
    fn resolve_waits_until_scopes_are_built() {
        let mut facts = Facts::default();
        let root = facts.arena.add_root("block");
        let reference = facts.arena.add_child(root, "statements", "ref").unwrap();
        let decl = facts.arena.add_child(root, "statements", "val").unwrap();
        let scope = facts.scopes.add_scope("root");
        facts.scopes.declare(scope, VARS, "x", decl);
        let slot = RefSlot::new(reference, "target");
        facts.scopes.register_lookup(slot.clone(), VARS, scope, "x");

        let mut engine = engine();
        let status = engine.get(&facts, RESOLVE, SemKey::Ref(slot.clone()));
        assert!(matches!(status, QueryStatus::Waiting(_)));

        engine.set(SCOPE_BUILT, SemKey::Node(root), SemValue::Built).unwrap();
        let status = engine.get(&facts, RESOLVE, SemKey::Ref(slot));
        assert_eq!(status, QueryStatus::Resolved(SemValue::Target(Some(decl))));
    }

    #[test]
    fn resolve_of_missing_name_is_none_not_an_error() {
        let mut facts = Facts::default();
        let root = facts.arena.add_root("block");
        let reference = facts.arena.add_child(root, "statements", "ref").unwrap();
        let scope = facts.scopes.add_scope("root");
        let slot = RefSlot::new(reference, "target");
        facts.scopes.register_lookup(slot.clone(), VARS, scope, "ghost");

        let mut engine = engine();
        engine.set(SCOPE_BUILT, SemKey::Node(root), SemValue::Built).unwrap();
        let status = engine.get(&facts, RESOLVE, SemKey::Ref(slot));
        assert_eq!(status, QueryStatus::Resolved(SemValue::Target(None)));
    }

    #[test]
    fn resolve_without_a_registered_lookup_fails() {
        let mut facts = Facts::default();
        let root = facts.arena.add_root("block");
        let reference = facts.arena.add_child(root, "statements", "ref").unwrap();
        facts.scopes.add_scope("root");

        let mut engine = engine();
        engine.set(SCOPE_BUILT, SemKey::Node(root), SemValue::Built).unwrap();
        let slot = RefSlot::new(reference, "target");
        let status = engine.get(&facts, RESOLVE, SemKey::Ref(slot));
        assert!(matches!(status, QueryStatus::Failed(_)));
    }
}
