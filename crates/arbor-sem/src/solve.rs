//! The iterative solver protocol and the two built-in solvers.
//!
//! Solvers run under a shared [`World`]. Each `iterate` call does a bounded
//! amount of work and reports whether it progressed, is blocked on queries,
//! or has finished. Because every solver reads and writes the same query
//! engine, one solver's publications are visible to the next solver within
//! the same evaluation pass.

use std::collections::{BTreeSet, VecDeque};
use std::mem;

use tracing::debug;

use arbor_model::NodeId;
use arbor_query::{QueryErr, QueryId};

use crate::error::SemError;
use crate::infer::{InferenceRuleSet, TypeCx};
use crate::queries::{SemKey, SemValue, SCOPE_BUILT, TYPE_OF};
use crate::rules::{ScopeCx, ScopeRuleSet};
use crate::scope::ScopeId;
use crate::table::Ty;
use crate::world::World;

/// Outcome of one `iterate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationResult {
    /// Work was done; another pass is worthwhile.
    Progress,
    /// Nothing could be done until the listed queries resolve.
    Waiting(BTreeSet<QueryId<SemKey>>),
    /// This solver has no work left.
    Done,
}

/// A participant in the joint fixpoint evaluation.
pub trait Solver {
    fn name(&self) -> &'static str;

    fn initialize(&mut self, world: &mut World) -> Result<(), SemError>;

    fn iterate(&mut self, world: &mut World) -> Result<IterationResult, SemError>;

    /// Runs after every solver reported `Done`.
    fn conclude(&mut self, world: &mut World) -> Result<(), SemError>;
}

// ---------------------------------------------------------------------------
// Scope solver
// ---------------------------------------------------------------------------

/// Builds the scope graph by traversing each tree from its root, then
/// publishes `scope_built` for every root.
pub struct ScopeSolver {
    rules: ScopeRuleSet,
    queue: VecDeque<(NodeId, ScopeId)>,
    published: bool,
}

impl ScopeSolver {
    pub fn new(rules: ScopeRuleSet) -> Self {
        ScopeSolver {
            rules,
            queue: VecDeque::new(),
            published: false,
        }
    }
}

impl Solver for ScopeSolver {
    fn name(&self) -> &'static str {
        "scopes"
    }

    fn initialize(&mut self, world: &mut World) -> Result<(), SemError> {
        let roots: Vec<NodeId> = world.facts.arena.roots().to_vec();
        for root in roots {
            let scope = world.facts.scopes.add_scope(format!("root {root}"));
            self.queue.push_back((root, scope));
        }
        Ok(())
    }

    fn iterate(&mut self, world: &mut World) -> Result<IterationResult, SemError> {
        if self.queue.is_empty() && self.published {
            return Ok(IterationResult::Done);
        }

        // Scope rules never block on queries, so the whole traversal fits
        // in one pass.
        while let Some((node, scope)) = self.queue.pop_front() {
            let facts = &mut world.facts;
            facts.scopes.set_scope_of(node, scope);
            let Some(kind) = facts.arena.kind(node) else {
                continue;
            };
            let mut cx = ScopeCx::new(&facts.arena, &mut facts.scopes, &mut self.queue);
            self.rules.apply(kind, node, scope, &mut cx)?;
        }

        let roots: Vec<NodeId> = world.facts.arena.roots().to_vec();
        for root in roots {
            world
                .engine
                .set(SCOPE_BUILT, SemKey::Node(root), SemValue::Built)?;
        }
        self.published = true;
        debug!(
            scopes = world.facts.scopes.scope_count(),
            "scope building complete"
        );
        Ok(IterationResult::Progress)
    }

    fn conclude(&mut self, _world: &mut World) -> Result<(), SemError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Type solver
// ---------------------------------------------------------------------------

/// Applies inference rules node by node, runs constraint propagation each
/// pass, and publishes `type_of` facts at conclusion.
pub struct TypeSolver {
    rules: InferenceRuleSet,
    pending: Vec<NodeId>,
    default_ty: Ty,
}

impl TypeSolver {
    /// `default_ty` is assigned to variables that finish evaluation without
    /// any constraint.
    pub fn new(rules: InferenceRuleSet, default_ty: Ty) -> Self {
        TypeSolver {
            rules,
            pending: Vec::new(),
            default_ty,
        }
    }
}

impl Solver for TypeSolver {
    fn name(&self) -> &'static str {
        "types"
    }

    fn initialize(&mut self, world: &mut World) -> Result<(), SemError> {
        self.pending = world.facts.arena.ids().collect();
        Ok(())
    }

    fn iterate(&mut self, world: &mut World) -> Result<IterationResult, SemError> {
        let mut waiting = BTreeSet::new();
        let mut still_pending = Vec::new();
        let mut failures: Vec<(NodeId, String)> = Vec::new();
        let mut applied = false;

        let pending = mem::take(&mut self.pending);
        {
            let mut cx = TypeCx::new(&mut world.engine, &world.facts, &mut world.infer);
            for node in pending {
                let Some(kind) = cx.arena().kind(node).cloned() else {
                    continue;
                };
                match self.rules.apply(&kind, node, &mut cx) {
                    Ok(()) => applied = true,
                    Err(QueryErr::Blocked(on)) => {
                        waiting.extend(on);
                        still_pending.push(node);
                    }
                    // A failed rule drops its node and reports; the rest of
                    // the program is still typed.
                    Err(QueryErr::Failed(failure)) => {
                        failures.push((node, failure.message));
                    }
                }
            }
        }
        for (node, message) in failures {
            world.diagnostics.error(message, Some(node));
        }
        self.pending = still_pending;

        let changed = world.infer.propagate(&mut world.lattice, &mut world.diagnostics);

        if applied || changed {
            Ok(IterationResult::Progress)
        } else if !self.pending.is_empty() {
            Ok(IterationResult::Waiting(waiting))
        } else {
            Ok(IterationResult::Done)
        }
    }

    fn conclude(&mut self, world: &mut World) -> Result<(), SemError> {
        let assignments = world.infer.conclude(self.default_ty);
        debug!(nodes = assignments.len(), "publishing concluded types");
        for (node, ty) in assignments {
            world
                .engine
                .set(TYPE_OF, SemKey::Node(node), SemValue::Type(ty))?;
        }
        Ok(())
    }
}
