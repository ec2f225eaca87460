//! The semantic evaluator: drives solvers to a joint fixpoint.
//!
//! Each pass iterates every solver in registration order. Passes repeat
//! until all solvers report `Done`. Stall detection is by the union of
//! waiting sets: when a pass blocks on exactly the same non-empty set of
//! queries as the pass before, those queries can never be answered, and
//! the evaluation fails with the stuck query identities.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use arbor_model::{NodeId, RefSlot};
use arbor_query::{QueryId, QueryStatus};

use crate::diag::Diagnostic;
use crate::error::SemError;
use crate::queries::{SemKey, SemValue, RESOLVE, TYPE_OF};
use crate::scope::ScopeId;
use crate::solve::{IterationResult, Solver};
use crate::table::Ty;
use crate::world::World;

/// Runs a fixed list of solvers over one world.
#[derive(Default)]
pub struct SemanticEvaluator {
    solvers: Vec<Box<dyn Solver>>,
}

impl SemanticEvaluator {
    pub fn new() -> Self {
        SemanticEvaluator {
            solvers: Vec::new(),
        }
    }

    pub fn with_solver(mut self, solver: Box<dyn Solver>) -> Self {
        self.solvers.push(solver);
        self
    }

    /// Runs initialization, the iteration loop, and conclusion, producing a
    /// read-only semantic model.
    pub fn evaluate(&mut self, world: &mut World) -> Result<SemanticModel, SemError> {
        for solver in &mut self.solvers {
            solver.initialize(world)?;
        }

        let mut previous: Option<BTreeSet<QueryId<SemKey>>> = None;
        let mut passes = 0u32;
        loop {
            passes += 1;
            let mut waiting = BTreeSet::new();
            let mut all_done = true;
            let mut progress = false;
            for solver in &mut self.solvers {
                match solver.iterate(world)? {
                    IterationResult::Progress => {
                        progress = true;
                        all_done = false;
                    }
                    IterationResult::Waiting(on) => {
                        all_done = false;
                        waiting.extend(on);
                    }
                    IterationResult::Done => {}
                }
            }
            waiting.extend(world.engine.take_waiting());
            debug!(passes, waiting = waiting.len(), progress, "evaluation pass");

            if all_done {
                break;
            }
            // A non-empty waiting set repeated verbatim can never shrink in a
            // later pass, no matter how much unrelated progress other solvers
            // report. A repeated empty set with no progress is the same stall.
            if previous.as_ref() == Some(&waiting) && (!waiting.is_empty() || !progress) {
                return Err(SemError::Deadlock {
                    passes,
                    stuck: waiting.iter().map(|id| id.to_string()).collect(),
                });
            }
            previous = Some(waiting);
        }

        for solver in &mut self.solvers {
            solver.conclude(world)?;
        }
        Ok(snapshot(world))
    }
}

fn snapshot(world: &mut World) -> SemanticModel {
    let ids: Vec<NodeId> = world.facts.arena.ids().collect();
    let mut types = BTreeMap::new();
    for id in ids {
        if let Some(SemValue::Type(ty)) = world.engine.resolved(TYPE_OF, &SemKey::Node(id)) {
            types.insert(id, *ty);
        }
    }

    let scopes: BTreeMap<NodeId, ScopeId> = world.facts.scopes.scope_assignments().collect();

    let slots: Vec<RefSlot> = world
        .facts
        .scopes
        .pending_lookups()
        .map(|(slot, _)| slot.clone())
        .collect();
    let mut resolutions = BTreeMap::new();
    for slot in slots {
        if let QueryStatus::Resolved(SemValue::Target(target)) =
            world
                .engine
                .get(&world.facts, RESOLVE, SemKey::Ref(slot.clone()))
        {
            resolutions.insert(slot, target);
        }
    }

    SemanticModel {
        types,
        scopes,
        resolutions,
        diagnostics: world.diagnostics.items().to_vec(),
    }
}

/// Read-only result of a successful evaluation.
#[derive(Debug, Clone)]
pub struct SemanticModel {
    types: BTreeMap<NodeId, Ty>,
    scopes: BTreeMap<NodeId, ScopeId>,
    resolutions: BTreeMap<RefSlot, Option<NodeId>>,
    diagnostics: Vec<Diagnostic>,
}

impl SemanticModel {
    /// The concluded type of a node, if it took part in inference.
    pub fn type_of(&self, node: NodeId) -> Option<Ty> {
        self.types.get(&node).copied()
    }

    /// The scope a node was traversed under.
    pub fn scope_for(&self, node: NodeId) -> Option<ScopeId> {
        self.scopes.get(&node).copied()
    }

    /// The target a reference resolved to; `None` both for unknown slots
    /// and for names that were not in scope.
    pub fn resolve(&self, slot: &RefSlot) -> Option<NodeId> {
        self.resolutions.get(slot).copied().flatten()
    }

    /// Whether the slot was looked up at all, and what it found.
    pub fn resolution(&self, slot: &RefSlot) -> Option<Option<NodeId>> {
        self.resolutions.get(slot).copied()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::TypeLattice;
    use crate::table::TypeTable;
    use arbor_model::NodeArena;
    use arbor_query::DefName;

    fn empty_world() -> World {
        World::new(
            NodeArena::new(),
            TypeLattice::new(TypeTable::new(), [], None),
        )
        .unwrap()
    }

    /// A solver that waits on a query forever.
    struct StuckSolver {
        on: DefName,
    }

    impl Solver for StuckSolver {
        fn name(&self) -> &'static str {
            "stuck"
        }

        fn initialize(&mut self, _world: &mut World) -> Result<(), SemError> {
            Ok(())
        }

        fn iterate(&mut self, _world: &mut World) -> Result<IterationResult, SemError> {
            Ok(IterationResult::Waiting(BTreeSet::from([QueryId::new(
                self.on,
                SemKey::Node(NodeId(0)),
            )])))
        }

        fn conclude(&mut self, _world: &mut World) -> Result<(), SemError> {
            Ok(())
        }
    }

    /// A solver that needs a fixed number of passes before finishing.
    struct CountdownSolver {
        remaining: u32,
    }

    impl Solver for CountdownSolver {
        fn name(&self) -> &'static str {
            "countdown"
        }

        fn initialize(&mut self, _world: &mut World) -> Result<(), SemError> {
            Ok(())
        }

        fn iterate(&mut self, _world: &mut World) -> Result<IterationResult, SemError> {
            if self.remaining == 0 {
                return Ok(IterationResult::Done);
            }
            self.remaining -= 1;
            Ok(IterationResult::Progress)
        }

        fn conclude(&mut self, _world: &mut World) -> Result<(), SemError> {
            Ok(())
        }
    }

    #[test]
    fn evaluation_with_no_solvers_succeeds() {
        let mut world = empty_world();
        let model = SemanticEvaluator::new().evaluate(&mut world).unwrap();
        assert!(model.diagnostics().is_empty());
    }

    #[test]
    fn solvers_making_progress_are_not_deadlocked() {
        let mut world = empty_world();
        let model = SemanticEvaluator::new()
            .with_solver(Box::new(CountdownSolver { remaining: 5 }))
            .evaluate(&mut world);
        assert!(model.is_ok());
    }

    #[test]
    fn mutually_stuck_solvers_deadlock_with_stuck_identities() {
        let mut world = empty_world();
        let result = SemanticEvaluator::new()
            .with_solver(Box::new(StuckSolver {
                on: DefName("fact_a"),
            }))
            .with_solver(Box::new(StuckSolver {
                on: DefName("fact_b"),
            }))
            .evaluate(&mut world);
        match result {
            Err(SemError::Deadlock { stuck, .. }) => {
                assert_eq!(stuck.len(), 2);
                assert!(stuck[0].contains("fact_a"));
                assert!(stuck[1].contains("fact_b"));
            }
            other => panic!("expected deadlock, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn a_progressing_solver_does_not_postpone_a_repeated_waiting_set() {
        let mut world = empty_world();
        let result = SemanticEvaluator::new()
            .with_solver(Box::new(CountdownSolver { remaining: 50 }))
            .with_solver(Box::new(StuckSolver {
                on: DefName("never"),
            }))
            .evaluate(&mut world);
        match result {
            Err(SemError::Deadlock { passes, stuck }) => {
                // The waiting set is {never(..)} from pass one on; the second
                // pass repeats it, so the countdown's progress is irrelevant.
                assert_eq!(passes, 2);
                assert_eq!(stuck.len(), 1);
                assert!(stuck[0].contains("never"));
            }
            other => panic!("expected deadlock, got {:?}", other.map(|_| ())),
        }
    }
}
