//! Shared evaluation state, threaded explicitly through every solver.

use std::sync::Arc;

use arbor_model::NodeArena;
use arbor_query::QueryEngine;

use crate::diag::Diagnostics;
use crate::error::SemError;
use crate::infer::InferCx;
use crate::lattice::TypeLattice;
use crate::queries::{Facts, ResolveRef, SemKey, SemValue, RESOLVE, SCOPE_BUILT, TYPE_OF};
use crate::scope::ScopeGraph;

/// Everything one evaluation operates on. There are no globals; each field
/// is borrowed where needed, and the split between `facts` and the rest is
/// what lets a running query read the scope graph while the engine is busy.
pub struct World {
    pub facts: Facts,
    pub engine: QueryEngine<Facts, SemKey, SemValue>,
    pub lattice: TypeLattice,
    pub infer: InferCx,
    pub diagnostics: Diagnostics,
}

impl World {
    /// Builds a world over a program tree, with the semantic query
    /// definitions registered.
    pub fn new(arena: NodeArena, lattice: TypeLattice) -> Result<Self, SemError> {
        let mut engine = QueryEngine::new();
        engine.register_input(SCOPE_BUILT)?;
        engine.register_input(TYPE_OF)?;
        engine.register_derived(RESOLVE, Arc::new(ResolveRef))?;
        Ok(World {
            facts: Facts {
                arena,
                scopes: ScopeGraph::new(),
            },
            engine,
            lattice,
            infer: InferCx::new(),
            diagnostics: Diagnostics::new(),
        })
    }
}
