//! A small sample language exercising the semantic core end to end.
//!
//! Programs are trees of `function` / `block` / `val` / literal / `binary` /
//! `ref` nodes. [`analyze`] validates the tree against the language's
//! schemas, then runs the scope and type solvers to a joint fixpoint and
//! returns the semantic model together with handles to the registered types.

use thiserror::Error;
use tracing::debug;

use arbor_model::{ModelError, NodeArena};
use arbor_sem::{
    ScopeSolver, SemError, SemanticEvaluator, SemanticModel, Ty, TypeSolver, World,
};

pub mod schemas;
pub mod scoping;
pub mod session;
pub mod types;
pub mod typing;

pub use session::{ModelEvent, ModelEventKind, Session};
pub use types::ArborTypes;

#[derive(Debug, Error)]
pub enum LangError {
    #[error("the program tree is structurally invalid ({} problems)", .0.len())]
    Invalid(Vec<ModelError>),

    #[error(transparent)]
    Sem(#[from] SemError),
}

/// Result of a successful analysis.
pub struct Analysis {
    pub model: SemanticModel,
    pub types: ArborTypes,
}

/// Validates and evaluates one program tree.
pub fn analyze(arena: NodeArena) -> Result<Analysis, LangError> {
    let schemas = schemas::schema_set().map_err(|e| LangError::Invalid(vec![e]))?;
    let errors = schemas.validate(&arena);
    if !errors.is_empty() {
        return Err(LangError::Invalid(errors));
    }

    let (lattice, types) = types::lattice(Some(1024))?;
    let mut world = World::new(arena, lattice)?;
    let mut evaluator = SemanticEvaluator::new()
        .with_solver(Box::new(ScopeSolver::new(scoping::scope_rules()?)))
        .with_solver(Box::new(TypeSolver::new(
            typing::inference_rules(types, &schemas)?,
            Ty::UNKNOWN,
        )));
    let model = evaluator.evaluate(&mut world)?;
    debug!(
        diagnostics = model.diagnostics().len(),
        "analysis complete"
    );
    Ok(Analysis { model, types })
}
