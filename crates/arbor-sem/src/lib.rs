//! Semantic resolution over program trees: scopes, types, and references.
//!
//! The crate is organized around one evaluation loop. A [`World`] holds the
//! program tree, the scope graph, the type lattice, the inference context,
//! and the query engine. Solvers ([`ScopeSolver`], [`TypeSolver`], or any
//! [`Solver`] implementation) run interleaved under the
//! [`SemanticEvaluator`] until they jointly reach a fixpoint; blocked work
//! is expressed as waiting on queries, and a waiting set that stops
//! shrinking is reported as a deadlock instead of looping forever. The
//! result is a read-only [`SemanticModel`] answering `type_of`,
//! `scope_for`, and `resolve`, plus accumulated diagnostics.

pub mod cache;
pub mod diag;
pub mod error;
pub mod evaluate;
pub mod infer;
pub mod lattice;
pub mod queries;
pub mod rules;
pub mod scope;
pub mod solve;
pub mod table;
pub mod world;

pub use cache::LraCache;
pub use diag::{Diagnostic, Diagnostics, Severity};
pub use error::SemError;
pub use evaluate::{SemanticEvaluator, SemanticModel};
pub use infer::{Constraint, InferCx, InferenceRule, InferenceRuleSet, Term, TypeCx, VarId};
pub use lattice::{SupertypeRelations, TypeLattice};
pub use queries::{Facts, ResolveRef, SemKey, SemValue, RESOLVE, SCOPE_BUILT, TYPE_OF};
pub use rules::{ScopeCx, ScopeRule, ScopeRuleSet};
pub use scope::{Namespace, PendingLookup, ScopeGraph, ScopeId};
pub use solve::{IterationResult, ScopeSolver, Solver, TypeSolver};
pub use table::{Ty, TypeTable};
pub use world::World;
