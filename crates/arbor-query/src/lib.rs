//! Demand-driven memoizing query engine.
//!
//! A query is a computation identified by a (definition, key) pair. The
//! engine caches one status per pair: resolved with a value, waiting on a
//! set of other queries, or terminally failed. Blocked computations are
//! abandoned and re-run from scratch on a later pass once their dependencies
//! resolve, so compute functions must be side-effect-free with respect to
//! everything outside the cache.
//!
//! Two definition flavors exist, mirroring the derived/input split of
//! incremental query databases: *derived* queries own a compute function;
//! *input* queries are resolved directly by whoever produces the fact (a
//! solver publishing "this scope is now built"). Demanding an unset input
//! yields `Waiting` on the input's own identity, which is exactly the hook
//! the iterative-solver protocol needs to express "blocked until someone
//! publishes X".

pub mod engine;
pub mod id;
pub mod status;

pub use engine::{QueryCompute, QueryCx, QueryEngine};
pub use id::{DefName, QueryId, QueryKey};
pub use status::{EngineError, QueryErr, QueryFailure, QueryStatus};
