//! The query engine: definition table, memo table, in-flight tracking.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::trace;

use crate::id::{DefName, QueryId, QueryKey};
use crate::status::{EngineError, QueryErr, QueryFailure, QueryStatus};

/// Compute function of a derived query.
///
/// `world` is a read-only view of whatever shared state the queries are
/// defined over (the semantic layer passes its scope graph and friends);
/// `cx` lets the computation demand other queries. Computations may run
/// several times before succeeding, so they must not mutate anything
/// observable outside the engine's cache.
pub trait QueryCompute<W, K, V> {
    fn compute(&self, key: &K, world: &W, cx: &mut QueryCx<'_, W, K, V>) -> Result<V, QueryErr<K>>;
}

enum DefEntry<W, K, V> {
    /// Resolved externally via [`QueryEngine::set`].
    Input,
    /// Computed on demand.
    Derived(Arc<dyn QueryCompute<W, K, V>>),
}

/// Handle given to a running computation for demanding other queries.
pub struct QueryCx<'a, W, K, V> {
    engine: &'a mut QueryEngine<W, K, V>,
    world: &'a W,
}

impl<W, K: QueryKey, V: Clone> QueryCx<'_, W, K, V> {
    /// Requests another query's value.
    ///
    /// Returns `Err(Blocked)` if the dependency is unresolved (including
    /// in-flight, which is how circular query dependencies surface), and
    /// `Err(Failed)` if the dependency failed; failure is contagious and
    /// non-retryable.
    pub fn demand(&mut self, def: DefName, key: K) -> Result<V, QueryErr<K>> {
        let id = QueryId::new(def, key.clone());
        match self.engine.get(self.world, def, key) {
            QueryStatus::Resolved(value) => Ok(value),
            QueryStatus::Waiting(on) => Err(QueryErr::Blocked(on)),
            QueryStatus::Failed(failure) => Err(QueryErr::Failed(QueryFailure::new(format!(
                "dependency {id} failed: {failure}"
            )))),
        }
    }
}

/// Memoizing computation store keyed by (definition, key).
pub struct QueryEngine<W, K, V> {
    defs: HashMap<DefName, DefEntry<W, K, V>>,
    slots: HashMap<QueryId<K>, QueryStatus<K, V>>,
    in_flight: Vec<QueryId<K>>,
    waiting_log: BTreeSet<QueryId<K>>,
}

impl<W, K: QueryKey, V: Clone> QueryEngine<W, K, V> {
    pub fn new() -> Self {
        QueryEngine {
            defs: HashMap::new(),
            slots: HashMap::new(),
            in_flight: Vec::new(),
            waiting_log: BTreeSet::new(),
        }
    }

    /// Registers an input definition, resolved via [`set`](Self::set).
    pub fn register_input(&mut self, def: DefName) -> Result<(), EngineError> {
        self.insert_def(def, DefEntry::Input)
    }

    /// Registers a derived definition with its compute function.
    pub fn register_derived(
        &mut self,
        def: DefName,
        compute: Arc<dyn QueryCompute<W, K, V>>,
    ) -> Result<(), EngineError> {
        self.insert_def(def, DefEntry::Derived(compute))
    }

    fn insert_def(&mut self, def: DefName, entry: DefEntry<W, K, V>) -> Result<(), EngineError> {
        if self.defs.contains_key(&def) {
            return Err(EngineError::DuplicateDefinition { name: def.0 });
        }
        self.defs.insert(def, entry);
        Ok(())
    }

    /// Resolves an input query directly.
    pub fn set(&mut self, def: DefName, key: K, value: V) -> Result<(), EngineError> {
        match self.defs.get(&def) {
            None => Err(EngineError::UnknownDefinition { name: def.0 }),
            Some(DefEntry::Derived(_)) => Err(EngineError::NotAnInput { name: def.0 }),
            Some(DefEntry::Input) => {
                self.slots
                    .insert(QueryId::new(def, key), QueryStatus::Resolved(value));
                Ok(())
            }
        }
    }

    /// Peeks at a query's cached status without driving a computation.
    pub fn status(&self, def: DefName, key: &K) -> Option<&QueryStatus<K, V>> {
        self.slots.get(&QueryId::new(def, key.clone()))
    }

    /// Returns the cached value of a resolved query, if any.
    pub fn resolved(&self, def: DefName, key: &K) -> Option<&V> {
        match self.status(def, key) {
            Some(QueryStatus::Resolved(value)) => Some(value),
            _ => None,
        }
    }

    /// Drains the identities every `Waiting` transition blocked on since the
    /// last call. The evaluator unions this into its per-pass waiting set.
    pub fn take_waiting(&mut self) -> BTreeSet<QueryId<K>> {
        std::mem::take(&mut self.waiting_log)
    }

    /// Requests a query, computing it if necessary.
    ///
    /// Resolved and failed statuses are cached and returned without
    /// recomputation; a waiting query is re-attempted from scratch.
    pub fn get(&mut self, world: &W, def: DefName, key: K) -> QueryStatus<K, V> {
        let id = QueryId::new(def, key);

        match self.slots.get(&id) {
            Some(status @ QueryStatus::Resolved(_)) | Some(status @ QueryStatus::Failed(_)) => {
                return status.clone();
            }
            _ => {}
        }

        // A query demanded while it is being computed is a circular
        // dependency; report it as blocking rather than recursing forever.
        if self.in_flight.contains(&id) {
            return self.note_waiting(id.clone(), BTreeSet::from([id]));
        }

        let compute = match self.defs.get(&def) {
            Some(DefEntry::Derived(compute)) => Arc::clone(compute),
            // An unset input blocks on its own identity until published.
            Some(DefEntry::Input) => {
                return self.note_waiting(id.clone(), BTreeSet::from([id]));
            }
            None => {
                let failure =
                    QueryFailure::new(format!("no query definition registered for '{def}'"));
                let status = QueryStatus::Failed(failure);
                self.slots.insert(id, status.clone());
                return status;
            }
        };

        self.in_flight.push(id.clone());
        let key = id.key.clone();
        let result = {
            let mut cx = QueryCx { engine: self, world };
            compute.compute(&key, world, &mut cx)
        };
        self.in_flight.pop();

        let status = match result {
            Ok(value) => QueryStatus::Resolved(value),
            Err(QueryErr::Blocked(on)) => {
                trace!(query = %id, blocked_on = on.len(), "query blocked");
                return self.note_waiting(id, on);
            }
            Err(QueryErr::Failed(failure)) => QueryStatus::Failed(failure),
        };
        self.slots.insert(id, status.clone());
        status
    }

    fn note_waiting(&mut self, id: QueryId<K>, on: BTreeSet<QueryId<K>>) -> QueryStatus<K, V> {
        self.waiting_log.extend(on.iter().cloned());
        let status = QueryStatus::Waiting(on);
        self.slots.insert(id, status.clone());
        status
    }
}

impl<W, K: QueryKey, V: Clone> Default for QueryEngine<W, K, V> {
    fn default() -> Self {
        Self::new()
    }
}
