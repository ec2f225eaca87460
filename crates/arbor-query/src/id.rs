//! Query identities.

use std::fmt;
use std::hash::Hash;

/// Name of a query definition. Definitions are compared by this name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DefName(pub &'static str);

impl fmt::Display for DefName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Bounds every query key type must satisfy.
///
/// `Ord` keeps waiting sets and deadlock reports deterministic.
pub trait QueryKey: Clone + Eq + Hash + Ord + fmt::Debug {}

impl<T: Clone + Eq + Hash + Ord + fmt::Debug> QueryKey for T {}

/// Identity of one query instance: which definition, applied to which key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryId<K> {
    pub def: DefName,
    pub key: K,
}

impl<K> QueryId<K> {
    pub fn new(def: DefName, key: K) -> Self {
        QueryId { def, key }
    }
}

impl<K: fmt::Debug> fmt::Display for QueryId<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.def, self.key)
    }
}
