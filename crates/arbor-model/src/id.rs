//! Stable ID newtype for tree nodes.
//!
//! `NodeId` is a distinct newtype wrapper over `u32` so node identities
//! cannot be confused with other numeric handles at the type level. IDs are
//! reference-stable: an arena never reuses or renumbers them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable node identifier within a [`NodeArena`](crate::arena::NodeArena).
///
/// `Ord` is derived so that ID sets used in diagnostics iterate
/// deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
