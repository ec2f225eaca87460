//! The type registry: named registration of semantic types.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::SemError;

/// Handle to a registered semantic type.
///
/// The numeric value is the registration index in the owning [`TypeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ty(pub u32);

impl Ty {
    /// The pre-registered "don't know" type. Assigned to variables that end
    /// an evaluation without any constraint, when the caller asks for it.
    pub const UNKNOWN: Ty = Ty(0);
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ty{}", self.0)
    }
}

/// Name-to-type registry. Registration order fixes each type's [`Ty`] index.
#[derive(Debug, Clone)]
pub struct TypeTable {
    names: IndexMap<String, Ty>,
}

impl TypeTable {
    pub fn new() -> Self {
        let mut names = IndexMap::new();
        names.insert("unknown".to_string(), Ty::UNKNOWN);
        TypeTable { names }
    }

    /// Registers a new type under `name`. Names are unique.
    pub fn register(&mut self, name: impl Into<String>) -> Result<Ty, SemError> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(SemError::DuplicateType { name });
        }
        let ty = Ty(self.names.len() as u32);
        self.names.insert(name, ty);
        Ok(ty)
    }

    pub fn get(&self, name: &str) -> Option<Ty> {
        self.names.get(name).copied()
    }

    pub fn name_of(&self, ty: Ty) -> Option<&str> {
        self.names.get_index(ty.0 as usize).map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}
