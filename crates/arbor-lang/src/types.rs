//! The sample language's type system: `Any`, `Num`, `Int`, `Str`.

use arbor_sem::{SemError, SupertypeRelations, TypeLattice, TypeTable};
use arbor_sem::Ty;

/// Handles to the registered types.
#[derive(Debug, Clone, Copy)]
pub struct ArborTypes {
    pub any: Ty,
    pub num: Ty,
    pub int: Ty,
    pub string: Ty,
}

pub fn register(table: &mut TypeTable) -> Result<ArborTypes, SemError> {
    Ok(ArborTypes {
        any: table.register("Any")?,
        num: table.register("Num")?,
        int: table.register("Int")?,
        string: table.register("Str")?,
    })
}

/// `Int` is a `Num`; everything concrete is an `Any`.
pub fn relations(types: ArborTypes) -> SupertypeRelations {
    SupertypeRelations::new()
        .add(types.int, [types.num])
        .add(types.num, [types.any])
        .add(types.string, [types.any])
}

/// A ready-to-use lattice with the sample types registered.
pub fn lattice(cache_capacity: Option<usize>) -> Result<(TypeLattice, ArborTypes), SemError> {
    let mut table = TypeTable::new();
    let types = register(&mut table)?;
    let lattice = TypeLattice::new(table, [relations(types)], cache_capacity);
    Ok((lattice, types))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_reaches_any_through_num() {
        let (mut lattice, types) = lattice(None).unwrap();
        assert!(lattice.is_subtype_of(types.int, types.num));
        assert!(lattice.is_subtype_of(types.int, types.any));
        assert!(!lattice.is_subtype_of(types.string, types.num));
    }
}
