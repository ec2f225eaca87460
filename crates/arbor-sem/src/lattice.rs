//! The type lattice: declared supertype edges and reachability queries.
//!
//! The lattice is a closed world. A type is a subtype of another exactly when
//! the two are equal or a chain of declared supertype edges connects them;
//! nothing is inferred beyond what plugins declare. Declared cycles are legal
//! and make every member of the cycle a mutual subtype of the others.

use std::collections::{HashMap, HashSet, VecDeque};

use smallvec::SmallVec;

use crate::cache::LraCache;
use crate::table::{Ty, TypeTable};

/// Supertype edges contributed by one type-system plugin.
#[derive(Debug, Clone, Default)]
pub struct SupertypeRelations {
    edges: Vec<(Ty, SmallVec<[Ty; 2]>)>,
}

impl SupertypeRelations {
    pub fn new() -> Self {
        SupertypeRelations::default()
    }

    /// Declares `sup` a direct supertype of `sub`.
    pub fn add(mut self, sub: Ty, sups: impl IntoIterator<Item = Ty>) -> Self {
        self.edges.push((sub, sups.into_iter().collect()));
        self
    }
}

/// Merged view of every plugin's supertype declarations, with a bounded memo
/// cache over subtype queries.
#[derive(Debug, Clone)]
pub struct TypeLattice {
    table: TypeTable,
    supers: HashMap<Ty, SmallVec<[Ty; 2]>>,
    cache: LraCache<(Ty, Ty), bool>,
}

impl TypeLattice {
    pub fn new(
        table: TypeTable,
        relations: impl IntoIterator<Item = SupertypeRelations>,
        cache_capacity: Option<usize>,
    ) -> Self {
        let mut supers: HashMap<Ty, SmallVec<[Ty; 2]>> = HashMap::new();
        for contribution in relations {
            for (sub, sups) in contribution.edges {
                let entry = supers.entry(sub).or_default();
                for sup in sups {
                    if !entry.contains(&sup) {
                        entry.push(sup);
                    }
                }
            }
        }
        TypeLattice {
            table,
            supers,
            cache: LraCache::new(cache_capacity),
        }
    }

    pub fn table(&self) -> &TypeTable {
        &self.table
    }

    /// The type's name if registered, or its raw index for display.
    pub fn ty_name(&self, ty: Ty) -> String {
        match self.table.name_of(ty) {
            Some(name) => name.to_string(),
            None => ty.to_string(),
        }
    }

    pub fn direct_supertypes(&self, ty: Ty) -> &[Ty] {
        self.supers.get(&ty).map(SmallVec::as_slice).unwrap_or(&[])
    }

    /// Whether `sub` is a subtype of `sup`: reflexivity, or reachability over
    /// declared supertype edges. Memoized per pair.
    pub fn is_subtype_of(&mut self, sub: Ty, sup: Ty) -> bool {
        if sub == sup {
            return true;
        }
        if let Some(&cached) = self.cache.get(&(sub, sup)) {
            return cached;
        }
        let result = self.reachable(sub, sup);
        self.cache.insert((sub, sup), result);
        result
    }

    fn reachable(&self, from: Ty, to: Ty) -> bool {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            for &sup in self.direct_supertypes(current) {
                if sup == to {
                    return true;
                }
                queue.push_back(sup);
            }
        }
        false
    }

    #[cfg(test)]
    pub(crate) fn cached_pairs(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_lattice(cache_capacity: Option<usize>) -> (TypeLattice, Ty, Ty, Ty, Ty) {
        let mut table = TypeTable::new();
        let any = table.register("Any").unwrap();
        let num = table.register("Num").unwrap();
        let int = table.register("Int").unwrap();
        let str_ = table.register("Str").unwrap();
        let relations = SupertypeRelations::new()
            .add(int, [num])
            .add(num, [any])
            .add(str_, [any]);
        let lattice = TypeLattice::new(table, [relations], cache_capacity);
        (lattice, any, num, int, str_)
    }

    #[test]
    fn subtyping_is_reflexive() {
        let (mut lattice, any, num, int, str_) = sample_lattice(None);
        for ty in [any, num, int, str_, Ty::UNKNOWN] {
            assert!(lattice.is_subtype_of(ty, ty));
        }
    }

    #[test]
    fn subtyping_follows_declared_edges_transitively() {
        let (mut lattice, any, num, int, str_) = sample_lattice(None);
        assert!(lattice.is_subtype_of(int, num));
        assert!(lattice.is_subtype_of(int, any));
        assert!(lattice.is_subtype_of(str_, any));
        assert!(!lattice.is_subtype_of(num, int));
        assert!(!lattice.is_subtype_of(str_, num));
    }

    #[test]
    fn undeclared_types_relate_to_nothing_but_themselves() {
        let (mut lattice, any, ..) = sample_lattice(None);
        assert!(!lattice.is_subtype_of(Ty::UNKNOWN, any));
        assert!(!lattice.is_subtype_of(any, Ty::UNKNOWN));
    }

    #[test]
    fn declared_cycles_terminate_and_are_mutual() {
        let mut table = TypeTable::new();
        let a = table.register("A").unwrap();
        let b = table.register("B").unwrap();
        let c = table.register("C").unwrap();
        let relations = SupertypeRelations::new().add(a, [b]).add(b, [c]).add(c, [a]);
        let mut lattice = TypeLattice::new(table, [relations], None);
        assert!(lattice.is_subtype_of(a, c));
        assert!(lattice.is_subtype_of(c, a));
        assert!(lattice.is_subtype_of(b, a));
    }

    #[test]
    fn plugin_contributions_are_merged() {
        let mut table = TypeTable::new();
        let a = table.register("A").unwrap();
        let b = table.register("B").unwrap();
        let c = table.register("C").unwrap();
        let first = SupertypeRelations::new().add(a, [b]);
        let second = SupertypeRelations::new().add(a, [c]).add(a, [b]);
        let mut lattice = TypeLattice::new(table, [first, second], None);
        assert_eq!(lattice.direct_supertypes(a), &[b, c]);
        assert!(lattice.is_subtype_of(a, c));
    }

    #[test]
    fn cache_stays_within_its_bound() {
        let (mut lattice, any, num, int, str_) = sample_lattice(Some(2));
        lattice.is_subtype_of(int, num);
        lattice.is_subtype_of(int, any);
        lattice.is_subtype_of(str_, num);
        assert!(lattice.cached_pairs() <= 2);
        // Evicted pairs are recomputed, not wrong.
        assert!(lattice.is_subtype_of(int, num));
    }

    proptest! {
        /// Transitivity over the sample lattice: if a <= b and b <= c then
        /// a <= c, for every combination of the registered types.
        #[test]
        fn subtyping_is_transitive(xs in proptest::collection::vec(0u32..5, 3)) {
            let (mut lattice, ..) = sample_lattice(None);
            let (a, b, c) = (Ty(xs[0]), Ty(xs[1]), Ty(xs[2]));
            if lattice.is_subtype_of(a, b) && lattice.is_subtype_of(b, c) {
                prop_assert!(lattice.is_subtype_of(a, c));
            }
        }
    }
}
