//! Subalgebras on a dense re-indexing of a subuniverse.

use std::sync::Arc;

use crate::alg::algebra::{BasicAlgebra, SmallAlgebra};
use crate::alg::conlat::congruence_lattice::CongruenceLattice;
use crate::alg::conlat::partition::Partition;
use crate::alg::op::operation::{IntOperation, Operation};
use crate::alg::sublat::{BasicSet, SubalgebraLattice};
use crate::error::{UACalcError, UACalcResult};
use crate::util::horner::{horner_inv_uniform_into, horner_table_size};

/// The algebra induced on a subuniverse of a parent algebra. The child
/// carrier is `{0,..,m-1}` with element `i` standing for the `i`-th
/// smallest member of the subuniverse; operations are the restrictions,
/// re-tabulated over child indices.
#[derive(Debug)]
pub struct Subalgebra {
    base: BasicAlgebra,
    parent: Arc<dyn SmallAlgebra>,
    subuniverse: Vec<usize>,
}

impl Subalgebra {
    pub fn new(
        name: impl Into<String>,
        parent: Arc<dyn SmallAlgebra>,
        subuniverse: &BasicSet,
    ) -> UACalcResult<Self> {
        let name = name.into();
        let elems = subuniverse.elements().to_vec();
        for &e in &elems {
            if e >= parent.cardinality() {
                return Err(UACalcError::invariant(format!(
                    "subalgebra {}: element {} outside parent {} of size {}",
                    name,
                    e,
                    parent.name(),
                    parent.cardinality()
                )));
            }
        }
        let m = elems.len();
        let mut ops: Vec<Arc<dyn Operation>> = Vec::with_capacity(parent.operations().len());
        for op in parent.operations() {
            let arity = op.arity();
            let size = horner_table_size(arity, m).ok_or_else(|| {
                UACalcError::out_of_range(format!(
                    "subalgebra {}: table size overflow for {}",
                    name,
                    op.symbol()
                ))
            })?;
            let mut table = Vec::with_capacity(size);
            let mut child_args = vec![0; arity];
            let mut parent_args = vec![0; arity];
            for k in 0..size {
                horner_inv_uniform_into(k, m, &mut child_args)?;
                for (p, &c) in parent_args.iter_mut().zip(&child_args) {
                    *p = elems[c];
                }
                let v = op.int_value_at(&parent_args)?;
                let child_v = elems.binary_search(&v).map_err(|_| {
                    UACalcError::invariant(format!(
                        "subalgebra {}: {} maps into {} outside the subuniverse",
                        name,
                        op.symbol(),
                        v
                    ))
                })?;
                table.push(child_v);
            }
            ops.push(Arc::new(IntOperation::new(op.symbol().clone(), m, table)?));
        }
        Ok(Subalgebra {
            base: BasicAlgebra::new(name, m, ops)?,
            parent,
            subuniverse: elems,
        })
    }

    pub fn super_algebra(&self) -> &Arc<dyn SmallAlgebra> {
        &self.parent
    }

    pub fn subuniverse(&self) -> &[usize] {
        &self.subuniverse
    }

    /// Child index of a parent element, if it belongs to the
    /// subuniverse.
    pub fn index_of(&self, parent_elem: usize) -> Option<usize> {
        self.subuniverse.binary_search(&parent_elem).ok()
    }

    /// Parent element of a child index.
    pub fn element_of(&self, child_index: usize) -> UACalcResult<usize> {
        self.subuniverse.get(child_index).copied().ok_or_else(|| {
            UACalcError::out_of_range(format!(
                "subalgebra {}: index {} exceeds size {}",
                self.base.name(),
                child_index,
                self.subuniverse.len()
            ))
        })
    }

    /// Restrict a partition of the parent carrier to the subuniverse.
    pub fn restrict_partition(&self, par: &Partition) -> UACalcResult<Partition> {
        if par.universe_size() != self.parent.cardinality() {
            return Err(UACalcError::invariant(format!(
                "subalgebra {}: partition on {} elements, parent has {}",
                self.base.name(),
                par.universe_size(),
                self.parent.cardinality()
            )));
        }
        let m = self.subuniverse.len();
        let mut blocks: ahash::AHashMap<usize, Vec<usize>> = ahash::AHashMap::new();
        for (child, &parent_elem) in self.subuniverse.iter().enumerate() {
            blocks
                .entry(par.representative(parent_elem))
                .or_default()
                .push(child);
        }
        let block_list: Vec<Vec<usize>> = blocks.into_values().collect();
        Partition::from_blocks(m, &block_list)
    }
}

impl SmallAlgebra for Subalgebra {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn cardinality(&self) -> usize {
        self.base.cardinality()
    }

    fn operations(&self) -> &[Arc<dyn Operation>] {
        self.base.operations()
    }

    fn con(&self) -> &CongruenceLattice {
        self.base.con()
    }

    fn sub(&self) -> &SubalgebraLattice {
        self.base.sub()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alg::algebra::BasicAlgebra;

    #[test]
    fn restriction_reindexes_densely() {
        // f(x) = x+2 mod 6 restricted to the evens {0,2,4}.
        let table: Vec<usize> = (0..6).map(|x| (x + 2) % 6).collect();
        let parent: Arc<dyn SmallAlgebra> = Arc::new(
            BasicAlgebra::from_tables("C6", 6, &[("f", 1, table)]).unwrap(),
        );
        let sub = Subalgebra::new(
            "evens",
            parent,
            &BasicSet::new(vec![0, 2, 4]),
        )
        .unwrap();
        assert_eq!(sub.cardinality(), 3);
        // Child 0 = parent 0, f(0) = 2 = child 1.
        let f = &sub.operations()[0];
        assert_eq!(f.int_value_at(&[0]).unwrap(), 1);
        assert_eq!(sub.index_of(4), Some(2));
        assert_eq!(sub.element_of(1).unwrap(), 2);
    }

    #[test]
    fn non_closed_set_is_rejected() {
        let table: Vec<usize> = (0..6).map(|x| (x + 2) % 6).collect();
        let parent: Arc<dyn SmallAlgebra> = Arc::new(
            BasicAlgebra::from_tables("C6", 6, &[("f", 1, table)]).unwrap(),
        );
        let err = Subalgebra::new("bad", parent, &BasicSet::new(vec![0, 1]));
        assert!(err.is_err());
    }

    #[test]
    fn partition_restriction() {
        let table: Vec<usize> = (0..6).map(|x| (x + 2) % 6).collect();
        let parent: Arc<dyn SmallAlgebra> = Arc::new(
            BasicAlgebra::from_tables("C6", 6, &[("f", 1, table)]).unwrap(),
        );
        let sub =
            Subalgebra::new("evens", parent, &BasicSet::new(vec![0, 2, 4])).unwrap();
        // Parent partition mod 3: {0,3},{1,4},{2,5}.
        let par =
            Partition::from_blocks(6, &[vec![0, 3], vec![1, 4], vec![2, 5]]).unwrap();
        let restricted = sub.restrict_partition(&par).unwrap();
        // Children 0,1,2 are parents 0,2,4 in distinct mod-3 classes.
        assert!(restricted.is_zero());
    }
}
