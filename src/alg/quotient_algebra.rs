//! Quotients modulo a congruence.

use std::sync::Arc;

use crate::alg::algebra::{BasicAlgebra, SmallAlgebra};
use crate::alg::conlat::congruence_lattice::CongruenceLattice;
use crate::alg::conlat::partition::Partition;
use crate::alg::op::operation::{IntOperation, Operation};
use crate::alg::sublat::SubalgebraLattice;
use crate::error::{UACalcError, UACalcResult};
use crate::util::horner::{horner_inv_uniform_into, horner_table_size};

/// `A/theta`: elements are the blocks of `theta`, canonically
/// represented by their minima, indexed in root order. Well defined
/// because `theta` is verified to be a congruence of the parent.
#[derive(Debug)]
pub struct QuotientAlgebra {
    base: BasicAlgebra,
    parent: Arc<dyn SmallAlgebra>,
    congruence: Partition,
    representatives: Vec<usize>,
}

impl QuotientAlgebra {
    pub fn new(parent: Arc<dyn SmallAlgebra>, theta: &Partition) -> UACalcResult<Self> {
        Self::with_name(
            format!("{}/{}", parent.name(), theta),
            parent,
            theta,
        )
    }

    pub fn with_name(
        name: impl Into<String>,
        parent: Arc<dyn SmallAlgebra>,
        theta: &Partition,
    ) -> UACalcResult<Self> {
        let name = name.into();
        let n = parent.cardinality();
        if theta.universe_size() != n {
            return Err(UACalcError::invariant(format!(
                "quotient {}: partition on {} elements, parent {} has {}",
                name,
                theta.universe_size(),
                parent.name(),
                n
            )));
        }
        Self::check_respected(&name, parent.as_ref(), theta)?;
        let representatives = theta.representatives();
        let m = representatives.len();
        let mut ops: Vec<Arc<dyn Operation>> = Vec::with_capacity(parent.operations().len());
        for op in parent.operations() {
            let arity = op.arity();
            let size = horner_table_size(arity, m).ok_or_else(|| {
                UACalcError::out_of_range(format!(
                    "quotient {}: table size overflow for {}",
                    name,
                    op.symbol()
                ))
            })?;
            let mut table = Vec::with_capacity(size);
            let mut block_args = vec![0; arity];
            let mut parent_args = vec![0; arity];
            for k in 0..size {
                horner_inv_uniform_into(k, m, &mut block_args)?;
                for (p, &b) in parent_args.iter_mut().zip(&block_args) {
                    *p = representatives[b];
                }
                let v = op.int_value_at(&parent_args)?;
                table.push(theta.block_index(v));
            }
            ops.push(Arc::new(IntOperation::new(op.symbol().clone(), m, table)?));
        }
        Ok(QuotientAlgebra {
            base: BasicAlgebra::new(name, m, ops)?,
            parent,
            congruence: theta.clone(),
            representatives,
        })
    }

    /// Verify that every operation respects the partition: for any
    /// argument tuple, replacing each argument by its block root leaves
    /// the value in the same block.
    fn check_respected(
        name: &str,
        parent: &dyn SmallAlgebra,
        theta: &Partition,
    ) -> UACalcResult<()> {
        let n = parent.cardinality();
        for op in parent.operations() {
            let arity = op.arity();
            let size = horner_table_size(arity, n).ok_or_else(|| {
                UACalcError::out_of_range(format!(
                    "quotient {}: respect check overflow for {}",
                    name,
                    op.symbol()
                ))
            })?;
            let mut args = vec![0; arity];
            let mut rep_args = vec![0; arity];
            for k in 0..size {
                horner_inv_uniform_into(k, n, &mut args)?;
                for (r, &a) in rep_args.iter_mut().zip(&args) {
                    *r = theta.representative(a);
                }
                let v = op.int_value_at(&args)?;
                let vr = op.int_value_at(&rep_args)?;
                if !theta.is_related(v, vr) {
                    return Err(UACalcError::invariant(format!(
                        "quotient {}: {} does not respect the partition at {:?}",
                        name,
                        op.symbol(),
                        args
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn super_algebra(&self) -> &Arc<dyn SmallAlgebra> {
        &self.parent
    }

    pub fn congruence(&self) -> &Partition {
        &self.congruence
    }

    /// The parent element canonically representing block `i`.
    pub fn representative(&self, block: usize) -> UACalcResult<usize> {
        self.representatives.get(block).copied().ok_or_else(|| {
            UACalcError::out_of_range(format!(
                "quotient {}: block {} of {}",
                self.base.name(),
                block,
                self.representatives.len()
            ))
        })
    }

    /// The canonical map `A -> A/theta`.
    pub fn canonical_homomorphism(&self, parent_elem: usize) -> UACalcResult<usize> {
        if parent_elem >= self.parent.cardinality() {
            return Err(UACalcError::out_of_range(format!(
                "quotient {}: element {} outside parent of size {}",
                self.base.name(),
                parent_elem,
                self.parent.cardinality()
            )));
        }
        Ok(self.congruence.block_index(parent_elem))
    }
}

impl SmallAlgebra for QuotientAlgebra {
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

    fn z4() -> Arc<dyn SmallAlgebra> {
        let mut table = Vec::new();
        for a in 0..4 {
            for b in 0..4 {
                table.push((a + b) % 4);
            }
        }
        Arc::new(BasicAlgebra::from_tables("Z4", 4, &[("+", 2, table)]).unwrap())
    }

    #[test]
    fn z4_mod_two_is_z2() {
        let parent = z4();
        let theta = Partition::from_blocks(4, &[vec![0, 2], vec![1, 3]]).unwrap();
        let q = QuotientAlgebra::new(parent, &theta).unwrap();
        assert_eq!(q.cardinality(), 2);
        let plus = &q.operations()[0];
        assert_eq!(plus.int_value_at(&[1, 1]).unwrap(), 0);
        assert_eq!(q.canonical_homomorphism(3).unwrap(), 1);
        assert_eq!(q.representative(1).unwrap(), 1);
    }

    #[test]
    fn non_congruence_is_rejected() {
        let parent = z4();
        // {0,1} vs {2},{3} is not a congruence of Z4.
        let theta = Partition::from_blocks(4, &[vec![0, 1]]).unwrap();
        assert!(QuotientAlgebra::new(parent, &theta).is_err());
    }
}
