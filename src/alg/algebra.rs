//! The algebra kernel: a finite carrier with an indexed operation list
//! and lazily built congruence and subalgebra lattices.

use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

use crate::alg::conlat::congruence_lattice::CongruenceLattice;
use crate::alg::op::operation::Operation;
use crate::alg::op::operation_symbol::{OperationSymbol, SimilarityType};
use crate::alg::sublat::SubalgebraLattice;
use crate::error::{UACalcError, UACalcResult};
use crate::util::horner::power_checked;

/// A finite algebra on the carrier `{0,..,cardinality-1}`.
///
/// Implementations are immutable once constructed apart from the
/// one-shot `con`/`sub` caches, so they can be shared freely.
pub trait SmallAlgebra: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn cardinality(&self) -> usize;

    fn operations(&self) -> &[Arc<dyn Operation>];

    fn operation(&self, sym: &OperationSymbol) -> Option<&Arc<dyn Operation>> {
        self.operations().iter().find(|op| op.symbol() == sym)
    }

    fn operation_by_name(&self, name: &str, arity: usize) -> Option<&Arc<dyn Operation>> {
        self.operation(&OperationSymbol::new(name, arity))
    }

    fn similarity_type(&self) -> SimilarityType {
        SimilarityType::new_unchecked(
            self.operations().iter().map(|op| op.symbol().clone()).collect(),
        )
    }

    /// The congruence lattice, built on first access and cached.
    fn con(&self) -> &CongruenceLattice;

    /// The subalgebra lattice, built on first access and cached.
    fn sub(&self) -> &SubalgebraLattice;

    fn make_operation_tables(&self) -> UACalcResult<()> {
        for op in self.operations() {
            op.make_table()?;
        }
        Ok(())
    }

    fn max_arity(&self) -> usize {
        self.operations().iter().map(|op| op.arity()).max().unwrap_or(0)
    }

    fn is_unary(&self) -> bool {
        self.operations().iter().all(|op| op.arity() <= 1)
    }

    /// Sum of `n^arity` over the operations; None on overflow.
    fn input_size(&self) -> Option<usize> {
        let mut total: usize = 0;
        for op in self.operations() {
            total = total.checked_add(power_checked(self.cardinality(), op.arity())?)?;
        }
        Some(total)
    }

    /// True when every operation is idempotent.
    fn is_idempotent(&self) -> UACalcResult<bool> {
        for op in self.operations() {
            if !op.is_idempotent()? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// The concrete kernel algebra.
#[derive(Debug)]
pub struct BasicAlgebra {
    name: String,
    size: usize,
    operations: Vec<Arc<dyn Operation>>,
    con: OnceCell<CongruenceLattice>,
    sub: OnceCell<SubalgebraLattice>,
}

impl BasicAlgebra {
    pub fn new(
        name: impl Into<String>,
        size: usize,
        operations: Vec<Arc<dyn Operation>>,
    ) -> UACalcResult<Self> {
        let name = name.into();
        for op in &operations {
            if op.set_size() != size {
                return Err(UACalcError::invariant(format!(
                    "algebra {}: operation {} acts on a carrier of size {}, algebra has {}",
                    name,
                    op.symbol(),
                    op.set_size(),
                    size
                )));
            }
        }
        for (i, a) in operations.iter().enumerate() {
            for b in &operations[i + 1..] {
                if a.symbol() == b.symbol() {
                    return Err(UACalcError::invariant(format!(
                        "algebra {}: duplicate operation symbol {} of arity {}",
                        name,
                        a.symbol(),
                        a.arity()
                    )));
                }
            }
        }
        Ok(BasicAlgebra {
            name,
            size,
            operations,
            con: OnceCell::new(),
            sub: OnceCell::new(),
        })
    }

    /// Convenience constructor from flat tables.
    pub fn from_tables(
        name: impl Into<String>,
        size: usize,
        tables: &[(&str, usize, Vec<usize>)],
    ) -> UACalcResult<Self> {
        let mut ops: Vec<Arc<dyn Operation>> = Vec::with_capacity(tables.len());
        for (op_name, arity, table) in tables {
            ops.push(crate::alg::op::operations::make_int_operation(
                op_name,
                *arity,
                size,
                table.clone(),
            )?);
        }
        BasicAlgebra::new(name, size, ops)
    }
}

impl SmallAlgebra for BasicAlgebra {
    fn name(&self) -> &str {
        &self.name
    }

    fn cardinality(&self) -> usize {
        self.size
    }

    fn operations(&self) -> &[Arc<dyn Operation>] {
        &self.operations
    }

    fn con(&self) -> &CongruenceLattice {
        self.con.get_or_init(|| {
            CongruenceLattice::new(self.name.clone(), self.size, self.operations.clone())
        })
    }

    fn sub(&self) -> &SubalgebraLattice {
        self.sub.get_or_init(|| {
            SubalgebraLattice::new(self.name.clone(), self.size, self.operations.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alg::op::operations;

    #[test]
    fn rejects_mismatched_carrier() {
        let op = operations::make_int_operation("f", 1, 2, vec![1, 0]).unwrap();
        assert!(BasicAlgebra::new("A", 3, vec![op]).is_err());
    }

    #[test]
    fn rejects_duplicate_symbols() {
        let f1 = operations::make_int_operation("f", 1, 2, vec![1, 0]).unwrap();
        let f2 = operations::make_int_operation("f", 1, 2, vec![0, 1]).unwrap();
        assert!(BasicAlgebra::new("A", 2, vec![f1, f2]).is_err());
    }

    #[test]
    fn similarity_type_lists_symbols_in_order() {
        let alg = BasicAlgebra::from_tables(
            "L",
            2,
            &[("meet", 2, vec![0, 0, 0, 1]), ("join", 2, vec![0, 1, 1, 1])],
        )
        .unwrap();
        let st = alg.similarity_type();
        assert_eq!(st.symbols().len(), 2);
        assert_eq!(st.symbols()[0].name(), "meet");
        assert_eq!(alg.max_arity(), 2);
        assert!(!alg.is_unary());
        assert_eq!(alg.input_size(), Some(8));
    }
}
