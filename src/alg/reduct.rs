//! Reducts: the same carrier with a subset of the operations.

use std::sync::Arc;

use crate::alg::algebra::{BasicAlgebra, SmallAlgebra};
use crate::alg::conlat::congruence_lattice::CongruenceLattice;
use crate::alg::op::operation::Operation;
use crate::alg::op::operation_symbol::OperationSymbol;
use crate::alg::sublat::SubalgebraLattice;
use crate::error::{UACalcError, UACalcResult};

#[derive(Debug)]
pub struct Reduct {
    base: BasicAlgebra,
    parent: Arc<dyn SmallAlgebra>,
}

impl Reduct {
    /// Keep only the listed symbols, in the order given.
    pub fn new(
        name: impl Into<String>,
        parent: Arc<dyn SmallAlgebra>,
        symbols: &[OperationSymbol],
    ) -> UACalcResult<Self> {
        let name = name.into();
        let mut ops: Vec<Arc<dyn Operation>> = Vec::with_capacity(symbols.len());
        for sym in symbols {
            match parent.operation(sym) {
                Some(op) => ops.push(op.clone()),
                None => {
                    return Err(UACalcError::signature(format!(
                        "reduct {}: parent {} has no operation {} of arity {}",
                        name,
                        parent.name(),
                        sym.name(),
                        sym.arity()
                    )));
                }
            }
        }
        Ok(Reduct {
            base: BasicAlgebra::new(name, parent.cardinality(), ops)?,
            parent,
        })
    }

    pub fn super_algebra(&self) -> &Arc<dyn SmallAlgebra> {
        &self.parent
    }
}

impl SmallAlgebra for Reduct {
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
    fn reduct_forgets_operations() {
        let parent: Arc<dyn SmallAlgebra> = Arc::new(
            BasicAlgebra::from_tables(
                "2",
                2,
                &[("meet", 2, vec![0, 0, 0, 1]), ("join", 2, vec![0, 1, 1, 1])],
            )
            .unwrap(),
        );
        let r = Reduct::new("meet-only", parent, &[OperationSymbol::new("meet", 2)]).unwrap();
        assert_eq!(r.operations().len(), 1);
        assert_eq!(r.cardinality(), 2);
        // The semilattice reduct has type set {5}.
        let types = r.con().type_set().unwrap();
        assert_eq!(types.iter().copied().collect::<Vec<u8>>(), vec![5]);
    }

    #[test]
    fn unknown_symbol_is_signature_mismatch() {
        let parent: Arc<dyn SmallAlgebra> = Arc::new(
            BasicAlgebra::from_tables("2", 2, &[("meet", 2, vec![0, 0, 0, 1])]).unwrap(),
        );
        let err = Reduct::new("bad", parent, &[OperationSymbol::new("join", 2)]);
        assert!(matches!(err, Err(UACalcError::SignatureMismatch { .. })));
    }
}
