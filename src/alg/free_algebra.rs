//! Finitely generated free algebras in the variety of a finite algebra.
//!
//! `F_V(k)` is realized as the subalgebra of `A^(|A|^k)` generated by
//! the `k` projection tuples: coordinate `j` of generator `i` is the
//! `i`-th digit of `j` in base `|A|`, so the coordinates range over all
//! assignments of the generators. Each element carries the term that
//! produced it.

use ahash::AHashMap;
use num_bigint::BigUint;
use std::sync::Arc;

use crate::alg::algebra::{BasicAlgebra, SmallAlgebra};
use crate::alg::big_product_algebra::BigProductAlgebra;
use crate::alg::closer::Closer;
use crate::alg::conlat::congruence_lattice::CongruenceLattice;
use crate::alg::op::operation::{check_args, Operation};
use crate::alg::op::operation_symbol::OperationSymbol;
use crate::alg::sublat::SubalgebraLattice;
use crate::error::{UACalcError, UACalcResult};
use crate::progress::Effort;
use crate::terms::{Term, Variable};
use crate::util::horner::{horner_inv_uniform_into, power_checked};
use crate::util::int_array::IntArray;

/// An operation of the free algebra, acting on element indices through
/// the stored coordinate vectors.
struct FreeOperation {
    symbol: OperationSymbol,
    root_op: Arc<dyn Operation>,
    elements: Arc<Vec<IntArray>>,
    index: Arc<AHashMap<IntArray, usize>>,
    set_size: usize,
}

impl std::fmt::Debug for FreeOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FreeOperation")
            .field("symbol", &self.symbol)
            .field("set_size", &self.set_size)
            .finish()
    }
}

impl Operation for FreeOperation {
    fn symbol(&self) -> &OperationSymbol {
        &self.symbol
    }

    fn set_size(&self) -> usize {
        self.set_size
    }

    fn int_value_at(&self, args: &[usize]) -> UACalcResult<usize> {
        check_args(self, args)?;
        let coords = self.elements[0].len();
        let mut ans = Vec::with_capacity(coords);
        let mut point: smallvec::SmallVec<[usize; 4]> = smallvec::smallvec![0; args.len()];
        for j in 0..coords {
            for (i, &a) in args.iter().enumerate() {
                point[i] = self.elements[a].as_slice()[j];
            }
            ans.push(self.root_op.int_value_at(&point)?);
        }
        let key = IntArray::new(ans);
        self.index.get(&key).copied().ok_or_else(|| {
            UACalcError::invariant(format!(
                "free algebra: {} produced a vector outside the closure",
                self.symbol
            ))
        })
    }
}

/// `F_V(k)` for the variety generated by a finite algebra.
#[derive(Debug)]
pub struct FreeAlgebra {
    base: BasicAlgebra,
    elements: Arc<Vec<IntArray>>,
    terms: Vec<Term>,
    variables: Vec<Variable>,
    generators: Vec<usize>,
    root_size: usize,
}

impl FreeAlgebra {
    pub fn new(root: &dyn SmallAlgebra, num_generators: usize) -> UACalcResult<Self> {
        Self::with_effort(root, num_generators, &Effort::unbounded())
    }

    pub fn with_effort(
        root: &dyn SmallAlgebra,
        num_generators: usize,
        effort: &Effort,
    ) -> UACalcResult<Self> {
        let n = root.cardinality();
        if n == 0 || num_generators == 0 {
            return Err(UACalcError::invariant(format!(
                "free algebra over {}: a nonempty root and at least one generator are required",
                root.name()
            )));
        }
        let coords = power_checked(n, num_generators).ok_or_else(|| {
            UACalcError::out_of_range(format!(
                "free algebra over {}: {}^{} coordinates overflow",
                root.name(),
                n,
                num_generators
            ))
        })?;
        // Generator i maps assignment j to its i-th digit.
        let mut gens: Vec<Vec<usize>> = vec![Vec::with_capacity(coords); num_generators];
        let mut digits = vec![0; num_generators];
        for j in 0..coords {
            horner_inv_uniform_into(j, n, &mut digits)?;
            for (i, g) in gens.iter_mut().enumerate() {
                g.push(digits[i]);
            }
        }
        let gens: Vec<IntArray> = gens.into_iter().map(IntArray::new).collect();
        let variables: Vec<Variable> = (0..num_generators).map(Variable::nth).collect();
        let envelope = BigProductAlgebra::power_of_ops(
            format!("{}^({}^{})", root.name(), n, num_generators),
            n,
            root.operations().to_vec(),
            coords,
        )?;
        let mut closer =
            Closer::new(&envelope, gens.clone()).with_term_map(&variables)?;
        let elements = closer.close(effort)?;
        let term_map = closer.term_map().ok_or_else(|| {
            UACalcError::invariant("free algebra: the closure lost its term map")
        })?;
        let mut terms: Vec<Term> = Vec::with_capacity(elements.len());
        for e in &elements {
            terms.push(term_map.get(e).cloned().ok_or_else(|| {
                UACalcError::invariant("free algebra: an element carries no term")
            })?);
        }
        let mut index = AHashMap::with_capacity(elements.len());
        for (i, e) in elements.iter().enumerate() {
            index.insert(e.clone(), i);
        }
        let mut generators: Vec<usize> = Vec::with_capacity(gens.len());
        for g in &gens {
            generators.push(*index.get(g).ok_or_else(|| {
                UACalcError::invariant("free algebra: a generator left the closure")
            })?);
        }
        let elements = Arc::new(elements);
        let index = Arc::new(index);
        let m = elements.len();
        let mut ops: Vec<Arc<dyn Operation>> = Vec::with_capacity(root.operations().len());
        for op in root.operations() {
            ops.push(Arc::new(FreeOperation {
                symbol: op.symbol().clone(),
                root_op: op.clone(),
                elements: elements.clone(),
                index: index.clone(),
                set_size: m,
            }));
        }
        let base = BasicAlgebra::new(
            format!("F({}, {})", root.name(), num_generators),
            m,
            ops,
        )?;
        Ok(FreeAlgebra {
            base,
            elements,
            terms,
            variables,
            generators,
            root_size: n,
        })
    }

    pub fn num_generators(&self) -> usize {
        self.generators.len()
    }

    /// Indices of the free generators among the elements.
    pub fn generators(&self) -> &[usize] {
        &self.generators
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// The coordinate vector realizing an element.
    pub fn element_vector(&self, index: usize) -> UACalcResult<&IntArray> {
        self.elements.get(index).ok_or_else(|| {
            UACalcError::out_of_range(format!(
                "free algebra {}: element {} of {}",
                self.base.name(),
                index,
                self.elements.len()
            ))
        })
    }

    /// A term over the generators evaluating to the element.
    pub fn term_for_element(&self, index: usize) -> UACalcResult<&Term> {
        self.terms.get(index).ok_or_else(|| {
            UACalcError::out_of_range(format!(
                "free algebra {}: element {} of {}",
                self.base.name(),
                index,
                self.terms.len()
            ))
        })
    }

    /// Cardinality of the enveloping power `|A|^(|A|^k)`.
    pub fn envelope_cardinality(&self) -> BigUint {
        let coords = self.elements.first().map(|e| e.len()).unwrap_or(0);
        let mut ans = BigUint::from(1u32);
        let base = BigUint::from(self.root_size);
        for _ in 0..coords {
            ans *= &base;
        }
        ans
    }
}

impl SmallAlgebra for FreeAlgebra {
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
    fn free_semilattice_on_two_generators() {
        let sl =
            BasicAlgebra::from_tables("sl2", 2, &[("meet", 2, vec![0, 0, 0, 1])]).unwrap();
        let f = FreeAlgebra::new(&sl, 2).unwrap();
        // Free semilattice on {x,y}: x, y, xy.
        assert_eq!(f.cardinality(), 3);
        let t = f.term_for_element(2).unwrap();
        assert_eq!(t.to_string(), "meet(x,y)");
    }

    #[test]
    fn free_z2_on_one_generator() {
        let z2 =
            BasicAlgebra::from_tables("Z2", 2, &[("+", 2, vec![0, 1, 1, 0])]).unwrap();
        let f = FreeAlgebra::new(&z2, 1).unwrap();
        // x and x + x.
        assert_eq!(f.cardinality(), 2);
        assert_eq!(f.envelope_cardinality(), BigUint::from(4u32));
        let plus = &f.operations()[0];
        let x = f.generators()[0];
        let xx = plus.int_value_at(&[x, x]).unwrap();
        assert_ne!(x, xx);
        assert_eq!(plus.int_value_at(&[xx, x]).unwrap(), x);
    }

    #[test]
    fn rejects_zero_generators() {
        let z2 =
            BasicAlgebra::from_tables("Z2", 2, &[("+", 2, vec![0, 1, 1, 0])]).unwrap();
        assert!(FreeAlgebra::new(&z2, 0).is_err());
    }
}
