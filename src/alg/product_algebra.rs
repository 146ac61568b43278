//! Finite direct products and powers.
//!
//! An element of `A0 x ... x A{k-1}` is the mixed-radix Horner code of
//! its coordinate vector; operations act coordinatewise through the
//! factor operations, decoding and re-encoding on the fly.

use std::fmt;
use std::sync::Arc;

use crate::alg::algebra::{BasicAlgebra, SmallAlgebra};
use crate::alg::conlat::congruence_lattice::CongruenceLattice;
use crate::alg::conlat::partition::Partition;
use crate::alg::op::operation::{check_args, Operation};
use crate::alg::op::operation_symbol::OperationSymbol;
use crate::alg::sublat::SubalgebraLattice;
use crate::error::{UACalcError, UACalcResult};
use crate::util::horner::{horner, horner_inv};

/// One coordinatewise operation of a product.
struct ProductOperation {
    symbol: OperationSymbol,
    factor_ops: Vec<Arc<dyn Operation>>,
    sizes: Vec<usize>,
    set_size: usize,
}

impl fmt::Debug for ProductOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProductOperation")
            .field("symbol", &self.symbol)
            .field("factors", &self.sizes.len())
            .finish()
    }
}

impl Operation for ProductOperation {
    fn symbol(&self) -> &OperationSymbol {
        &self.symbol
    }

    fn set_size(&self) -> usize {
        self.set_size
    }

    fn int_value_at(&self, args: &[usize]) -> UACalcResult<usize> {
        check_args(self, args)?;
        let arity = self.arity();
        let num_factors = self.sizes.len();
        // Decode every argument into its coordinate vector.
        let mut coords: Vec<Vec<usize>> = Vec::with_capacity(arity);
        for &a in args {
            coords.push(horner_inv(a, &self.sizes)?);
        }
        let mut result = Vec::with_capacity(num_factors);
        let mut point: smallvec::SmallVec<[usize; 4]> = smallvec::smallvec![0; arity];
        for j in 0..num_factors {
            for (i, c) in coords.iter().enumerate() {
                point[i] = c[j];
            }
            result.push(self.factor_ops[j].int_value_at(&point)?);
        }
        horner(&result, &self.sizes)
    }
}

/// The direct product of finitely many similar algebras.
#[derive(Debug)]
pub struct ProductAlgebra {
    base: BasicAlgebra,
    factors: Vec<Arc<dyn SmallAlgebra>>,
    sizes: Vec<usize>,
}

impl ProductAlgebra {
    pub fn new(
        name: impl Into<String>,
        factors: Vec<Arc<dyn SmallAlgebra>>,
    ) -> UACalcResult<Self> {
        let name = name.into();
        if factors.is_empty() {
            return Err(UACalcError::invariant(format!(
                "product {}: at least one factor is required",
                name
            )));
        }
        let st = factors[0].similarity_type();
        for f in &factors[1..] {
            if f.similarity_type() != st {
                return Err(UACalcError::signature(format!(
                    "product {}: factor {} has similarity type {}, expected {}",
                    name,
                    f.name(),
                    f.similarity_type(),
                    st
                )));
            }
        }
        let sizes: Vec<usize> = factors.iter().map(|f| f.cardinality()).collect();
        let mut size: usize = 1;
        for &s in &sizes {
            size = size.checked_mul(s).ok_or_else(|| {
                UACalcError::out_of_range(format!("product {}: carrier size overflow", name))
            })?;
        }
        let mut ops: Vec<Arc<dyn Operation>> = Vec::new();
        for (op_index, sym) in st.symbols().iter().enumerate() {
            let factor_ops: Vec<Arc<dyn Operation>> = factors
                .iter()
                .map(|f| f.operations()[op_index].clone())
                .collect();
            ops.push(Arc::new(ProductOperation {
                symbol: sym.clone(),
                factor_ops,
                sizes: sizes.clone(),
                set_size: size,
            }));
        }
        Ok(ProductAlgebra {
            base: BasicAlgebra::new(name, size, ops)?,
            factors,
            sizes,
        })
    }

    /// The product of two algebras, `A x B`.
    pub fn pair(a: Arc<dyn SmallAlgebra>, b: Arc<dyn SmallAlgebra>) -> UACalcResult<Self> {
        let name = format!("{}x{}", a.name(), b.name());
        ProductAlgebra::new(name, vec![a, b])
    }

    pub fn factors(&self) -> &[Arc<dyn SmallAlgebra>] {
        &self.factors
    }

    pub fn num_factors(&self) -> usize {
        self.factors.len()
    }

    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Product index of a coordinate vector.
    pub fn index_of(&self, coords: &[usize]) -> UACalcResult<usize> {
        horner(coords, &self.sizes)
    }

    /// Coordinate vector of a product index.
    pub fn coords_of(&self, index: usize) -> UACalcResult<Vec<usize>> {
        horner_inv(index, &self.sizes)
    }

    /// Kernel of the projection onto coordinate `k`: elements are
    /// related iff their `k`-th coordinates agree.
    pub fn projection_kernel(&self, k: usize) -> UACalcResult<Partition> {
        if k >= self.factors.len() {
            return Err(UACalcError::out_of_range(format!(
                "product {}: projection onto coordinate {} of {}",
                self.base.name(),
                k,
                self.factors.len()
            )));
        }
        let n = self.base.cardinality();
        let mut blocks: Vec<Vec<usize>> = vec![Vec::new(); self.sizes[k]];
        for e in 0..n {
            let coords = self.coords_of(e)?;
            blocks[coords[k]].push(e);
        }
        Partition::from_blocks(n, &blocks)
    }
}

impl SmallAlgebra for ProductAlgebra {
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

/// `A^k`: the k-fold product of one algebra, indexed in uniform Horner
/// encoding.
#[derive(Debug)]
pub struct PowerAlgebra {
    product: ProductAlgebra,
    power: usize,
}

impl PowerAlgebra {
    pub fn new(root: Arc<dyn SmallAlgebra>, power: usize) -> UACalcResult<Self> {
        if power == 0 {
            return Err(UACalcError::invariant(
                "power algebra: the exponent must be positive",
            ));
        }
        let name = format!("{}^{}", root.name(), power);
        let factors: Vec<Arc<dyn SmallAlgebra>> =
            (0..power).map(|_| root.clone()).collect();
        Ok(PowerAlgebra {
            product: ProductAlgebra::new(name, factors)?,
            power,
        })
    }

    pub fn power(&self) -> usize {
        self.power
    }

    pub fn root(&self) -> &Arc<dyn SmallAlgebra> {
        &self.product.factors()[0]
    }

    pub fn as_product(&self) -> &ProductAlgebra {
        &self.product
    }
}

impl SmallAlgebra for PowerAlgebra {
    fn name(&self) -> &str {
        self.product.name()
    }

    fn cardinality(&self) -> usize {
        self.product.cardinality()
    }

    fn operations(&self) -> &[Arc<dyn Operation>] {
        self.product.operations()
    }

    fn con(&self) -> &CongruenceLattice {
        self.product.con()
    }

    fn sub(&self) -> &SubalgebraLattice {
        self.product.sub()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alg::algebra::BasicAlgebra;

    fn z2() -> Arc<dyn SmallAlgebra> {
        Arc::new(BasicAlgebra::from_tables("Z2", 2, &[("+", 2, vec![0, 1, 1, 0])]).unwrap())
    }

    fn z3() -> Arc<dyn SmallAlgebra> {
        Arc::new(
            BasicAlgebra::from_tables("Z3", 3, &[("+", 2, vec![0, 1, 2, 1, 2, 0, 2, 0, 1])])
                .unwrap(),
        )
    }

    #[test]
    fn product_acts_coordinatewise() {
        let p = ProductAlgebra::pair(z2(), z3()).unwrap();
        assert_eq!(p.cardinality(), 6);
        // (1,2) + (1,2) = (0,1); indices: (1,2) -> 1*3+2 = 5, (0,1) -> 1.
        let plus = &p.operations()[0];
        assert_eq!(plus.int_value_at(&[5, 5]).unwrap(), 1);
        assert_eq!(p.index_of(&[1, 2]).unwrap(), 5);
        assert_eq!(p.coords_of(1).unwrap(), vec![0, 1]);
    }

    #[test]
    fn mismatched_signatures_are_rejected() {
        let a = z2();
        let b: Arc<dyn SmallAlgebra> = Arc::new(
            BasicAlgebra::from_tables("L", 2, &[("meet", 2, vec![0, 0, 0, 1])]).unwrap(),
        );
        assert!(ProductAlgebra::pair(a, b).is_err());
    }

    #[test]
    fn power_uses_uniform_encoding() {
        let sq = PowerAlgebra::new(z3(), 2).unwrap();
        assert_eq!(sq.cardinality(), 9);
        let plus = &sq.operations()[0];
        // (1,2) + (2,2) = (0,1): 1*3+2=5, 2*3+2=8, 0*3+1=1.
        assert_eq!(plus.int_value_at(&[5, 8]).unwrap(), 1);
    }

    #[test]
    fn projection_kernels_meet_to_zero() {
        let p = ProductAlgebra::pair(z2(), z3()).unwrap();
        let k0 = p.projection_kernel(0).unwrap();
        let k1 = p.projection_kernel(1).unwrap();
        assert_eq!(k0.number_of_blocks(), 2);
        assert_eq!(k1.number_of_blocks(), 3);
        assert!(k0.meet(&k1).unwrap().is_zero());
        assert!(k0.join(&k1).unwrap().is_one());
    }
}
