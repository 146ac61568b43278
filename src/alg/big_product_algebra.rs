//! Products too large to materialize.
//!
//! Elements are coordinate vectors ([`IntArray`]); operations act
//! coordinatewise through the factor operations. Nothing about the
//! carrier is ever enumerated; the only way in is through generated
//! subalgebras ([`crate::alg::closer::Closer`]).

use num_bigint::BigUint;
use std::sync::Arc;

use crate::alg::algebra::SmallAlgebra;
use crate::alg::op::operation::Operation;
use crate::alg::op::operation_symbol::OperationSymbol;
use crate::error::{UACalcError, UACalcResult};
use crate::progress::Effort;
use crate::util::int_array::IntArray;

#[derive(Debug)]
enum Factors {
    /// `root^count`: one factor repeated; operations are shared.
    Power {
        root_size: usize,
        root_ops: Vec<Arc<dyn Operation>>,
        count: usize,
    },
    /// A finite list of similar algebras.
    List {
        sizes: Vec<usize>,
        ops_by_factor: Vec<Vec<Arc<dyn Operation>>>,
    },
}

#[derive(Debug)]
pub struct BigProductAlgebra {
    name: String,
    factors: Factors,
}

impl BigProductAlgebra {
    /// The power `root^count`, built from the root's parts. Useful when
    /// only the operation list of the root is at hand.
    pub fn power_of_ops(
        name: impl Into<String>,
        root_size: usize,
        root_ops: Vec<Arc<dyn Operation>>,
        count: usize,
    ) -> UACalcResult<Self> {
        if count == 0 {
            return Err(UACalcError::invariant(
                "big product: a power needs at least one coordinate",
            ));
        }
        Ok(BigProductAlgebra {
            name: name.into(),
            factors: Factors::Power { root_size, root_ops, count },
        })
    }

    /// The power `root^count`.
    pub fn power(root: &dyn SmallAlgebra, count: usize) -> UACalcResult<Self> {
        Self::power_of_ops(
            format!("{}^{}", root.name(), count),
            root.cardinality(),
            root.operations().to_vec(),
            count,
        )
    }

    /// A product of similar algebras.
    pub fn product(name: impl Into<String>, factors: &[Arc<dyn SmallAlgebra>]) -> UACalcResult<Self> {
        if factors.is_empty() {
            return Err(UACalcError::invariant(
                "big product: at least one factor is required",
            ));
        }
        let st = factors[0].similarity_type();
        for f in &factors[1..] {
            if f.similarity_type() != st {
                return Err(UACalcError::signature(format!(
                    "big product: factor {} has similarity type {}, expected {}",
                    f.name(),
                    f.similarity_type(),
                    st
                )));
            }
        }
        Ok(BigProductAlgebra {
            name: name.into(),
            factors: Factors::List {
                sizes: factors.iter().map(|f| f.cardinality()).collect(),
                ops_by_factor: factors.iter().map(|f| f.operations().to_vec()).collect(),
            },
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of coordinates of an element.
    pub fn num_factors(&self) -> usize {
        match &self.factors {
            Factors::Power { count, .. } => *count,
            Factors::List { sizes, .. } => sizes.len(),
        }
    }

    pub fn factor_size(&self, coord: usize) -> usize {
        match &self.factors {
            Factors::Power { root_size, .. } => *root_size,
            Factors::List { sizes, .. } => sizes[coord],
        }
    }

    /// Cardinality of the (unmaterialized) carrier.
    pub fn cardinality(&self) -> BigUint {
        match &self.factors {
            Factors::Power { root_size, count, .. } => {
                let mut ans = BigUint::from(1u32);
                let base = BigUint::from(*root_size);
                for _ in 0..*count {
                    ans *= &base;
                }
                ans
            }
            Factors::List { sizes, .. } => {
                let mut ans = BigUint::from(1u32);
                for &s in sizes {
                    ans *= BigUint::from(s);
                }
                ans
            }
        }
    }

    pub fn num_operations(&self) -> usize {
        match &self.factors {
            Factors::Power { root_ops, .. } => root_ops.len(),
            Factors::List { ops_by_factor, .. } => ops_by_factor[0].len(),
        }
    }

    pub fn op_symbol(&self, op_index: usize) -> &OperationSymbol {
        match &self.factors {
            Factors::Power { root_ops, .. } => root_ops[op_index].symbol(),
            Factors::List { ops_by_factor, .. } => ops_by_factor[0][op_index].symbol(),
        }
    }

    pub fn op_arity(&self, op_index: usize) -> usize {
        self.op_symbol(op_index).arity()
    }

    /// Validate that a vector is an element of this product.
    pub fn check_element(&self, elem: &IntArray) -> UACalcResult<()> {
        if elem.len() != self.num_factors() {
            return Err(UACalcError::out_of_range(format!(
                "big product {}: element has {} coordinates, expected {}",
                self.name,
                elem.len(),
                self.num_factors()
            )));
        }
        for (j, v) in elem.as_slice().iter().enumerate() {
            if *v >= self.factor_size(j) {
                return Err(UACalcError::out_of_range(format!(
                    "big product {}: coordinate {} holds {}, factor size is {}",
                    self.name,
                    j,
                    v,
                    self.factor_size(j)
                )));
            }
        }
        Ok(())
    }

    /// Apply operation `op_index` coordinatewise.
    pub fn apply(&self, op_index: usize, args: &[&IntArray]) -> UACalcResult<IntArray> {
        let arity = self.op_arity(op_index);
        if args.len() != arity {
            return Err(UACalcError::out_of_range(format!(
                "big product {}: operation {} got {} arguments, arity is {}",
                self.name,
                self.op_symbol(op_index),
                args.len(),
                arity
            )));
        }
        let coords = self.num_factors();
        let mut ans = Vec::with_capacity(coords);
        let mut point: smallvec::SmallVec<[usize; 4]> = smallvec::smallvec![0; arity];
        for j in 0..coords {
            for (i, a) in args.iter().enumerate() {
                point[i] = a.get(j).ok_or_else(|| {
                    UACalcError::out_of_range(format!(
                        "big product {}: argument {} is too short",
                        self.name, i
                    ))
                })?;
            }
            let op = match &self.factors {
                Factors::Power { root_ops, .. } => &root_ops[op_index],
                Factors::List { ops_by_factor, .. } => &ops_by_factor[j][op_index],
            };
            ans.push(op.int_value_at(&point)?);
        }
        Ok(IntArray::new(ans))
    }

    /// The subuniverse generated by the given vectors.
    pub fn sg_close(
        &self,
        generators: Vec<IntArray>,
        effort: &Effort,
    ) -> UACalcResult<Vec<IntArray>> {
        let mut closer = crate::alg::closer::Closer::new(self, generators);
        closer.close(effort)
    }

    /// The kernel of the projection onto one coordinate of the listed
    /// generators: relates generator indices with equal images.
    pub fn projection_of(&self, elems: &[IntArray], coord: usize) -> UACalcResult<Vec<usize>> {
        if coord >= self.num_factors() {
            return Err(UACalcError::out_of_range(format!(
                "big product {}: projection onto coordinate {} of {}",
                self.name,
                coord,
                self.num_factors()
            )));
        }
        elems
            .iter()
            .map(|e| {
                e.get(coord).ok_or_else(|| {
                    UACalcError::out_of_range("big product: short element in projection")
                })
            })
            .collect()
    }
}
