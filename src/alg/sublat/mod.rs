//! Subuniverses and the subalgebra lattice.
//!
//! A subuniverse is a subset of the carrier closed under every
//! operation. The lattice is ordered by inclusion; meet is intersection
//! and join is the generated subuniverse of the union. The universe is
//! the join closure of the one-generated subuniverses over the
//! constants.

use ahash::AHashSet;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

use crate::alg::op::operation::Operation;
use crate::error::{UACalcError, UACalcResult};
use crate::progress::Effort;
use crate::util::sequence::FrontierIncrementor;

/// A sorted set of carrier elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BasicSet {
    elements: Vec<usize>,
}

impl BasicSet {
    pub fn new(mut elements: Vec<usize>) -> Self {
        elements.sort_unstable();
        elements.dedup();
        BasicSet { elements }
    }

    pub fn empty() -> Self {
        BasicSet { elements: Vec::new() }
    }

    pub fn full(size: usize) -> Self {
        BasicSet { elements: (0..size).collect() }
    }

    pub fn size(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[usize] {
        &self.elements
    }

    pub fn contains(&self, e: usize) -> bool {
        self.elements.binary_search(&e).is_ok()
    }

    /// Inclusion order.
    pub fn leq(&self, other: &BasicSet) -> bool {
        self.elements.iter().all(|e| other.contains(*e))
    }

    pub fn union(&self, other: &BasicSet) -> BasicSet {
        let mut elements = self.elements.clone();
        elements.extend_from_slice(&other.elements);
        BasicSet::new(elements)
    }

    pub fn intersection(&self, other: &BasicSet) -> BasicSet {
        BasicSet {
            elements: self
                .elements
                .iter()
                .copied()
                .filter(|e| other.contains(*e))
                .collect(),
        }
    }
}

impl fmt::Display for BasicSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, e) in self.elements.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", e)?;
        }
        write!(f, "}}")
    }
}

/// The lattice of subuniverses of a finite algebra.
#[derive(Debug)]
pub struct SubalgebraLattice {
    alg_name: String,
    alg_size: usize,
    operations: Vec<Arc<dyn Operation>>,
    one: BasicSet,
    zero: OnceCell<BasicSet>,
    one_generated: OnceCell<Vec<BasicSet>>,
    universe: OnceCell<Vec<BasicSet>>,
    join_irreducibles: OnceCell<Vec<BasicSet>>,
}

impl SubalgebraLattice {
    pub fn new(alg_name: String, alg_size: usize, operations: Vec<Arc<dyn Operation>>) -> Self {
        SubalgebraLattice {
            alg_name,
            alg_size,
            operations,
            one: BasicSet::full(alg_size),
            zero: OnceCell::new(),
            one_generated: OnceCell::new(),
            universe: OnceCell::new(),
            join_irreducibles: OnceCell::new(),
        }
    }

    pub fn alg_name(&self) -> &str {
        &self.alg_name
    }

    pub fn alg_size(&self) -> usize {
        self.alg_size
    }

    /// The whole carrier.
    pub fn one(&self) -> &BasicSet {
        &self.one
    }

    /// The least subuniverse: the closure of the constants, the empty
    /// set when there are none.
    pub fn zero(&self) -> UACalcResult<&BasicSet> {
        self.zero.get_or_try_init(|| self.sg(&[]))
    }

    /// The subuniverse generated by the given elements.
    pub fn sg(&self, generators: &[usize]) -> UACalcResult<BasicSet> {
        self.sg_with_effort(generators, &Effort::unbounded())
    }

    pub fn sg_with_effort(
        &self,
        generators: &[usize],
        effort: &Effort,
    ) -> UACalcResult<BasicSet> {
        for &g in generators {
            if g >= self.alg_size {
                return Err(UACalcError::invariant(format!(
                    "Sg on {}: generator {} outside carrier of size {}",
                    self.alg_name, g, self.alg_size
                )));
            }
        }
        let mut lst: Vec<usize> = Vec::new();
        let mut su: AHashSet<usize> = AHashSet::new();
        for op in &self.operations {
            if op.arity() == 0 {
                let c = op.int_value_at(&[])?;
                if su.insert(c) {
                    lst.push(c);
                }
            }
        }
        for &g in generators {
            if su.insert(g) {
                lst.push(g);
            }
        }
        let mut closed_mark = 0;
        let mut current_mark = lst.len();
        let mut args_buf: Vec<usize> = Vec::new();
        while closed_mark < current_mark {
            effort.tick("Sg")?;
            for op in &self.operations {
                let arity = op.arity();
                if arity == 0 {
                    continue;
                }
                let mut inc = FrontierIncrementor::new(arity, current_mark - 1, closed_mark);
                while let Some(indices) = inc.next() {
                    args_buf.clear();
                    args_buf.extend(indices.iter().map(|&i| lst[i]));
                    let v = op.int_value_at(&args_buf)?;
                    if su.insert(v) {
                        lst.push(v);
                    }
                }
            }
            closed_mark = current_mark;
            current_mark = lst.len();
        }
        Ok(BasicSet::new(lst))
    }

    /// The distinct subuniverses generated by single elements, in
    /// generator order.
    pub fn one_generated(&self) -> UACalcResult<&[BasicSet]> {
        self.one_generated
            .get_or_try_init(|| {
                let mut ans: Vec<BasicSet> = Vec::new();
                for x in 0..self.alg_size {
                    let s = self.sg(&[x])?;
                    if !ans.contains(&s) {
                        ans.push(s);
                    }
                }
                Ok(ans)
            })
            .map(|v| v.as_slice())
    }

    /// All subuniverses: the join closure of the one-generated
    /// subuniverses, with the constant subuniverse in front.
    pub fn universe(&self) -> UACalcResult<&[BasicSet]> {
        if let Some(u) = self.universe.get() {
            return Ok(u);
        }
        let computed = self.compute_universe(&Effort::unbounded())?;
        Ok(self.universe.get_or_init(|| computed))
    }

    /// Budgeted variant; truncation caches nothing.
    pub fn universe_with_effort(&self, effort: &Effort) -> UACalcResult<&[BasicSet]> {
        if let Some(u) = self.universe.get() {
            return Ok(u);
        }
        let computed = self.compute_universe(effort)?;
        Ok(self.universe.get_or_init(|| computed))
    }

    fn compute_universe(&self, effort: &Effort) -> UACalcResult<Vec<BasicSet>> {
        let gens = self.one_generated()?.to_vec();
        let mut univ: Vec<BasicSet> = gens.clone();
        let mut seen: AHashSet<BasicSet> = gens.iter().cloned().collect();
        for k in 0..gens.len() {
            let elem = gens[k].clone();
            let mut i = k;
            while i < univ.len() {
                effort.tick("Sub universe")?;
                let join = self.join(&elem, &univ[i])?;
                if seen.insert(join.clone()) {
                    univ.push(join);
                }
                i += 1;
            }
        }
        let zero = self.zero()?.clone();
        if seen.insert(zero.clone()) {
            univ.insert(0, zero);
        }
        Ok(univ)
    }

    pub fn cardinality(&self) -> UACalcResult<usize> {
        Ok(self.universe()?.len())
    }

    /// Join in Sub(A): the subuniverse generated by the union.
    pub fn join(&self, a: &BasicSet, b: &BasicSet) -> UACalcResult<BasicSet> {
        self.sg(a.union(b).elements())
    }

    /// Meet in Sub(A): plain intersection, which is always closed.
    pub fn meet(&self, a: &BasicSet, b: &BasicSet) -> BasicSet {
        a.intersection(b)
    }

    /// Subuniverses not equal to the join of strictly smaller ones.
    pub fn join_irreducibles(&self) -> UACalcResult<&[BasicSet]> {
        self.join_irreducibles
            .get_or_try_init(|| {
                let zero = self.zero()?.clone();
                let gens = self.one_generated()?.to_vec();
                let mut jis = Vec::new();
                for p in &gens {
                    if p == &zero {
                        continue;
                    }
                    let mut join = zero.clone();
                    for q in &gens {
                        if q != p && q.leq(p) {
                            join = self.join(&join, q)?;
                            if &join == p {
                                break;
                            }
                        }
                    }
                    if &join != p {
                        jis.push(p.clone());
                    }
                }
                Ok(jis)
            })
            .map(|v| v.as_slice())
    }

    /// Stability check used by tests: a set is a subuniverse iff closed.
    pub fn is_subuniverse(&self, s: &BasicSet) -> UACalcResult<bool> {
        Ok(&self.sg(s.elements())? == s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alg::algebra::{BasicAlgebra, SmallAlgebra};

    #[test]
    fn basic_set_operations() {
        let a = BasicSet::new(vec![3, 1, 1]);
        assert_eq!(a.elements(), &[1, 3]);
        let b = BasicSet::new(vec![1, 2]);
        assert_eq!(a.union(&b).elements(), &[1, 2, 3]);
        assert_eq!(a.intersection(&b).elements(), &[1]);
        assert!(BasicSet::new(vec![1]).leq(&a));
        assert_eq!(a.to_string(), "{1,3}");
    }

    #[test]
    fn z3_has_only_trivial_subuniverses() {
        let alg =
            BasicAlgebra::from_tables("Z3", 3, &[("+", 2, vec![0, 1, 2, 1, 2, 0, 2, 0, 1])])
                .unwrap();
        let sub = alg.sub();
        assert!(sub.zero().unwrap().is_empty());
        assert_eq!(sub.cardinality().unwrap(), 2);
        assert_eq!(sub.sg(&[1]).unwrap().size(), 3);
    }

    #[test]
    fn two_element_lattice_subuniverses() {
        let alg = BasicAlgebra::from_tables(
            "2",
            2,
            &[("meet", 2, vec![0, 0, 0, 1]), ("join", 2, vec![0, 1, 1, 1])],
        )
        .unwrap();
        let sub = alg.sub();
        // Empty, {0}, {1}, {0,1}.
        assert_eq!(sub.cardinality().unwrap(), 4);
        assert_eq!(sub.join_irreducibles().unwrap().len(), 2);
    }

    #[test]
    fn sg_is_stable() {
        let alg = BasicAlgebra::from_tables(
            "semilattice",
            2,
            &[("meet", 2, vec![0, 0, 0, 1])],
        )
        .unwrap();
        let s = alg.sub().sg(&[0, 1]).unwrap();
        assert!(alg.sub().is_subuniverse(&s).unwrap());
    }

    #[test]
    fn constants_always_included() {
        let c = crate::alg::op::operations::constant("c", 3, 2).unwrap();
        let alg = BasicAlgebra::new("pointed", 3, vec![c]).unwrap();
        let zero = alg.sub().zero().unwrap();
        assert_eq!(zero.elements(), &[2]);
        assert!(alg.sub().sg(&[0]).unwrap().contains(2));
    }

    #[test]
    fn generator_out_of_range_is_rejected() {
        let alg = BasicAlgebra::new("empty-sig", 2, Vec::new()).unwrap();
        assert!(alg.sub().sg(&[5]).is_err());
    }
}
