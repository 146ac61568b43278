//! Breadth-first subuniverse closure over a big product.
//!
//! The closer drives the generated-subalgebra construction used by free
//! algebras, the witness-term searches, and the type finder. It can
//! carry a term map (each produced element remembers a term evaluating
//! to it), stop early when a sought element appears, and respect a size
//! cap and a step budget.

use ahash::{AHashMap, AHashSet};

use crate::alg::big_product_algebra::BigProductAlgebra;
use crate::error::{UACalcError, UACalcResult};
use crate::progress::Effort;
use crate::terms::{Term, Variable};
use crate::util::int_array::IntArray;
use crate::util::sequence::FrontierIncrementor;

pub struct Closer<'a> {
    alg: &'a BigProductAlgebra,
    generators: Vec<IntArray>,
    term_map: Option<AHashMap<IntArray, Term>>,
    element_to_find: Option<IntArray>,
    max_size: Option<usize>,
    found: bool,
}

impl<'a> Closer<'a> {
    pub fn new(alg: &'a BigProductAlgebra, generators: Vec<IntArray>) -> Self {
        Closer {
            alg,
            generators,
            term_map: None,
            element_to_find: None,
            max_size: None,
            found: false,
        }
    }

    /// Track terms: generator `i` is labelled by `variables[i]`.
    pub fn with_term_map(mut self, variables: &[Variable]) -> UACalcResult<Self> {
        if variables.len() != self.generators.len() {
            return Err(UACalcError::invariant(format!(
                "closer: {} variables for {} generators",
                variables.len(),
                self.generators.len()
            )));
        }
        let mut map = AHashMap::new();
        for (g, v) in self.generators.iter().zip(variables) {
            map.entry(g.clone()).or_insert_with(|| Term::var(v.clone()));
        }
        self.term_map = Some(map);
        Ok(self)
    }

    /// Stop as soon as this element is produced.
    pub fn with_element_to_find(mut self, elem: IntArray) -> Self {
        self.element_to_find = Some(elem);
        self
    }

    /// Give up (with `Truncated`) once the closure exceeds this size.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Whether a sought element was produced by the last `close` call.
    pub fn found(&self) -> bool {
        self.found
    }

    pub fn term_map(&self) -> Option<&AHashMap<IntArray, Term>> {
        self.term_map.as_ref()
    }

    /// The term evaluating to the sought element, when tracked and found.
    pub fn found_term(&self) -> Option<&Term> {
        if !self.found {
            return None;
        }
        let elem = self.element_to_find.as_ref()?;
        self.term_map.as_ref()?.get(elem)
    }

    /// Run the closure; returns the closed list in discovery order.
    ///
    /// With an element to find, the list stops where the element
    /// appeared; check [`Closer::found`].
    pub fn close(&mut self, effort: &Effort) -> UACalcResult<Vec<IntArray>> {
        self.found = false;
        let mut lst: Vec<IntArray> = Vec::new();
        let mut seen: AHashSet<IntArray> = AHashSet::new();
        for g in &self.generators {
            self.alg.check_element(g)?;
            if seen.insert(g.clone()) {
                lst.push(g.clone());
            }
        }
        if let Some(target) = &self.element_to_find {
            if seen.contains(target) {
                self.found = true;
                return Ok(lst);
            }
        }
        let mut closed_mark = 0;
        let mut current_mark = lst.len();
        while closed_mark < current_mark {
            effort.tick("sg closure")?;
            for op_index in 0..self.alg.num_operations() {
                let arity = self.alg.op_arity(op_index);
                if arity == 0 {
                    continue;
                }
                let mut inc = FrontierIncrementor::new(arity, current_mark - 1, closed_mark);
                while let Some(indices) = inc.next() {
                    // Indices refer to the stable prefix of lst; the
                    // arguments are cloned so new elements can be pushed.
                    let owned: Vec<IntArray> =
                        indices.iter().map(|&i| lst[i].clone()).collect();
                    let args: Vec<&IntArray> = owned.iter().collect();
                    let v = self.alg.apply(op_index, &args)?;
                    if seen.contains(&v) {
                        continue;
                    }
                    if let Some(map) = &mut self.term_map {
                        let mut children: Vec<Term> = Vec::with_capacity(indices.len());
                        for &i in indices {
                            children.push(map.get(&lst[i]).cloned().ok_or_else(|| {
                                UACalcError::invariant(
                                    "closure produced an element with no recorded term",
                                )
                            })?);
                        }
                        map.insert(
                            v.clone(),
                            Term::apply(self.alg.op_symbol(op_index).clone(), children),
                        );
                    }
                    seen.insert(v.clone());
                    lst.push(v.clone());
                    if let Some(max) = self.max_size {
                        if lst.len() > max {
                            return Err(UACalcError::truncated(
                                "sg closure size cap",
                                lst.len() as u64,
                            ));
                        }
                    }
                    if Some(&v) == self.element_to_find.as_ref() {
                        self.found = true;
                        return Ok(lst);
                    }
                }
            }
            closed_mark = current_mark;
            current_mark = lst.len();
        }
        Ok(lst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alg::algebra::BasicAlgebra;

    fn z3() -> BasicAlgebra {
        BasicAlgebra::from_tables("Z3", 3, &[("+", 2, vec![0, 1, 2, 1, 2, 0, 2, 0, 1])])
            .unwrap()
    }

    #[test]
    fn close_with_terms() {
        let alg = z3();
        let square = BigProductAlgebra::power(&alg, 2).unwrap();
        let gens = vec![IntArray::from_slice(&[1, 0]), IntArray::from_slice(&[0, 1])];
        let vars = [Variable::new("x"), Variable::new("y")];
        let mut closer = Closer::new(&square, gens).with_term_map(&vars).unwrap();
        let closed = closer.close(&Effort::unbounded()).unwrap();
        // Sg((1,0),(0,1)) under + is all of Z3 x Z3.
        assert_eq!(closed.len(), 9);
        let map = closer.term_map().unwrap();
        // The element (1,1) is x + y.
        let t = map.get(&IntArray::from_slice(&[1, 1])).unwrap();
        assert_eq!(t.to_string(), "+(x,y)");
    }

    #[test]
    fn early_exit_on_target() {
        let alg = z3();
        let square = BigProductAlgebra::power(&alg, 2).unwrap();
        let gens = vec![IntArray::from_slice(&[1, 0])];
        let mut closer = Closer::new(&square, gens)
            .with_element_to_find(IntArray::from_slice(&[2, 0]));
        closer.close(&Effort::unbounded()).unwrap();
        assert!(closer.found());
    }

    #[test]
    fn size_cap_truncates() {
        let alg = z3();
        let square = BigProductAlgebra::power(&alg, 2).unwrap();
        let gens = vec![IntArray::from_slice(&[1, 0]), IntArray::from_slice(&[0, 1])];
        let mut closer = Closer::new(&square, gens).with_max_size(4);
        let err = closer.close(&Effort::unbounded()).unwrap_err();
        assert_eq!(err.kind(), "Truncated");
    }
}
