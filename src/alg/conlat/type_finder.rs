//! Tame-congruence-theory types of prime quotients.
//!
//! For a join irreducible congruence `beta` with lower cover
//! `beta_*`, the finder locates a subtrace `{c, d}` of the quotient
//! `beta_* < beta` and labels it with one of the five types of minimal
//! algebra: 1 unary, 2 affine, 3 boolean, 4 lattice, 5 semilattice.
//!
//! The search follows the image of the pair under unary polynomials,
//! realized as the subalgebra of `A^2` generated by the pair and the
//! diagonal; whenever the image of the pair yields an unvisited
//! off-`alpha` pair the search restarts from it. The type of the final
//! pair is read off the closure in `A^4` of the two projections
//! `[c,c,d,d]` and `[c,d,c,d]` over the diagonal, by watching for meet,
//! join and snag patterns modulo `alpha`.

use ahash::AHashSet;
use std::collections::BTreeSet;

use crate::alg::big_product_algebra::BigProductAlgebra;
use crate::alg::conlat::congruence_lattice::CongruenceLattice;
use crate::alg::conlat::partition::Partition;
use crate::alg::conlat::subtrace::{CentralityData, Subtrace};
use crate::error::{UACalcError, UACalcResult};
use crate::progress::Effort;
use crate::util::int_array::IntArray;
use crate::util::sequence::FrontierIncrementor;

pub struct TypeFinder<'a> {
    con: &'a CongruenceLattice,
    alg_size: usize,
    a_squared: BigProductAlgebra,
    a_fourth: BigProductAlgebra,
    alpha: Partition,
    diagonal4: Vec<IntArray>,
    effort: Effort,
    centrality: Option<CentralityData>,
    type_set_cache: Option<BTreeSet<u8>>,
}

impl<'a> TypeFinder<'a> {
    pub fn new(con: &'a CongruenceLattice) -> UACalcResult<Self> {
        let alg_size = con.alg_size();
        let ops = con.operations().to_vec();
        let a_squared =
            BigProductAlgebra::power_of_ops(format!("{}^2", con.alg_name()), alg_size, ops.clone(), 2)?;
        let a_fourth =
            BigProductAlgebra::power_of_ops(format!("{}^4", con.alg_name()), alg_size, ops, 4)?;
        let mut finder = TypeFinder {
            con,
            alg_size,
            a_squared,
            a_fourth,
            alpha: Partition::zero(alg_size),
            diagonal4: Vec::new(),
            effort: Effort::unbounded(),
            centrality: None,
            type_set_cache: None,
        };
        finder.rebuild_diagonal();
        Ok(finder)
    }

    /// Bound the closure loops; truncation surfaces as `Truncated`.
    pub fn set_effort(&mut self, effort: Effort) {
        self.effort = effort;
    }

    pub fn alg_size(&self) -> usize {
        self.alg_size
    }

    /// The relational data of the last subtrace search.
    pub fn centrality_data(&self) -> Option<&CentralityData> {
        self.centrality.as_ref()
    }

    fn set_alpha(&mut self, alpha: Partition) {
        if alpha == self.alpha {
            return;
        }
        self.alpha = alpha;
        self.rebuild_diagonal();
    }

    fn rebuild_diagonal(&mut self) {
        self.diagonal4 = self
            .alpha
            .representatives()
            .into_iter()
            .map(|r| IntArray::constant(r, 4))
            .collect();
    }

    /// The set of types over all join irreducibles of `Con(A)`.
    pub fn find_type_set(&mut self) -> UACalcResult<BTreeSet<u8>> {
        if let Some(ts) = &self.type_set_cache {
            return Ok(ts.clone());
        }
        let jis = self.con.join_irreducibles()?.to_vec();
        let mut type_set = BTreeSet::new();
        for ji in &jis {
            type_set.insert(self.find_type(ji)?);
        }
        self.type_set_cache = Some(type_set.clone());
        Ok(type_set)
    }

    /// The type of the prime quotient under a join irreducible.
    pub fn find_type(&mut self, beta: &Partition) -> UACalcResult<u8> {
        let beta_star = self.lower_cover_of(beta)?;
        self.find_type_with_alpha(beta, &beta_star)
    }

    /// The type of `beta` over `alpha v beta_*`, for any congruence
    /// `alpha` whose join with the lower cover stays below `beta`.
    pub fn find_type_with_alpha(
        &mut self,
        beta: &Partition,
        alpha: &Partition,
    ) -> UACalcResult<u8> {
        let subtrace = self.find_subtrace_with_alpha(beta, alpha)?;
        let labelled = self.find_type_from_subtrace(subtrace)?;
        Ok(labelled.subtrace_type().expect("labelled subtrace has a type"))
    }

    /// A subtrace for `beta` over its lower cover.
    pub fn find_subtrace(&mut self, beta: &Partition) -> UACalcResult<Subtrace> {
        let beta_star = self.lower_cover_of(beta)?;
        self.find_subtrace_with_alpha(beta, &beta_star)
    }

    pub fn find_subtrace_with_alpha(
        &mut self,
        beta: &Partition,
        alpha: &Partition,
    ) -> UACalcResult<Subtrace> {
        let beta_star = self.lower_cover_of(beta)?;
        let joined = alpha.join(&beta_star)?;
        if beta.leq(&joined) {
            return Err(UACalcError::invariant(format!(
                "type finder on {}: beta lies below its lower cover joined with alpha",
                self.con.alg_name()
            )));
        }
        self.set_alpha(joined);
        let (a, b) = self.con.generating_pair(beta)?.ok_or_else(|| {
            UACalcError::invariant(format!(
                "type finder on {}: no generating pair for the join irreducible",
                self.con.alg_name()
            ))
        })?;
        self.find_subtrace_from_pair(&IntArray::pair(a, b))
    }

    /// Whether the pair is a subtrace for `beta` under the current
    /// `alpha`.
    pub fn is_subtrace(&mut self, pair: &IntArray, beta: &Partition) -> UACalcResult<bool> {
        let beta_star = self.lower_cover_of(beta)?;
        let joined = self.alpha.join(&beta_star)?;
        if beta.leq(&joined) {
            return Err(UACalcError::invariant(
                "type finder: beta lies below its lower cover joined with alpha",
            ));
        }
        self.set_alpha(joined);
        let subtrace = self.find_subtrace_from_pair(pair)?;
        Ok(subtrace
            .subtrace_universe()
            .map(|univ| univ.iter().any(|e| e == pair))
            .unwrap_or(false))
    }

    fn lower_cover_of(&self, beta: &Partition) -> UACalcResult<Partition> {
        self.con.lower_star(beta)?.ok_or_else(|| {
            UACalcError::invariant(format!(
                "type finder on {}: congruence {} is not join irreducible",
                self.con.alg_name(),
                beta
            ))
        })
    }

    /// Follow polynomial images of the pair until they stabilize, then
    /// package the closure as a subtrace.
    pub fn find_subtrace_from_pair(&mut self, pair: &IntArray) -> UACalcResult<Subtrace> {
        let mut current = pair.clone();
        let mut unordered: AHashSet<IntArray> = AHashSet::new();
        let mut univ_hs: AHashSet<IntArray> = AHashSet::new();
        let mut univ: Vec<IntArray> = Vec::new();
        loop {
            univ.clear();
            match self.next_pair_for_subtrace(&current, &mut univ_hs, &mut unordered, &mut univ)? {
                Some(next) => current = next,
                None => break,
            }
        }
        let a = current.get(0).ok_or_else(|| {
            UACalcError::out_of_range("type finder: subtrace pair is too short")
        })?;
        let b = current.get(1).ok_or_else(|| {
            UACalcError::out_of_range("type finder: subtrace pair is too short")
        })?;
        let has_involution = univ_hs.contains(&IntArray::pair(b, a));
        let reversed: Vec<IntArray> = univ
            .iter()
            .map(|p| IntArray::pair(p.as_slice()[1], p.as_slice()[0]))
            .collect();
        self.centrality = Some(CentralityData::new(
            univ.clone(),
            reversed,
            self.alpha.clone(),
        ));
        let mut subtrace = Subtrace::new(a, b, has_involution);
        subtrace.set_subtrace_universe(univ);
        Ok(subtrace)
    }

    /// Close the pair with the diagonal under the operations of `A^2`.
    /// Returns the first unvisited pair off `alpha` produced as an
    /// image, or None when the closure finishes, which makes the input
    /// pair a subtrace.
    fn next_pair_for_subtrace(
        &self,
        pair: &IntArray,
        univ_hs: &mut AHashSet<IntArray>,
        unordered: &mut AHashSet<IntArray>,
        univ: &mut Vec<IntArray>,
    ) -> UACalcResult<Option<IntArray>> {
        univ_hs.clear();
        univ.push(pair.clone());
        for i in 0..self.alg_size {
            univ.push(IntArray::pair(i, i));
        }
        for e in univ.iter() {
            univ_hs.insert(e.clone());
        }
        let mut closed_mark = 0;
        let mut current_mark = univ.len();
        while closed_mark < current_mark {
            self.effort.tick("type finder pair closure")?;
            for op_index in 0..self.a_squared.num_operations() {
                let arity = self.a_squared.op_arity(op_index);
                if arity == 0 {
                    continue;
                }
                let mut inc = FrontierIncrementor::new(arity, current_mark - 1, closed_mark);
                while let Some(indices) = inc.next() {
                    let owned: Vec<IntArray> =
                        indices.iter().map(|&i| univ[i].clone()).collect();
                    let args: Vec<&IntArray> = owned.iter().collect();
                    let v = self.a_squared.apply(op_index, &args)?;
                    let v0 = v.as_slice()[0];
                    let v1 = v.as_slice()[1];
                    if !self.alpha.is_related(v0, v1) {
                        let key = if v0 < v1 {
                            IntArray::pair(v0, v1)
                        } else {
                            IntArray::pair(v1, v0)
                        };
                        if unordered.insert(key) {
                            // A new image pair: abandon and restart there.
                            return Ok(Some(v));
                        }
                    }
                    if univ_hs.insert(v.clone()) {
                        univ.push(v);
                    }
                }
            }
            closed_mark = current_mark;
            current_mark = univ.len();
        }
        Ok(None)
    }

    /// Label a subtrace `{c, d}`. Quadruples are read as 2x2 matrices
    /// over `{c,d}` in row order `(c,c),(c,d),(d,c),(d,d)`; the closure
    /// of the projections `[c,c,d,d]` and `[c,d,c,d]` is scanned modulo
    /// `alpha` for meet, join and snag patterns.
    pub fn find_type_from_subtrace(&mut self, mut subtrace: Subtrace) -> UACalcResult<Subtrace> {
        let c = subtrace.first();
        let d = subtrace.second();
        let mut meet = false;
        let mut join = false;
        let mut one_snag = false;

        let mut universe: Vec<IntArray> = self.diagonal4.clone();
        let mut univ_hs: AHashSet<IntArray> = universe.iter().cloned().collect();
        let rows = IntArray::new(vec![c, c, d, d]);
        let cols = IntArray::new(vec![c, d, c, d]);
        univ_hs.insert(rows.clone());
        univ_hs.insert(cols.clone());
        universe.push(rows);
        universe.push(cols);

        let mut closed_mark = 0;
        let mut current_mark = universe.len();
        while closed_mark < current_mark {
            self.effort.tick("type finder matrix closure")?;
            for op_index in 0..self.a_fourth.num_operations() {
                let arity = self.a_fourth.op_arity(op_index);
                if arity == 0 {
                    continue;
                }
                let mut inc = FrontierIncrementor::new(arity, current_mark - 1, closed_mark);
                while let Some(indices) = inc.next() {
                    let owned: Vec<IntArray> =
                        indices.iter().map(|&i| universe[i].clone()).collect();
                    let args: Vec<&IntArray> = owned.iter().collect();
                    let v = self.a_fourth.apply(op_index, &args)?;
                    if !univ_hs.insert(v.clone()) {
                        continue;
                    }
                    let x = self.alpha.representative(v.as_slice()[0]);
                    let y = self.alpha.representative(v.as_slice()[1]);
                    let u = self.alpha.representative(v.as_slice()[2]);
                    let w = self.alpha.representative(v.as_slice()[3]);
                    universe.push(v);
                    if !join && ((x != y && u == w) || (x != u && y == w)) {
                        if subtrace.has_involution() {
                            subtrace.set_matrix_universe(universe);
                            subtrace.set_type(3);
                            return Ok(subtrace);
                        }
                        if meet {
                            subtrace.set_matrix_universe(universe);
                            subtrace.set_type(4);
                            return Ok(subtrace);
                        }
                        join = true;
                        one_snag = true;
                    } else if !meet && ((x == y && u != w) || (x == u && y != w)) {
                        if subtrace.has_involution() {
                            subtrace.set_matrix_universe(universe);
                            subtrace.set_type(3);
                            return Ok(subtrace);
                        }
                        if join {
                            subtrace.set_matrix_universe(universe);
                            subtrace.set_type(4);
                            return Ok(subtrace);
                        }
                        meet = true;
                        one_snag = true;
                    }
                    if !one_snag
                        && ((x == w && (x != y || u != w)) || (y == u && (x != y || u != w)))
                    {
                        one_snag = true;
                    }
                }
            }
            closed_mark = current_mark;
            current_mark = universe.len();
        }

        subtrace.set_matrix_universe(universe);
        if join || meet {
            subtrace.set_type(5);
        } else if one_snag {
            subtrace.set_type(2);
        } else {
            subtrace.set_type(1);
        }
        Ok(subtrace)
    }
}
