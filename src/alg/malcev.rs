//! Witness terms for Maltsev conditions.
//!
//! Each search asks whether the variety of a finite algebra has a term
//! satisfying a fixed system of two-variable identities. The identities
//! are stacked side by side as coordinates of a big power of `A`; the
//! candidate term exists iff the target vector lies in the subalgebra
//! generated by the argument vectors, and the closure's term map hands
//! back the witness.

use crate::alg::algebra::SmallAlgebra;
use crate::alg::big_product_algebra::BigProductAlgebra;
use crate::alg::closer::Closer;
use crate::alg::free_algebra::FreeAlgebra;
use crate::alg::op::operation::Operation;
use crate::error::{UACalcError, UACalcResult};
use crate::progress::Effort;
use crate::terms::{Term, TermOperation, Variable};
use crate::util::horner::{horner_inv_uniform_into, power_checked};
use crate::util::int_array::IntArray;

/// One identity `t(args) = target` where args and target name free
/// generators (0 = x, 1 = y).
struct Identity {
    args: Vec<usize>,
    target: usize,
}

/// The projection tuples of the free generators in `A^(n^v)`.
fn free_generator_tuples(n: usize, num_free_vars: usize) -> UACalcResult<Vec<Vec<usize>>> {
    let coords = power_checked(n, num_free_vars).ok_or_else(|| {
        UACalcError::out_of_range("witness search: assignment space overflows")
    })?;
    let mut gens: Vec<Vec<usize>> = vec![Vec::with_capacity(coords); num_free_vars];
    let mut digits = vec![0; num_free_vars];
    for j in 0..coords {
        horner_inv_uniform_into(j, n, &mut digits)?;
        for (i, g) in gens.iter_mut().enumerate() {
            g.push(digits[i]);
        }
    }
    Ok(gens)
}

/// Search for a term satisfying all the identities at once.
fn find_witness(
    alg: &dyn SmallAlgebra,
    identities: &[Identity],
    num_term_vars: usize,
    num_free_vars: usize,
    effort: &Effort,
) -> UACalcResult<Option<Term>> {
    let n = alg.cardinality();
    if n == 0 {
        return Ok(None);
    }
    if n == 1 {
        // Everything holds in a trivial algebra; the first projection is
        // as good a witness as any.
        return Ok(Some(Term::var(Variable::nth(0))));
    }
    let free_tuples = free_generator_tuples(n, num_free_vars)?;
    let block = free_tuples[0].len();
    let total = block
        .checked_mul(identities.len())
        .ok_or_else(|| UACalcError::out_of_range("witness search: coordinate overflow"))?;
    let mut gen_vecs: Vec<Vec<usize>> = vec![Vec::with_capacity(total); num_term_vars];
    let mut target_vec: Vec<usize> = Vec::with_capacity(total);
    for id in identities {
        if id.args.len() != num_term_vars {
            return Err(UACalcError::invariant(
                "witness search: identity arity disagrees with the term arity",
            ));
        }
        for (v, g) in gen_vecs.iter_mut().enumerate() {
            g.extend_from_slice(&free_tuples[id.args[v]]);
        }
        target_vec.extend_from_slice(&free_tuples[id.target]);
    }
    let envelope = BigProductAlgebra::power_of_ops(
        format!("{}-witness", alg.name()),
        n,
        alg.operations().to_vec(),
        total,
    )?;
    let gens: Vec<IntArray> = gen_vecs.into_iter().map(IntArray::new).collect();
    let variables: Vec<Variable> = (0..num_term_vars).map(Variable::nth).collect();
    let mut closer = Closer::new(&envelope, gens)
        .with_term_map(&variables)?
        .with_element_to_find(IntArray::new(target_vec));
    closer.close(effort)?;
    Ok(closer.found_term().cloned())
}

/// A ternary term with `m(x,x,y) = y` and `m(y,x,x) = y`.
pub fn malcev_term(alg: &dyn SmallAlgebra) -> UACalcResult<Option<Term>> {
    malcev_term_with_effort(alg, &Effort::unbounded())
}

pub fn malcev_term_with_effort(
    alg: &dyn SmallAlgebra,
    effort: &Effort,
) -> UACalcResult<Option<Term>> {
    find_witness(
        alg,
        &[
            Identity { args: vec![0, 0, 1], target: 1 },
            Identity { args: vec![1, 0, 0], target: 1 },
        ],
        3,
        2,
        effort,
    )
}

/// A ternary term with `m(x,x,y) = m(x,y,x) = m(y,x,x) = x`.
pub fn majority_term(alg: &dyn SmallAlgebra) -> UACalcResult<Option<Term>> {
    find_witness(
        alg,
        &[
            Identity { args: vec![0, 0, 1], target: 0 },
            Identity { args: vec![0, 1, 0], target: 0 },
            Identity { args: vec![1, 0, 0], target: 0 },
        ],
        3,
        2,
        &Effort::unbounded(),
    )
}

/// A ternary term with `m(x,x,y) = m(x,y,x) = m(y,x,x) = y`.
pub fn minority_term(alg: &dyn SmallAlgebra) -> UACalcResult<Option<Term>> {
    find_witness(
        alg,
        &[
            Identity { args: vec![0, 0, 1], target: 1 },
            Identity { args: vec![0, 1, 0], target: 1 },
            Identity { args: vec![1, 0, 0], target: 1 },
        ],
        3,
        2,
        &Effort::unbounded(),
    )
}

/// A ternary term with `p(x,y,y) = p(x,y,x) = x` and `p(x,x,y) = y`.
pub fn pixley_term(alg: &dyn SmallAlgebra) -> UACalcResult<Option<Term>> {
    find_witness(
        alg,
        &[
            Identity { args: vec![0, 1, 1], target: 0 },
            Identity { args: vec![0, 1, 0], target: 0 },
            Identity { args: vec![0, 0, 1], target: 1 },
        ],
        3,
        2,
        &Effort::unbounded(),
    )
}

/// A near-unanimity term of the given arity: `u(y,x,..,x) = ... = x`
/// with the lone `y` in every position.
pub fn nu_term(alg: &dyn SmallAlgebra, arity: usize) -> UACalcResult<Option<Term>> {
    if arity < 3 {
        return Err(UACalcError::invariant(
            "near-unanimity terms need arity at least 3",
        ));
    }
    let identities: Vec<Identity> = (0..arity)
        .map(|i| Identity {
            args: (0..arity).map(|v| if v == i { 1 } else { 0 }).collect(),
            target: 0,
        })
        .collect();
    find_witness(alg, &identities, arity, 2, &Effort::unbounded())
}

/// A binary idempotent, commutative, associative term.
pub fn semilattice_term(alg: &dyn SmallAlgebra) -> UACalcResult<Option<Term>> {
    semilattice_term_with_effort(alg, &Effort::unbounded())
}

pub fn semilattice_term_with_effort(
    alg: &dyn SmallAlgebra,
    effort: &Effort,
) -> UACalcResult<Option<Term>> {
    let n = alg.cardinality();
    if n <= 1 {
        return Ok(Some(Term::var(Variable::x())));
    }
    let f2 = FreeAlgebra::with_effort(alg, 2, effort)?;
    let vars = vec![Variable::x(), Variable::y()];
    for i in 0..f2.cardinality() {
        let term = f2.term_for_element(i)?.clone();
        let op = TermOperation::compile(term.clone(), vars.clone(), alg)?;
        if op.is_idempotent()? && op.is_commutative()? && op.is_associative()? {
            return Ok(Some(term));
        }
    }
    Ok(None)
}

/// A Jónsson chain `t_0 = x, .., t_m = z` witnessing congruence
/// distributivity: every `t_i(x,y,x) = x`, consecutive terms agreeing
/// on `x = y` at even links and on `y = z` at odd links.
pub fn jonsson_terms(alg: &dyn SmallAlgebra) -> UACalcResult<Option<Vec<Term>>> {
    jonsson_terms_with_effort(alg, &Effort::unbounded())
}

pub fn jonsson_terms_with_effort(
    alg: &dyn SmallAlgebra,
    effort: &Effort,
) -> UACalcResult<Option<Vec<Term>>> {
    let n = alg.cardinality();
    if n <= 1 {
        return Ok(Some(vec![Term::var(Variable::x())]));
    }
    let coords = power_checked(n, 3).ok_or_else(|| {
        UACalcError::out_of_range("Jónsson search: assignment space overflows")
    })?;
    // Digit vectors of the three free generators, and the coordinate
    // classes where pairs of them agree.
    let mut digits = vec![0; 3];
    let mut x_t = Vec::with_capacity(coords);
    let mut y_t = Vec::with_capacity(coords);
    let mut z_t = Vec::with_capacity(coords);
    let mut eq_xy = Vec::new();
    let mut eq_yz = Vec::new();
    let mut eq_xz = Vec::new();
    for j in 0..coords {
        horner_inv_uniform_into(j, n, &mut digits)?;
        x_t.push(digits[0]);
        y_t.push(digits[1]);
        z_t.push(digits[2]);
        if digits[0] == digits[1] {
            eq_xy.push(j);
        }
        if digits[1] == digits[2] {
            eq_yz.push(j);
        }
        if digits[0] == digits[2] {
            eq_xz.push(j);
        }
    }
    let envelope = BigProductAlgebra::power_of_ops(
        format!("{}-jonsson", alg.name()),
        n,
        alg.operations().to_vec(),
        coords,
    )?;
    let gens = vec![
        IntArray::new(x_t.clone()),
        IntArray::new(y_t),
        IntArray::new(z_t.clone()),
    ];
    let variables = [Variable::x(), Variable::y(), Variable::z()];
    let mut closer = Closer::new(&envelope, gens).with_term_map(&variables)?;
    let elements = closer.close(effort)?;
    let term_map = closer.term_map().ok_or_else(|| {
        UACalcError::invariant("Jónsson search: the closure lost its term map")
    })?;

    // Candidates satisfy t(x,y,x) = x: the vector agrees with x
    // wherever the first and third digits coincide.
    let candidates: Vec<usize> = (0..elements.len())
        .filter(|&i| {
            let e = elements[i].as_slice();
            eq_xz.iter().all(|&j| e[j] == x_t[j])
        })
        .collect();
    let x_vec = IntArray::new(x_t);
    let z_vec = IntArray::new(z_t);
    let x_idx = elements.iter().position(|e| e == &x_vec);
    let z_idx = elements.iter().position(|e| e == &z_vec);
    let (x_idx, z_idx) = match (x_idx, z_idx) {
        (Some(a), Some(b)) => (a, b),
        _ => return Ok(None),
    };
    let agree = |a: usize, b: usize, class: &[usize]| -> bool {
        let ea = elements[a].as_slice();
        let eb = elements[b].as_slice();
        class.iter().all(|&j| ea[j] == eb[j])
    };
    // Breadth-first search over (candidate, link parity).
    let num = elements.len();
    let mut pred: Vec<[Option<(usize, usize)>; 2]> = vec![[None, None]; num];
    let mut seen = vec![[false, false]; num];
    let mut queue = std::collections::VecDeque::new();
    seen[x_idx][0] = true;
    queue.push_back((x_idx, 0usize));
    let mut goal: Option<(usize, usize)> = None;
    if x_idx == z_idx {
        goal = Some((x_idx, 0));
    }
    'bfs: while let Some((e, p)) = queue.pop_front() {
        effort.tick("Jónsson chain search")?;
        let class = if p == 0 { &eq_xy } else { &eq_yz };
        for &c in &candidates {
            if seen[c][1 - p] || !agree(e, c, class) {
                continue;
            }
            seen[c][1 - p] = true;
            pred[c][1 - p] = Some((e, p));
            if c == z_idx {
                goal = Some((c, 1 - p));
                break 'bfs;
            }
            queue.push_back((c, 1 - p));
        }
    }
    let (mut e, mut p) = match goal {
        Some(g) => g,
        None => return Ok(None),
    };
    let mut path = vec![e];
    while let Some((prev, pp)) = pred[e][p] {
        path.push(prev);
        e = prev;
        p = pp;
    }
    path.reverse();
    let mut terms: Vec<Term> = Vec::with_capacity(path.len());
    for &i in &path {
        terms.push(term_map.get(&elements[i]).cloned().ok_or_else(|| {
            UACalcError::invariant("Jónsson search: a chain element carries no term")
        })?);
    }
    Ok(Some(terms))
}

/// Number of links in the shortest Jónsson chain, when one exists.
pub fn jonsson_level(alg: &dyn SmallAlgebra) -> UACalcResult<Option<usize>> {
    Ok(jonsson_terms(alg)?.map(|ts| ts.len().saturating_sub(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alg::algebra::BasicAlgebra;

    fn z3() -> BasicAlgebra {
        BasicAlgebra::from_tables("Z3", 3, &[("+", 2, vec![0, 1, 2, 1, 2, 0, 2, 0, 1])])
            .unwrap()
    }

    fn lattice2() -> BasicAlgebra {
        BasicAlgebra::from_tables(
            "2",
            2,
            &[("meet", 2, vec![0, 0, 0, 1]), ("join", 2, vec![0, 1, 1, 1])],
        )
        .unwrap()
    }

    #[test]
    fn z3_has_a_malcev_term() {
        let alg = z3();
        let term = malcev_term(&alg).unwrap().expect("groups are Maltsev");
        let vars = [Variable::x(), Variable::y(), Variable::z()];
        for a in 0..3 {
            for b in 0..3 {
                assert_eq!(term.int_value_at(&alg, &vars, &[a, a, b]).unwrap(), b);
                assert_eq!(term.int_value_at(&alg, &vars, &[b, a, a]).unwrap(), b);
            }
        }
    }

    #[test]
    fn lattice_has_majority_but_no_malcev() {
        let alg = lattice2();
        assert!(malcev_term(&alg).unwrap().is_none());
        let m = majority_term(&alg).unwrap().expect("lattices have a majority term");
        let vars = [Variable::x(), Variable::y(), Variable::z()];
        for a in 0..2 {
            for b in 0..2 {
                assert_eq!(m.int_value_at(&alg, &vars, &[a, a, b]).unwrap(), a);
                assert_eq!(m.int_value_at(&alg, &vars, &[a, b, a]).unwrap(), a);
                assert_eq!(m.int_value_at(&alg, &vars, &[b, a, a]).unwrap(), a);
            }
        }
    }

    #[test]
    fn semilattice_term_of_a_semilattice() {
        let alg =
            BasicAlgebra::from_tables("sl2", 2, &[("meet", 2, vec![0, 0, 0, 1])]).unwrap();
        let t = semilattice_term(&alg).unwrap().expect("meet works");
        assert_eq!(t.to_string(), "meet(x,y)");
    }

    #[test]
    fn z3_has_no_semilattice_term() {
        assert!(semilattice_term(&z3()).unwrap().is_none());
    }

    #[test]
    fn lattice_jonsson_chain_is_short() {
        let alg = lattice2();
        let terms = jonsson_terms(&alg).unwrap().expect("lattices are CD");
        assert!(terms.len() >= 2);
        // Endpoints are the projections.
        assert_eq!(terms.first().unwrap().to_string(), "x");
        assert_eq!(terms.last().unwrap().to_string(), "z");
    }

    #[test]
    fn z3_has_no_jonsson_chain() {
        // Abelian groups are congruence permutable but not distributive.
        assert!(jonsson_terms(&z3()).unwrap().is_none());
    }

    #[test]
    fn discriminator_has_pixley_term() {
        let mut table = Vec::new();
        for x in 0..2 {
            for y in 0..2 {
                for z in 0..2 {
                    table.push(if x == y { z } else { x });
                }
            }
        }
        let alg = BasicAlgebra::from_tables("disc2", 2, &[("t", 3, table)]).unwrap();
        assert!(pixley_term(&alg).unwrap().is_some());
        assert!(malcev_term(&alg).unwrap().is_some());
        assert!(majority_term(&alg).unwrap().is_some());
    }
}
