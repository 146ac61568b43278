//! Congruence-lattice scenarios on small concrete algebras.

use uacalc_kernel::prelude::*;

fn z3() -> BasicAlgebra {
    BasicAlgebra::from_tables("Z3", 3, &[("+", 2, vec![0, 1, 2, 1, 2, 0, 2, 0, 1])]).unwrap()
}

fn lattice2() -> BasicAlgebra {
    BasicAlgebra::from_tables(
        "2",
        2,
        &[("meet", 2, vec![0, 0, 0, 1]), ("join", 2, vec![0, 1, 1, 1])],
    )
    .unwrap()
}

/// A three-element chain as a lattice; Con is the 3-element chain too.
fn chain3() -> BasicAlgebra {
    let meet = vec![0, 0, 0, 0, 1, 1, 0, 1, 2];
    let join = vec![0, 1, 2, 1, 1, 2, 2, 2, 2];
    BasicAlgebra::from_tables("C3", 3, &[("meet", 2, meet), ("join", 2, join)]).unwrap()
}

#[test]
fn cyclic_group_of_order_three() {
    let alg = z3();
    let con = alg.con();
    assert!(con.cg(0, 1).unwrap().is_one());
    assert_eq!(con.cardinality().unwrap(), 2);
    assert!(con.is_distributive().unwrap());
    assert_eq!(con.atoms().unwrap().len(), 1);
    assert_eq!(con.join_irreducibles().unwrap().len(), 1);
}

#[test]
fn two_element_lattice() {
    let alg = lattice2();
    let con = alg.con();
    assert_eq!(con.cardinality().unwrap(), 2);
    assert_eq!(con.atoms().unwrap().len(), 1);
    assert!(con.is_distributive().unwrap());
}

#[test]
fn chain_congruences() {
    let alg = chain3();
    let con = alg.con();
    // Collapsing 0,1 or 1,2 gives proper congruences of the chain.
    let c01 = con.cg(0, 1).unwrap();
    let c12 = con.cg(1, 2).unwrap();
    assert_eq!(c01.number_of_blocks(), 2);
    assert_eq!(c12.number_of_blocks(), 2);
    assert!(c01.join(&c12).unwrap().is_one());
    assert!(c01.meet(&c12).unwrap().is_zero());
    assert_eq!(con.cardinality().unwrap(), 4);
    assert!(con.is_distributive().unwrap());
    assert!(con.is_modular().unwrap());
    assert_eq!(con.coatoms().unwrap().len(), 2);
}

#[test]
fn congruence_closure_respects_operations() {
    let alg = chain3();
    let con = alg.con();
    let theta = con.cg(0, 1).unwrap();
    let n = alg.cardinality();
    for op in alg.operations() {
        let arity = op.arity();
        for x in 0..n {
            for y in 0..n {
                if !theta.is_related(x, y) {
                    continue;
                }
                // Perturb each coordinate of every tuple.
                for coord in 0..arity {
                    let total = n.pow((arity - 1) as u32);
                    for rest in 0..total {
                        let mut args = vec![0; arity];
                        let mut r = rest;
                        for (i, a) in args.iter_mut().enumerate() {
                            if i != coord {
                                *a = r % n;
                                r /= n;
                            }
                        }
                        args[coord] = x;
                        let vx = op.int_value_at(&args).unwrap();
                        args[coord] = y;
                        let vy = op.int_value_at(&args).unwrap();
                        assert!(theta.is_related(vx, vy));
                    }
                }
            }
        }
    }
}

#[test]
fn principal_congruence_is_minimal() {
    let alg = chain3();
    let con = alg.con();
    let theta = con.cg(0, 1).unwrap();
    let n = alg.cardinality();
    for u in 0..n {
        for v in (u + 1)..n {
            if theta.is_related(u, v) {
                continue;
            }
            // Adding an outside pair and closing again grows strictly.
            let seeded = theta.join(&Partition::from_blocks(n, &[vec![u, v]]).unwrap()).unwrap();
            let closed = con.cg_partition(&seeded).unwrap();
            assert!(theta.leq(&closed));
            assert_ne!(theta, closed);
        }
    }
}

#[test]
fn atoms_are_join_irreducible_congruences() {
    for alg in [z3(), lattice2(), chain3()] {
        let con = alg.con();
        let universe = con.universe().unwrap().to_vec();
        let jis = con.join_irreducibles().unwrap().to_vec();
        let atoms = con.atoms().unwrap().to_vec();
        for a in &atoms {
            assert!(jis.contains(a));
        }
        for ji in &jis {
            assert!(universe.contains(ji));
        }
    }
}

#[test]
fn join_irreducibles_have_unique_lower_cover() {
    let alg = chain3();
    let con = alg.con();
    for ji in con.join_irreducibles().unwrap() {
        let star = con.lower_star(ji).unwrap().unwrap();
        assert!(star.leq(ji));
        assert_ne!(&star, ji);
    }
}

#[test]
fn complements_in_the_four_element_con() {
    let alg = chain3();
    let con = alg.con();
    let c01 = con.cg(0, 1).unwrap();
    let comps = con.complements(&c01).unwrap();
    assert_eq!(comps.len(), 1);
    assert_eq!(comps[0], con.cg(1, 2).unwrap());
}

#[test]
fn generating_pair_matches_principal() {
    let alg = chain3();
    let con = alg.con();
    let theta = con.cg(1, 2).unwrap();
    let (a, b) = con.generating_pair(&theta).unwrap().unwrap();
    assert_eq!(con.cg(a, b).unwrap(), theta);
}

#[test]
fn meet_irreducibles_and_upper_covers() {
    let alg = chain3();
    let con = alg.con();
    let mis = con.meet_irreducibles().unwrap();
    // In the 2x2 diamond only the two coatoms have a single upper cover.
    assert_eq!(mis.len(), 2);
    let zero_covers = con.upper_covers(con.zero()).unwrap();
    assert_eq!(zero_covers.len(), 2);
}
