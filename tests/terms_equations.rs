//! Term parsing, evaluation, compilation, and equation checking.

use uacalc_kernel::prelude::*;

fn z3() -> BasicAlgebra {
    BasicAlgebra::from_tables("Z3", 3, &[("+", 2, vec![0, 1, 2, 1, 2, 0, 2, 0, 1])]).unwrap()
}

#[test]
fn parse_print_round_trip() {
    for s in [
        "x",
        "f(x)",
        "f(x,y)",
        "f(g(x),h(y,z))",
        "+(x,+(y,z))",
        "meet(join(x,y),z)",
    ] {
        let t = Term::parse(s).unwrap();
        assert_eq!(Term::parse(&t.to_string()).unwrap(), t);
        assert_eq!(t.to_string(), s);
    }
}

#[test]
fn commutativity_has_no_failure_in_z3() {
    let alg = z3();
    let eq = Equation::parse("+(x,y)", "+(y,x)").unwrap();
    assert_eq!(eq.find_failure(&alg).unwrap(), None);
}

#[test]
fn medial_law_holds_in_abelian_groups() {
    let alg = z3();
    let eq = Equation::parse("+(x,+(y,z))", "+(+(x,z),y)").unwrap();
    assert_eq!(eq.find_failure(&alg).unwrap(), None);
}

#[test]
fn symmetric_group_fails_commutativity() {
    // S3 as the multiplication table of the six permutations of
    // {0,1,2}; elements are numbered 0 = id, 1 = (01), 2 = (02),
    // 3 = (12), 4 = (012), 5 = (021), composing left to right.
    let perms: [[usize; 3]; 6] = [
        [0, 1, 2],
        [1, 0, 2],
        [2, 1, 0],
        [0, 2, 1],
        [1, 2, 0],
        [2, 0, 1],
    ];
    let compose = |a: usize, b: usize| -> usize {
        let mut image = [0; 3];
        for (i, slot) in image.iter_mut().enumerate() {
            *slot = perms[b][perms[a][i]];
        }
        perms.iter().position(|p| *p == image).unwrap()
    };
    let mut table = Vec::with_capacity(36);
    for a in 0..6 {
        for b in 0..6 {
            table.push(compose(a, b));
        }
    }
    let alg = BasicAlgebra::from_tables("S3", 6, &[("*", 2, table)]).unwrap();
    let eq = Equation::parse("*(x,y)", "*(y,x)").unwrap();
    let failure = eq.find_failure(&alg).unwrap().expect("S3 is nonabelian");
    let a = failure[0];
    let b = failure[1];
    assert_ne!(compose(a, b), compose(b, a));
}

#[test]
fn table_materialization_matches_direct_reads() {
    let alg = z3();
    let t = Term::parse("+(+(x,y),x)").unwrap();
    let vars = vec![Variable::x(), Variable::y()];
    let op = TermOperation::compile(t, vars, &alg).unwrap();
    op.make_table().unwrap();
    let table = op.table().unwrap();
    for a in 0..3 {
        for b in 0..3 {
            let k = horner::horner_uniform(&[a, b], 3).unwrap();
            assert_eq!(op.int_value_at(&[a, b]).unwrap(), table[k]);
        }
    }
}

#[test]
fn undefined_propagates_through_terms() {
    let partial = FunctionOperation::new(OperationSymbol::new("p", 1), 2, |args| {
        if args[0] == 0 {
            Some(0)
        } else {
            None
        }
    });
    let alg = BasicAlgebra::new("partial", 2, vec![std::sync::Arc::new(partial)]).unwrap();
    let t = Term::parse("p(p(x))").unwrap();
    assert_eq!(t.int_value_at(&alg, &[Variable::x()], &[0]).unwrap(), 0);
    let err = t.int_value_at(&alg, &[Variable::x()], &[1]).unwrap_err();
    assert_eq!(err.kind(), "Undefined");
}

#[test]
fn equation_over_constants_only() {
    let c = operations::constant("c", 2, 1).unwrap();
    let d = operations::constant("d", 2, 1).unwrap();
    let alg = BasicAlgebra::new("pointed", 2, vec![c, d]).unwrap();
    let eq = Equation::parse("c()", "d()").unwrap();
    assert_eq!(eq.find_failure(&alg).unwrap(), None);
}
