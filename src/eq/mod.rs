//! Equations: a pair of terms over shared variables.

use crate::alg::algebra::SmallAlgebra;
use crate::alg::op::operation_symbol::OperationSymbol;
use crate::error::{UACalcError, UACalcResult};
use crate::terms::{Term, Variable};
use crate::util::horner::{horner_inv_uniform_into, power_checked};

/// `left = right`. The equation fails in an algebra iff some assignment
/// of the variables makes the sides differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equation {
    left: Term,
    right: Term,
    variables: Vec<Variable>,
}

impl Equation {
    pub fn new(left: Term, right: Term) -> Self {
        let mut variables = left.variables();
        for v in right.variables() {
            if !variables.contains(&v) {
                variables.push(v);
            }
        }
        Equation { left, right, variables }
    }

    pub fn parse(left: &str, right: &str) -> UACalcResult<Self> {
        Ok(Equation::new(Term::parse(left)?, Term::parse(right)?))
    }

    pub fn left(&self) -> &Term {
        &self.left
    }

    pub fn right(&self) -> &Term {
        &self.right
    }

    /// Variables of both sides, leftmost-first, left side first.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Operation symbols of both sides.
    pub fn symbols(&self) -> Vec<OperationSymbol> {
        let mut syms = self.left.symbols();
        for s in self.right.symbols() {
            if !syms.contains(&s) {
                syms.push(s);
            }
        }
        syms
    }

    /// The first assignment (in Horner order over the variable list)
    /// where the sides differ, or None when the equation holds.
    pub fn find_failure(&self, alg: &dyn SmallAlgebra) -> UACalcResult<Option<Vec<usize>>> {
        let n = alg.cardinality();
        let num_vars = self.variables.len();
        if n == 0 {
            return Ok(None);
        }
        let total = power_checked(n, num_vars).ok_or_else(|| {
            UACalcError::out_of_range(format!(
                "equation on {}: {}^{} assignments overflow",
                alg.name(),
                n,
                num_vars
            ))
        })?;
        let mut args = vec![0; num_vars];
        for k in 0..total {
            horner_inv_uniform_into(k, n, &mut args)?;
            let l = self.left.int_value_at(alg, &self.variables, &args)?;
            let r = self.right.int_value_at(alg, &self.variables, &args)?;
            if l != r {
                return Ok(Some(args));
            }
        }
        Ok(None)
    }

    /// Like [`Equation::find_failure`] but keyed by variable.
    pub fn find_failure_map(
        &self,
        alg: &dyn SmallAlgebra,
    ) -> UACalcResult<Option<Vec<(Variable, usize)>>> {
        Ok(self.find_failure(alg)?.map(|args| {
            self.variables.iter().cloned().zip(args).collect()
        }))
    }

    pub fn holds_in(&self, alg: &dyn SmallAlgebra) -> UACalcResult<bool> {
        Ok(self.find_failure(alg)?.is_none())
    }
}

impl std::fmt::Display for Equation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.left, self.right)
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
    fn commutativity_holds_in_z3() {
        let eq = Equation::parse("+(x,y)", "+(y,x)").unwrap();
        assert!(eq.holds_in(&z3()).unwrap());
    }

    #[test]
    fn mediality_holds_in_abelian_group() {
        let eq = Equation::parse("+(x,+(y,z))", "+(+(x,z),y)").unwrap();
        assert_eq!(eq.find_failure(&z3()).unwrap(), None);
    }

    #[test]
    fn failing_equation_reports_first_assignment() {
        // x + y = x fails first at x=0, y=1 in Horner order.
        let eq = Equation::parse("+(x,y)", "x").unwrap();
        let failure = eq.find_failure(&z3()).unwrap().unwrap();
        assert_eq!(failure, vec![0, 1]);
        let map = eq.find_failure_map(&z3()).unwrap().unwrap();
        assert_eq!(map[0], (Variable::x(), 0));
        assert_eq!(map[1], (Variable::y(), 1));
    }

    #[test]
    fn variable_order_left_then_right() {
        let eq = Equation::parse("+(y,x)", "+(x,z)").unwrap();
        let names: Vec<&str> = eq.variables().iter().map(|v| v.name()).collect();
        assert_eq!(names, vec!["y", "x", "z"]);
    }
}
