//! Terms over a similarity type: variables and operation applications.
//!
//! Terms are immutable trees. They evaluate against any algebra whose
//! signature contains their symbols, print as `f(x,g(y))`, parse back
//! from that shape, and compile into operations (table-backed when the
//! table fits).

use ahash::AHashMap;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

use crate::alg::algebra::SmallAlgebra;
use crate::alg::op::operation::{check_args, Operation};
use crate::alg::op::operation_symbol::OperationSymbol;
use crate::error::{UACalcError, UACalcResult};
use crate::util::horner::{horner_inv_uniform_into, horner_table_size, horner_uniform};

/// Above this table size a compiled term evaluates on demand.
pub const TABLE_LIMIT: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    name: String,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Variable { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn x() -> Self {
        Variable::new("x")
    }

    pub fn y() -> Self {
        Variable::new("y")
    }

    pub fn z() -> Self {
        Variable::new("z")
    }

    /// x, y, z, then x3, x4, ...
    pub fn nth(i: usize) -> Self {
        match i {
            0 => Variable::x(),
            1 => Variable::y(),
            2 => Variable::z(),
            n => Variable::new(format!("x{}", n)),
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Variable(Variable),
    NonVariable {
        symbol: OperationSymbol,
        children: Vec<Term>,
    },
}

impl Term {
    pub fn var(v: Variable) -> Self {
        Term::Variable(v)
    }

    /// `symbol(children...)`; the arity must match.
    pub fn apply(symbol: OperationSymbol, children: Vec<Term>) -> Self {
        debug_assert_eq!(symbol.arity(), children.len());
        Term::NonVariable { symbol, children }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    /// Free variables in leftmost-first order.
    pub fn variables(&self) -> Vec<Variable> {
        let mut vars = Vec::new();
        self.collect_variables(&mut vars);
        vars
    }

    fn collect_variables(&self, vars: &mut Vec<Variable>) {
        match self {
            Term::Variable(v) => {
                if !vars.contains(v) {
                    vars.push(v.clone());
                }
            }
            Term::NonVariable { children, .. } => {
                for c in children {
                    c.collect_variables(vars);
                }
            }
        }
    }

    /// Operation symbols occurring in the term, leftmost-first.
    pub fn symbols(&self) -> Vec<OperationSymbol> {
        let mut syms = Vec::new();
        self.collect_symbols(&mut syms);
        syms
    }

    fn collect_symbols(&self, syms: &mut Vec<OperationSymbol>) {
        if let Term::NonVariable { symbol, children } = self {
            if !syms.contains(symbol) {
                syms.push(symbol.clone());
            }
            for c in children {
                c.collect_symbols(syms);
            }
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            Term::Variable(_) => 0,
            Term::NonVariable { children, .. } => {
                1 + children.iter().map(Term::depth).max().unwrap_or(0)
            }
        }
    }

    /// Number of nodes.
    pub fn length(&self) -> usize {
        match self {
            Term::Variable(_) => 1,
            Term::NonVariable { children, .. } => {
                1 + children.iter().map(Term::length).sum::<usize>()
            }
        }
    }

    /// Evaluate in `alg` with `variables[i]` bound to `args[i]`,
    /// children left to right.
    pub fn int_value_at(
        &self,
        alg: &dyn SmallAlgebra,
        variables: &[Variable],
        args: &[usize],
    ) -> UACalcResult<usize> {
        if variables.len() != args.len() {
            return Err(UACalcError::out_of_range(format!(
                "term evaluation: {} variables but {} arguments",
                variables.len(),
                args.len()
            )));
        }
        let ops = capture_ops(self, alg)?;
        eval_with_ops(self, &ops, variables, args)
    }

    /// Evaluate with an explicit variable assignment.
    pub fn int_value_with_map(
        &self,
        alg: &dyn SmallAlgebra,
        assignment: &AHashMap<Variable, usize>,
    ) -> UACalcResult<usize> {
        let vars = self.variables();
        let mut args = Vec::with_capacity(vars.len());
        for v in &vars {
            args.push(*assignment.get(v).ok_or_else(|| {
                UACalcError::out_of_range(format!("term evaluation: variable {} unbound", v))
            })?);
        }
        self.int_value_at(alg, &vars, &args)
    }

    /// Parse `f(x,g(y,z))`-shaped text. Names may use any characters
    /// except parentheses, commas and whitespace; whitespace is
    /// insignificant. A bare name is a variable.
    pub fn parse(input: &str) -> UACalcResult<Term> {
        let chars: Vec<char> = input.chars().collect();
        let mut pos = 0;
        let term = parse_term(&chars, &mut pos)?;
        skip_ws(&chars, &mut pos);
        if pos != chars.len() {
            return Err(UACalcError::parse(format!(
                "term '{}': trailing input at position {}",
                input, pos
            )));
        }
        Ok(term)
    }
}

fn skip_ws(chars: &[char], pos: &mut usize) {
    while *pos < chars.len() && chars[*pos].is_whitespace() {
        *pos += 1;
    }
}

fn is_name_char(c: char) -> bool {
    !c.is_whitespace() && c != '(' && c != ')' && c != ','
}

fn parse_term(chars: &[char], pos: &mut usize) -> UACalcResult<Term> {
    skip_ws(chars, pos);
    let start = *pos;
    while *pos < chars.len() && is_name_char(chars[*pos]) {
        *pos += 1;
    }
    if *pos == start {
        return Err(UACalcError::parse(format!(
            "term: expected a name at position {}",
            start
        )));
    }
    let name: String = chars[start..*pos].iter().collect();
    skip_ws(chars, pos);
    if *pos < chars.len() && chars[*pos] == '(' {
        *pos += 1;
        let mut children = Vec::new();
        skip_ws(chars, pos);
        if *pos < chars.len() && chars[*pos] == ')' {
            *pos += 1;
        } else {
            loop {
                children.push(parse_term(chars, pos)?);
                skip_ws(chars, pos);
                match chars.get(*pos) {
                    Some(',') => {
                        *pos += 1;
                    }
                    Some(')') => {
                        *pos += 1;
                        break;
                    }
                    _ => {
                        return Err(UACalcError::parse(format!(
                            "term: expected ',' or ')' at position {}",
                            pos
                        )));
                    }
                }
            }
        }
        let symbol = OperationSymbol::new(name, children.len());
        Ok(Term::NonVariable { symbol, children })
    } else {
        Ok(Term::Variable(Variable::new(name)))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Variable(v) => write!(f, "{}", v),
            Term::NonVariable { symbol, children } => {
                write!(f, "{}", symbol.name())?;
                write!(f, "(")?;
                for (i, c) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", c)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Collect the operations a term needs from an algebra, by symbol.
fn capture_ops(
    term: &Term,
    alg: &dyn SmallAlgebra,
) -> UACalcResult<AHashMap<OperationSymbol, Arc<dyn Operation>>> {
    let mut map = AHashMap::new();
    for sym in term.symbols() {
        match alg.operation(&sym) {
            Some(op) => {
                map.insert(sym, op.clone());
            }
            None => {
                return Err(UACalcError::signature(format!(
                    "algebra {} has no operation {} of arity {}",
                    alg.name(),
                    sym.name(),
                    sym.arity()
                )));
            }
        }
    }
    Ok(map)
}

fn eval_with_ops(
    term: &Term,
    ops: &AHashMap<OperationSymbol, Arc<dyn Operation>>,
    variables: &[Variable],
    args: &[usize],
) -> UACalcResult<usize> {
    match term {
        Term::Variable(v) => variables
            .iter()
            .position(|w| w == v)
            .map(|i| args[i])
            .ok_or_else(|| {
                UACalcError::out_of_range(format!("term evaluation: variable {} unbound", v))
            }),
        Term::NonVariable { symbol, children } => {
            let op = ops.get(symbol).ok_or_else(|| {
                UACalcError::signature(format!(
                    "term evaluation: no operation for symbol {}",
                    symbol
                ))
            })?;
            let mut vals = Vec::with_capacity(children.len());
            for c in children {
                vals.push(eval_with_ops(c, ops, variables, args)?);
            }
            op.int_value_at(&vals)
        }
    }
}

/// A term compiled into an operation of arity `variables.len()`.
pub struct TermOperation {
    symbol: OperationSymbol,
    term: Term,
    variables: Vec<Variable>,
    set_size: usize,
    ops: AHashMap<OperationSymbol, Arc<dyn Operation>>,
    table: OnceCell<Vec<usize>>,
}

impl TermOperation {
    /// Compile `term` against `alg` with the given argument order. When
    /// the table fits under [`TABLE_LIMIT`] it is materialized at once;
    /// otherwise evaluation stays on demand.
    pub fn compile(
        term: Term,
        variables: Vec<Variable>,
        alg: &dyn SmallAlgebra,
    ) -> UACalcResult<Self> {
        for v in term.variables() {
            if !variables.contains(&v) {
                return Err(UACalcError::out_of_range(format!(
                    "term {}: variable {} is not in the argument list",
                    term, v
                )));
            }
        }
        let ops = capture_ops(&term, alg)?;
        let symbol = OperationSymbol::new(term.to_string(), variables.len());
        let op = TermOperation {
            symbol,
            term,
            variables,
            set_size: alg.cardinality(),
            ops,
            table: OnceCell::new(),
        };
        if let Some(size) = horner_table_size(op.arity(), op.set_size) {
            if size <= TABLE_LIMIT {
                op.make_table()?;
            }
        }
        Ok(op)
    }

    pub fn term(&self) -> &Term {
        &self.term
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }
}

impl fmt::Debug for TermOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TermOperation")
            .field("term", &self.term.to_string())
            .field("arity", &self.variables.len())
            .field("set_size", &self.set_size)
            .field("table_built", &self.table.get().is_some())
            .finish()
    }
}

impl Operation for TermOperation {
    fn symbol(&self) -> &OperationSymbol {
        &self.symbol
    }

    fn set_size(&self) -> usize {
        self.set_size
    }

    fn int_value_at(&self, args: &[usize]) -> UACalcResult<usize> {
        check_args(self, args)?;
        if let Some(table) = self.table.get() {
            return Ok(table[horner_uniform(args, self.set_size)?]);
        }
        eval_with_ops(&self.term, &self.ops, &self.variables, args)
    }

    fn make_table(&self) -> UACalcResult<()> {
        self.table
            .get_or_try_init(|| {
                let size = horner_table_size(self.arity(), self.set_size).ok_or_else(|| {
                    UACalcError::out_of_range(format!(
                        "term {}: table size overflow",
                        self.term
                    ))
                })?;
                let mut table = Vec::with_capacity(size);
                let mut args = vec![0; self.arity()];
                for k in 0..size {
                    horner_inv_uniform_into(k, self.set_size, &mut args)?;
                    table.push(eval_with_ops(&self.term, &self.ops, &self.variables, &args)?);
                }
                Ok(table)
            })
            .map(|_| ())
    }

    fn table(&self) -> Option<&[usize]> {
        self.table.get().map(|t| t.as_slice())
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
    fn parse_print_round_trip() {
        for s in ["x", "f(x,y)", "f(x,g(y,z))", "+(x,+(y,y))"] {
            let t = Term::parse(s).unwrap();
            assert_eq!(t.to_string(), s);
            assert_eq!(Term::parse(&t.to_string()).unwrap(), t);
        }
    }

    #[test]
    fn parse_ignores_whitespace() {
        let t = Term::parse(" f ( x , y ) ").unwrap();
        assert_eq!(t.to_string(), "f(x,y)");
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(Term::parse("f(x").is_err());
        assert!(Term::parse("f(x,)").is_err());
        assert!(Term::parse("").is_err());
        assert!(Term::parse("f(x) y").is_err());
    }

    #[test]
    fn variables_leftmost_first() {
        let t = Term::parse("f(y,g(x,y),z)").unwrap();
        let vars = t.variables();
        let names: Vec<&str> = vars.iter().map(|v| v.name()).collect::<Vec<_>>();
        assert_eq!(names, vec!["y", "x", "z"]);
        assert_eq!(t.depth(), 2);
        assert_eq!(t.length(), 6);
    }

    #[test]
    fn evaluation_in_z3() {
        let alg = z3();
        let t = Term::parse("+(x,+(y,y))").unwrap();
        let vars = [Variable::x(), Variable::y()];
        // 1 + (2 + 2) = 1 + 1 = 2.
        assert_eq!(t.int_value_at(&alg, &vars, &[1, 2]).unwrap(), 2);
    }

    #[test]
    fn missing_symbol_is_signature_mismatch() {
        let alg = z3();
        let t = Term::parse("*(x,y)").unwrap();
        let err = t
            .int_value_at(&alg, &[Variable::x(), Variable::y()], &[0, 0])
            .unwrap_err();
        assert_eq!(err.kind(), "SignatureMismatch");
    }

    #[test]
    fn compiled_term_matches_direct_evaluation() {
        let alg = z3();
        let t = Term::parse("+(x,+(y,y))").unwrap();
        let vars = vec![Variable::x(), Variable::y()];
        let op = TermOperation::compile(t.clone(), vars.clone(), &alg).unwrap();
        assert!(op.is_table_based());
        for a in 0..3 {
            for b in 0..3 {
                assert_eq!(
                    op.int_value_at(&[a, b]).unwrap(),
                    t.int_value_at(&alg, &vars, &[a, b]).unwrap()
                );
            }
        }
    }

    #[test]
    fn compile_can_add_dummy_arguments() {
        let alg = z3();
        let t = Term::parse("+(x,x)").unwrap();
        let op =
            TermOperation::compile(t, vec![Variable::x(), Variable::y()], &alg).unwrap();
        assert_eq!(op.arity(), 2);
        assert_eq!(op.int_value_at(&[1, 2]).unwrap(), 2);
    }
}
