//! The operation model.
//!
//! An operation is an `n`-ary map on a carrier `{0,..,set_size-1}`. The
//! two base representations are a flat Horner-indexed table
//! ([`IntOperation`]) and an on-demand evaluator ([`FunctionOperation`],
//! possibly partial). Derived algebras add composite operations that
//! delegate to their parents; all of them speak this trait.

use once_cell::sync::OnceCell;
use std::fmt;

use crate::alg::op::operation_symbol::OperationSymbol;
use crate::error::{UACalcError, UACalcResult};
use crate::util::horner::{horner_inv_uniform, horner_table_size, horner_uniform};

/// Uniform contract for operations on an integer carrier.
pub trait Operation: fmt::Debug + Send + Sync {
    fn symbol(&self) -> &OperationSymbol;

    /// Size of the carrier the operation acts on.
    fn set_size(&self) -> usize;

    fn arity(&self) -> usize {
        self.symbol().arity()
    }

    /// Value on an argument tuple. `Undefined` for partial operations on
    /// arguments outside the defined region, `OutOfRange` on bad input.
    fn int_value_at(&self, args: &[usize]) -> UACalcResult<usize>;

    /// Value by Horner-encoded index, `int_value_at(decode(index))`.
    fn int_value_at_index(&self, index: usize) -> UACalcResult<usize> {
        if let Some(table) = self.table() {
            return table.get(index).copied().ok_or_else(|| {
                UACalcError::out_of_range(format!(
                    "operation {}: index {} exceeds table of length {}",
                    self.symbol(),
                    index,
                    table.len()
                ))
            });
        }
        let args = horner_inv_uniform(index, self.set_size(), self.arity())?;
        self.int_value_at(&args)
    }

    /// Materialize the flat table. Idempotent; later reads go through it.
    fn make_table(&self) -> UACalcResult<()> {
        Ok(())
    }

    /// The flat table, if one has been materialized.
    fn table(&self) -> Option<&[usize]> {
        None
    }

    fn is_table_based(&self) -> bool {
        self.table().is_some()
    }

    fn is_idempotent(&self) -> UACalcResult<bool> {
        compute_idempotent(self)
    }

    fn is_commutative(&self) -> UACalcResult<bool> {
        compute_commutative(self)
    }

    fn is_associative(&self) -> UACalcResult<bool> {
        compute_associative(self)
    }

    fn is_totally_symmetric(&self) -> UACalcResult<bool> {
        compute_totally_symmetric(self)
    }

    fn is_maltsev(&self) -> UACalcResult<bool> {
        compute_maltsev(self)
    }

    /// Whether the operation is defined on every argument tuple.
    fn is_total(&self) -> UACalcResult<bool> {
        compute_total(self)
    }
}

pub(crate) fn check_args(op: &(impl Operation + ?Sized), args: &[usize]) -> UACalcResult<()> {
    if args.len() != op.arity() {
        return Err(UACalcError::out_of_range(format!(
            "operation {}: got {} arguments, arity is {}",
            op.symbol(),
            args.len(),
            op.arity()
        )));
    }
    for &a in args {
        if a >= op.set_size() {
            return Err(UACalcError::out_of_range(format!(
                "operation {}: argument {} exceeds carrier size {}",
                op.symbol(),
                a,
                op.set_size()
            )));
        }
    }
    Ok(())
}

pub fn compute_idempotent(op: &(impl Operation + ?Sized)) -> UACalcResult<bool> {
    if op.arity() == 0 {
        return Ok(false);
    }
    let args_buf = vec![0; op.arity()];
    let mut args = args_buf;
    for x in 0..op.set_size() {
        args.fill(x);
        if op.int_value_at(&args)? != x {
            return Ok(false);
        }
    }
    Ok(true)
}

pub fn compute_commutative(op: &(impl Operation + ?Sized)) -> UACalcResult<bool> {
    if op.arity() != 2 {
        return Ok(false);
    }
    let n = op.set_size();
    for a in 0..n {
        for b in (a + 1)..n {
            if op.int_value_at(&[a, b])? != op.int_value_at(&[b, a])? {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

pub fn compute_associative(op: &(impl Operation + ?Sized)) -> UACalcResult<bool> {
    if op.arity() != 2 {
        return Ok(false);
    }
    let n = op.set_size();
    for a in 0..n {
        for b in 0..n {
            let ab = op.int_value_at(&[a, b])?;
            for c in 0..n {
                let bc = op.int_value_at(&[b, c])?;
                if op.int_value_at(&[ab, c])? != op.int_value_at(&[a, bc])? {
                    return Ok(false);
                }
            }
        }
    }
    Ok(true)
}

/// Invariance under every permutation of the arguments. It suffices to
/// compare each tuple with its sorted form.
pub fn compute_totally_symmetric(op: &(impl Operation + ?Sized)) -> UACalcResult<bool> {
    let arity = op.arity();
    if arity < 2 {
        return Ok(true);
    }
    let n = op.set_size();
    let table_size = horner_table_size(arity, n)
        .ok_or_else(|| UACalcError::out_of_range("totally symmetric check: table overflow"))?;
    for k in 0..table_size {
        let args = horner_inv_uniform(k, n, arity)?;
        let mut sorted = args.clone();
        sorted.sort_unstable();
        if sorted != args {
            let canon = horner_uniform(&sorted, n)?;
            if op.int_value_at_index(k)? != op.int_value_at_index(canon)? {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

pub fn compute_maltsev(op: &(impl Operation + ?Sized)) -> UACalcResult<bool> {
    if op.arity() != 3 {
        return Ok(false);
    }
    let n = op.set_size();
    for x in 0..n {
        for y in 0..n {
            if op.int_value_at(&[x, x, y])? != y || op.int_value_at(&[y, x, x])? != y {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

pub fn compute_total(op: &(impl Operation + ?Sized)) -> UACalcResult<bool> {
    let table_size = horner_table_size(op.arity(), op.set_size())
        .ok_or_else(|| UACalcError::out_of_range("totality check: table overflow"))?;
    for k in 0..table_size {
        match op.int_value_at_index(k) {
            Ok(_) => {}
            Err(UACalcError::Undefined { .. }) => return Ok(false),
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

/// Lazily computed algebraic properties, cached per operation.
#[derive(Debug, Clone, Default)]
pub(crate) struct PropertyCache {
    idempotent: OnceCell<bool>,
    commutative: OnceCell<bool>,
    associative: OnceCell<bool>,
    totally_symmetric: OnceCell<bool>,
    maltsev: OnceCell<bool>,
    total: OnceCell<bool>,
}

impl PropertyCache {
    fn cached<O: Operation + ?Sized>(
        cell: &OnceCell<bool>,
        op: &O,
        f: impl FnOnce(&O) -> UACalcResult<bool>,
    ) -> UACalcResult<bool> {
        cell.get_or_try_init(|| f(op)).copied()
    }
}

/// A total operation backed by a flat Horner-indexed table.
#[derive(Debug, Clone)]
pub struct IntOperation {
    symbol: OperationSymbol,
    set_size: usize,
    table: Vec<usize>,
    props: PropertyCache,
}

impl IntOperation {
    pub fn new(symbol: OperationSymbol, set_size: usize, table: Vec<usize>) -> UACalcResult<Self> {
        let expected = horner_table_size(symbol.arity(), set_size).ok_or_else(|| {
            UACalcError::out_of_range(format!("operation {}: table size overflow", symbol))
        })?;
        if table.len() != expected {
            return Err(UACalcError::invariant(format!(
                "operation {}: table has {} entries, expected {}^{} = {}",
                symbol,
                table.len(),
                set_size,
                symbol.arity(),
                expected
            )));
        }
        if let Some(&bad) = table.iter().find(|&&v| v >= set_size) {
            return Err(UACalcError::invariant(format!(
                "operation {}: table value {} exceeds carrier size {}",
                symbol, bad, set_size
            )));
        }
        Ok(IntOperation { symbol, set_size, table, props: PropertyCache::default() })
    }

    pub fn table_vec(&self) -> &Vec<usize> {
        &self.table
    }
}

impl Operation for IntOperation {
    fn symbol(&self) -> &OperationSymbol {
        &self.symbol
    }

    fn set_size(&self) -> usize {
        self.set_size
    }

    fn int_value_at(&self, args: &[usize]) -> UACalcResult<usize> {
        check_args(self, args)?;
        let index = horner_uniform(args, self.set_size)?;
        Ok(self.table[index])
    }

    fn int_value_at_index(&self, index: usize) -> UACalcResult<usize> {
        self.table.get(index).copied().ok_or_else(|| {
            UACalcError::out_of_range(format!(
                "operation {}: index {} exceeds table of length {}",
                self.symbol,
                index,
                self.table.len()
            ))
        })
    }

    fn table(&self) -> Option<&[usize]> {
        Some(&self.table)
    }

    fn is_idempotent(&self) -> UACalcResult<bool> {
        PropertyCache::cached(&self.props.idempotent, self, compute_idempotent)
    }

    fn is_commutative(&self) -> UACalcResult<bool> {
        PropertyCache::cached(&self.props.commutative, self, compute_commutative)
    }

    fn is_associative(&self) -> UACalcResult<bool> {
        PropertyCache::cached(&self.props.associative, self, compute_associative)
    }

    fn is_totally_symmetric(&self) -> UACalcResult<bool> {
        PropertyCache::cached(&self.props.totally_symmetric, self, compute_totally_symmetric)
    }

    fn is_maltsev(&self) -> UACalcResult<bool> {
        PropertyCache::cached(&self.props.maltsev, self, compute_maltsev)
    }

    fn is_total(&self) -> UACalcResult<bool> {
        Ok(true)
    }
}

/// An operation evaluated on demand; `None` from the closure means the
/// operation is partial there and surfaces as `Undefined`.
pub struct FunctionOperation {
    symbol: OperationSymbol,
    set_size: usize,
    func: Box<dyn Fn(&[usize]) -> Option<usize> + Send + Sync>,
    table: OnceCell<Vec<usize>>,
    props: PropertyCache,
}

impl FunctionOperation {
    pub fn new(
        symbol: OperationSymbol,
        set_size: usize,
        func: impl Fn(&[usize]) -> Option<usize> + Send + Sync + 'static,
    ) -> Self {
        FunctionOperation {
            symbol,
            set_size,
            func: Box::new(func),
            table: OnceCell::new(),
            props: PropertyCache::default(),
        }
    }
}

impl fmt::Debug for FunctionOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionOperation")
            .field("symbol", &self.symbol)
            .field("set_size", &self.set_size)
            .field("table_built", &self.table.get().is_some())
            .finish()
    }
}

impl Operation for FunctionOperation {
    fn symbol(&self) -> &OperationSymbol {
        &self.symbol
    }

    fn set_size(&self) -> usize {
        self.set_size
    }

    fn int_value_at(&self, args: &[usize]) -> UACalcResult<usize> {
        check_args(self, args)?;
        if let Some(table) = self.table.get() {
            let index = horner_uniform(args, self.set_size)?;
            return Ok(table[index]);
        }
        let v = (self.func)(args).ok_or_else(|| {
            UACalcError::undefined(format!(
                "operation {} undefined at {:?}",
                self.symbol, args
            ))
        })?;
        if v >= self.set_size {
            return Err(UACalcError::invariant(format!(
                "operation {}: value {} exceeds carrier size {}",
                self.symbol, v, self.set_size
            )));
        }
        Ok(v)
    }

    fn make_table(&self) -> UACalcResult<()> {
        self.table
            .get_or_try_init(|| {
                let size = horner_table_size(self.arity(), self.set_size).ok_or_else(|| {
                    UACalcError::out_of_range(format!(
                        "operation {}: table size overflow",
                        self.symbol
                    ))
                })?;
                let mut table = Vec::with_capacity(size);
                let mut args = vec![0; self.arity()];
                for k in 0..size {
                    crate::util::horner::horner_inv_uniform_into(k, self.set_size, &mut args)?;
                    table.push(self.int_value_at(&args)?);
                }
                Ok(table)
            })
            .map(|_| ())
    }

    fn table(&self) -> Option<&[usize]> {
        self.table.get().map(|t| t.as_slice())
    }

    fn is_idempotent(&self) -> UACalcResult<bool> {
        PropertyCache::cached(&self.props.idempotent, self, compute_idempotent)
    }

    fn is_commutative(&self) -> UACalcResult<bool> {
        PropertyCache::cached(&self.props.commutative, self, compute_commutative)
    }

    fn is_associative(&self) -> UACalcResult<bool> {
        PropertyCache::cached(&self.props.associative, self, compute_associative)
    }

    fn is_totally_symmetric(&self) -> UACalcResult<bool> {
        PropertyCache::cached(&self.props.totally_symmetric, self, compute_totally_symmetric)
    }

    fn is_maltsev(&self) -> UACalcResult<bool> {
        PropertyCache::cached(&self.props.maltsev, self, compute_maltsev)
    }

    fn is_total(&self) -> UACalcResult<bool> {
        PropertyCache::cached(&self.props.total, self, compute_total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn z3_plus() -> IntOperation {
        IntOperation::new(
            OperationSymbol::new("+", 2),
            3,
            vec![0, 1, 2, 1, 2, 0, 2, 0, 1],
        )
        .unwrap()
    }

    #[test]
    fn table_lookup_matches_value_at() {
        let op = z3_plus();
        assert_eq!(op.int_value_at(&[1, 2]).unwrap(), 0);
        assert_eq!(op.int_value_at_index(5).unwrap(), 0);
        assert!(op.is_table_based());
    }

    #[test]
    fn z3_properties() {
        let op = z3_plus();
        assert!(op.is_commutative().unwrap());
        assert!(op.is_associative().unwrap());
        assert!(!op.is_idempotent().unwrap());
        assert!(op.is_totally_symmetric().unwrap());
        assert!(op.is_total().unwrap());
    }

    #[test]
    fn discriminator_is_maltsev() {
        // t(x,y,z) = z if x == y else x.
        let op = FunctionOperation::new(OperationSymbol::new("t", 3), 2, |args| {
            Some(if args[0] == args[1] { args[2] } else { args[0] })
        });
        assert!(op.is_maltsev().unwrap());
    }

    #[test]
    fn bad_table_rejected() {
        let err = IntOperation::new(OperationSymbol::new("f", 1), 2, vec![0, 5]);
        assert!(err.is_err());
        let err = IntOperation::new(OperationSymbol::new("f", 1), 2, vec![0]);
        assert!(err.is_err());
    }

    #[test]
    fn partial_operation_is_undefined_outside_domain() {
        let op = FunctionOperation::new(OperationSymbol::new("p", 1), 3, |args| {
            if args[0] < 2 {
                Some(args[0])
            } else {
                None
            }
        });
        assert_eq!(op.int_value_at(&[1]).unwrap(), 1);
        let err = op.int_value_at(&[2]).unwrap_err();
        assert_eq!(err.kind(), "Undefined");
        assert!(!op.is_total().unwrap());
        assert!(op.make_table().is_err());
    }

    #[test]
    fn make_table_is_idempotent() {
        let op = FunctionOperation::new(OperationSymbol::new("s", 1), 4, |args| {
            Some((args[0] + 1) % 4)
        });
        op.make_table().unwrap();
        op.make_table().unwrap();
        assert_eq!(op.table().unwrap(), &[1, 2, 3, 0]);
        assert_eq!(op.int_value_at(&[3]).unwrap(), 0);
    }
}
