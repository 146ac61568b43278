//! Factory helpers for common operations.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::alg::op::operation::{IntOperation, Operation};
use crate::alg::op::operation_symbol::OperationSymbol;
use crate::error::{UACalcError, UACalcResult};
use crate::util::horner::{horner_inv_uniform_into, horner_table_size};

/// Build a table-backed operation from a flat table.
pub fn make_int_operation(
    name: &str,
    arity: usize,
    set_size: usize,
    table: Vec<usize>,
) -> UACalcResult<Arc<dyn Operation>> {
    let op = IntOperation::new(OperationSymbol::new(name, arity), set_size, table)?;
    Ok(Arc::new(op))
}

/// Build a binary operation from a row-major table.
pub fn make_binary_int_operation(
    name: &str,
    set_size: usize,
    table: Vec<usize>,
) -> UACalcResult<Arc<dyn Operation>> {
    make_int_operation(name, 2, set_size, table)
}

/// The k-th projection of the given arity.
pub fn projection(set_size: usize, arity: usize, k: usize) -> UACalcResult<Arc<dyn Operation>> {
    if k >= arity {
        return Err(UACalcError::out_of_range(format!(
            "projection: coordinate {} of arity {}",
            k, arity
        )));
    }
    let size = horner_table_size(arity, set_size)
        .ok_or_else(|| UACalcError::out_of_range("projection: table size overflow"))?;
    let mut table = Vec::with_capacity(size);
    let mut args = vec![0; arity];
    for idx in 0..size {
        horner_inv_uniform_into(idx, set_size, &mut args)?;
        table.push(args[k]);
    }
    make_int_operation(&format!("p{}", k), arity, set_size, table)
}

/// A constant, as a nullary operation.
pub fn constant(name: &str, set_size: usize, value: usize) -> UACalcResult<Arc<dyn Operation>> {
    if value >= set_size {
        return Err(UACalcError::out_of_range(format!(
            "constant {}: value {} exceeds carrier size {}",
            name, value, set_size
        )));
    }
    make_int_operation(name, 0, set_size, vec![value])
}

/// Canonical order on operations: arity descending, then symbol name.
pub fn compare(a: &dyn Operation, b: &dyn Operation) -> Ordering {
    a.symbol().cmp(b.symbol())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_returns_its_coordinate() {
        let p1 = projection(3, 2, 1).unwrap();
        assert_eq!(p1.int_value_at(&[2, 0]).unwrap(), 0);
        assert_eq!(p1.int_value_at(&[0, 2]).unwrap(), 2);
    }

    #[test]
    fn constant_has_arity_zero() {
        let c = constant("c", 4, 3).unwrap();
        assert_eq!(c.arity(), 0);
        assert_eq!(c.int_value_at(&[]).unwrap(), 3);
        assert!(constant("c", 4, 4).is_err());
    }

    #[test]
    fn compare_orders_by_arity_then_name() {
        let f = make_int_operation("f", 1, 2, vec![0, 1]).unwrap();
        let g = make_binary_int_operation("g", 2, vec![0, 0, 0, 1]).unwrap();
        assert_eq!(compare(g.as_ref(), f.as_ref()), Ordering::Less);
    }
}
