//! Horner encoding and its inverse.
//!
//! The canonical bijection between argument tuples and flat table indices.
//! The encoding is left-to-right: the first argument is the most
//! significant digit, so a flat operation table is row-major with the
//! last argument varying fastest.

use crate::error::{UACalcError, UACalcResult};

/// Encode a tuple drawn from a mixed-radix product.
///
/// `horner(&[a0, a1, a2], &[s0, s1, s2]) = ((a0 * s1) + a1) * s2 + a2`.
pub fn horner(args: &[usize], sizes: &[usize]) -> UACalcResult<usize> {
    if args.len() != sizes.len() {
        return Err(UACalcError::out_of_range(format!(
            "horner: {} args for {} sizes",
            args.len(),
            sizes.len()
        )));
    }
    let mut ans: usize = 0;
    for (i, (&a, &s)) in args.iter().zip(sizes).enumerate() {
        if a >= s {
            return Err(UACalcError::out_of_range(format!(
                "horner: argument {} at position {} exceeds size {}",
                a, i, s
            )));
        }
        ans = ans
            .checked_mul(s)
            .and_then(|v| v.checked_add(a))
            .ok_or_else(|| UACalcError::out_of_range("horner: index overflow"))?;
    }
    Ok(ans)
}

/// Uniform-size convenience for carriers `{0,..,size-1}`.
pub fn horner_uniform(args: &[usize], size: usize) -> UACalcResult<usize> {
    let mut ans: usize = 0;
    for (i, &a) in args.iter().enumerate() {
        if a >= size {
            return Err(UACalcError::out_of_range(format!(
                "horner: argument {} at position {} exceeds size {}",
                a, i, size
            )));
        }
        ans = ans
            .checked_mul(size)
            .and_then(|v| v.checked_add(a))
            .ok_or_else(|| UACalcError::out_of_range("horner: index overflow"))?;
    }
    Ok(ans)
}

/// Decode a flat index back into a mixed-radix tuple.
pub fn horner_inv(k: usize, sizes: &[usize]) -> UACalcResult<Vec<usize>> {
    let mut ans = vec![0; sizes.len()];
    let mut k = k;
    for i in (0..sizes.len()).rev() {
        let s = sizes[i];
        if s == 0 {
            return Err(UACalcError::out_of_range("horner_inv: zero radix"));
        }
        ans[i] = k % s;
        k /= s;
    }
    if k != 0 {
        return Err(UACalcError::out_of_range(format!(
            "horner_inv: index exceeds the product of sizes by a factor of {}",
            k
        )));
    }
    Ok(ans)
}

/// Uniform-size decode into a caller-supplied buffer.
pub fn horner_inv_uniform_into(mut k: usize, size: usize, dest: &mut [usize]) -> UACalcResult<()> {
    if size == 0 && !dest.is_empty() {
        return Err(UACalcError::out_of_range("horner_inv: zero radix"));
    }
    for i in (0..dest.len()).rev() {
        dest[i] = k % size;
        k /= size;
    }
    if k != 0 {
        return Err(UACalcError::out_of_range("horner_inv: index exceeds table size"));
    }
    Ok(())
}

pub fn horner_inv_uniform(k: usize, size: usize, arity: usize) -> UACalcResult<Vec<usize>> {
    let mut dest = vec![0; arity];
    horner_inv_uniform_into(k, size, &mut dest)?;
    Ok(dest)
}

/// `size^arity` with overflow detection.
pub fn power_checked(base: usize, exp: usize) -> Option<usize> {
    let mut ans: usize = 1;
    for _ in 0..exp {
        ans = ans.checked_mul(base)?;
    }
    Some(ans)
}

/// Length of the flat table of an operation of the given arity.
pub fn horner_table_size(arity: usize, set_size: usize) -> Option<usize> {
    power_checked(set_size, arity)
}

/// Element-reverse of a vector.
pub fn reverse<T: Clone>(v: &[T]) -> Vec<T> {
    let mut ans = v.to_vec();
    ans.reverse();
    ans
}

/// Permute a flat operation table so that the argument order
/// `(x0,..,x{a-1})` becomes `(x{a-1},..,x0)`.
///
/// Translates between the row-major convention used here and the
/// first-argument-fastest convention of some external tools.
pub fn left_right_reverse(
    table: &[usize],
    alg_size: usize,
    arity: usize,
) -> UACalcResult<Vec<usize>> {
    let expected = horner_table_size(arity, alg_size)
        .ok_or_else(|| UACalcError::out_of_range("left_right_reverse: table size overflow"))?;
    if table.len() != expected {
        return Err(UACalcError::invariant(format!(
            "left_right_reverse: table has {} entries, expected {}",
            table.len(),
            expected
        )));
    }
    let mut ans = vec![0; table.len()];
    let mut args = vec![0; arity];
    for (k, &v) in table.iter().enumerate() {
        horner_inv_uniform_into(k, alg_size, &mut args)?;
        args.reverse();
        ans[horner_uniform(&args, alg_size)?] = v;
    }
    Ok(ans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_radix_example() {
        assert_eq!(horner(&[1, 2, 3], &[4, 5, 6]).unwrap(), 45);
        assert_eq!(horner_inv(45, &[4, 5, 6]).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn round_trip_small() {
        let sizes = [3, 2, 4];
        for k in 0..24 {
            let v = horner_inv(k, &sizes).unwrap();
            assert_eq!(horner(&v, &sizes).unwrap(), k);
        }
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(horner(&[4, 0], &[4, 5]).is_err());
        assert!(horner_inv(24, &[4, 3, 2]).is_err());
        assert!(horner(&[0], &[4, 5]).is_err());
    }

    #[test]
    fn empty_tuple_encodes_to_zero() {
        assert_eq!(horner(&[], &[]).unwrap(), 0);
        assert_eq!(horner_inv(0, &[]).unwrap(), Vec::<usize>::new());
    }

    #[test]
    fn left_right_reverse_is_involutive() {
        // Binary operation on {0,1,2}: f(i,j) = i (first projection).
        let table: Vec<usize> = (0..9).map(|k| k / 3).collect();
        let rev = left_right_reverse(&table, 3, 2).unwrap();
        // Reversed table is the second projection.
        let expect: Vec<usize> = (0..9).map(|k| k % 3).collect();
        assert_eq!(rev, expect);
        assert_eq!(left_right_reverse(&rev, 3, 2).unwrap(), table);
    }
}
